//! Debounced lint scheduling. Turns a stream of document edits into at most
//! one pending-or-in-flight lint request: every edit restarts the debounce
//! window and supersedes the previous one, and a response that arrives after
//! a newer edit is discarded (last-request-wins by request id).

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use crate::{LintResult, RuleEngine};

/// Failure to schedule a lint at all, surfaced so the caller can show an
/// error state instead of a false "no issues" signal.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("lint pipeline is not running")]
    NotRunning,
}

/// Failure of one lint request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LintError {
    #[error("lint engine is unavailable")]
    EngineUnavailable,
    #[error("lint transport failed: {0}")]
    Transport(String),
}

/// Outcome of the most recent non-superseded lint request.
#[derive(Debug, Clone, PartialEq)]
pub struct LintUpdate {
    pub request_id: u64,
    pub outcome: Result<LintResult, LintError>,
}

/// Asynchronous boundary around an engine. The in-process implementation
/// wraps [`RuleEngine`]; an out-of-process one would speak
/// [`crate::protocol`] over a transport.
pub trait LintBackend: Send + Sync + 'static {
    fn lint(&self, text: String) -> impl Future<Output = Result<LintResult, LintError>> + Send;
}

/// In-process backend: the synchronous engine behind the async boundary.
#[derive(Clone)]
pub struct EngineBackend {
    engine: Arc<RuleEngine>,
}

impl EngineBackend {
    pub fn new(engine: Arc<RuleEngine>) -> Self {
        Self { engine }
    }
}

impl LintBackend for EngineBackend {
    fn lint(&self, text: String) -> impl Future<Output = Result<LintResult, LintError>> + Send {
        let engine = Arc::clone(&self.engine);
        async move { Ok(engine.lint(&text)) }
    }
}

/// Handle to the scheduling task. Edits go in through [`submit`], results
/// come out through the watch channel from [`subscribe`].
///
/// [`submit`]: LintPipeline::submit
/// [`subscribe`]: LintPipeline::subscribe
pub struct LintPipeline {
    edits: mpsc::UnboundedSender<String>,
    updates: watch::Receiver<Option<LintUpdate>>,
    task: JoinHandle<()>,
}

impl LintPipeline {
    pub fn spawn<B: LintBackend>(backend: B, delay: Duration) -> Self {
        let (edits_tx, edits_rx) = mpsc::unbounded_channel();
        let (updates_tx, updates_rx) = watch::channel(None);
        let task = tokio::spawn(run(backend, delay, edits_rx, updates_tx));
        Self {
            edits: edits_tx,
            updates: updates_rx,
            task,
        }
    }

    /// Queues the latest document text, restarting the debounce window.
    pub fn submit(&self, text: impl Into<String>) -> Result<(), PipelineError> {
        if self.task.is_finished() {
            return Err(PipelineError::NotRunning);
        }
        self.edits
            .send(text.into())
            .map_err(|_| PipelineError::NotRunning)
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<LintUpdate>> {
        self.updates.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Cancels the pending window and any in-flight request.
    pub fn shutdown(&self) {
        self.task.abort();
    }
}

async fn run<B: LintBackend>(
    backend: B,
    delay: Duration,
    mut edits: mpsc::UnboundedReceiver<String>,
    updates: watch::Sender<Option<LintUpdate>>,
) {
    let mut pending: Option<String> = None;
    let mut deadline: Option<Instant> = None;
    let mut next_id: u64 = 0;

    loop {
        tokio::select! {
            maybe = edits.recv() => {
                match maybe {
                    Some(text) => {
                        // A new window entirely supersedes the previous one.
                        pending = Some(text);
                        deadline = Some(Instant::now() + delay);
                    }
                    None => break,
                }
            }
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                deadline = None;
                let Some(text) = pending.take() else { continue };
                next_id += 1;
                let request_id = next_id;

                // Blank documents short-circuit without touching the backend.
                if text.trim().is_empty() {
                    let _ = updates.send(Some(LintUpdate {
                        request_id,
                        outcome: Ok(LintResult::default()),
                    }));
                    continue;
                }

                let lint = backend.lint(text);
                tokio::pin!(lint);
                let mut superseded = false;
                let mut closed = false;
                let outcome = loop {
                    if closed {
                        break lint.await;
                    }
                    tokio::select! {
                        outcome = &mut lint => break outcome,
                        maybe = edits.recv() => match maybe {
                            Some(newer) => {
                                pending = Some(newer);
                                deadline = Some(Instant::now() + delay);
                                superseded = true;
                            }
                            None => closed = true,
                        }
                    }
                };
                // A stale response never overwrites a newer edit's result.
                if !superseded {
                    let _ = updates.send(Some(LintUpdate { request_id, outcome }));
                }
                if closed {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct RecordingBackend {
        calls: Arc<Mutex<Vec<String>>>,
        response_delay: Option<Duration>,
    }

    impl RecordingBackend {
        fn delayed(delay: Duration) -> Self {
            Self {
                calls: Arc::default(),
                response_delay: Some(delay),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl LintBackend for RecordingBackend {
        fn lint(
            &self,
            text: String,
        ) -> impl Future<Output = Result<LintResult, LintError>> + Send {
            let calls = Arc::clone(&self.calls);
            let response_delay = self.response_delay;
            async move {
                if let Some(delay) = response_delay {
                    tokio::time::sleep(delay).await;
                }
                calls.lock().unwrap().push(text);
                Ok(LintResult::default())
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_edits_coalesce_into_one_invocation_with_latest_text() {
        let backend = RecordingBackend::default();
        let pipeline = LintPipeline::spawn(backend.clone(), Duration::from_millis(300));
        let mut updates = pipeline.subscribe();

        pipeline.submit("最初の版").unwrap();
        tokio::time::advance(Duration::from_millis(50)).await;
        pipeline.submit("次の版").unwrap();
        tokio::time::advance(Duration::from_millis(50)).await;
        pipeline.submit("最終版の本文").unwrap();

        updates.changed().await.unwrap();
        let update = updates.borrow().clone().unwrap();
        assert_eq!(update.request_id, 1);
        assert_eq!(backend.calls(), vec!["最終版の本文".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn blank_document_short_circuits_without_backend_call() {
        let backend = RecordingBackend::default();
        let pipeline = LintPipeline::spawn(backend.clone(), Duration::from_millis(300));
        let mut updates = pipeline.subscribe();

        pipeline.submit("   \n\t  ").unwrap();
        updates.changed().await.unwrap();
        let update = updates.borrow().clone().unwrap();
        assert_eq!(update.outcome, Ok(LintResult::default()));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn stale_in_flight_result_is_discarded() {
        let backend = RecordingBackend::delayed(Duration::from_millis(100));
        let pipeline = LintPipeline::spawn(backend.clone(), Duration::from_millis(300));
        let mut updates = pipeline.subscribe();

        pipeline.submit("第一版の本文").unwrap();
        tokio::time::advance(Duration::from_millis(320)).await;
        // Request 1 is now in flight; this edit supersedes it.
        pipeline.submit("第二版の本文").unwrap();

        updates.changed().await.unwrap();
        let update = updates.borrow().clone().unwrap();
        assert_eq!(update.request_id, 2);
        assert_eq!(
            backend.calls(),
            vec!["第一版の本文".to_string(), "第二版の本文".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn consecutive_windows_increment_request_ids() {
        let backend = RecordingBackend::default();
        let pipeline = LintPipeline::spawn(backend.clone(), Duration::from_millis(300));
        let mut updates = pipeline.subscribe();

        pipeline.submit("一回目").unwrap();
        updates.changed().await.unwrap();
        assert_eq!(updates.borrow().clone().unwrap().request_id, 1);

        pipeline.submit("二回目").unwrap();
        updates.changed().await.unwrap();
        assert_eq!(updates.borrow().clone().unwrap().request_id, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn submit_after_shutdown_reports_not_running() {
        let backend = RecordingBackend::default();
        let pipeline = LintPipeline::spawn(backend, Duration::from_millis(300));
        pipeline.shutdown();
        while pipeline.is_running() {
            tokio::task::yield_now().await;
        }
        assert_eq!(pipeline.submit("手遅れ"), Err(PipelineError::NotRunning));
    }

    #[tokio::test(start_paused = true)]
    async fn engine_backend_reports_real_diagnostics() {
        let backend = EngineBackend::new(Arc::new(RuleEngine::new()));
        let pipeline = LintPipeline::spawn(backend, Duration::from_millis(100));
        let mut updates = pipeline.subscribe();

        pipeline.submit("これはすごい！").unwrap();
        updates.changed().await.unwrap();
        let update = updates.borrow().clone().unwrap();
        let result = update.outcome.unwrap();
        assert_eq!(result.error_count, 1);
        assert_eq!(result.messages[0].rule_id, "no-exclamation-question-mark");
    }
}
