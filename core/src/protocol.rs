//! Wire contract for an out-of-process lint engine. The pipeline correlates
//! responses to requests by `id` and ignores any response whose id is not
//! the most recently issued; these types only define the shapes and the
//! mapping of a transported `error` field onto [`LintError`].

use serde::{Deserialize, Serialize};

use crate::pipeline::LintError;
use crate::LintResult;

/// Commands understood by the engine process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Command {
    #[default]
    Lint,
}

/// One lint request, tagged with a monotonically increasing id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LintRequest {
    pub id: u64,
    pub command: Command,
    pub text: String,
}

impl LintRequest {
    pub fn new(id: u64, text: impl Into<String>) -> Self {
        Self {
            id,
            command: Command::Lint,
            text: text.into(),
        }
    }
}

/// Response to one request: either results or an error, never silently
/// neither.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LintResponse {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<LintResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LintResponse {
    pub fn success(id: u64, results: LintResult) -> Self {
        Self {
            id,
            results: Some(results),
            error: None,
        }
    }

    pub fn failure(id: u64, error: impl Into<String>) -> Self {
        Self {
            id,
            results: None,
            error: Some(error.into()),
        }
    }

    /// Propagates a transported error as a failed request rather than a
    /// fake empty diagnostic list.
    pub fn into_outcome(self) -> Result<LintResult, LintError> {
        if let Some(error) = self.error {
            return Err(LintError::Transport(error));
        }
        self.results
            .ok_or_else(|| LintError::Transport("response carried no results".to_string()))
    }
}
