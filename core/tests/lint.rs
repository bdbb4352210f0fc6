use kousei_core::{
    extract_context, filter_diagnostics, resolve_word_span, Document, LintResult,
    RuleConfiguration, RuleEngine, Severity, SeverityFilter, ELLIPSIS,
};

fn lint(text: &str) -> LintResult {
    RuleEngine::new().lint(text)
}

fn assert_has(result: &LintResult, rule_id: &str) {
    assert!(
        result.messages.iter().any(|d| d.rule_id == rule_id),
        "expected rule {rule_id}, got diagnostics: {:#?}",
        result.messages
    );
}

#[test]
fn scenario_exclamation_mark() {
    let result = lint("これはすごい！");
    assert_eq!(result.messages.len(), 1);
    let diag = &result.messages[0];
    assert_eq!(diag.rule_id, "no-exclamation-question-mark");
    assert_eq!(diag.severity, Severity::Error);
    assert_eq!(diag.column, 7);
}

#[test]
fn scenario_doubled_particle() {
    let result = lint("彼は彼は行った");
    assert_eq!(result.messages.len(), 1);
    let diag = &result.messages[0];
    assert_eq!(diag.rule_id, "no-doubled-joshi");
    assert!(diag.message.contains("「は」"));
}

#[test]
fn scenario_overlong_sentence_without_delimiter() {
    let text = "あ".repeat(101);
    let result = lint(&text);
    assert_eq!(result.messages.len(), 1);
    let diag = &result.messages[0];
    assert_eq!(diag.rule_id, "sentence-length");
    assert_eq!(diag.column, 1);
    assert!(diag.message.contains("101"));
}

#[test]
fn scenario_successive_word() {
    let result = lint("テストテスト");
    assert_eq!(result.messages.len(), 1);
    let diag = &result.messages[0];
    assert_eq!(diag.rule_id, "ja-no-successive-word");
    assert_eq!(diag.severity, Severity::Error);
}

#[test]
fn scenario_colon_reports_later_of_two() {
    // ASCII colon at char index 5, full-width colon at char index 10.
    let result = lint("手順まとめ:そのまま：続く");
    let hits: Vec<_> = result
        .messages
        .iter()
        .filter(|d| d.rule_id == "no-ai-colon-continuation")
        .collect();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].column, 11);
}

#[test]
fn every_diagnostic_stays_within_document_bounds() {
    let text = "これはすごい！\n\n彼は彼は行った。見れると思う：\n✅ **結論**: 画期的だ！？\nまず最初にテストテストを実行することができる。";
    let result = lint(text);
    let line_count = text.split('\n').count();
    assert!(!result.messages.is_empty());
    for diag in &result.messages {
        assert!(diag.line >= 1 && diag.line <= line_count, "line out of bounds: {diag:?}");
        assert!(diag.column >= 1, "column out of bounds: {diag:?}");
    }
}

#[test]
fn counts_always_partition_the_message_list() {
    for text in [
        "",
        "問題のない文です。",
        "これはすごい！彼は彼は行った。",
        "✅ 画期的な究極の体験！",
    ] {
        let result = lint(text);
        assert_eq!(
            result.error_count + result.warning_count,
            result.messages.len(),
            "counts diverged for {text:?}"
        );
    }
}

#[test]
fn lint_is_deterministic_across_calls() {
    let text = "彼は彼は行った！\n見れるかもしれないと思う：\nまず最初にテストテストへ";
    assert_eq!(lint(text), lint(text));
}

#[test]
fn filter_with_everything_enabled_is_identity() {
    let result = lint("これはすごい！動くかもしれない。");
    let filtered = filter_diagnostics(
        &result.messages,
        &RuleConfiguration::default(),
        SeverityFilter::All,
    );
    assert_eq!(filtered.messages, result.messages);
    assert_eq!(filtered.error_count, result.error_count);
    assert_eq!(filtered.warning_count, result.warning_count);
}

#[test]
fn disabled_rule_and_severity_filter_compose() {
    let result = lint("これはすごい！動くかもしれない。テストテスト");
    let mut config = RuleConfiguration::default();
    config.disable("ja-no-successive-word");
    let filtered = filter_diagnostics(&result.messages, &config, SeverityFilter::Error);
    assert_eq!(filtered.warning_count, 0);
    assert!(filtered
        .messages
        .iter()
        .all(|d| d.rule_id == "no-exclamation-question-mark"));
}

#[test]
fn snippet_round_trips_onto_the_diagnosed_line() {
    let text = format!("{}これが問題の箇所です{}", "前".repeat(30), "後".repeat(30));
    let result = lint(&text);
    let document = Document::new(&text);
    for diag in &result.messages {
        let snippet = match extract_context(&document, diag.line, diag.column, 20) {
            Some(snippet) => snippet,
            None => continue,
        };
        let joined = format!(
            "{}{}{}",
            snippet.before.trim_start_matches(ELLIPSIS),
            snippet.error_text,
            snippet.after.trim_end_matches(ELLIPSIS)
        );
        let line = document.line(diag.line).unwrap();
        assert!(
            line.contains(&joined),
            "snippet {joined:?} is not contiguous in line {line:?}"
        );
    }
}

#[test]
fn selection_span_matches_snippet_text() {
    let text = "彼は彼は行った。すごい！";
    let result = lint(text);
    assert_has(&result, "no-doubled-joshi");
    let document = Document::new(text);
    for diag in &result.messages {
        let span = resolve_word_span(&document, diag.line, diag.column).unwrap();
        let snippet = extract_context(&document, diag.line, diag.column, 20).unwrap();
        assert_eq!(span.length, snippet.error_text.chars().count().max(1));
    }
}

#[test]
fn out_of_range_positions_degrade_to_no_context() {
    let document = Document::new("一行だけの文書");
    assert!(resolve_word_span(&document, 5, 1).is_none());
    assert!(extract_context(&document, 5, 1, 20).is_none());
}
