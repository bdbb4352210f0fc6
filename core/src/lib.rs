//! Kousei core lint engine.
//! Implements deterministic surface-pattern rules that flag stylistic issues
//! in Japanese prose and reports each as a positioned diagnostic.

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub mod filter;
pub mod pipeline;
pub mod protocol;
pub mod span;

pub use filter::{filter_diagnostics, rule_listing, RuleConfiguration, SeverityFilter};
pub use span::{extract_context, resolve_word_span, Document, Snippet, Span, ELLIPSIS};

/// Diagnostic severity. Serializes as the wire integer (warning = 1, error = 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    pub fn as_number(self) -> u8 {
        match self {
            Severity::Warning => 1,
            Severity::Error => 2,
        }
    }
}

impl Serialize for Severity {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_number())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match u8::deserialize(deserializer)? {
            1 => Ok(Severity::Warning),
            2 => Ok(Severity::Error),
            other => Err(serde::de::Error::custom(format!(
                "invalid severity `{other}`, expected 1 or 2"
            ))),
        }
    }
}

/// Rule category identifiers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Ord, PartialOrd)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    TechnicalWriting,
    AiWriting,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Category::TechnicalWriting => "technical-writing",
            Category::AiWriting => "ai-writing",
        };
        f.write_str(name)
    }
}

/// Wire tag carried by every lint message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Lint,
}

/// One reported issue with a 1-based line/column location.
/// `column` counts characters, not bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    #[serde(rename = "type", default)]
    pub kind: MessageKind,
    pub rule_id: String,
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub severity: Severity,
}

impl Diagnostic {
    fn of(rule: &RuleInfo, line: usize, column: usize, message: String) -> Self {
        Self {
            kind: MessageKind::Lint,
            rule_id: rule.id.to_string(),
            message,
            line,
            column,
            severity: rule.severity,
        }
    }
}

/// Aggregated result of one lint pass. Counts are always derived from the
/// message list, never set independently.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LintResult {
    pub messages: Vec<Diagnostic>,
    pub error_count: usize,
    pub warning_count: usize,
}

impl LintResult {
    pub fn from_messages(messages: Vec<Diagnostic>) -> Self {
        let error_count = messages
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count();
        let warning_count = messages
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count();
        Self {
            messages,
            error_count,
            warning_count,
        }
    }
}

/// Static registry entry for one rule. Runtime enablement lives in
/// [`filter::RuleConfiguration`], not here.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RuleInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub category: Category,
    pub severity: Severity,
}

const EXCLAMATION_QUESTION: RuleInfo = RuleInfo {
    id: "no-exclamation-question-mark",
    name: "感嘆符・疑問符",
    category: Category::TechnicalWriting,
    severity: Severity::Error,
};
const SENTENCE_LENGTH: RuleInfo = RuleInfo {
    id: "sentence-length",
    name: "文の長さ",
    category: Category::TechnicalWriting,
    severity: Severity::Error,
};
const REDUNDANT_EXPRESSION: RuleInfo = RuleInfo {
    id: "ja-no-redundant-expression",
    name: "冗長な表現",
    category: Category::TechnicalWriting,
    severity: Severity::Warning,
};
const WEAK_PHRASE: RuleInfo = RuleInfo {
    id: "ja-no-weak-phrase",
    name: "弱い表現",
    category: Category::TechnicalWriting,
    severity: Severity::Warning,
};
const DOUBLED_JOSHI: RuleInfo = RuleInfo {
    id: "no-doubled-joshi",
    name: "助詞の連続",
    category: Category::TechnicalWriting,
    severity: Severity::Warning,
};
const SUCCESSIVE_WORD: RuleInfo = RuleInfo {
    id: "ja-no-successive-word",
    name: "単語の連続",
    category: Category::TechnicalWriting,
    severity: Severity::Error,
};
const DROPPING_RA: RuleInfo = RuleInfo {
    id: "no-dropping-ra",
    name: "ら抜き言葉",
    category: Category::TechnicalWriting,
    severity: Severity::Warning,
};
const KANJI_CONTINUOUS: RuleInfo = RuleInfo {
    id: "max-kanji-continuous-len",
    name: "漢字の連続",
    category: Category::TechnicalWriting,
    severity: Severity::Warning,
};
const AI_HYPE: RuleInfo = RuleInfo {
    id: "no-ai-hype-expressions",
    name: "誇張表現",
    category: Category::AiWriting,
    severity: Severity::Warning,
};
const AI_LIST_FORMATTING: RuleInfo = RuleInfo {
    id: "no-ai-list-formatting",
    name: "記号付き箇条書き",
    category: Category::AiWriting,
    severity: Severity::Warning,
};
const AI_EMPHASIS: RuleInfo = RuleInfo {
    id: "no-ai-emphasis-patterns",
    name: "強調パターン",
    category: Category::AiWriting,
    severity: Severity::Warning,
};
const AI_COLON: RuleInfo = RuleInfo {
    id: "no-ai-colon-continuation",
    name: "コロンの使用",
    category: Category::AiWriting,
    severity: Severity::Warning,
};

/// Registered rules in execution order.
pub const RULES: &[RuleInfo] = &[
    EXCLAMATION_QUESTION,
    SENTENCE_LENGTH,
    REDUNDANT_EXPRESSION,
    WEAK_PHRASE,
    DOUBLED_JOSHI,
    SUCCESSIVE_WORD,
    DROPPING_RA,
    KANJI_CONTINUOUS,
    AI_HYPE,
    AI_LIST_FORMATTING,
    AI_EMPHASIS,
    AI_COLON,
];

/// Looks up a registered rule by id.
pub fn rule_info(id: &str) -> Option<&'static RuleInfo> {
    RULES.iter().find(|r| r.id == id)
}

const MAX_SENTENCE_LEN: usize = 100;
const MAX_KANJI_RUN: usize = 6;
const DOUBLED_JOSHI_WINDOW: usize = 10;

const SENTENCE_DELIMITERS: &[char] = &['。', '．'];
const DOUBLED_PARTICLES: &[char] = &['は', 'が', 'を', 'に'];
const CHECKMARK_GLYPHS: &[char] = &['✅', '✔', '☑'];

const REDUNDANT_EXPRESSIONS: &[(&str, &str)] = &[
    ("まず最初に", "最初に"),
    ("することができます", "できます"),
    ("することができる", "できる"),
    ("することが可能", "できる"),
    ("ということができる", "といえる"),
    ("を行うことができる", "を行える"),
];

const WEAK_PHRASES: &[&str] = &[
    "かもしれません",
    "かもしれない",
    "と思われます",
    "と思われる",
    "思います",
    "思う",
    "だろう",
    "でしょう",
];

const RA_NUKI_FORMS: &[&str] = &[
    "食べれる",
    "食べれます",
    "見れる",
    "見れます",
    "来れる",
    "着れる",
    "考えれる",
    "出れる",
    "信じれる",
    "起きれる",
    "降りれる",
];

const HYPE_EXPRESSIONS: &[&str] = &[
    "革命的",
    "画期的",
    "革新的",
    "究極の",
    "圧倒的な",
    "劇的に",
    "爆速",
    "魔法のような",
    "ゲームチェンジャー",
    "無限の可能性",
    "次世代の",
];

static EXCLAMATION_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[!！?？]+").expect("static regex"));

static KANJI_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\p{Han}{7,}").expect("static regex"));

static EMPHASIS_COLON_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*[^*]+\*\*[:：]").expect("static regex"));

/// Runs the registered rules over a document and aggregates diagnostics.
///
/// Linting is deterministic and total: a rule that finds nothing simply
/// contributes no diagnostics. The whole document is rescanned on every call.
pub struct RuleEngine {
    redundant_matcher: AhoCorasick,
    weak_phrase_matcher: AhoCorasick,
    ra_nuki_matcher: AhoCorasick,
    hype_matcher: AhoCorasick,
}

impl RuleEngine {
    pub fn new() -> Self {
        let phrases: Vec<&str> = REDUNDANT_EXPRESSIONS.iter().map(|(p, _)| *p).collect();
        let redundant_matcher = AhoCorasickBuilder::new()
            .match_kind(MatchKind::LeftmostLongest)
            .build(&phrases);
        let weak_phrase_matcher = AhoCorasickBuilder::new()
            .match_kind(MatchKind::LeftmostLongest)
            .build(WEAK_PHRASES);
        let ra_nuki_matcher = AhoCorasickBuilder::new()
            .match_kind(MatchKind::LeftmostLongest)
            .build(RA_NUKI_FORMS);
        let hype_matcher = AhoCorasickBuilder::new()
            .match_kind(MatchKind::LeftmostLongest)
            .build(HYPE_EXPRESSIONS);
        Self {
            redundant_matcher,
            weak_phrase_matcher,
            ra_nuki_matcher,
            hype_matcher,
        }
    }

    /// Lints a document. Rules run per line, in registration order.
    pub fn lint(&self, text: &str) -> LintResult {
        let mut messages = Vec::new();
        for (idx, line) in text.split('\n').enumerate() {
            let line_no = idx + 1;
            self.check_exclamation_question(line, line_no, &mut messages);
            self.check_sentence_length(line, line_no, &mut messages);
            self.check_redundant_expression(line, line_no, &mut messages);
            self.check_weak_phrase(line, line_no, &mut messages);
            self.check_doubled_joshi(line, line_no, &mut messages);
            self.check_successive_word(line, line_no, &mut messages);
            self.check_dropping_ra(line, line_no, &mut messages);
            self.check_kanji_run(line, line_no, &mut messages);
            self.check_ai_hype(line, line_no, &mut messages);
            self.check_ai_list_formatting(line, line_no, &mut messages);
            self.check_ai_emphasis(line, line_no, &mut messages);
            self.check_ai_colon(line, line_no, &mut messages);
        }
        LintResult::from_messages(messages)
    }

    fn check_exclamation_question(&self, line: &str, line_no: usize, out: &mut Vec<Diagnostic>) {
        for mat in EXCLAMATION_RUN_RE.find_iter(line) {
            out.push(Diagnostic::of(
                &EXCLAMATION_QUESTION,
                line_no,
                char_column(line, mat.start()),
                format!("感嘆符・疑問符「{}」を使用しています。", mat.as_str()),
            ));
        }
    }

    // Column accounting mirrors the delimiter consumption: each segment
    // advances the running offset by its own length plus one.
    fn check_sentence_length(&self, line: &str, line_no: usize, out: &mut Vec<Diagnostic>) {
        let mut column = 1usize;
        for segment in line.split(SENTENCE_DELIMITERS) {
            let len = segment.chars().count();
            if len > MAX_SENTENCE_LEN {
                out.push(Diagnostic::of(
                    &SENTENCE_LENGTH,
                    line_no,
                    column,
                    format!(
                        "1文の長さ（{len}文字）が最大値（{MAX_SENTENCE_LEN}文字）を超えています。"
                    ),
                ));
            }
            column += len + 1;
        }
    }

    fn check_redundant_expression(&self, line: &str, line_no: usize, out: &mut Vec<Diagnostic>) {
        for mat in self.redundant_matcher.find_iter(line.as_bytes()) {
            let (found, replacement) = REDUNDANT_EXPRESSIONS[mat.pattern()];
            out.push(Diagnostic::of(
                &REDUNDANT_EXPRESSION,
                line_no,
                char_column(line, mat.start()),
                format!(
                    "冗長な表現「{found}」が使われています。「{replacement}」と言い換えられます。"
                ),
            ));
        }
    }

    fn check_weak_phrase(&self, line: &str, line_no: usize, out: &mut Vec<Diagnostic>) {
        for mat in self.weak_phrase_matcher.find_iter(line.as_bytes()) {
            let found = WEAK_PHRASES[mat.pattern()];
            out.push(Diagnostic::of(
                &WEAK_PHRASE,
                line_no,
                char_column(line, mat.start()),
                format!("弱い表現「{found}」が使われています。"),
            ));
        }
    }

    // A particle counts as doubled when the same character recurs with at
    // most DOUBLED_JOSHI_WINDOW intervening non-particle characters. Matches
    // are non-overlapping: scanning resumes after the second particle.
    fn check_doubled_joshi(&self, line: &str, line_no: usize, out: &mut Vec<Diagnostic>) {
        let chars: Vec<char> = line.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            let particle = chars[i];
            if !DOUBLED_PARTICLES.contains(&particle) {
                i += 1;
                continue;
            }
            let mut matched = false;
            let mut j = i + 1;
            while j < chars.len() && j - i - 1 <= DOUBLED_JOSHI_WINDOW {
                if chars[j] == particle {
                    out.push(Diagnostic::of(
                        &DOUBLED_JOSHI,
                        line_no,
                        i + 1,
                        format!("一文に同じ助詞「{particle}」が連続して使われています。"),
                    ));
                    i = j + 1;
                    matched = true;
                    break;
                }
                if DOUBLED_PARTICLES.contains(&chars[j]) {
                    break;
                }
                j += 1;
            }
            if !matched {
                i += 1;
            }
        }
    }

    fn check_successive_word(&self, line: &str, line_no: usize, out: &mut Vec<Diagnostic>) {
        let chars: Vec<char> = line.chars().collect();
        for (start, total) in repeated_runs(&chars, 2, is_cjk_word_char) {
            let word: String = chars[start..start + total / 2].iter().collect();
            out.push(Diagnostic::of(
                &SUCCESSIVE_WORD,
                line_no,
                start + 1,
                format!("単語「{word}」が連続して使われています。"),
            ));
        }
        for (start, total) in repeated_runs(&chars, 3, |c| c.is_ascii_alphabetic()) {
            let word: String = chars[start..start + total / 2].iter().collect();
            out.push(Diagnostic::of(
                &SUCCESSIVE_WORD,
                line_no,
                start + 1,
                format!("単語「{word}」が連続して使われています。"),
            ));
        }
        self.check_spaced_latin_repeat(&chars, line_no, out);
    }

    // Latin token of 2+ letters, whitespace, then the identical token. Both
    // tokens are consumed on a match so runs of three report once.
    fn check_spaced_latin_repeat(&self, chars: &[char], line_no: usize, out: &mut Vec<Diagnostic>) {
        let mut tokens: Vec<(usize, usize)> = Vec::new();
        let mut i = 0;
        while i < chars.len() {
            if chars[i].is_ascii_alphabetic() {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_alphabetic() {
                    i += 1;
                }
                tokens.push((start, i));
            } else {
                i += 1;
            }
        }
        let mut k = 0;
        while k + 1 < tokens.len() {
            let (s1, e1) = tokens[k];
            let (s2, e2) = tokens[k + 1];
            let gap_is_whitespace = e1 < s2 && chars[e1..s2].iter().all(|c| c.is_whitespace());
            if gap_is_whitespace && e1 - s1 >= 2 && chars[s1..e1] == chars[s2..e2] {
                let word: String = chars[s1..e1].iter().collect();
                out.push(Diagnostic::of(
                    &SUCCESSIVE_WORD,
                    line_no,
                    s1 + 1,
                    format!("単語「{word}」が連続して使われています。"),
                ));
                k += 2;
            } else {
                k += 1;
            }
        }
    }

    fn check_dropping_ra(&self, line: &str, line_no: usize, out: &mut Vec<Diagnostic>) {
        for mat in self.ra_nuki_matcher.find_iter(line.as_bytes()) {
            let found = RA_NUKI_FORMS[mat.pattern()];
            out.push(Diagnostic::of(
                &DROPPING_RA,
                line_no,
                char_column(line, mat.start()),
                format!("ら抜き言葉「{found}」が使われています。"),
            ));
        }
    }

    // First over-long run per line only.
    fn check_kanji_run(&self, line: &str, line_no: usize, out: &mut Vec<Diagnostic>) {
        if let Some(mat) = KANJI_RUN_RE.find(line) {
            let len = mat.as_str().chars().count();
            out.push(Diagnostic::of(
                &KANJI_CONTINUOUS,
                line_no,
                char_column(line, mat.start()),
                format!("漢字が{len}文字連続しています（最大{MAX_KANJI_RUN}文字）。"),
            ));
        }
    }

    fn check_ai_hype(&self, line: &str, line_no: usize, out: &mut Vec<Diagnostic>) {
        for mat in self.hype_matcher.find_iter(line.as_bytes()) {
            let found = HYPE_EXPRESSIONS[mat.pattern()];
            out.push(Diagnostic::of(
                &AI_HYPE,
                line_no,
                char_column(line, mat.start()),
                format!("AI文章によくある誇張表現「{found}」が使われています。"),
            ));
        }
    }

    fn check_ai_list_formatting(&self, line: &str, line_no: usize, out: &mut Vec<Diagnostic>) {
        for (idx, ch) in line.chars().enumerate() {
            if CHECKMARK_GLYPHS.contains(&ch) {
                out.push(Diagnostic::of(
                    &AI_LIST_FORMATTING,
                    line_no,
                    idx + 1,
                    format!("チェックマーク記号「{ch}」による箇条書きはAI的な文体です。"),
                ));
            }
        }
    }

    fn check_ai_emphasis(&self, line: &str, line_no: usize, out: &mut Vec<Diagnostic>) {
        for mat in EMPHASIS_COLON_RE.find_iter(line) {
            out.push(Diagnostic::of(
                &AI_EMPHASIS,
                line_no,
                char_column(line, mat.start()),
                format!(
                    "強調記号とコロンの組み合わせ「{}」はAI的な文体です。",
                    mat.as_str()
                ),
            ));
        }
    }

    // One diagnostic per line, positioned at the later of the first ASCII
    // and first full-width colon.
    fn check_ai_colon(&self, line: &str, line_no: usize, out: &mut Vec<Diagnostic>) {
        let mut ascii = None;
        let mut wide = None;
        for (idx, ch) in line.chars().enumerate() {
            if ch == ':' && ascii.is_none() {
                ascii = Some(idx);
            }
            if ch == '：' && wide.is_none() {
                wide = Some(idx);
            }
        }
        let position = match (ascii, wide) {
            (Some(a), Some(w)) => Some(a.max(w)),
            (Some(a), None) => Some(a),
            (None, Some(w)) => Some(w),
            (None, None) => None,
        };
        if let Some(idx) = position {
            out.push(Diagnostic::of(
                &AI_COLON,
                line_no,
                idx + 1,
                "コロンで文を続ける書き方はAI的な文体です。".to_string(),
            ));
        }
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn char_column(line: &str, byte_offset: usize) -> usize {
    line[..byte_offset].chars().count() + 1
}

// Kanji and katakana only. Hiragana is excluded so particles and okurigana
// do not glue unrelated words into a false repeat.
fn is_cjk_word_char(c: char) -> bool {
    matches!(c,
        '\u{3005}'
        | '\u{30A0}'..='\u{30FF}'
        | '\u{3400}'..='\u{4DBF}'
        | '\u{4E00}'..='\u{9FFF}')
}

// Finds non-overlapping `XX` repeats inside maximal runs of member
// characters, preferring the longest repeat at each position. Pure scan;
// no matcher state survives the call.
fn repeated_runs(
    chars: &[char],
    min_len: usize,
    is_member: impl Fn(char) -> bool,
) -> Vec<(usize, usize)> {
    let mut found = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        if !is_member(chars[i]) {
            i += 1;
            continue;
        }
        let run_start = i;
        let mut run_end = i;
        while run_end < chars.len() && is_member(chars[run_end]) {
            run_end += 1;
        }
        let mut pos = run_start;
        'scan: while pos < run_end {
            let mut len = (run_end - pos) / 2;
            while len >= min_len {
                if chars[pos..pos + len] == chars[pos + len..pos + 2 * len] {
                    found.push((pos, 2 * len));
                    pos += 2 * len;
                    continue 'scan;
                }
                len -= 1;
            }
            pos += 1;
        }
        i = run_end;
    }
    found
}
