//! User-controlled diagnostic filtering: per-rule enable/disable state and a
//! severity filter, applied after the engine runs. Counts are always
//! recomputed from the filtered list.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Category, Diagnostic, LintResult, Severity, RULES};

/// Per-rule runtime toggle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RuleToggle {
    pub enabled: bool,
}

/// Mapping from rule id to its toggle, owned by the presentation layer and
/// consumed read-only here. Rules absent from the map are enabled.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfiguration {
    pub rules: BTreeMap<String, RuleToggle>,
}

impl RuleConfiguration {
    pub fn is_enabled(&self, rule_id: &str) -> bool {
        self.rules.get(rule_id).map_or(true, |t| t.enabled)
    }

    pub fn disable(&mut self, rule_id: impl Into<String>) {
        self.rules
            .insert(rule_id.into(), RuleToggle { enabled: false });
    }

    pub fn enable(&mut self, rule_id: impl Into<String>) {
        self.rules
            .insert(rule_id.into(), RuleToggle { enabled: true });
    }
}

/// Severity filter applied after rule filtering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SeverityFilter {
    #[default]
    All,
    Error,
    Warning,
}

impl SeverityFilter {
    fn allows(self, severity: Severity) -> bool {
        match self {
            SeverityFilter::All => true,
            SeverityFilter::Error => severity == Severity::Error,
            SeverityFilter::Warning => severity == Severity::Warning,
        }
    }
}

/// Applies rule enablement first, then the severity filter. Diagnostics for
/// rule ids missing from the configuration pass through unaffected.
pub fn filter_diagnostics(
    diagnostics: &[Diagnostic],
    configuration: &RuleConfiguration,
    severity: SeverityFilter,
) -> LintResult {
    let kept: Vec<Diagnostic> = diagnostics
        .iter()
        .filter(|d| configuration.is_enabled(&d.rule_id))
        .filter(|d| severity.allows(d.severity))
        .cloned()
        .collect();
    LintResult::from_messages(kept)
}

/// Ordered registry surface for an enable/disable control panel.
#[derive(Debug, Clone, Serialize)]
pub struct RuleListing {
    pub id: &'static str,
    pub name: &'static str,
    pub category: Category,
    pub enabled: bool,
}

/// Lists every registered rule, in registration order, with its current
/// enabled state under `configuration`.
pub fn rule_listing(configuration: &RuleConfiguration) -> Vec<RuleListing> {
    RULES
        .iter()
        .map(|rule| RuleListing {
            id: rule.id,
            name: rule.name,
            category: rule.category,
            enabled: configuration.is_enabled(rule.id),
        })
        .collect()
}
