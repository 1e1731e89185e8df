use rust_decimal::Decimal;
use serde::Serialize;

use super::error::{FatooraError, RuleViolation};
use super::rules::Rule;

/// Result of evaluating one rule on one subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleOutcome {
    pub rule: Rule,
    /// `"document"`, `"tax total 2"`, `"line 1"`, ...
    pub subject: String,
    /// Value computed from the other fields.
    pub expected: Decimal,
    /// Value stated in the document.
    pub actual: Decimal,
    pub passed: bool,
}

impl RuleOutcome {
    pub fn violation(&self) -> Option<RuleViolation> {
        (!self.passed).then(|| RuleViolation {
            rule: self.rule,
            subject: self.subject.clone(),
            expected: self.expected,
            actual: self.actual,
        })
    }
}

/// Outcomes of a full check pass over one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RuleReport {
    /// `cbc:ID` of the checked invoice, when present.
    pub document_id: Option<String>,
    pub outcomes: Vec<RuleOutcome>,
}

impl RuleReport {
    pub fn is_conforming(&self) -> bool {
        self.outcomes.iter().all(|o| o.passed)
    }

    pub fn violations(&self) -> Vec<RuleViolation> {
        self.outcomes.iter().filter_map(RuleOutcome::violation).collect()
    }

    /// Outcomes for a single rule.
    pub fn outcomes_for(&self, rule: Rule) -> impl Iterator<Item = &RuleOutcome> {
        self.outcomes.iter().filter(move |o| o.rule == rule)
    }

    /// Turn any violation into [`FatooraError::RuleViolations`].
    pub fn into_result(self) -> Result<Self, FatooraError> {
        let violations = self.violations();
        if violations.is_empty() {
            Ok(self)
        } else {
            Err(FatooraError::RuleViolations(violations))
        }
    }

    #[cfg(feature = "json")]
    pub fn to_json(&self) -> Result<String, FatooraError> {
        serde_json::to_string_pretty(self).map_err(|e| FatooraError::Config(e.to_string()))
    }
}

impl std::fmt::Display for RuleReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "invoice {}: {}",
            self.document_id.as_deref().unwrap_or("<no id>"),
            if self.is_conforming() { "conforming" } else { "NOT conforming" }
        )?;
        for o in &self.outcomes {
            writeln!(
                f,
                "  {} {:<9} {}: expected {}, found {}",
                if o.passed { "ok  " } else { "FAIL" },
                o.rule.id(),
                o.subject,
                o.expected,
                o.actual
            )?;
        }
        Ok(())
    }
}
