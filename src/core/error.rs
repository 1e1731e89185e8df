use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use super::rules::Rule;

/// Errors that can occur while parsing or checking an invoice document.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FatooraError {
    /// The document is not well-formed XML or is not a UBL invoice.
    #[error("XML error: {0}")]
    Xml(String),

    /// A field required by a rule is absent from the document.
    #[error("missing field: {path}")]
    MissingField { path: String },

    /// A field exists but its text is not a decimal number.
    #[error("invalid amount at {path}: {value:?}")]
    InvalidAmount { path: String, value: String },

    /// Summing the document's amounts overflowed the decimal range.
    #[error("arithmetic error: {0}")]
    Arithmetic(String),

    /// One or more rules did not hold.
    #[error("{} rule violation(s): {}", .0.len(), join_violations(.0))]
    RuleViolations(Vec<RuleViolation>),

    /// Check configuration could not be loaded.
    #[error("config error: {0}")]
    Config(String),

    /// Fixture builder received invalid input.
    #[error("builder error: {0}")]
    Builder(String),
}

fn join_violations(violations: &[RuleViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A failed comparison: the rule, what it was evaluated on, and both operands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleViolation {
    pub rule: Rule,
    /// What the rule was evaluated on, e.g. `"document"` or `"line 2"`.
    pub subject: String,
    /// Value computed from the other fields.
    pub expected: Decimal,
    /// Value stated in the document.
    pub actual: Decimal,
}

impl std::fmt::Display for RuleViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {}: expected {}, found {}",
            self.rule.id(),
            self.subject,
            self.expected,
            self.actual
        )
    }
}
