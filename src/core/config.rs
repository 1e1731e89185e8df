use serde::{Deserialize, Serialize};

use super::amount::amounts_match;
use super::rules::Rule;
use rust_decimal::Decimal;

/// Which rules to check and how strictly amounts are compared.
///
/// ```
/// use fatoora::core::*;
///
/// let config = CheckConfig::default();
/// assert_eq!(config.rules, Rule::ZATCA_ROUNDING.to_vec());
/// assert_eq!(config.precision, Some(2));
///
/// let strict = CheckConfig::all_rules().exact();
/// assert_eq!(strict.precision, None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    /// Rules to check, in report order.
    pub rules: Vec<Rule>,
    /// Decimal places at which computed and stated values must agree.
    /// `None` requires exact equality.
    pub precision: Option<u32>,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            rules: Rule::ZATCA_ROUNDING.to_vec(),
            precision: Some(2),
        }
    }
}

impl CheckConfig {
    /// Default tolerance, every supported rule.
    pub fn all_rules() -> Self {
        Self {
            rules: Rule::ALL.to_vec(),
            ..Self::default()
        }
    }

    pub fn with_rules(mut self, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.rules = rules.into_iter().collect();
        self
    }

    pub fn precision(mut self, dp: u32) -> Self {
        self.precision = Some(dp);
        self
    }

    pub fn exact(mut self) -> Self {
        self.precision = None;
        self
    }

    pub fn matches(&self, expected: Decimal, actual: Decimal) -> bool {
        amounts_match(expected, actual, self.precision)
    }

    /// Load a config from JSON, e.g. `{"rules": ["BR-CO-15"], "precision": 2}`.
    /// Omitted keys keep their defaults.
    #[cfg(feature = "json")]
    pub fn from_json(json: &str) -> Result<Self, super::FatooraError> {
        serde_json::from_str(json).map_err(|e| super::FatooraError::Config(e.to_string()))
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn json_overrides_only_given_keys() {
        let cfg = CheckConfig::from_json(r#"{"rules": ["BR-CO-15", "BR-KSA-51"]}"#).unwrap();
        assert_eq!(cfg.rules, vec![Rule::BrCo15, Rule::BrKsa51]);
        assert_eq!(cfg.precision, Some(2));

        let cfg = CheckConfig::from_json(r#"{"precision": null}"#).unwrap();
        assert_eq!(cfg.rules, Rule::ZATCA_ROUNDING.to_vec());
        assert_eq!(cfg.precision, None);
    }

    #[test]
    fn json_rejects_unknown_rule() {
        let err = CheckConfig::from_json(r#"{"rules": ["BR-XX-1"]}"#).unwrap_err();
        assert!(err.to_string().starts_with("config error"));
    }

    #[test]
    fn matches_uses_precision() {
        let cfg = CheckConfig::default();
        assert!(cfg.matches(dec!(10.00), dec!(10.004)));
        assert!(!cfg.clone().exact().matches(dec!(10.00), dec!(10.004)));
        assert!(cfg.precision(3).matches(dec!(10.000), dec!(10.0004)));
    }
}
