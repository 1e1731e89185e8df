use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::error::FatooraError;

/// Arithmetic business rules that can be checked on an invoice document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rule {
    /// Sum of invoice line net amounts.
    #[serde(rename = "BR-CO-10")]
    BrCo10,
    /// Sum of document-level allowances.
    #[serde(rename = "BR-CO-11")]
    BrCo11,
    /// Sum of document-level charges.
    #[serde(rename = "BR-CO-12")]
    BrCo12,
    /// Total without VAT.
    #[serde(rename = "BR-CO-13")]
    BrCo13,
    /// Total VAT equals the sum of the VAT breakdown.
    #[serde(rename = "BR-CO-14")]
    BrCo14,
    /// Total with VAT.
    #[serde(rename = "BR-CO-15")]
    BrCo15,
    /// Amount due for payment.
    #[serde(rename = "BR-CO-16")]
    BrCo16,
    /// Line rounding amount (ZATCA).
    #[serde(rename = "BR-KSA-51")]
    BrKsa51,
}

impl Rule {
    /// The ZATCA rounding rules, checked by default.
    pub const ZATCA_ROUNDING: [Rule; 4] = [Rule::BrCo15, Rule::BrCo11, Rule::BrCo14, Rule::BrKsa51];

    /// Every supported rule.
    pub const ALL: [Rule; 8] = [
        Rule::BrCo10,
        Rule::BrCo11,
        Rule::BrCo12,
        Rule::BrCo13,
        Rule::BrCo14,
        Rule::BrCo15,
        Rule::BrCo16,
        Rule::BrKsa51,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Self::BrCo10 => "BR-CO-10",
            Self::BrCo11 => "BR-CO-11",
            Self::BrCo12 => "BR-CO-12",
            Self::BrCo13 => "BR-CO-13",
            Self::BrCo14 => "BR-CO-14",
            Self::BrCo15 => "BR-CO-15",
            Self::BrCo16 => "BR-CO-16",
            Self::BrKsa51 => "BR-KSA-51",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::BrCo10 => "LineExtensionAmount = Σ InvoiceLine/LineExtensionAmount",
            Self::BrCo11 => "AllowanceTotalAmount = Σ AllowanceCharge/Amount (allowances)",
            Self::BrCo12 => "ChargeTotalAmount = Σ AllowanceCharge/Amount (charges)",
            Self::BrCo13 => {
                "TaxExclusiveAmount = LineExtensionAmount - AllowanceTotalAmount + ChargeTotalAmount"
            }
            Self::BrCo14 => "TaxTotal/TaxAmount = Σ TaxSubtotal/TaxAmount",
            Self::BrCo15 => "TaxInclusiveAmount = TaxExclusiveAmount + TaxTotal/TaxAmount",
            Self::BrCo16 => {
                "PayableAmount = TaxInclusiveAmount - PrepaidAmount + PayableRoundingAmount"
            }
            Self::BrKsa51 => "RoundingAmount = LineExtensionAmount + TaxTotal/TaxAmount per line",
        }
    }
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Rule {
    type Err = FatooraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Rule::ALL
            .into_iter()
            .find(|r| r.id().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| FatooraError::Config(format!("unknown rule: {wanted:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip_through_from_str() {
        for rule in Rule::ALL {
            assert_eq!(rule.id().parse::<Rule>().unwrap(), rule);
        }
        assert_eq!("br-ksa-51".parse::<Rule>().unwrap(), Rule::BrKsa51);
        assert!("BR-CO-99".parse::<Rule>().is_err());
    }

    #[test]
    fn zatca_rounding_set_is_the_four_core_rules() {
        let ids: Vec<_> = Rule::ZATCA_ROUNDING.iter().map(Rule::id).collect();
        assert_eq!(ids, ["BR-CO-15", "BR-CO-11", "BR-CO-14", "BR-KSA-51"]);
    }
}
