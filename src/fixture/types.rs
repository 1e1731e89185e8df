use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// ZATCA VAT category (UNCL 5305 subset).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TaxCategory {
    /// S: standard rate (15%).
    Standard,
    /// Z: zero rated.
    ZeroRated,
    /// E: exempt.
    Exempt,
    /// O: out of scope.
    OutOfScope,
}

impl TaxCategory {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Standard => "S",
            Self::ZeroRated => "Z",
            Self::Exempt => "E",
            Self::OutOfScope => "O",
        }
    }

    pub fn default_rate(&self) -> Decimal {
        match self {
            Self::Standard => dec!(15),
            _ => Decimal::ZERO,
        }
    }

    /// ZATCA exemption reason (code, text); required for Z, E and O.
    pub fn exemption_reason(&self) -> Option<(&'static str, &'static str)> {
        match self {
            Self::Standard => None,
            Self::ZeroRated => Some(("VATEX-SA-32", "Export of goods")),
            Self::Exempt => Some((
                "VATEX-SA-29",
                "Financial services mentioned in Article 29 of the VAT Regulations",
            )),
            Self::OutOfScope => Some(("VATEX-SA-OOS", "Not subject to VAT")),
        }
    }
}

/// One requested invoice line, before any rounding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureLine {
    pub item_code: String,
    /// List price per unit. Includes VAT when the invoice uses tax-inclusive pricing.
    pub price: Decimal,
    pub quantity: Decimal,
    /// Per-item discount in percent of the list price.
    pub discount_percent: Decimal,
    pub tax_category: TaxCategory,
    pub tax_rate: Decimal,
}

/// A line with every amount rounded the way it appears in the XML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputedLine {
    /// 1-based line number.
    pub id: String,
    pub item_code: String,
    pub quantity: Decimal,
    /// Unit price before the item discount, excluding VAT.
    pub base_price: Decimal,
    /// Unit price after the item discount, excluding VAT.
    pub net_price: Decimal,
    pub line_extension: Decimal,
    pub tax_amount: Decimal,
    /// `line_extension + tax_amount`.
    pub rounding_amount: Decimal,
    pub tax_category: TaxCategory,
    pub tax_rate: Decimal,
}

impl ComputedLine {
    pub fn price_discount(&self) -> Decimal {
        self.base_price - self.net_price
    }
}

/// Document-level discount share for one tax category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputedAllowance {
    pub amount: Decimal,
    /// Line extension total of the category the share is taken from.
    pub base_amount: Decimal,
    pub percent: Decimal,
    pub tax_category: TaxCategory,
    pub tax_rate: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputedSubtotal {
    pub taxable_amount: Decimal,
    pub tax_amount: Decimal,
    pub tax_category: TaxCategory,
    pub tax_rate: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureTotals {
    pub line_extension: Decimal,
    pub allowance_total: Decimal,
    pub tax_exclusive: Decimal,
    pub tax_total: Decimal,
    pub tax_inclusive: Decimal,
    pub payable: Decimal,
}

/// A fully computed invoice, ready to serialize with
/// [`to_xml`](InvoiceFixture::to_xml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceFixture {
    pub id: String,
    pub uuid: Option<String>,
    pub issue_date: NaiveDate,
    pub currency: String,
    pub seller_name: String,
    pub seller_vat_id: String,
    pub buyer_name: String,
    pub tax_included: bool,
    pub lines: Vec<ComputedLine>,
    pub allowances: Vec<ComputedAllowance>,
    pub subtotals: Vec<ComputedSubtotal>,
    pub totals: FixtureTotals,
}
