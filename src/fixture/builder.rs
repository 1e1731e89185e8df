use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

use super::types::*;
use crate::core::{
    FatooraError, checked_add, checked_div, checked_mul, checked_sub, round_half_up,
};

const HUNDRED: Decimal = dec!(100);

fn round2(value: Decimal) -> Decimal {
    round_half_up(value, 2)
}

/// `round2(value * percent / 100)`, overflow-checked.
fn percent_of(value: Decimal, percent: Decimal, what: &str) -> Result<Decimal, FatooraError> {
    Ok(round2(checked_div(checked_mul(value, percent, what)?, HUNDRED, what)?))
}

fn checked_sum(
    values: impl IntoIterator<Item = Decimal>,
    what: &str,
) -> Result<Decimal, FatooraError> {
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, v| checked_add(acc, v, what))
}

/// Builder for a single [`FixtureLine`]. Defaults: quantity 1, no discount,
/// standard rate 15%.
pub struct LineBuilder {
    line: FixtureLine,
}

impl LineBuilder {
    pub fn new(item_code: impl Into<String>, price: Decimal) -> Self {
        Self {
            line: FixtureLine {
                item_code: item_code.into(),
                price,
                quantity: Decimal::ONE,
                discount_percent: Decimal::ZERO,
                tax_category: TaxCategory::Standard,
                tax_rate: TaxCategory::Standard.default_rate(),
            },
        }
    }

    pub fn quantity(mut self, quantity: Decimal) -> Self {
        self.line.quantity = quantity;
        self
    }

    pub fn discount_percent(mut self, percent: Decimal) -> Self {
        self.line.discount_percent = percent;
        self
    }

    pub fn tax(mut self, category: TaxCategory, rate: Decimal) -> Self {
        self.line.tax_category = category;
        self.line.tax_rate = rate;
        self
    }

    pub fn build(self) -> FixtureLine {
        self.line
    }
}

/// Builder for deterministic ZATCA-shaped invoices used as rule-check
/// fixtures.
///
/// ```
/// use chrono::NaiveDate;
/// use fatoora::fixture::*;
/// use rust_decimal_macros::dec;
///
/// let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
/// let fixture = InvoiceFixtureBuilder::new("SME00011", date)
///     .document_discount_percent(dec!(3.53))
///     .add_line(LineBuilder::new("Demo Item", dec!(57.38)).build())
///     .build()
///     .unwrap();
///
/// assert_eq!(fixture.totals.allowance_total, dec!(2.03));
/// assert_eq!(fixture.totals.tax_exclusive, dec!(55.35));
/// assert_eq!(fixture.totals.tax_inclusive, dec!(63.65));
/// ```
pub struct InvoiceFixtureBuilder {
    id: String,
    issue_date: NaiveDate,
    uuid: Option<String>,
    currency: String,
    seller_name: String,
    seller_vat_id: String,
    buyer_name: String,
    tax_included: bool,
    document_discount_percent: Option<Decimal>,
    lines: Vec<FixtureLine>,
}

impl InvoiceFixtureBuilder {
    pub fn new(id: impl Into<String>, issue_date: NaiveDate) -> Self {
        Self {
            id: id.into(),
            issue_date,
            uuid: None,
            currency: "SAR".to_string(),
            seller_name: "KSA Demo".to_string(),
            seller_vat_id: "399999999900003".to_string(),
            buyer_name: "Simplified customer".to_string(),
            tax_included: false,
            document_discount_percent: None,
            lines: Vec::new(),
        }
    }

    pub fn uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = Some(uuid.into());
        self
    }

    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    /// Selling company name and VAT registration number.
    pub fn seller(mut self, name: impl Into<String>, vat_id: impl Into<String>) -> Self {
        self.seller_name = name.into();
        self.seller_vat_id = vat_id.into();
        self
    }

    pub fn buyer(mut self, name: impl Into<String>) -> Self {
        self.buyer_name = name.into();
        self
    }

    /// Line prices include VAT; the exclusive amount is back-computed.
    pub fn tax_included(mut self, included: bool) -> Self {
        self.tax_included = included;
        self
    }

    /// Invoice-wide discount in percent of the line extension total.
    pub fn document_discount_percent(mut self, percent: Decimal) -> Self {
        self.document_discount_percent = Some(percent);
        self
    }

    pub fn add_line(mut self, line: FixtureLine) -> Self {
        self.lines.push(line);
        self
    }

    pub fn build(self) -> Result<InvoiceFixture, FatooraError> {
        self.check_input()?;

        let lines: Vec<ComputedLine> = self
            .lines
            .iter()
            .enumerate()
            .map(|(i, l)| compute_line(i + 1, l, self.tax_included))
            .collect::<Result<_, _>>()?;

        let line_total = checked_sum(lines.iter().map(|l| l.line_extension), "line total")?;
        let allowance_total = match self.document_discount_percent {
            Some(p) => percent_of(line_total, p, "document allowance")?,
            None => Decimal::ZERO,
        };

        // Group by (category, rate); BTreeMap keeps the breakdown order stable.
        let mut groups: BTreeMap<(TaxCategory, Decimal), Decimal> = BTreeMap::new();
        for line in &lines {
            let base = groups
                .entry((line.tax_category, line.tax_rate))
                .or_insert(Decimal::ZERO);
            *base = checked_add(*base, line.line_extension, "category base")?;
        }

        let mut allowances = Vec::new();
        let mut subtotals = Vec::new();
        let mut allocated = Decimal::ZERO;
        let group_count = groups.len();

        for (i, ((category, rate), base)) in groups.into_iter().enumerate() {
            let share = match self.document_discount_percent {
                None => Decimal::ZERO,
                // The last category takes the remainder so the shares add up exactly.
                Some(_) if i + 1 == group_count => {
                    checked_sub(allowance_total, allocated, "allowance share")?
                }
                Some(_) if line_total.is_zero() => Decimal::ZERO,
                Some(_) => round2(checked_div(
                    checked_mul(allowance_total, base, "allowance share")?,
                    line_total,
                    "allowance share",
                )?),
            };
            allocated = checked_add(allocated, share, "allowance share")?;

            if let Some(percent) = self.document_discount_percent {
                allowances.push(ComputedAllowance {
                    amount: share,
                    base_amount: base,
                    percent,
                    tax_category: category,
                    tax_rate: rate,
                });
            }

            let taxable_amount = checked_sub(base, share, "taxable amount")?;
            subtotals.push(ComputedSubtotal {
                taxable_amount,
                tax_amount: percent_of(taxable_amount, rate, "subtotal tax")?,
                tax_category: category,
                tax_rate: rate,
            });
        }

        let tax_total = checked_sum(subtotals.iter().map(|s| s.tax_amount), "tax total")?;
        let tax_exclusive = checked_sub(line_total, allowance_total, "tax exclusive amount")?;
        let tax_inclusive = checked_add(tax_exclusive, tax_total, "tax inclusive amount")?;

        let fixture = InvoiceFixture {
            id: self.id,
            uuid: self.uuid,
            issue_date: self.issue_date,
            currency: self.currency,
            seller_name: self.seller_name,
            seller_vat_id: self.seller_vat_id,
            buyer_name: self.buyer_name,
            tax_included: self.tax_included,
            lines,
            allowances,
            subtotals,
            totals: FixtureTotals {
                line_extension: line_total,
                allowance_total,
                tax_exclusive,
                tax_total,
                tax_inclusive,
                payable: tax_inclusive,
            },
        };
        tracing::debug!(
            id = %fixture.id,
            lines = fixture.lines.len(),
            inclusive = %fixture.totals.tax_inclusive,
            "built invoice fixture"
        );
        Ok(fixture)
    }

    fn check_input(&self) -> Result<(), FatooraError> {
        if self.id.trim().is_empty() {
            return Err(FatooraError::Builder("invoice ID must not be empty".into()));
        }
        if self.currency.trim().len() != 3 {
            return Err(FatooraError::Builder(format!(
                "currency must be a 3-letter code, got {:?}",
                self.currency
            )));
        }
        if self.lines.is_empty() {
            return Err(FatooraError::Builder(
                "invoice fixture needs at least one line".into(),
            ));
        }
        if let Some(p) = self.document_discount_percent {
            if p < Decimal::ZERO || p >= HUNDRED {
                return Err(FatooraError::Builder(format!(
                    "document discount must be in [0, 100), got {p}"
                )));
            }
        }
        for (i, line) in self.lines.iter().enumerate() {
            let n = i + 1;
            if line.price < Decimal::ZERO {
                return Err(FatooraError::Builder(format!(
                    "line {n}: price must not be negative, got {}",
                    line.price
                )));
            }
            if line.quantity <= Decimal::ZERO {
                return Err(FatooraError::Builder(format!(
                    "line {n}: quantity must be positive, got {}",
                    line.quantity
                )));
            }
            if line.discount_percent < Decimal::ZERO || line.discount_percent >= HUNDRED {
                return Err(FatooraError::Builder(format!(
                    "line {n}: discount must be in [0, 100), got {}",
                    line.discount_percent
                )));
            }
            if line.tax_rate < Decimal::ZERO {
                return Err(FatooraError::Builder(format!(
                    "line {n}: tax rate must not be negative, got {}",
                    line.tax_rate
                )));
            }
        }
        Ok(())
    }
}

fn compute_line(
    number: usize,
    line: &FixtureLine,
    tax_included: bool,
) -> Result<ComputedLine, FatooraError> {
    let what = format!("line {number}");
    let unit = percent_of(line.price, HUNDRED - line.discount_percent, &what)?;
    let gross = round2(checked_mul(unit, line.quantity, &what)?);
    let divisor = checked_div(checked_add(HUNDRED, line.tax_rate, &what)?, HUNDRED, &what)?;

    let (line_extension, tax_amount, base_price, net_price) = if tax_included {
        let extension = round2(checked_div(gross, divisor, &what)?);
        (
            extension,
            checked_sub(gross, extension, &what)?,
            round2(checked_div(line.price, divisor, &what)?),
            round2(checked_div(unit, divisor, &what)?),
        )
    } else {
        (
            gross,
            percent_of(gross, line.tax_rate, &what)?,
            line.price,
            unit,
        )
    };

    Ok(ComputedLine {
        id: number.to_string(),
        item_code: line.item_code.clone(),
        quantity: line.quantity,
        base_price,
        net_price,
        line_extension,
        tax_amount,
        rounding_amount: checked_add(line_extension, tax_amount, &what)?,
        tax_category: line.tax_category,
        tax_rate: line.tax_rate,
    })
}
