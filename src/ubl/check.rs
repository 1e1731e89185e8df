use rust_decimal::Decimal;

use super::tree::{Element, UblDocument, parse_document};
use crate::core::*;

const ROOT: &str = "Invoice";
const LMT: &str = "cac:LegalMonetaryTotal";

/// Parse `xml` and check it against `config`.
pub fn check_xml(xml: &str, config: &CheckConfig) -> Result<RuleReport, FatooraError> {
    let doc = parse_document(xml)?;
    check_document(&doc, config)
}

/// Check `xml` against the ZATCA rounding rules (BR-CO-15, BR-CO-11,
/// BR-CO-14, BR-KSA-51) with two-decimal tolerance.
///
/// Any violation is returned as [`FatooraError::RuleViolations`]; a
/// missing field is a [`FatooraError::MissingField`].
pub fn assert_zatca_rules(xml: &str) -> Result<RuleReport, FatooraError> {
    check_xml(xml, &CheckConfig::default())?.into_result()
}

/// Evaluate every rule in `config` on `doc`.
///
/// A field the rule needs but cannot find aborts the whole pass with an
/// error; rules are never skipped.
pub fn check_document(doc: &UblDocument, config: &CheckConfig) -> Result<RuleReport, FatooraError> {
    let root = doc.root();
    let mut outcomes = Vec::new();

    for rule in &config.rules {
        let rule_outcomes = match rule {
            Rule::BrCo10 => check_br_co_10(root, config)?,
            Rule::BrCo11 => check_br_co_11(root, config)?,
            Rule::BrCo12 => check_br_co_12(root, config)?,
            Rule::BrCo13 => check_br_co_13(root, config)?,
            Rule::BrCo14 => check_br_co_14(root, config)?,
            Rule::BrCo15 => check_br_co_15(root, config)?,
            Rule::BrCo16 => check_br_co_16(root, config)?,
            Rule::BrKsa51 => check_br_ksa_51(root, config)?,
        };

        for o in &rule_outcomes {
            if o.passed {
                tracing::debug!(rule = %o.rule, subject = %o.subject, "rule holds");
            } else {
                tracing::warn!(
                    rule = %o.rule,
                    subject = %o.subject,
                    expected = %o.expected,
                    actual = %o.actual,
                    "rule violated"
                );
            }
        }
        outcomes.extend(rule_outcomes);
    }

    Ok(RuleReport {
        document_id: doc.info().id,
        outcomes,
    })
}

fn outcome(
    rule: Rule,
    subject: impl Into<String>,
    expected: Decimal,
    actual: Decimal,
    config: &CheckConfig,
) -> RuleOutcome {
    RuleOutcome {
        rule,
        subject: subject.into(),
        expected,
        actual,
        passed: config.matches(expected, actual),
    }
}

fn tax_total_context(index: usize) -> String {
    format!("{ROOT}/cac:TaxTotal[{}]", index + 1)
}

/// The document-level tax total in the document currency.
///
/// ZATCA invoices carry one tax total in the tax currency (amount only)
/// and one in the document currency (with the breakdown). Falls back to
/// the first one when no currency matches.
fn document_tax_total(root: &Element) -> Result<(usize, &Element), FatooraError> {
    let totals: Vec<&Element> = root.children("cac:TaxTotal").collect();
    if totals.is_empty() {
        return Err(FatooraError::MissingField {
            path: format!("{ROOT}/cac:TaxTotal/cbc:TaxAmount"),
        });
    }

    let currency = root
        .find("cbc:DocumentCurrencyCode")
        .map(|e| e.text())
        .filter(|c| !c.is_empty());
    let index = currency
        .and_then(|c| {
            totals.iter().position(|t| {
                t.find("cbc:TaxAmount")
                    .and_then(|a| a.attribute("currencyID"))
                    == Some(c)
            })
        })
        .unwrap_or(0);

    Ok((index, totals[index]))
}

fn parse_charge_indicator(ac: &Element, context: &str) -> Result<bool, FatooraError> {
    let value = ac.require("cbc:ChargeIndicator", context)?.text();
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(FatooraError::Xml(format!(
            "invalid {context}/cbc:ChargeIndicator: {value:?}"
        ))),
    }
}

/// Sum of document-level allowance (`charge = false`) or charge amounts.
/// Line- and price-level entries are not document-level and never count.
fn sum_allowance_charges(root: &Element, charge: bool) -> Result<Decimal, FatooraError> {
    let mut sum = Decimal::ZERO;
    for (i, ac) in root.children("cac:AllowanceCharge").enumerate() {
        let context = format!("{ROOT}/cac:AllowanceCharge[{}]", i + 1);
        if parse_charge_indicator(ac, &context)? == charge {
            sum = checked_add(sum, ac.amount("cbc:Amount", &context)?, "allowance/charge sum")?;
        }
    }
    Ok(sum)
}

fn optional_total(root: &Element, field: &str) -> Result<Decimal, FatooraError> {
    Ok(root
        .optional_amount(&format!("{LMT}/{field}"), ROOT)?
        .unwrap_or(Decimal::ZERO))
}

/// BR-CO-10: LineExtensionAmount = Σ InvoiceLine/LineExtensionAmount.
pub fn check_br_co_10(
    root: &Element,
    config: &CheckConfig,
) -> Result<Vec<RuleOutcome>, FatooraError> {
    let stated = root.amount("cac:LegalMonetaryTotal/cbc:LineExtensionAmount", ROOT)?;

    let mut sum = Decimal::ZERO;
    for (i, line) in root.children("cac:InvoiceLine").enumerate() {
        let context = format!("{ROOT}/cac:InvoiceLine[{}]", i + 1);
        sum = checked_add(sum, line.amount("cbc:LineExtensionAmount", &context)?, "BR-CO-10")?;
    }

    Ok(vec![outcome(Rule::BrCo10, "document", sum, stated, config)])
}

/// BR-CO-11: AllowanceTotalAmount = Σ document-level allowance amounts.
/// No allowances sum to zero.
pub fn check_br_co_11(
    root: &Element,
    config: &CheckConfig,
) -> Result<Vec<RuleOutcome>, FatooraError> {
    let stated = root.amount("cac:LegalMonetaryTotal/cbc:AllowanceTotalAmount", ROOT)?;
    let sum = sum_allowance_charges(root, false)?;
    Ok(vec![outcome(Rule::BrCo11, "document", sum, stated, config)])
}

/// BR-CO-12: ChargeTotalAmount = Σ document-level charge amounts.
/// An absent ChargeTotalAmount counts as zero.
pub fn check_br_co_12(
    root: &Element,
    config: &CheckConfig,
) -> Result<Vec<RuleOutcome>, FatooraError> {
    let stated = optional_total(root, "cbc:ChargeTotalAmount")?;
    let sum = sum_allowance_charges(root, true)?;
    Ok(vec![outcome(Rule::BrCo12, "document", sum, stated, config)])
}

/// BR-CO-13: TaxExclusiveAmount = LineExtensionAmount − AllowanceTotalAmount + ChargeTotalAmount.
pub fn check_br_co_13(
    root: &Element,
    config: &CheckConfig,
) -> Result<Vec<RuleOutcome>, FatooraError> {
    let exclusive = root.amount("cac:LegalMonetaryTotal/cbc:TaxExclusiveAmount", ROOT)?;
    let line_total = root.amount("cac:LegalMonetaryTotal/cbc:LineExtensionAmount", ROOT)?;
    let allowances = optional_total(root, "cbc:AllowanceTotalAmount")?;
    let charges = optional_total(root, "cbc:ChargeTotalAmount")?;

    let net = checked_sub(line_total, allowances, "BR-CO-13")?;
    let expected = checked_add(net, charges, "BR-CO-13")?;
    Ok(vec![outcome(Rule::BrCo13, "document", expected, exclusive, config)])
}

/// BR-CO-14: TaxTotal/TaxAmount = Σ TaxTotal/TaxSubtotal/TaxAmount, for
/// every document-level tax total that has a breakdown.
///
/// When no tax total has subtotals, the document-currency tax total is
/// compared against the empty sum.
pub fn check_br_co_14(
    root: &Element,
    config: &CheckConfig,
) -> Result<Vec<RuleOutcome>, FatooraError> {
    let mut targets: Vec<(usize, &Element)> = root
        .children("cac:TaxTotal")
        .enumerate()
        .filter(|(_, t)| t.children("cac:TaxSubtotal").next().is_some())
        .collect();
    if targets.is_empty() {
        targets.push(document_tax_total(root)?);
    }

    let mut outcomes = Vec::with_capacity(targets.len());
    for (index, total) in targets {
        let context = tax_total_context(index);
        let stated = total.amount("cbc:TaxAmount", &context)?;

        let mut sum = Decimal::ZERO;
        for (j, subtotal) in total.children("cac:TaxSubtotal").enumerate() {
            let sub_context = format!("{context}/cac:TaxSubtotal[{}]", j + 1);
            sum = checked_add(sum, subtotal.amount("cbc:TaxAmount", &sub_context)?, "BR-CO-14")?;
        }

        outcomes.push(outcome(
            Rule::BrCo14,
            format!("tax total {}", index + 1),
            sum,
            stated,
            config,
        ));
    }
    Ok(outcomes)
}

/// BR-CO-15: TaxInclusiveAmount = TaxExclusiveAmount + TaxTotal/TaxAmount.
pub fn check_br_co_15(
    root: &Element,
    config: &CheckConfig,
) -> Result<Vec<RuleOutcome>, FatooraError> {
    let inclusive = root.amount("cac:LegalMonetaryTotal/cbc:TaxInclusiveAmount", ROOT)?;
    let exclusive = root.amount("cac:LegalMonetaryTotal/cbc:TaxExclusiveAmount", ROOT)?;
    let (index, tax_total) = document_tax_total(root)?;
    let tax = tax_total.amount("cbc:TaxAmount", &tax_total_context(index))?;

    let expected = checked_add(exclusive, tax, "BR-CO-15")?;
    Ok(vec![outcome(Rule::BrCo15, "document", expected, inclusive, config)])
}

/// BR-CO-16: PayableAmount = TaxInclusiveAmount − PrepaidAmount + PayableRoundingAmount.
pub fn check_br_co_16(
    root: &Element,
    config: &CheckConfig,
) -> Result<Vec<RuleOutcome>, FatooraError> {
    let payable = root.amount("cac:LegalMonetaryTotal/cbc:PayableAmount", ROOT)?;
    let inclusive = root.amount("cac:LegalMonetaryTotal/cbc:TaxInclusiveAmount", ROOT)?;
    let prepaid = optional_total(root, "cbc:PrepaidAmount")?;
    let rounding = optional_total(root, "cbc:PayableRoundingAmount")?;

    let due = checked_sub(inclusive, prepaid, "BR-CO-16")?;
    let expected = checked_add(due, rounding, "BR-CO-16")?;
    Ok(vec![outcome(Rule::BrCo16, "document", expected, payable, config)])
}

/// BR-KSA-51: for every line, RoundingAmount = LineExtensionAmount + TaxTotal/TaxAmount.
///
/// One outcome per line, named after the line's `cbc:ID` (or its position
/// when the ID is missing).
pub fn check_br_ksa_51(
    root: &Element,
    config: &CheckConfig,
) -> Result<Vec<RuleOutcome>, FatooraError> {
    let mut outcomes = Vec::new();
    for (i, line) in root.children("cac:InvoiceLine").enumerate() {
        let context = format!("{ROOT}/cac:InvoiceLine[{}]", i + 1);
        let rounding = line.amount("cac:TaxTotal/cbc:RoundingAmount", &context)?;
        let tax = line.amount("cac:TaxTotal/cbc:TaxAmount", &context)?;
        let extension = line.amount("cbc:LineExtensionAmount", &context)?;

        let subject = match line.find("cbc:ID").map(|id| id.text()) {
            Some(id) if !id.is_empty() => format!("line {id}"),
            _ => format!("line {}", i + 1),
        };
        let expected = checked_add(extension, tax, &subject)?;
        outcomes.push(outcome(Rule::BrKsa51, subject, expected, rounding, config));
    }
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn invoice(body: &str) -> UblDocument {
        let xml = format!(
            r#"<Invoice xmlns="urn:oasis:names:specification:ubl:schema:xsd:Invoice-2"
   xmlns:cac="urn:oasis:names:specification:ubl:schema:xsd:CommonAggregateComponents-2"
   xmlns:cbc="urn:oasis:names:specification:ubl:schema:xsd:CommonBasicComponents-2">
  <cbc:ID>T-1</cbc:ID>
  <cbc:DocumentCurrencyCode>SAR</cbc:DocumentCurrencyCode>
  {body}
</Invoice>"#
        );
        parse_document(&xml).unwrap()
    }

    fn totals(excl: &str, incl: &str, allowance: &str) -> String {
        format!(
            "<cac:LegalMonetaryTotal>
               <cbc:LineExtensionAmount currencyID=\"SAR\">57.38</cbc:LineExtensionAmount>
               <cbc:TaxExclusiveAmount currencyID=\"SAR\">{excl}</cbc:TaxExclusiveAmount>
               <cbc:TaxInclusiveAmount currencyID=\"SAR\">{incl}</cbc:TaxInclusiveAmount>
               <cbc:AllowanceTotalAmount currencyID=\"SAR\">{allowance}</cbc:AllowanceTotalAmount>
               <cbc:PayableAmount currencyID=\"SAR\">{incl}</cbc:PayableAmount>
             </cac:LegalMonetaryTotal>"
        )
    }

    const TAX_TOTAL: &str = r#"<cac:TaxTotal><cbc:TaxAmount currencyID="SAR">8.61</cbc:TaxAmount></cac:TaxTotal>
        <cac:TaxTotal>
          <cbc:TaxAmount currencyID="SAR">8.61</cbc:TaxAmount>
          <cac:TaxSubtotal><cbc:TaxAmount currencyID="SAR">8.61</cbc:TaxAmount></cac:TaxSubtotal>
        </cac:TaxTotal>"#;

    #[test]
    fn br_co_15_passes_and_fails() {
        let doc = invoice(&format!("{TAX_TOTAL}{}", totals("57.38", "65.99", "0.00")));
        let out = check_br_co_15(doc.root(), &CheckConfig::default()).unwrap();
        assert!(out[0].passed);
        assert_eq!(out[0].expected, dec!(65.99));

        let doc = invoice(&format!("{TAX_TOTAL}{}", totals("57.38", "66.00", "0.00")));
        let out = check_br_co_15(doc.root(), &CheckConfig::default()).unwrap();
        assert!(!out[0].passed);
        assert_eq!(out[0].actual, dec!(66.00));
    }

    #[test]
    fn br_co_15_prefers_document_currency_tax_total() {
        let doc = invoice(&format!(
            r#"<cac:TaxTotal><cbc:TaxAmount currencyID="USD">2.30</cbc:TaxAmount></cac:TaxTotal>
               <cac:TaxTotal><cbc:TaxAmount currencyID="SAR">8.61</cbc:TaxAmount></cac:TaxTotal>
               {}"#,
            totals("57.38", "65.99", "0.00")
        ));
        let out = check_br_co_15(doc.root(), &CheckConfig::default()).unwrap();
        assert!(out[0].passed, "{:?}", out[0]);
    }

    #[test]
    fn br_co_11_ignores_line_level_allowances() {
        let doc = invoice(&format!(
            r#"<cac:AllowanceCharge>
                 <cbc:ChargeIndicator>false</cbc:ChargeIndicator>
                 <cbc:Amount currencyID="SAR">2.03</cbc:Amount>
               </cac:AllowanceCharge>
               <cac:AllowanceCharge>
                 <cbc:ChargeIndicator>true</cbc:ChargeIndicator>
                 <cbc:Amount currencyID="SAR">5.00</cbc:Amount>
               </cac:AllowanceCharge>
               {}
               <cac:InvoiceLine>
                 <cbc:ID>1</cbc:ID>
                 <cac:Price>
                   <cac:AllowanceCharge>
                     <cbc:ChargeIndicator>false</cbc:ChargeIndicator>
                     <cbc:Amount currencyID="SAR">0.79</cbc:Amount>
                   </cac:AllowanceCharge>
                 </cac:Price>
               </cac:InvoiceLine>"#,
            totals("55.35", "63.65", "2.03")
        ));
        let out = check_br_co_11(doc.root(), &CheckConfig::default()).unwrap();
        assert!(out[0].passed);
        assert_eq!(out[0].expected, dec!(2.03));

        let out = check_br_co_12(doc.root(), &CheckConfig::default()).unwrap();
        assert_eq!(out[0].expected, dec!(5.00));
        assert_eq!(out[0].actual, Decimal::ZERO);
        assert!(!out[0].passed);
    }

    #[test]
    fn br_co_11_requires_charge_indicator() {
        let doc = invoice(&format!(
            r#"<cac:AllowanceCharge><cbc:Amount currencyID="SAR">2.03</cbc:Amount></cac:AllowanceCharge>{}"#,
            totals("55.35", "63.65", "2.03")
        ));
        let err = check_br_co_11(doc.root(), &CheckConfig::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "missing field: Invoice/cac:AllowanceCharge[1]/cbc:ChargeIndicator"
        );
    }

    #[test]
    fn br_co_14_without_breakdown_compares_against_zero() {
        let doc = invoice(
            r#"<cac:TaxTotal><cbc:TaxAmount currencyID="SAR">0.00</cbc:TaxAmount></cac:TaxTotal>"#,
        );
        let out = check_br_co_14(doc.root(), &CheckConfig::default()).unwrap();
        assert_eq!(out.len(), 1);
        assert!(out[0].passed);
        assert_eq!(out[0].subject, "tax total 1");
    }

    #[test]
    fn br_co_14_checks_the_total_with_subtotals() {
        let doc = invoice(TAX_TOTAL);
        let out = check_br_co_14(doc.root(), &CheckConfig::default()).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].subject, "tax total 2");
        assert!(out[0].passed);
    }

    #[test]
    fn br_ksa_51_names_lines_by_id() {
        let doc = invoice(
            r#"<cac:InvoiceLine>
                 <cbc:ID>7</cbc:ID>
                 <cbc:LineExtensionAmount currencyID="SAR">56.59</cbc:LineExtensionAmount>
                 <cac:TaxTotal>
                   <cbc:TaxAmount currencyID="SAR">8.49</cbc:TaxAmount>
                   <cbc:RoundingAmount currencyID="SAR">65.08</cbc:RoundingAmount>
                 </cac:TaxTotal>
               </cac:InvoiceLine>
               <cac:InvoiceLine>
                 <cbc:LineExtensionAmount currencyID="SAR">56.59</cbc:LineExtensionAmount>
                 <cac:TaxTotal>
                   <cbc:TaxAmount currencyID="SAR">8.49</cbc:TaxAmount>
                   <cbc:RoundingAmount currencyID="SAR">65.09</cbc:RoundingAmount>
                 </cac:TaxTotal>
               </cac:InvoiceLine>"#,
        );
        let out = check_br_ksa_51(doc.root(), &CheckConfig::default()).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].subject, "line 7");
        assert!(out[0].passed);
        assert_eq!(out[1].subject, "line 2");
        assert!(!out[1].passed);
        assert_eq!(out[1].expected, dec!(65.08));
    }

    #[test]
    fn missing_rounding_amount_is_a_lookup_failure() {
        let doc = invoice(
            r#"<cac:InvoiceLine>
                 <cbc:LineExtensionAmount currencyID="SAR">1.00</cbc:LineExtensionAmount>
                 <cac:TaxTotal><cbc:TaxAmount currencyID="SAR">0.15</cbc:TaxAmount></cac:TaxTotal>
               </cac:InvoiceLine>"#,
        );
        let err = check_br_ksa_51(doc.root(), &CheckConfig::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "missing field: Invoice/cac:InvoiceLine[1]/cac:TaxTotal/cbc:RoundingAmount"
        );
    }

    #[test]
    fn extended_totals_default_optional_fields_to_zero() {
        let doc = invoice(&format!(
            r#"<cac:InvoiceLine>
                 <cbc:LineExtensionAmount currencyID="SAR">57.38</cbc:LineExtensionAmount>
               </cac:InvoiceLine>
               {}"#,
            totals("57.38", "65.99", "0.00")
        ));
        let cfg = CheckConfig::default();
        assert!(check_br_co_10(doc.root(), &cfg).unwrap()[0].passed);
        assert!(check_br_co_13(doc.root(), &cfg).unwrap()[0].passed);
        assert!(check_br_co_16(doc.root(), &cfg).unwrap()[0].passed);
    }

    #[test]
    fn check_document_follows_config_order() {
        let doc = invoice(&format!("{TAX_TOTAL}{}", totals("57.38", "65.99", "0.00")));
        let cfg = CheckConfig::default().with_rules([Rule::BrCo14, Rule::BrCo15]);
        let report = check_document(&doc, &cfg).unwrap();
        assert_eq!(report.document_id.as_deref(), Some("T-1"));
        let rules: Vec<_> = report.outcomes.iter().map(|o| o.rule).collect();
        assert_eq!(rules, [Rule::BrCo14, Rule::BrCo15]);
        assert!(report.is_conforming());
    }
}
