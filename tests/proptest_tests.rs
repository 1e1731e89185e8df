//! Property-based tests: generated invoices always conform, and a one-halala
//! tamper of a checked total is always caught.
//!
//! Run with: `cargo test --test proptest_tests`

#![cfg(feature = "fixture")]

use chrono::NaiveDate;
use fatoora::core::*;
use fatoora::fixture::*;
use fatoora::ubl;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ── Proptest Strategies ─────────────────────────────────────────────────────

/// Price from 0.00 to 10000.00.
fn arb_price() -> impl Strategy<Value = Decimal> {
    (0i64..=1_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

/// Quantity from 0.1 to 200.0.
fn arb_quantity() -> impl Strategy<Value = Decimal> {
    (1i64..=2000).prop_map(|tenths| Decimal::new(tenths, 1))
}

/// Discount percentage from 0.00 to 49.99.
fn arb_discount() -> impl Strategy<Value = Decimal> {
    (0i64..5000).prop_map(|bp| Decimal::new(bp, 2))
}

fn arb_category() -> impl Strategy<Value = (TaxCategory, Decimal)> {
    prop_oneof![
        4 => Just((TaxCategory::Standard, dec!(15))),
        1 => Just((TaxCategory::Standard, dec!(5))),
        1 => Just((TaxCategory::ZeroRated, Decimal::ZERO)),
        1 => Just((TaxCategory::Exempt, Decimal::ZERO)),
        1 => Just((TaxCategory::OutOfScope, Decimal::ZERO)),
    ]
}

fn arb_line() -> impl Strategy<Value = FixtureLine> {
    (arb_price(), arb_quantity(), arb_discount(), arb_category()).prop_map(
        |(price, qty, discount, (category, rate))| {
            LineBuilder::new("Item", price)
                .quantity(qty)
                .discount_percent(discount)
                .tax(category, rate)
                .build()
        },
    )
}

fn arb_fixture() -> impl Strategy<Value = InvoiceFixture> {
    (
        prop::collection::vec(arb_line(), 1..8),
        any::<bool>(),
        prop::option::of(arb_discount()),
    )
        .prop_map(|(lines, tax_included, doc_discount)| {
            let mut builder = InvoiceFixtureBuilder::new(
                "PROP-001",
                NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            )
            .tax_included(tax_included);
            if let Some(p) = doc_discount {
                builder = builder.document_discount_percent(p);
            }
            for line in lines {
                builder = builder.add_line(line);
            }
            builder.build().unwrap()
        })
}

fn bump(xml: &str, element: &str, value: Decimal) -> String {
    let from = format!(r#"<{element} currencyID="SAR">{}</{element}>"#, format_amount(value));
    let to = format!(
        r#"<{element} currencyID="SAR">{}</{element}>"#,
        format_amount(value + dec!(0.01))
    );
    assert!(xml.contains(&from), "{from} not found");
    xml.replacen(&from, &to, 1)
}

// ── Properties ──────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn generated_invoices_conform_exactly(fixture in arb_fixture()) {
        let xml = fixture.to_xml().unwrap();
        let report = ubl::check_xml(&xml, &CheckConfig::all_rules().exact()).unwrap();
        prop_assert!(report.is_conforming(), "{}", report);
        prop_assert_eq!(report.outcomes_for(Rule::BrKsa51).count(), fixture.lines.len());
    }

    #[test]
    fn allowances_add_up_to_the_total(fixture in arb_fixture()) {
        let shares: Decimal = fixture.allowances.iter().map(|a| a.amount).sum();
        prop_assert_eq!(shares, fixture.totals.allowance_total);
        let taxable: Decimal = fixture.subtotals.iter().map(|s| s.taxable_amount).sum();
        prop_assert_eq!(taxable, fixture.totals.tax_exclusive);
    }

    #[test]
    fn inclusive_tamper_breaks_br_co_15(fixture in arb_fixture()) {
        let xml = fixture.to_xml().unwrap();
        let xml = bump(&xml, "cbc:TaxInclusiveAmount", fixture.totals.tax_inclusive);
        let cfg = CheckConfig::default().with_rules([Rule::BrCo15]);
        let report = ubl::check_xml(&xml, &cfg).unwrap();
        prop_assert!(!report.is_conforming());
    }

    #[test]
    fn allowance_tamper_breaks_br_co_11(fixture in arb_fixture()) {
        let xml = fixture.to_xml().unwrap();
        let xml = bump(&xml, "cbc:AllowanceTotalAmount", fixture.totals.allowance_total);
        let err = ubl::assert_zatca_rules(&xml).unwrap_err();
        let is_co11 = matches!(
            &err,
            FatooraError::RuleViolations(v) if v.iter().any(|v| v.rule == Rule::BrCo11)
        );
        prop_assert!(is_co11, "{}", err);
    }

    #[test]
    fn tolerance_is_symmetric(a in -1_000_000i64..1_000_000, b in -1_000_000i64..1_000_000) {
        let (a, b) = (Decimal::new(a, 4), Decimal::new(b, 4));
        prop_assert_eq!(amounts_match(a, b, Some(2)), amounts_match(b, a, Some(2)));
        prop_assert_eq!(amounts_match(a, b, None), a == b);
    }
}
