use chrono::NaiveDate;
use fatoora::core::*;
use fatoora::fixture::*;
use fatoora::ubl;
use rust_decimal_macros::dec;

fn main() {
    let date = NaiveDate::from_ymd_opt(2024, 3, 5).expect("valid date");

    for tax_included in [false, true] {
        let discounts = [(false, false), (true, false), (false, true), (true, true)];
        for (invoice_discount, item_discount) in discounts {
            let mut builder =
                InvoiceFixtureBuilder::new("SME00100", date).tax_included(tax_included);
            if invoice_discount {
                builder = builder.document_discount_percent(dec!(3.53));
            }
            for item in ["Demo Item", "Test5"] {
                let mut line = LineBuilder::new(item, dec!(57.38));
                if item_discount {
                    line = line.discount_percent(dec!(1.37));
                }
                builder = builder.add_line(line.build());
            }

            let invoice = builder.build().expect("fixture input is valid");
            let xml = invoice.to_xml().expect("fixture serializes");
            let report = ubl::check_xml(&xml, &CheckConfig::default()).expect("fixture parses");

            println!(
                "\n{} pricing, invoice discount: {}, item discount: {}",
                if tax_included { "inclusive" } else { "exclusive" },
                invoice_discount,
                item_discount
            );
            println!(
                "  exclusive {}  tax {}  inclusive {}",
                invoice.totals.tax_exclusive, invoice.totals.tax_total, invoice.totals.tax_inclusive
            );
            print!("{report}");
        }
    }
}
