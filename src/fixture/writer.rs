use rust_decimal::Decimal;

use super::types::*;
use super::xml_utils::{XmlWriter, format_decimal};
use crate::core::FatooraError;
use crate::ubl::ns;

/// Simplified tax invoice, ZATCA `InvoiceTypeCode/@name` transaction flags.
const SIMPLIFIED_INVOICE_FLAGS: &str = "0200000";
const INVOICE_TYPE_CODE: &str = "388";

impl InvoiceFixture {
    /// Serialize as a ZATCA-shaped UBL 2.1 invoice.
    ///
    /// Carries the two document-level tax totals ZATCA expects (tax
    /// currency amount, then the breakdown), document allowances per tax
    /// category, and item discounts as price-level allowances.
    pub fn to_xml(&self) -> Result<String, FatooraError> {
        let cur = self.currency.as_str();
        let mut w = XmlWriter::new()?;

        w.start_with_attrs(
            "Invoice",
            &[
                ("xmlns", ns::INVOICE),
                ("xmlns:cac", ns::CAC),
                ("xmlns:cbc", ns::CBC),
                ("xmlns:ext", ns::EXT),
            ],
        )?;

        w.text("cbc:ProfileID", "reporting:1.0")?;
        w.text("cbc:ID", &self.id)?;
        if let Some(uuid) = &self.uuid {
            w.text("cbc:UUID", uuid)?;
        }
        w.text("cbc:IssueDate", &self.issue_date.format("%Y-%m-%d").to_string())?;
        w.text_with_attrs(
            "cbc:InvoiceTypeCode",
            INVOICE_TYPE_CODE,
            &[("name", SIMPLIFIED_INVOICE_FLAGS)],
        )?;
        w.text("cbc:DocumentCurrencyCode", cur)?;
        w.text("cbc:TaxCurrencyCode", cur)?;

        self.write_parties(&mut w)?;

        for allowance in &self.allowances {
            w.start("cac:AllowanceCharge")?;
            w.text("cbc:ChargeIndicator", "false")?;
            w.text("cbc:AllowanceChargeReason", "discount")?;
            w.text("cbc:MultiplierFactorNumeric", &format_decimal(allowance.percent))?;
            w.amount("cbc:Amount", allowance.amount, cur)?;
            w.amount("cbc:BaseAmount", allowance.base_amount, cur)?;
            write_tax_category(
                &mut w,
                "cac:TaxCategory",
                allowance.tax_category,
                allowance.tax_rate,
                false,
            )?;
            w.end("cac:AllowanceCharge")?;
        }

        // Tax total in the tax currency: amount only.
        w.start("cac:TaxTotal")?;
        w.amount("cbc:TaxAmount", self.totals.tax_total, cur)?;
        w.end("cac:TaxTotal")?;

        w.start("cac:TaxTotal")?;
        w.amount("cbc:TaxAmount", self.totals.tax_total, cur)?;
        for subtotal in &self.subtotals {
            w.start("cac:TaxSubtotal")?;
            w.amount("cbc:TaxableAmount", subtotal.taxable_amount, cur)?;
            w.amount("cbc:TaxAmount", subtotal.tax_amount, cur)?;
            write_tax_category(
                &mut w,
                "cac:TaxCategory",
                subtotal.tax_category,
                subtotal.tax_rate,
                true,
            )?;
            w.end("cac:TaxSubtotal")?;
        }
        w.end("cac:TaxTotal")?;

        w.start("cac:LegalMonetaryTotal")?;
        w.amount("cbc:LineExtensionAmount", self.totals.line_extension, cur)?;
        w.amount("cbc:TaxExclusiveAmount", self.totals.tax_exclusive, cur)?;
        w.amount("cbc:TaxInclusiveAmount", self.totals.tax_inclusive, cur)?;
        w.amount("cbc:AllowanceTotalAmount", self.totals.allowance_total, cur)?;
        w.amount("cbc:ChargeTotalAmount", Decimal::ZERO, cur)?;
        w.amount("cbc:PrepaidAmount", Decimal::ZERO, cur)?;
        w.amount("cbc:PayableAmount", self.totals.payable, cur)?;
        w.end("cac:LegalMonetaryTotal")?;

        for line in &self.lines {
            write_line(&mut w, line, cur)?;
        }

        w.end("Invoice")?;
        w.into_string()
    }

    fn write_parties(&self, w: &mut XmlWriter) -> Result<(), FatooraError> {
        w.start("cac:AccountingSupplierParty")?;
        w.start("cac:Party")?;
        w.start("cac:PartyTaxScheme")?;
        w.text("cbc:CompanyID", &self.seller_vat_id)?;
        w.start("cac:TaxScheme")?;
        w.text("cbc:ID", "VAT")?;
        w.end("cac:TaxScheme")?;
        w.end("cac:PartyTaxScheme")?;
        w.start("cac:PartyLegalEntity")?;
        w.text("cbc:RegistrationName", &self.seller_name)?;
        w.end("cac:PartyLegalEntity")?;
        w.end("cac:Party")?;
        w.end("cac:AccountingSupplierParty")?;

        w.start("cac:AccountingCustomerParty")?;
        w.start("cac:Party")?;
        w.start("cac:PartyLegalEntity")?;
        w.text("cbc:RegistrationName", &self.buyer_name)?;
        w.end("cac:PartyLegalEntity")?;
        w.end("cac:Party")?;
        w.end("cac:AccountingCustomerParty")?;
        Ok(())
    }
}

fn write_tax_category(
    w: &mut XmlWriter,
    wrapper: &str,
    category: TaxCategory,
    rate: Decimal,
    with_exemption: bool,
) -> Result<(), FatooraError> {
    w.start(wrapper)?;
    w.text("cbc:ID", category.code())?;
    w.text("cbc:Percent", &format_decimal(rate))?;
    if with_exemption {
        if let Some((code, reason)) = category.exemption_reason() {
            w.text("cbc:TaxExemptionReasonCode", code)?;
            w.text("cbc:TaxExemptionReason", reason)?;
        }
    }
    w.start("cac:TaxScheme")?;
    w.text("cbc:ID", "VAT")?;
    w.end("cac:TaxScheme")?;
    w.end(wrapper)?;
    Ok(())
}

fn write_line(w: &mut XmlWriter, line: &ComputedLine, cur: &str) -> Result<(), FatooraError> {
    w.start("cac:InvoiceLine")?;
    w.text("cbc:ID", &line.id)?;
    w.quantity("cbc:InvoicedQuantity", line.quantity, "PCE")?;
    w.amount("cbc:LineExtensionAmount", line.line_extension, cur)?;

    w.start("cac:TaxTotal")?;
    w.amount("cbc:TaxAmount", line.tax_amount, cur)?;
    w.amount("cbc:RoundingAmount", line.rounding_amount, cur)?;
    w.end("cac:TaxTotal")?;

    w.start("cac:Item")?;
    w.text("cbc:Name", &line.item_code)?;
    write_tax_category(w, "cac:ClassifiedTaxCategory", line.tax_category, line.tax_rate, false)?;
    w.end("cac:Item")?;

    w.start("cac:Price")?;
    w.amount("cbc:PriceAmount", line.net_price, cur)?;
    let discount = line.price_discount();
    if !discount.is_zero() {
        w.start("cac:AllowanceCharge")?;
        w.text("cbc:ChargeIndicator", "false")?;
        w.text("cbc:AllowanceChargeReason", "discount")?;
        w.amount("cbc:Amount", discount, cur)?;
        w.amount("cbc:BaseAmount", line.base_price, cur)?;
        w.end("cac:AllowanceCharge")?;
    }
    w.end("cac:Price")?;

    w.end("cac:InvoiceLine")?;
    Ok(())
}
