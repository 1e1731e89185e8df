use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use rust_decimal::Decimal;
use std::io::Cursor;

use crate::core::{FatooraError, round_half_up};

fn xml_io(e: std::io::Error) -> FatooraError {
    FatooraError::Xml(format!("XML write error: {e}"))
}

/// Thin indenting writer over `quick_xml::Writer` for UBL fragments.
pub struct XmlWriter {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl XmlWriter {
    pub fn new() -> Result<Self, FatooraError> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml_io)?;
        Ok(Self { writer })
    }

    pub fn into_string(self) -> Result<String, FatooraError> {
        let buf = self.writer.into_inner().into_inner();
        String::from_utf8(buf).map_err(|e| FatooraError::Xml(format!("XML UTF-8 error: {e}")))
    }

    pub fn start(&mut self, name: &str) -> Result<&mut Self, FatooraError> {
        self.start_with_attrs(name, &[])
    }

    pub fn start_with_attrs(
        &mut self,
        name: &str,
        attrs: &[(&str, &str)],
    ) -> Result<&mut Self, FatooraError> {
        let mut elem = BytesStart::new(name);
        for (k, v) in attrs {
            elem.push_attribute((*k, *v));
        }
        self.writer.write_event(Event::Start(elem)).map_err(xml_io)?;
        Ok(self)
    }

    pub fn end(&mut self, name: &str) -> Result<&mut Self, FatooraError> {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn text(&mut self, name: &str, text: &str) -> Result<&mut Self, FatooraError> {
        self.text_with_attrs(name, text, &[])
    }

    pub fn text_with_attrs(
        &mut self,
        name: &str,
        text: &str,
        attrs: &[(&str, &str)],
    ) -> Result<&mut Self, FatooraError> {
        self.start_with_attrs(name, attrs)?;
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_io)?;
        self.end(name)
    }

    /// Monetary amount with `currencyID`, always two decimal places.
    pub fn amount(
        &mut self,
        name: &str,
        amount: Decimal,
        currency: &str,
    ) -> Result<&mut Self, FatooraError> {
        self.text_with_attrs(name, &format_amount(amount), &[("currencyID", currency)])
    }

    pub fn quantity(
        &mut self,
        name: &str,
        qty: Decimal,
        unit: &str,
    ) -> Result<&mut Self, FatooraError> {
        self.text_with_attrs(name, &format_decimal(qty), &[("unitCode", unit)])
    }
}

/// Two-decimal monetary text, e.g. `8.61`, `100.00`.
pub fn format_amount(d: Decimal) -> String {
    let mut rounded = round_half_up(d, 2);
    rounded.rescale(2);
    rounded.to_string()
}

/// Non-monetary decimal text (quantities, percentages): at least two
/// decimal places, trailing zeros beyond that stripped.
pub fn format_decimal(d: Decimal) -> String {
    let s = d.normalize().to_string();
    match s.find('.') {
        Some(dot) if s.len() - dot - 1 >= 2 => s,
        Some(dot) => format!("{s}{}", "0".repeat(2 - (s.len() - dot - 1))),
        None => format!("{s}.00"),
    }
}
