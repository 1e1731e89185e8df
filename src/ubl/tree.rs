use chrono::NaiveDate;
use quick_xml::NsReader;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use rust_decimal::Decimal;
use std::str::FromStr;

use super::ns;
use crate::core::{FatooraError, parse_amount};

/// One XML element with its resolved namespace, attributes and text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    namespace: Option<String>,
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<Element>,
}

/// A single `prefix:Local` path step resolved against the fixed UBL prefix table.
#[derive(Debug, Clone, Copy)]
struct Step<'a> {
    namespace: Option<&'static str>,
    local: &'a str,
    prefixed: bool,
}

impl<'a> Step<'a> {
    fn parse(segment: &'a str) -> Self {
        match segment.split_once(':') {
            Some((prefix, local)) => Self {
                namespace: ns::namespace_for(prefix),
                local,
                prefixed: true,
            },
            None => Self {
                namespace: None,
                local: segment,
                prefixed: false,
            },
        }
    }

    fn matches(&self, element: &Element) -> bool {
        if element.name != self.local {
            return false;
        }
        if !self.prefixed {
            return true;
        }
        // An unknown prefix resolves to None and never matches.
        self.namespace
            .is_some_and(|uri| element.namespace.as_deref() == Some(uri))
    }
}

impl Element {
    fn from_start(namespace: Option<String>, start: &BytesStart<'_>) -> Result<Self, FatooraError> {
        let name = std::str::from_utf8(start.local_name().as_ref())
            .map_err(|e| FatooraError::Xml(format!("element name is not UTF-8: {e}")))?
            .to_string();

        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr =
                attr.map_err(|e| FatooraError::Xml(format!("bad attribute on {name}: {e}")))?;
            if attr.key.as_namespace_binding().is_some() {
                continue;
            }
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| FatooraError::Xml(format!("bad attribute value on {name}: {e}")))?
                .into_owned();
            attributes.push((key, value));
        }

        Ok(Self {
            namespace,
            name,
            attributes,
            text: String::new(),
            children: Vec::new(),
        })
    }

    /// Local name, without prefix.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolved namespace URI.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Text content, whitespace-trimmed.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn child_elements(&self) -> &[Element] {
        &self.children
    }

    /// Direct children matching one path step, e.g. `"cac:TaxTotal"`.
    pub fn children<'a>(&'a self, step: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        let step = Step::parse(step);
        self.children.iter().filter(move |c| step.matches(c))
    }

    /// All elements reached by following `path` from this element, in
    /// document order.
    ///
    /// Paths are `/`-separated steps of direct children such as
    /// `"cac:LegalMonetaryTotal/cbc:TaxInclusiveAmount"`. Prefixes are
    /// resolved against the UBL prefix table (`cac`, `cbc`, `ext`), not
    /// against the document's own declarations; an unprefixed step
    /// matches the local name in any namespace.
    pub fn find_all<'a>(&'a self, path: &'a str) -> Vec<&'a Element> {
        let mut current: Vec<&Element> = vec![self];
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            let step = Step::parse(segment);
            current = current
                .into_iter()
                .flat_map(move |e| e.children.iter().filter(move |c| step.matches(c)))
                .collect();
            if current.is_empty() {
                break;
            }
        }
        current
    }

    /// First element reached by `path`.
    pub fn find<'a>(&'a self, path: &'a str) -> Option<&'a Element> {
        self.find_all(path).into_iter().next()
    }

    /// Like [`find`](Self::find), but absence is a [`FatooraError::MissingField`].
    /// `context` describes where this element sits and prefixes the reported path.
    pub fn require<'a>(
        &'a self,
        path: &'a str,
        context: &str,
    ) -> Result<&'a Element, FatooraError> {
        self.find(path).ok_or_else(|| FatooraError::MissingField {
            path: format!("{context}/{path}"),
        })
    }

    /// Parse this element's text as an amount.
    pub fn amount_value(&self, context: &str) -> Result<Decimal, FatooraError> {
        parse_amount(&self.text, context)
    }

    /// Required amount at `path`.
    pub fn amount(&self, path: &str, context: &str) -> Result<Decimal, FatooraError> {
        self.require(path, context)?
            .amount_value(&format!("{context}/{path}"))
    }

    /// Optional amount at `path`: `None` when absent, an error when present
    /// but unparseable.
    pub fn optional_amount(
        &self,
        path: &str,
        context: &str,
    ) -> Result<Option<Decimal>, FatooraError> {
        self.find(path)
            .map(|e| e.amount_value(&format!("{context}/{path}")))
            .transpose()
    }

    fn element_count(&self) -> usize {
        let mut count = 0;
        let mut pending = vec![self];
        while let Some(e) = pending.pop() {
            count += 1;
            pending.extend(&e.children);
        }
        count
    }
}

/// A parsed UBL invoice. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UblDocument {
    root: Element,
}

/// Identifying metadata of an invoice document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocumentInfo {
    /// `cbc:ID`
    pub id: Option<String>,
    /// `cbc:UUID`
    pub uuid: Option<String>,
    /// `cbc:IssueDate`
    pub issue_date: Option<NaiveDate>,
    /// `cbc:InvoiceTypeCode`
    pub type_code: Option<String>,
    /// `cbc:DocumentCurrencyCode`
    pub currency: Option<String>,
}

impl UblDocument {
    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn info(&self) -> DocumentInfo {
        let text = |path: &str| {
            self.root
                .find(path)
                .map(|e| e.text().to_string())
                .filter(|t| !t.is_empty())
        };
        DocumentInfo {
            id: text("cbc:ID"),
            uuid: text("cbc:UUID"),
            issue_date: text("cbc:IssueDate")
                .and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
            type_code: text("cbc:InvoiceTypeCode"),
            currency: text("cbc:DocumentCurrencyCode"),
        }
    }

    /// Number of `cac:InvoiceLine` elements.
    pub fn line_count(&self) -> usize {
        self.root.children("cac:InvoiceLine").count()
    }
}

impl FromStr for UblDocument {
    type Err = FatooraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_document(s)
    }
}

fn resolve(ns: &ResolveResult<'_>) -> Result<Option<String>, FatooraError> {
    match ns {
        ResolveResult::Bound(Namespace(uri)) => Ok(Some(String::from_utf8_lossy(uri).into_owned())),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(FatooraError::Xml(format!(
            "undeclared namespace prefix: {}",
            String::from_utf8_lossy(prefix)
        ))),
    }
}

/// Deepest element nesting accepted by [`parse_document`]. UBL invoices
/// stay well below twenty levels.
pub const MAX_DEPTH: usize = 256;

/// Parse a UBL invoice XML string into an element tree.
///
/// The root element must be `Invoice` in the UBL Invoice-2 namespace.
/// Documents nested deeper than [`MAX_DEPTH`] are rejected.
pub fn parse_document(xml: &str) -> Result<UblDocument, FatooraError> {
    let mut reader = NsReader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader.read_resolved_event();
        match event {
            Ok((ns, Event::Start(ref e))) => {
                let element = Element::from_start(resolve(&ns)?, e)?;
                if root.is_some() {
                    return Err(FatooraError::Xml(format!(
                        "content after document root: <{}>",
                        element.name
                    )));
                }
                if stack.len() >= MAX_DEPTH {
                    return Err(FatooraError::Xml(format!(
                        "elements nested deeper than {MAX_DEPTH} levels"
                    )));
                }
                stack.push(element);
            }
            Ok((ns, Event::Empty(ref e))) => {
                let element = Element::from_start(resolve(&ns)?, e)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None if root.is_none() => root = Some(element),
                    None => {
                        return Err(FatooraError::Xml(format!(
                            "content after document root: <{}>",
                            element.name
                        )));
                    }
                }
            }
            Ok((_, Event::Text(ref e))) => {
                let text = e
                    .unescape()
                    .map_err(|e| FatooraError::Xml(format!("bad text content: {e}")))?;
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&text);
                }
            }
            Ok((_, Event::CData(e))) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok((_, Event::End(_))) => {
                let Some(done) = stack.pop() else {
                    return Err(FatooraError::Xml("unbalanced end tag".into()));
                };
                match stack.last_mut() {
                    Some(parent) => parent.children.push(done),
                    None => root = Some(done),
                }
            }
            Ok((_, Event::Eof)) => break,
            Ok(_) => {}
            Err(e) => return Err(FatooraError::Xml(format!("XML parse error: {e}"))),
        }
    }

    if let Some(open) = stack.last() {
        return Err(FatooraError::Xml(format!(
            "unexpected end of document inside <{}>",
            open.name
        )));
    }
    let root = root.ok_or_else(|| FatooraError::Xml("document has no root element".into()))?;

    if root.name != "Invoice" || root.namespace.as_deref() != Some(ns::INVOICE) {
        return Err(FatooraError::Xml(format!(
            "root element is {{{}}}{}, expected a UBL Invoice",
            root.namespace.as_deref().unwrap_or(""),
            root.name
        )));
    }

    let doc = UblDocument { root };
    tracing::debug!(
        elements = doc.root.element_count(),
        lines = doc.line_count(),
        "parsed UBL invoice"
    );
    Ok(doc)
}
