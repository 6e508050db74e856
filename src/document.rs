//! Immutable ISO 19139 source document.
//!
//! The raw bytes are decoded (BOM or XML declaration, via `encoding_rs`), read
//! with `quick-xml`'s namespace-resolving reader and turned into an owned tree
//! of [`Element`]s. Element and attribute names carry their resolved namespace
//! URI, never the prefix used in the source, so path matching is independent
//! of how a record chose to spell its prefixes.

use std::borrow::Cow;
use std::fmt::Write;

use encoding_rs::{Encoding, UTF_8};
use lazy_static::lazy_static;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;
use regex::bytes::Regex;
use sha2::{Digest, Sha256};
use unicode_normalization::UnicodeNormalization;

use crate::error::{ConversionError, Result};

lazy_static! {
    static ref DECLARED_ENCODING: Regex =
        Regex::new(r#"^\s*<\?xml[^>]*\sencoding\s*=\s*["']([A-Za-z0-9._:-]+)["']"#)
            .expect("valid regex");
}

/// A node in the document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A child element.
    Element(Element),
    /// Character data (text or CDATA), NFC-normalized.
    Text(String),
}

/// An attribute with its resolved namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Namespace URI, `None` for unprefixed attributes.
    pub namespace: Option<String>,
    /// Local name.
    pub local_name: String,
    /// Unescaped value.
    pub value: String,
}

/// An element with its resolved namespace, attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Namespace URI, `None` when the element is not in a namespace.
    pub namespace: Option<String>,
    /// Local name.
    pub local_name: String,
    /// Attributes in source order (namespace declarations excluded).
    pub attributes: Vec<Attribute>,
    /// Children in source order.
    pub children: Vec<Node>,
}

impl Element {
    /// Creates an element with no attributes or children.
    #[must_use]
    pub fn new(namespace: Option<&str>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.map(String::from),
            local_name: local_name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Iterates over child elements in source order.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        })
    }

    /// Looks up an attribute by namespace (`None` = unprefixed) and local name.
    #[must_use]
    pub fn attribute(&self, namespace: Option<&str>, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.namespace.as_deref() == namespace && a.local_name == local_name)
            .map(|a| a.value.as_str())
    }

    /// Returns the concatenated descendant text, trimmed.
    #[must_use]
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out.trim().to_string()
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                Node::Text(t) => out.push_str(t),
                Node::Element(el) => el.collect_text(out),
            }
        }
    }

    /// Serializes the subtree into a form that identifies it: names,
    /// attributes and non-blank text, each length-prefixed.
    ///
    /// Unlike [`Element::text`], attribute values count and adjacent text
    /// nodes stay apart, so `<a>1</a><b>23</b>` and `<a>12</a><b>3</b>` differ.
    /// Indentation does not.
    #[must_use]
    pub fn canonical_form(&self) -> String {
        let mut out = String::new();
        self.write_canonical(&mut out);
        out
    }

    fn write_canonical(&self, out: &mut String) {
        out.push('<');
        push_token(out, self.namespace.as_deref().unwrap_or_default());
        push_token(out, &self.local_name);
        for attr in &self.attributes {
            out.push('@');
            push_token(out, attr.namespace.as_deref().unwrap_or_default());
            push_token(out, &attr.local_name);
            push_token(out, &attr.value);
        }
        for node in &self.children {
            match node {
                Node::Text(t) if t.trim().is_empty() => {},
                Node::Text(t) => {
                    out.push('"');
                    push_token(out, t.trim());
                },
                Node::Element(el) => el.write_canonical(out),
            }
        }
        out.push('>');
    }

    /// Returns true if the element has no child elements and only blank text.
    ///
    /// ISO 19139 uses such elements with `gco:nilReason` to say "unknown";
    /// the resolver treats them as absent.
    #[must_use]
    pub fn is_empty_leaf(&self) -> bool {
        self.child_elements().next().is_none() && self.text().is_empty()
    }
}

fn push_token(out: &mut String, token: &str) {
    let _ = write!(out, "{}:{token}", token.len());
}

/// A parsed, immutable ISO 19139 document.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    root: Element,
    digest: String,
}

impl SourceDocument {
    /// Parses raw XML bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::Xml`] if the bytes cannot be decoded or are
    /// not a well-formed, namespace-valid XML document.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let text = decode_input(bytes)?;
        let root = build_tree(&text)?;
        let digest = hex::encode(Sha256::digest(bytes));
        log::trace!(
            "parsed document <{}> ({} bytes, digest {})",
            root.local_name,
            bytes.len(),
            &digest[..16]
        );
        Ok(Self { root, digest })
    }

    /// The document element.
    #[must_use]
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Lowercase hex SHA-256 of the input bytes.
    #[must_use]
    pub fn digest(&self) -> &str {
        &self.digest
    }
}

/// Decodes input bytes to UTF-8 text, honoring a BOM or the XML declaration.
fn decode_input(bytes: &[u8]) -> Result<Cow<'_, str>> {
    let (encoding, body) = if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        (encoding, &bytes[bom_len..])
    } else {
        let declared = DECLARED_ENCODING
            .captures(bytes)
            .and_then(|caps| caps.get(1))
            .and_then(|label| Encoding::for_label(label.as_bytes()));
        (declared.unwrap_or(UTF_8), bytes)
    };

    let (text, had_errors) = encoding.decode_without_bom_handling(body);
    if had_errors {
        return Err(ConversionError::Xml(format!(
            "input is not valid {}",
            encoding.name()
        )));
    }
    Ok(text)
}

fn resolved_namespace(result: ResolveResult<'_>) -> Result<Option<String>> {
    match result {
        ResolveResult::Bound(Namespace(uri)) => Ok(Some(String::from_utf8_lossy(uri).into_owned())),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(ConversionError::Xml(format!(
            "undeclared namespace prefix '{}'",
            String::from_utf8_lossy(&prefix)
        ))),
    }
}

fn normalize(text: &str) -> String {
    text.nfc().collect()
}

fn element_from_start(
    reader: &NsReader<&[u8]>,
    namespace: Option<String>,
    start: &BytesStart<'_>,
) -> Result<Element> {
    let local_name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| ConversionError::Xml(e.to_string()))?;
        let raw = attr.key.as_ref();
        if raw == b"xmlns" || raw.starts_with(b"xmlns:") {
            continue;
        }
        let (ns, local) = reader.resolve_attribute(attr.key);
        let namespace = resolved_namespace(ns)?;
        let value = attr
            .unescape_value()
            .map_err(|e| ConversionError::Xml(e.to_string()))?;
        attributes.push(Attribute {
            namespace,
            local_name: String::from_utf8_lossy(local.as_ref()).into_owned(),
            value: normalize(&value),
        });
    }
    Ok(Element {
        namespace,
        local_name,
        attributes,
        children: Vec::new(),
    })
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(Node::Element(element));
        Ok(())
    } else if root.is_some() {
        Err(ConversionError::Xml(
            "document has more than one root element".into(),
        ))
    } else {
        *root = Some(element);
        Ok(())
    }
}

fn build_tree(text: &str) -> Result<Element> {
    let mut reader = NsReader::from_reader(text.as_bytes());
    let mut buf = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let (ns, event) = reader
            .read_resolved_event_into(&mut buf)
            .map_err(|e| ConversionError::Xml(e.to_string()))?;
        let namespace = resolved_namespace(ns)?;
        match event {
            Event::Start(start) => {
                let element = element_from_start(&reader, namespace, &start)?;
                stack.push(element);
            },
            Event::Empty(start) => {
                let element = element_from_start(&reader, namespace, &start)?;
                attach(&mut stack, &mut root, element)?;
            },
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| ConversionError::Xml("unexpected closing tag".into()))?;
                attach(&mut stack, &mut root, element)?;
            },
            Event::Text(t) => {
                let value = t
                    .unescape()
                    .map_err(|e| ConversionError::Xml(e.to_string()))?;
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(Node::Text(normalize(&value)));
                } else if !value.trim().is_empty() {
                    return Err(ConversionError::Xml(
                        "text outside the root element".into(),
                    ));
                }
            },
            Event::CData(c) => {
                let value = String::from_utf8_lossy(&c.into_inner()).into_owned();
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(Node::Text(normalize(&value)));
                }
            },
            Event::Eof => break,
            _ => {},
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(ConversionError::Xml(format!(
            "unclosed element <{}>",
            open.local_name
        )));
    }
    root.ok_or_else(|| ConversionError::Xml("document has no root element".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespaces::{GCO, GMD, XLINK};

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gmd:MD_Metadata xmlns:gmd="http://www.isotc211.org/2005/gmd"
                 xmlns:gco="http://www.isotc211.org/2005/gco"
                 xmlns:xlink="http://www.w3.org/1999/xlink">
  <gmd:fileIdentifier><gco:CharacterString>abc-123</gco:CharacterString></gmd:fileIdentifier>
  <gmd:contact xlink:href="http://example.org/c1" uuidref="u1"/>
  <gmd:abstract><gco:CharacterString>Rivers &amp; lakes</gco:CharacterString></gmd:abstract>
  <gmd:purpose><gco:CharacterString><![CDATA[<raw>]]></gco:CharacterString></gmd:purpose>
  <gmd:language gco:nilReason="unknown"/>
</gmd:MD_Metadata>"#;

    #[test]
    fn test_parse_resolves_namespaces() {
        let doc = SourceDocument::parse(SAMPLE.as_bytes()).unwrap();
        let root = doc.root();
        assert_eq!(root.local_name, "MD_Metadata");
        assert_eq!(root.namespace.as_deref(), Some(GMD));
        let first = root.child_elements().next().unwrap();
        assert_eq!(first.local_name, "fileIdentifier");
        assert_eq!(first.text(), "abc-123");
        let inner = first.child_elements().next().unwrap();
        assert_eq!(inner.namespace.as_deref(), Some(GCO));
    }

    #[test]
    fn test_attributes_resolved_and_xmlns_skipped() {
        let doc = SourceDocument::parse(SAMPLE.as_bytes()).unwrap();
        assert!(doc.root().attributes.is_empty());
        let contact = doc.root().child_elements().nth(1).unwrap();
        assert_eq!(
            contact.attribute(Some(XLINK), "href"),
            Some("http://example.org/c1")
        );
        assert_eq!(contact.attribute(None, "uuidref"), Some("u1"));
        assert!(contact.is_empty_leaf());
    }

    #[test]
    fn test_text_unescaped_and_cdata() {
        let doc = SourceDocument::parse(SAMPLE.as_bytes()).unwrap();
        let abstract_ = doc.root().child_elements().nth(2).unwrap();
        assert_eq!(abstract_.text(), "Rivers & lakes");
        let purpose = doc.root().child_elements().nth(3).unwrap();
        assert_eq!(purpose.text(), "<raw>");
    }

    #[test]
    fn test_digest_is_stable() {
        let a = SourceDocument::parse(SAMPLE.as_bytes()).unwrap();
        let b = SourceDocument::parse(SAMPLE.as_bytes()).unwrap();
        assert_eq!(a.digest(), b.digest());
        assert_eq!(a.digest().len(), 64);
    }

    #[test]
    fn test_malformed_xml_is_error() {
        let err = SourceDocument::parse(b"<a><b></a>").unwrap_err();
        assert!(matches!(err, ConversionError::Xml(_)));
        let err = SourceDocument::parse(b"<a>").unwrap_err();
        assert!(matches!(err, ConversionError::Xml(_)));
        let err = SourceDocument::parse(b"").unwrap_err();
        assert!(matches!(err, ConversionError::Xml(_)));
    }

    #[test]
    fn test_undeclared_prefix_is_error() {
        let err = SourceDocument::parse(b"<gmd:MD_Metadata/>").unwrap_err();
        assert!(err.to_string().contains("gmd"));
    }

    #[test]
    fn test_latin1_declared_encoding() {
        let mut bytes =
            b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><title>Z\xfcrich</title>".to_vec();
        let doc = SourceDocument::parse(&bytes).unwrap();
        assert_eq!(doc.root().text(), "Zürich");

        bytes.truncate(0);
        bytes.extend_from_slice(b"\xef\xbb\xbf<title>Gen\xc3\xa8ve</title>");
        let doc = SourceDocument::parse(&bytes).unwrap();
        assert_eq!(doc.root().text(), "Genève");
    }

    #[test]
    fn test_canonical_form_keeps_text_nodes_apart() {
        let wrap = |w: &str, e: &str| {
            format!("<box xmlns:g=\"urn:g\"><g:w>{w}</g:w><g:e>{e}</g:e></box>")
        };
        let a = SourceDocument::parse(wrap("1", "23").as_bytes()).unwrap();
        let b = SourceDocument::parse(wrap("12", "3").as_bytes()).unwrap();
        assert_eq!(a.root().text(), b.root().text());
        assert_ne!(a.root().canonical_form(), b.root().canonical_form());
    }

    #[test]
    fn test_canonical_form_includes_attributes() {
        let owner = SourceDocument::parse(br#"<p><role code="owner"/>Agency</p>"#).unwrap();
        let publisher = SourceDocument::parse(br#"<p><role code="publisher"/>Agency</p>"#).unwrap();
        assert_eq!(owner.root().text(), publisher.root().text());
        assert_ne!(owner.root().canonical_form(), publisher.root().canonical_form());
    }

    #[test]
    fn test_canonical_form_ignores_indentation() {
        let compact = SourceDocument::parse(b"<a><b>x</b><c k=\"v\"/></a>").unwrap();
        let pretty = SourceDocument::parse(b"<a>\n  <b> x </b>\n  <c k=\"v\"/>\n</a>").unwrap();
        assert_eq!(compact.root().canonical_form(), pretty.root().canonical_form());
        assert_eq!(compact.root().canonical_form(), "<0:1:a<0:1:b\"1:x><0:1:c@0:1:k1:v>>");
    }

    #[test]
    fn test_text_is_nfc_normalized() {
        // "e" followed by a combining acute accent
        let doc = SourceDocument::parse("<t>Caf\u{0065}\u{0301}</t>".as_bytes()).unwrap();
        assert_eq!(doc.root().text(), "Caf\u{00e9}");
    }
}
