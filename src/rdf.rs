//! Triple model and RDF syntaxes.
//!
//! [`RdfGraph`] is a plain list of triples handed to oxrdfio. Triples are
//! written in insertion order, so a graph always produces the same bytes for
//! a given format.

use std::io::{Read, Write};

use oxrdf::{BlankNode, Literal, NamedNode, NamedOrBlankNode, Term, Triple};
use oxrdfio::{JsonLdProfileSet, RdfFormat as OxRdfFormat, RdfParser, RdfSerializer};

use crate::config::RdfFormat;
use crate::error::{ConversionError, Result};
use crate::namespaces::{self, OUTPUT_PREFIXES};

const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";

const EMPTY_RDF_XML: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
<rdf:RDF xmlns:rdf=\"http://www.w3.org/1999/02/22-rdf-syntax-ns#\"/>\n";

/// One statement of the output graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RdfTriple {
    /// Entity IRI (or blank node, for parsed input).
    pub subject: RdfNode,
    /// Property IRI.
    pub predicate: String,
    /// Value.
    pub object: RdfNode,
}

impl RdfTriple {
    /// Builds a statement.
    #[must_use]
    pub fn new(subject: RdfNode, predicate: impl Into<String>, object: RdfNode) -> Self {
        Self {
            subject,
            predicate: predicate.into(),
            object,
        }
    }
}

/// A term in subject or object position.
///
/// Conversion never mints blank nodes; the variant exists so that arbitrary
/// RDF can be parsed back for inspection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RdfNode {
    /// An absolute IRI.
    Uri(String),
    /// A blank node label.
    BlankNode(String),
    /// A literal. At most one of `language` and `datatype` is set; neither
    /// means `xsd:string`.
    Literal {
        /// Lexical form.
        value: String,
        /// BCP 47 tag.
        language: Option<String>,
        /// Datatype IRI.
        datatype: Option<String>,
    },
}

impl RdfNode {
    /// An IRI term.
    #[must_use]
    pub fn uri(uri: impl Into<String>) -> Self {
        Self::Uri(uri.into())
    }

    /// A plain `xsd:string` literal.
    #[must_use]
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal {
            value: value.into(),
            language: None,
            datatype: None,
        }
    }

    /// A language-tagged literal.
    #[must_use]
    pub fn literal_with_lang(value: impl Into<String>, lang: impl Into<String>) -> Self {
        Self::Literal {
            value: value.into(),
            language: Some(lang.into()),
            datatype: None,
        }
    }

    /// A literal with an explicit datatype such as `xsd:date`.
    #[must_use]
    pub fn typed_literal(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self::Literal {
            value: value.into(),
            language: None,
            datatype: Some(datatype.into()),
        }
    }

    /// Returns true for IRI terms.
    #[must_use]
    pub const fn is_uri(&self) -> bool {
        matches!(self, Self::Uri(_))
    }

    /// Returns true for literals.
    #[must_use]
    pub const fn is_literal(&self) -> bool {
        matches!(self, Self::Literal { .. })
    }

    /// The IRI, for URI nodes.
    #[must_use]
    pub fn as_uri(&self) -> Option<&str> {
        match self {
            Self::Uri(uri) => Some(uri),
            _ => None,
        }
    }

    /// The lexical value, for literals.
    #[must_use]
    pub fn literal_value(&self) -> Option<&str> {
        match self {
            Self::Literal { value, .. } => Some(value),
            _ => None,
        }
    }

    fn to_subject(&self) -> Result<NamedOrBlankNode> {
        match self {
            Self::Uri(iri) => Ok(named_node(iri)?.into()),
            Self::BlankNode(label) => Ok(blank_node(label)?.into()),
            Self::Literal { value, .. } => Err(rdf_error(format!(
                "literal \"{value}\" used as a subject"
            ))),
        }
    }

    fn to_term(&self) -> Result<Term> {
        Ok(match self {
            Self::Uri(iri) => named_node(iri)?.into(),
            Self::BlankNode(label) => blank_node(label)?.into(),
            Self::Literal {
                value,
                language: Some(tag),
                ..
            } => Literal::new_language_tagged_literal(value.as_str(), tag.as_str())
                .map_err(|e| rdf_error(format!("bad language tag '{tag}': {e}")))?
                .into(),
            Self::Literal {
                value,
                datatype: Some(datatype),
                ..
            } => Literal::new_typed_literal(value.as_str(), named_node(datatype)?).into(),
            Self::Literal { value, .. } => Literal::new_simple_literal(value.as_str()).into(),
        })
    }

    fn from_term(term: &Term) -> Result<Self> {
        match term {
            Term::NamedNode(node) => Ok(Self::uri(node.as_str())),
            Term::BlankNode(node) => Ok(Self::BlankNode(node.as_str().to_string())),
            Term::Literal(literal) => Ok(match literal.language() {
                Some(tag) => Self::literal_with_lang(literal.value(), tag),
                None if literal.datatype().as_str() == XSD_STRING => {
                    Self::literal(literal.value())
                },
                None => Self::typed_literal(literal.value(), literal.datatype().as_str()),
            }),
            #[allow(unreachable_patterns)]
            _ => Err(rdf_error("quoted triples are not supported")),
        }
    }
}

/// An ordered list of triples.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RdfGraph {
    triples: Vec<RdfTriple>,
}

impl RdfGraph {
    /// An empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `subject predicate object`.
    pub fn add(&mut self, subject: RdfNode, predicate: impl Into<String>, object: RdfNode) {
        self.triples.push(RdfTriple::new(subject, predicate, object));
    }

    /// Number of statements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.triples.len()
    }

    /// Returns true if the graph has no triples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// Statements in insertion order.
    pub fn triples(&self) -> impl Iterator<Item = &RdfTriple> {
        self.triples.iter()
    }

    /// Objects of every triple matching `subject` and `predicate`.
    pub fn objects<'a>(
        &'a self,
        subject: &'a str,
        predicate: &'a str,
    ) -> impl Iterator<Item = &'a RdfNode> + 'a {
        self.triples
            .iter()
            .filter(move |t| t.subject.as_uri() == Some(subject) && t.predicate == predicate)
            .map(|t| &t.object)
    }

    /// Subjects typed with `class`.
    pub fn subjects_of_type<'a>(&'a self, class: &'a str) -> impl Iterator<Item = &'a RdfNode> + 'a {
        self.triples
            .iter()
            .filter(move |t| {
                t.predicate == namespaces::properties::TYPE && t.object.as_uri() == Some(class)
            })
            .map(|t| &t.subject)
    }

    /// Serializes into a new buffer.
    ///
    /// # Errors
    ///
    /// As [`RdfGraph::serialize_to_writer`].
    pub fn serialize(&self, format: RdfFormat) -> Result<Vec<u8>> {
        let mut buffer = Vec::with_capacity(self.triples.len() * 96);
        self.serialize_to_writer(&mut buffer, format)?;
        Ok(buffer)
    }

    /// Writes the graph to `writer`.
    ///
    /// An empty graph is written as a valid empty document (`[]` for JSON-LD,
    /// a bare `rdf:RDF` element for RDF/XML, nothing for the line formats).
    ///
    /// # Errors
    ///
    /// [`ConversionError::MalformedValue`] for a term that is not valid RDF,
    /// [`ConversionError::Io`] if writing fails.
    pub fn serialize_to_writer<W: Write>(&self, mut writer: W, format: RdfFormat) -> Result<()> {
        if self.is_empty() {
            match format {
                RdfFormat::JsonLd => writer.write_all(b"[]\n")?,
                RdfFormat::RdfXml => writer.write_all(EMPTY_RDF_XML.as_bytes())?,
                RdfFormat::Turtle | RdfFormat::NTriples => {},
            }
            return Ok(());
        }

        let mut serializer = RdfSerializer::from_format(oxrdfio_format(format));
        if matches!(format, RdfFormat::Turtle | RdfFormat::RdfXml) {
            for (prefix, iri) in OUTPUT_PREFIXES {
                serializer = serializer.with_prefix(*prefix, *iri).map_err(|e| {
                    ConversionError::Configuration(format!("invalid prefix '{prefix}': {e}"))
                })?;
            }
        }

        let mut sink = serializer.for_writer(writer);
        for statement in &self.triples {
            let triple = Triple::new(
                statement.subject.to_subject()?,
                named_node(&statement.predicate)?,
                statement.object.to_term()?,
            );
            sink.serialize_triple(&triple).map_err(write_error)?;
        }
        sink.finish().map_err(write_error)?;
        Ok(())
    }

    /// Reads every triple of an RDF document; named graphs are flattened.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::MalformedValue`] if the input is not valid
    /// RDF in that format.
    pub fn parse_from_reader<R: Read>(reader: R, format: RdfFormat) -> Result<Self> {
        let mut graph = Self::new();
        for quad in RdfParser::from_format(oxrdfio_format(format)).for_reader(reader) {
            let quad = quad.map_err(|e| rdf_error(format!("{format} parse error: {e}")))?;
            let subject = match &quad.subject {
                NamedOrBlankNode::NamedNode(node) => RdfNode::uri(node.as_str()),
                NamedOrBlankNode::BlankNode(node) => RdfNode::BlankNode(node.as_str().to_string()),
                #[allow(unreachable_patterns)]
                _ => return Err(rdf_error("unsupported subject")),
            };
            graph.add(subject, quad.predicate.as_str(), RdfNode::from_term(&quad.object)?);
        }
        Ok(graph)
    }

    /// [`RdfGraph::parse_from_reader`] over a byte slice.
    ///
    /// # Errors
    ///
    /// As [`RdfGraph::parse_from_reader`].
    pub fn parse(input: &[u8], format: RdfFormat) -> Result<Self> {
        Self::parse_from_reader(input, format)
    }
}

fn rdf_error(reason: impl Into<String>) -> ConversionError {
    ConversionError::MalformedValue {
        path: "rdf".into(),
        value: String::new(),
        reason: reason.into(),
    }
}

fn write_error(e: impl std::fmt::Display) -> ConversionError {
    ConversionError::Io(std::io::Error::other(e.to_string()))
}

fn oxrdfio_format(format: RdfFormat) -> OxRdfFormat {
    match format {
        RdfFormat::RdfXml => OxRdfFormat::RdfXml,
        RdfFormat::Turtle => OxRdfFormat::Turtle,
        RdfFormat::NTriples => OxRdfFormat::NTriples,
        RdfFormat::JsonLd => OxRdfFormat::JsonLd {
            profile: JsonLdProfileSet::default(),
        },
    }
}

fn named_node(iri: &str) -> Result<NamedNode> {
    NamedNode::new(iri).map_err(|e| rdf_error(format!("invalid IRI '{iri}': {e}")))
}

fn blank_node(label: &str) -> Result<BlankNode> {
    BlankNode::new(label).map_err(|e| rdf_error(format!("invalid blank node '{label}': {e}")))
}
