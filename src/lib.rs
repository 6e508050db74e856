#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

//! # geodcat: ISO 19139 to DCAT-AP
//!
//! Converts one ISO 19139 metadata record (`gmd:MD_Metadata` or
//! `gmi:MI_Metadata`) into a GeoDCAT-AP RDF description and serializes it as
//! RDF/XML, Turtle, N-Triples or JSON-LD.
//!
//! ## Quick Start
//!
//! ```no_run
//! use geodcat::{iso19139_to_dcat, ConversionConfig, RdfFormat};
//!
//! let xml = std::fs::read("record.xml")?;
//! let config = ConversionConfig::new().with_output_format(RdfFormat::Turtle);
//! let conversion = iso19139_to_dcat(&xml, &config)?;
//! println!("{}", conversion.output_str());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! For many records, build a [`Converter`] once and reuse it; it is
//! `Send + Sync` and [`Converter::convert_batch`] spreads records over
//! rayon's thread pool.
//!
//! ## Modules
//!
//! - [`document`]: Immutable source tree built from the XML bytes
//! - [`path`]: Namespace-aware path expressions over that tree
//! - [`vocabulary`]: Code → IRI tables for controlled vocabularies
//! - [`rules`]: Field rules and entity templates
//! - [`profile`]: Rule set plus vocabularies, built in or loaded from JSON
//! - [`mapper`]: Value transforms (dates, decimals, bounding boxes, codes)
//! - [`assembler`]: Applies a profile to a document and validates the graph
//! - [`graph`]: Entities, identifier minting and lowering to triples
//! - [`rdf`]: Triple model and serialization through oxrdfio
//! - [`converter`]: The end-to-end pipeline
//! - [`config`]: Conversion settings
//! - [`namespaces`]: Input and output namespaces, classes and properties
//! - [`error`]: Error and warning types
//!
//! ## Logging
//!
//! The crate logs through the [`log`] facade: `debug!` for pipeline stages,
//! `warn!` for every [`Warning`], `trace!` for path resolution. It never
//! installs a logger.

pub mod assembler;
pub mod config;
pub mod converter;
pub mod document;
pub mod error;
pub mod graph;
pub mod mapper;
pub mod namespaces;
pub mod path;
pub mod profile;
pub mod rdf;
pub mod rules;
pub mod vocabulary;

pub use assembler::{assemble, Assembly};
pub use config::{ConversionConfig, DistributionPolicy, RdfFormat, DEFAULT_ID_PREFIX};
pub use converter::{Conversion, Converter};
pub use document::SourceDocument;
pub use error::{ConversionError, Result, Warning};
pub use graph::{Entity, OutputGraph, PropertyValue};
pub use path::{resolve, PathExpr, ResolvedValue};
pub use profile::MappingProfile;
pub use rdf::{RdfGraph, RdfNode, RdfTriple};
pub use rules::{Cardinality, EntityTemplate, FieldRule, RuleSet, Transform};
pub use vocabulary::{Vocabularies, VocabularyTable};

/// Converts one ISO 19139 record with the built-in GeoDCAT-AP profile.
///
/// Loads the profile on every call; use a [`Converter`] for repeated
/// conversions.
///
/// # Errors
///
/// Any [`ConversionError`]; on error no output is produced.
pub fn iso19139_to_dcat(input: &[u8], config: &ConversionConfig) -> Result<Conversion> {
    Converter::geodcat_ap(config.clone())?.convert(input)
}
