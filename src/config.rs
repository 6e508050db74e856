//! Configuration options for ISO 19139 to DCAT-AP conversion.
//!
//! This module provides the [`ConversionConfig`] struct which controls how
//! identifiers are minted, how strictly source data is treated and how the
//! resulting RDF is serialized.

use std::fmt;
use std::str::FromStr;

use oxrdf::{Literal, NamedNode};

use crate::error::{ConversionError, Result};

/// RDF syntax of the serialized output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RdfFormat {
    /// RDF/XML format (application/rdf+xml), what most catalogues harvest
    #[default]
    RdfXml,
    /// JSON-LD format (application/ld+json)
    JsonLd,
    /// Turtle format (text/turtle)
    Turtle,
    /// N-Triples format (application/n-triples), one triple per line
    NTriples,
}

impl fmt::Display for RdfFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RdfXml => write!(f, "RDF/XML"),
            Self::JsonLd => write!(f, "JSON-LD"),
            Self::Turtle => write!(f, "Turtle"),
            Self::NTriples => write!(f, "N-Triples"),
        }
    }
}

impl RdfFormat {
    /// Media type to send with the output.
    #[must_use]
    pub const fn mime_type(&self) -> &'static str {
        match self {
            Self::RdfXml => "application/rdf+xml",
            Self::JsonLd => "application/ld+json",
            Self::Turtle => "text/turtle",
            Self::NTriples => "application/n-triples",
        }
    }

    /// Conventional file extension, without the dot.
    #[must_use]
    pub const fn file_extension(&self) -> &'static str {
        match self {
            Self::RdfXml => "rdf",
            Self::JsonLd => "jsonld",
            Self::Turtle => "ttl",
            Self::NTriples => "nt",
        }
    }
}

impl FromStr for RdfFormat {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rdfxml" | "rdf/xml" | "rdf" | "xml" => Ok(Self::RdfXml),
            "turtle" | "ttl" => Ok(Self::Turtle),
            "ntriples" | "n-triples" | "nt" => Ok(Self::NTriples),
            "jsonld" | "json-ld" => Ok(Self::JsonLd),
            other => Err(ConversionError::Configuration(format!(
                "unknown output format '{other}'"
            ))),
        }
    }
}

/// What to do when a record lists no distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistributionPolicy {
    /// Emit the dataset anyway and report [`crate::Warning::MissingDistribution`].
    #[default]
    FlagAbsence,
    /// Fail with [`ConversionError::IncompleteGraph`].
    Require,
}

/// Default namespace for minted entity IRIs.
pub const DEFAULT_ID_PREFIX: &str = "urn:geodcat:";

/// Configuration for a conversion.
///
/// # Examples
///
/// ```
/// use geodcat::{ConversionConfig, RdfFormat};
///
/// let config = ConversionConfig::new()
///     .with_output_format(RdfFormat::Turtle)
///     .with_id_prefix("https://data.example.org/")
///     .with_strict_mode(true);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionConfig {
    // === Identifiers ===
    /// Prefix for minted IRIs, e.g. `{prefix}dataset/{record-id}`.
    pub id_prefix: String,

    // === Output Control ===
    /// RDF syntax of the serialized output.
    pub output_format: RdfFormat,

    /// Emit a `dcat:CatalogRecord` describing the metadata record itself.
    pub include_catalog_record: bool,

    /// Language tag applied to plain text literals, if any.
    pub literal_language: Option<String>,

    // === Error Handling ===
    /// Strict mode: an unmapped controlled-vocabulary code is an error
    /// instead of a warning.
    pub strict: bool,

    /// Handling of records without any distribution.
    pub distribution_policy: DistributionPolicy,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            id_prefix: DEFAULT_ID_PREFIX.to_string(),
            output_format: RdfFormat::default(),
            include_catalog_record: true,
            literal_language: None,
            strict: false,
            distribution_policy: DistributionPolicy::default(),
        }
    }
}

impl ConversionConfig {
    /// The default configuration: RDF/XML, `urn:geodcat:` prefix, catalog record on.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the prefix for minted IRIs.
    #[must_use]
    pub fn with_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.id_prefix = prefix.into();
        self
    }

    /// Selects the RDF syntax.
    #[must_use]
    pub const fn with_output_format(mut self, format: RdfFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Enables or disables the catalog record.
    #[must_use]
    pub const fn with_catalog_record(mut self, enabled: bool) -> Self {
        self.include_catalog_record = enabled;
        self
    }

    /// Tags plain literals with a language.
    #[must_use]
    pub fn with_literal_language(mut self, language: impl Into<String>) -> Self {
        self.literal_language = Some(language.into());
        self
    }

    /// Enables strict mode.
    #[must_use]
    pub const fn with_strict_mode(mut self, enabled: bool) -> Self {
        self.strict = enabled;
        self
    }

    /// Sets the distribution policy.
    #[must_use]
    pub const fn with_distribution_policy(mut self, policy: DistributionPolicy) -> Self {
        self.distribution_policy = policy;
        self
    }

    /// Checks that the prefix yields valid IRIs and the language tag is well formed.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::Configuration`] naming the bad setting.
    pub fn validate(&self) -> Result<()> {
        if self.id_prefix.is_empty() {
            return Err(ConversionError::Configuration(
                "id prefix must not be empty".into(),
            ));
        }
        NamedNode::new(format!("{}dataset/x", self.id_prefix)).map_err(|e| {
            ConversionError::Configuration(format!(
                "id prefix '{}' does not form valid IRIs: {e}",
                self.id_prefix
            ))
        })?;
        if let Some(language) = &self.literal_language {
            Literal::new_language_tagged_literal("x", language).map_err(|e| {
                ConversionError::Configuration(format!("invalid language tag '{language}': {e}"))
            })?;
        }
        Ok(())
    }
}
