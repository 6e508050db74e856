//! The conversion pipeline: parse, resolve, map, assemble, serialize.
//!
//! A [`Converter`] owns its configuration and shares its profile behind an
//! [`Arc`], so one instance can be cloned into worker threads or used from
//! rayon's pool. Each call builds a fresh document and graph; nothing is
//! shared between conversions except the read-only profile.
//!
//! # Examples
//!
//! ```no_run
//! use geodcat::{ConversionConfig, Converter, RdfFormat};
//!
//! let converter = Converter::geodcat_ap(
//!     ConversionConfig::new().with_output_format(RdfFormat::Turtle),
//! )?;
//! let xml = std::fs::read("record.xml")?;
//! let conversion = converter.convert(&xml)?;
//! for warning in &conversion.warnings {
//!     eprintln!("warning: {warning}");
//! }
//! std::io::Write::write_all(&mut std::io::stdout(), &conversion.output)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::sync::Arc;

use log::debug;
use rayon::prelude::*;

use crate::assembler::assemble;
use crate::config::{ConversionConfig, RdfFormat};
use crate::document::SourceDocument;
use crate::error::{Result, Warning};
use crate::graph::OutputGraph;
use crate::profile::MappingProfile;

/// The result of one successful conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    /// Serialized RDF.
    pub output: Vec<u8>,
    /// Format of `output`.
    pub format: RdfFormat,
    /// The assembled graph, for callers that want to inspect it.
    pub graph: OutputGraph,
    /// Recoverable conditions met along the way.
    pub warnings: Vec<Warning>,
}

impl Conversion {
    /// Output as UTF-8 text; every supported format is UTF-8.
    #[must_use]
    pub fn output_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.output)
    }
}

/// Converts ISO 19139 records with a fixed profile and configuration.
#[derive(Debug, Clone)]
pub struct Converter {
    profile: Arc<MappingProfile>,
    config: ConversionConfig,
}

impl Converter {
    /// Creates a converter, validating the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ConversionError::Configuration`] if `config` is invalid.
    pub fn new(profile: MappingProfile, config: ConversionConfig) -> Result<Self> {
        Self::with_shared_profile(Arc::new(profile), config)
    }

    /// Creates a converter around an already shared profile.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ConversionError::Configuration`] if `config` is invalid.
    pub fn with_shared_profile(
        profile: Arc<MappingProfile>,
        config: ConversionConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self { profile, config })
    }

    /// Creates a converter with the built-in GeoDCAT-AP profile.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ConversionError::Configuration`] if `config` is invalid.
    pub fn geodcat_ap(config: ConversionConfig) -> Result<Self> {
        Self::new(MappingProfile::geodcat_ap()?, config)
    }

    /// The profile in use.
    #[must_use]
    pub fn profile(&self) -> &Arc<MappingProfile> {
        &self.profile
    }

    /// The configuration in use.
    #[must_use]
    pub const fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Converts raw XML bytes.
    ///
    /// # Errors
    ///
    /// Any [`crate::ConversionError`]; on error no output is produced.
    pub fn convert(&self, input: &[u8]) -> Result<Conversion> {
        let document = SourceDocument::parse(input)?;
        debug!(
            "parsed <{}> ({} bytes, digest {})",
            document.root().local_name,
            input.len(),
            &document.digest()[..16]
        );
        self.convert_document(&document)
    }

    /// Converts an already parsed document.
    ///
    /// # Errors
    ///
    /// Any [`crate::ConversionError`] except XML errors.
    pub fn convert_document(&self, document: &SourceDocument) -> Result<Conversion> {
        let assembly = assemble(document, &self.profile, &self.config)?;
        let format = self.config.output_format;
        let output = assembly.graph.serialize(format)?;
        debug!("serialized {} bytes of {format}", output.len());
        Ok(Conversion {
            output,
            format,
            graph: assembly.graph,
            warnings: assembly.warnings,
        })
    }

    /// Converts independent records on rayon's thread pool.
    ///
    /// Results are returned in input order; one failing record does not
    /// affect the others.
    #[must_use]
    pub fn convert_batch<I>(&self, inputs: &[I]) -> Vec<Result<Conversion>>
    where
        I: AsRef<[u8]> + Sync,
    {
        inputs
            .par_iter()
            .map(|input| self.convert(input.as_ref()))
            .collect()
    }
}
