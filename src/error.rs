//! Error and warning types for ISO 19139 → DCAT-AP conversion.
//!
//! This module provides the [`ConversionError`] type for all fatal conditions,
//! the [`Warning`] type for recoverable ones, and the [`Result`] convenience type.

use std::fmt;

use thiserror::Error;

/// Error type for all conversion operations.
///
/// Every variant is fatal for the conversion that raised it: no partial output
/// is produced.
#[derive(Error, Debug)]
pub enum ConversionError {
    /// Invalid rule, vocabulary, path, format or prefix configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The source record lacks a field the rule set marks as mandatory.
    #[error("Missing mandatory field for rule '{rule}' ({property}) at path {path}")]
    MissingMandatoryField {
        /// Identifier of the rule that failed.
        rule: String,
        /// Target property IRI.
        property: String,
        /// Source path expression.
        path: String,
    },

    /// A value at a resolved path could not be parsed.
    #[error("Malformed value '{value}' at path {path}: {reason}")]
    MalformedValue {
        /// Source path expression.
        path: String,
        /// Raw source text.
        value: String,
        /// What was expected.
        reason: String,
    },

    /// A coded value is missing from its vocabulary table (strict mode only).
    #[error("Unmapped code '{code}' in vocabulary '{table}' at path {path}")]
    UnmappedCode {
        /// Vocabulary table name.
        table: String,
        /// The raw code.
        code: String,
        /// Source path expression.
        path: String,
    },

    /// The assembled graph failed post-assembly validation.
    #[error("Incomplete graph: {0}")]
    IncompleteGraph(String),

    /// The input is not well-formed XML.
    #[error("XML error: {0}")]
    Xml(String),

    /// IO error while reading configuration.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for [`std::result::Result`] with [`ConversionError`].
pub type Result<T> = std::result::Result<T, ConversionError>;

/// A recoverable condition raised during conversion.
///
/// Warnings accumulate over one conversion and are returned alongside the
/// successful result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A code was not found in its vocabulary and was kept as a plain literal.
    UnmappedCode {
        /// Vocabulary table name.
        table: String,
        /// The raw code.
        code: String,
        /// Source path expression.
        path: String,
        /// Target property IRI.
        property: String,
    },
    /// A value that should have been an IRI was kept as a plain literal.
    InvalidIri {
        /// The raw value.
        value: String,
        /// Source path expression.
        path: String,
        /// Target property IRI.
        property: String,
    },
    /// The dataset has no distribution.
    MissingDistribution,
    /// Nothing in the record could be mapped; the output graph is empty.
    EmptyRecord,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnmappedCode {
                table,
                code,
                path,
                property,
            } => write!(
                f,
                "unmapped code '{code}' in vocabulary '{table}' at path {path}; kept as literal on {property}"
            ),
            Self::InvalidIri {
                value,
                path,
                property,
            } => write!(
                f,
                "'{value}' at path {path} is not an absolute IRI; kept as literal on {property}"
            ),
            Self::MissingDistribution => write!(f, "dataset has no distribution"),
            Self::EmptyRecord => write!(f, "record contains no mappable fields"),
        }
    }
}
