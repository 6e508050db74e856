//! Mapping profiles: a rule set plus the vocabularies it refers to.
//!
//! Profiles are static configuration. Load one once, wrap it in an
//! [`Arc`](std::sync::Arc) (see [`crate::Converter`]) and share it across
//! threads; nothing in a profile changes after [`MappingProfile::from_json`]
//! returns.
//!
//! # JSON format
//!
//! ```json
//! {
//!   "name": "my-profile",
//!   "record_identifier": "gmd:fileIdentifier/gco:CharacterString",
//!   "vocabularies": { "status": { "completed": "http://example.org/status/done" } },
//!   "dataset": { "role": "dataset", "classes": ["dcat:Dataset"], "rules": [ ... ] },
//!   "catalog_record": { "role": "record", "classes": ["dcat:CatalogRecord"], "rules": [ ... ] }
//! }
//! ```
//!
//! Profile vocabularies are layered over the built-in GeoDCAT-AP tables; a
//! table with the same name replaces the built-in one.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use log::debug;
use serde::Deserialize;

use crate::error::{ConversionError, Result};
use crate::namespaces::NamespaceRegistry;
use crate::rules::{RuleSet, RuleSetSpec, TemplateSpec};
use crate::vocabulary::Vocabularies;

const GEODCAT_AP_PROFILE: &str = include_str!("profiles/geodcat_ap.json");

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProfileSpec {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    record_identifier: Option<String>,
    #[serde(default)]
    vocabularies: IndexMap<String, IndexMap<String, String>>,
    dataset: TemplateSpec,
    #[serde(default)]
    catalog_record: Option<TemplateSpec>,
}

/// A validated rule set together with its vocabulary tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingProfile {
    name: String,
    rules: RuleSet,
    vocabularies: Vocabularies,
}

impl MappingProfile {
    /// Builds a profile from already validated parts.
    #[must_use]
    pub fn new(name: impl Into<String>, rules: RuleSet, vocabularies: Vocabularies) -> Self {
        Self {
            name: name.into(),
            rules,
            vocabularies,
        }
    }

    /// The built-in ISO 19139 to GeoDCAT-AP profile.
    ///
    /// # Errors
    ///
    /// Only fails if the embedded profile is broken.
    pub fn geodcat_ap() -> Result<Self> {
        Self::from_json(GEODCAT_AP_PROFILE)
    }

    /// Parses and validates a JSON profile.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::Configuration`] for malformed JSON, unknown
    /// fields, invalid paths, unknown prefixes or vocabulary tables, or
    /// invalid IRIs.
    pub fn from_json(json: &str) -> Result<Self> {
        let spec: ProfileSpec = serde_json::from_str(json)
            .map_err(|e| ConversionError::Configuration(format!("invalid profile: {e}")))?;

        let mut vocabularies = Vocabularies::geodcat_ap()?;
        for table in Vocabularies::from_map(spec.vocabularies)?.into_tables() {
            vocabularies.insert(table);
        }

        let rules = RuleSet::compile(
            RuleSetSpec {
                record_identifier: spec.record_identifier,
                dataset: spec.dataset,
                catalog_record: spec.catalog_record,
            },
            &NamespaceRegistry::iso19139(),
            &vocabularies,
        )?;
        let name = spec.name.unwrap_or_else(|| "custom".to_string());
        debug!(
            "loaded profile '{name}': {} dataset rules, {} vocabularies",
            rules.dataset.rules.len(),
            vocabularies.names().count()
        );
        Ok(Self::new(name, rules, vocabularies))
    }

    /// Reads a JSON profile from a file.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::Io`] if the file cannot be read, otherwise
    /// as [`MappingProfile::from_json`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path.as_ref())?;
        Self::from_json(&json)
    }

    /// Profile name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The rule set.
    #[must_use]
    pub const fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// The vocabulary tables.
    #[must_use]
    pub const fn vocabularies(&self) -> &Vocabularies {
        &self.vocabularies
    }
}
