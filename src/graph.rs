//! The assembled output graph.
//!
//! An [`OutputGraph`] is a set of [`Entity`] values keyed by IRI. Entities
//! reference each other by identifier rather than by pointer, so dangling
//! references can be checked before anything is serialized. Every entity has
//! a deterministic IRI minted by [`IdMinter`]; no blank nodes are produced.

use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};
use lazy_static::lazy_static;
use regex::Regex;
use sha2::{Digest, Sha256};

use crate::config::RdfFormat;
use crate::error::{ConversionError, Result};
use crate::namespaces::properties;
use crate::rdf::{RdfGraph, RdfNode};

lazy_static! {
    static ref SAFE_ID: Regex = Regex::new(r"^[A-Za-z0-9._~-]{1,128}$").expect("valid regex");
}

/// Length of hashed identifier segments, in hex characters.
const HASH_LEN: usize = 16;

/// The value of one property on an entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyValue {
    /// A literal or external IRI.
    Term(RdfNode),
    /// The identifier of another entity in the same graph.
    Reference(String),
}

impl PropertyValue {
    /// The referenced entity id, if this is a reference.
    #[must_use]
    pub fn as_reference(&self) -> Option<&str> {
        match self {
            Self::Reference(id) => Some(id),
            Self::Term(_) => None,
        }
    }

    /// The term, if this is not a reference.
    #[must_use]
    pub const fn as_term(&self) -> Option<&RdfNode> {
        match self {
            Self::Term(node) => Some(node),
            Self::Reference(_) => None,
        }
    }
}

/// One node of the output graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    /// Entity IRI.
    pub id: String,
    /// Template role that produced it (dataset, distribution, ...).
    pub role: String,
    /// `rdf:type` IRIs, in first-seen order.
    pub classes: IndexSet<String>,
    /// `(property, value)` pairs, in first-seen order, without duplicates.
    pub properties: IndexSet<(String, PropertyValue)>,
}

impl Entity {
    /// Creates an entity with classes but no properties.
    #[must_use]
    pub fn new(id: impl Into<String>, role: impl Into<String>, classes: &[String]) -> Self {
        Self {
            id: id.into(),
            role: role.into(),
            classes: classes.iter().cloned().collect(),
            properties: IndexSet::new(),
        }
    }

    /// Adds a value; returns false if it was already present.
    pub fn add(&mut self, property: impl Into<String>, value: PropertyValue) -> bool {
        self.properties.insert((property.into(), value))
    }

    /// Values of `property` in insertion order.
    pub fn values<'a>(&'a self, property: &'a str) -> impl Iterator<Item = &'a PropertyValue> + 'a {
        self.properties
            .iter()
            .filter(move |(p, _)| p == property)
            .map(|(_, v)| v)
    }

    /// Returns true if at least one value of `property` is present.
    #[must_use]
    pub fn has(&self, property: &str) -> bool {
        self.values(property).next().is_some()
    }

    /// Lexical values of literal terms for `property`.
    pub fn literals<'a>(&'a self, property: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.values(property)
            .filter_map(PropertyValue::as_term)
            .filter_map(RdfNode::literal_value)
    }

    /// Set union with another description of the same entity.
    pub fn merge(&mut self, other: Self) {
        self.classes.extend(other.classes);
        self.properties.extend(other.properties);
    }
}

/// The graph produced for one source document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputGraph {
    entities: IndexMap<String, Entity>,
    root: Option<String>,
}

impl OutputGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entity, merging it into an existing one with the same id.
    pub fn upsert(&mut self, entity: Entity) {
        match self.entities.get_mut(&entity.id) {
            Some(existing) => existing.merge(entity),
            None => {
                self.entities.insert(entity.id.clone(), entity);
            },
        }
    }

    pub(crate) fn entity_mut(&mut self, id: &str) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    pub(crate) fn remove(&mut self, id: &str) -> Option<Entity> {
        self.entities.shift_remove(id)
    }

    pub(crate) fn set_root(&mut self, id: impl Into<String>) {
        self.root = Some(id.into());
    }

    /// Returns true if an entity with this id exists.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.entities.contains_key(id)
    }

    /// Looks up an entity.
    #[must_use]
    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Entities in creation order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Entities with the given template role.
    pub fn entities_with_role<'a>(&'a self, role: &'a str) -> impl Iterator<Item = &'a Entity> + 'a {
        self.entities.values().filter(move |e| e.role == role)
    }

    /// The root dataset entity.
    #[must_use]
    pub fn root(&self) -> Option<&Entity> {
        self.root.as_deref().and_then(|id| self.entities.get(id))
    }

    /// Number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if the graph holds no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// `(entity, property, target)` for every reference whose target is missing.
    #[must_use]
    pub fn dangling_references(&self) -> Vec<(&str, &str, &str)> {
        self.entities
            .values()
            .flat_map(|entity| {
                entity.properties.iter().filter_map(move |(property, value)| {
                    value
                        .as_reference()
                        .filter(|target| !self.entities.contains_key(*target))
                        .map(|target| (entity.id.as_str(), property.as_str(), target))
                })
            })
            .collect()
    }

    /// Fails with [`ConversionError::IncompleteGraph`] if any reference dangles.
    ///
    /// # Errors
    ///
    /// See above.
    pub fn check_references(&self) -> Result<()> {
        match self.dangling_references().first() {
            Some((entity, property, target)) => Err(ConversionError::IncompleteGraph(format!(
                "<{entity}> <{property}> refers to missing entity <{target}>"
            ))),
            None => Ok(()),
        }
    }

    /// Lowers the graph to triples: per entity, its types then its properties.
    #[must_use]
    pub fn to_rdf(&self) -> RdfGraph {
        let mut graph = RdfGraph::new();
        for entity in self.entities.values() {
            let subject = RdfNode::uri(entity.id.as_str());
            for class in &entity.classes {
                graph.add(subject.clone(), properties::TYPE, RdfNode::uri(class.as_str()));
            }
            for (property, value) in &entity.properties {
                let object = match value {
                    PropertyValue::Term(node) => node.clone(),
                    PropertyValue::Reference(id) => RdfNode::uri(id.as_str()),
                };
                graph.add(subject.clone(), property.as_str(), object);
            }
        }
        graph
    }

    /// Serializes the graph.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn serialize(&self, format: RdfFormat) -> Result<Vec<u8>> {
        self.to_rdf().serialize(format)
    }
}

/// First [`HASH_LEN`] hex characters of the SHA-256 of `text`.
#[must_use]
pub fn short_hash(text: &str) -> String {
    let digest = hex::encode(Sha256::digest(text.as_bytes()));
    digest[..HASH_LEN].to_string()
}

/// Derives the record identifier segment used in every minted IRI.
///
/// A `fileIdentifier` made only of IRI-safe characters is used as is; any
/// other is hashed. Without one, the hash of the document digest is used, so
/// the same bytes always mint the same IRIs.
#[must_use]
pub fn record_segment(file_identifier: Option<&str>, document_digest: &str) -> String {
    match file_identifier.map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) if SAFE_ID.is_match(id) => id.to_string(),
        Some(id) => short_hash(id),
        None => document_digest[..HASH_LEN.min(document_digest.len())].to_string(),
    }
}

/// Mints entity IRIs for one conversion.
///
/// Keyed entities get `{prefix}{role}/{record}/{hash(key)}`, so equal keys
/// collapse into one entity. Unkeyed entities get a 1-based ordinal per role
/// in rule application order.
#[derive(Debug, Clone)]
pub struct IdMinter {
    prefix: String,
    record: String,
    ordinals: HashMap<String, usize>,
}

impl IdMinter {
    /// Creates a minter for one record.
    #[must_use]
    pub fn new(prefix: impl Into<String>, record: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            record: record.into(),
            ordinals: HashMap::new(),
        }
    }

    /// The record segment.
    #[must_use]
    pub fn record(&self) -> &str {
        &self.record
    }

    /// IRI of a singleton entity (`dataset`, `record`).
    #[must_use]
    pub fn singleton(&self, role: &str) -> String {
        format!("{}{role}/{}", self.prefix, self.record)
    }

    /// IRI of a nested entity, keyed by the hash of `key` when present.
    pub fn nested(&mut self, role: &str, key: Option<&str>) -> String {
        let discriminator = match key {
            Some(key) => short_hash(key),
            None => {
                let ordinal = self.ordinals.entry(role.to_string()).or_insert(0);
                *ordinal += 1;
                ordinal.to_string()
            },
        };
        format!("{}{role}/{}/{discriminator}", self.prefix, self.record)
    }
}
