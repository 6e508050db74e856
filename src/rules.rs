//! Field rules: the static description of how ISO 19139 maps to DCAT-AP.
//!
//! Rules come in two shapes. The `*Spec` types are the serde-facing form read
//! from JSON profiles; [`RuleSet::compile`] validates them once (paths compiled,
//! CURIEs expanded, IRIs checked, vocabulary references resolved) and produces
//! the immutable [`RuleSet`] the mappers run on. A malformed profile therefore
//! fails at load, never halfway through a conversion.

use std::collections::HashSet;

use lazy_static::lazy_static;
use oxrdf::NamedNode;
use regex::Regex;
use serde::Deserialize;

use crate::error::{ConversionError, Result};
use crate::namespaces::{expand_curie, NamespaceRegistry};
use crate::path::PathExpr;
use crate::vocabulary::Vocabularies;

lazy_static! {
    static ref ROLE_NAME: Regex = Regex::new(r"^[A-Za-z][A-Za-z0-9_-]*$").expect("valid regex");
}

/// How many values a rule emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    /// Exactly one value; absence is a `MissingMandatoryField` error.
    #[default]
    One,
    /// Zero or one value.
    Optional,
    /// Every match, in source order.
    Many,
}

/// What a rule does with each resolved value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transform {
    /// Copy text as a plain (or language-tagged) literal.
    Literal,
    /// Copy text as an IRI, optionally prefixed (e.g. `mailto:`).
    Iri {
        /// Prepended to the source text.
        prefix: Option<String>,
        /// Keep invalid IRIs as literals with a warning instead of failing.
        lenient: bool,
    },
    /// Normalize an ISO 8601 date or date-time.
    Date,
    /// Normalize a decimal number.
    Decimal,
    /// Look the code up in a vocabulary table.
    Vocabulary {
        /// Table name.
        table: String,
    },
    /// Turn an `EX_GeographicBoundingBox` into a WKT polygon.
    BoundingBox,
    /// Build a nested entity and reference it.
    Nested(Box<EntityTemplate>),
}

impl Transform {
    /// Short name used in logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Literal => "literal",
            Self::Iri { .. } => "iri",
            Self::Date => "date",
            Self::Decimal => "decimal",
            Self::Vocabulary { .. } => "vocabulary",
            Self::BoundingBox => "bounding_box",
            Self::Nested(_) => "nested",
        }
    }
}

/// One target property and how to fill it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRule {
    /// Rule identifier, unique within its template.
    pub id: String,
    /// Target property IRI.
    pub property: String,
    /// Source path, relative to the entity's source element.
    pub path: PathExpr,
    /// Multiplicity.
    pub cardinality: Cardinality,
    /// Value transformation.
    pub transform: Transform,
}

/// Template for one kind of entity (dataset, distribution, contact, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityTemplate {
    /// Role name, used in minted identifiers.
    pub role: String,
    /// `rdf:type` IRIs.
    pub classes: Vec<String>,
    /// Path whose text keys the identifier; entities with equal keys merge.
    pub key: Option<PathExpr>,
    /// Rules in application order.
    pub rules: Vec<FieldRule>,
}

/// The complete, validated rule set.
///
/// Application order is fixed: the dataset template's rules in declared order
/// (nested templates depth-first where they are referenced), then the catalog
/// record template. Ordinal identifiers depend on this order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    /// Path of the record identifier used in minted IRIs.
    pub record_identifier: Option<PathExpr>,
    /// Root dataset template; evaluated against the document element.
    pub dataset: EntityTemplate,
    /// Optional catalog record template; evaluated against the document element.
    pub catalog_record: Option<EntityTemplate>,
}

impl RuleSet {
    /// Validates and compiles a rule set specification.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::Configuration`] describing the first problem.
    pub fn compile(
        spec: RuleSetSpec,
        registry: &NamespaceRegistry,
        vocabularies: &Vocabularies,
    ) -> Result<Self> {
        let record_identifier = spec
            .record_identifier
            .as_deref()
            .map(|p| PathExpr::compile(p, registry))
            .transpose()?;
        let dataset = compile_template(spec.dataset, registry, vocabularies)?;
        if dataset.rules.is_empty() {
            return Err(ConversionError::Configuration(
                "dataset template has no rules".into(),
            ));
        }
        let catalog_record = spec
            .catalog_record
            .map(|t| compile_template(t, registry, vocabularies))
            .transpose()?;
        if let Some(record) = &catalog_record {
            if record.role == dataset.role {
                return Err(ConversionError::Configuration(format!(
                    "catalog record and dataset share the role '{}'",
                    record.role
                )));
            }
        }
        Ok(Self {
            record_identifier,
            dataset,
            catalog_record,
        })
    }

    /// Top-level rules (dataset, then catalog record) in application order.
    pub fn top_level_rules(&self) -> impl Iterator<Item = &FieldRule> {
        self.dataset.rules.iter().chain(
            self.catalog_record
                .iter()
                .flat_map(|record| record.rules.iter()),
        )
    }
}

// ---------------------------------------------------------------------------
// Serde-facing specifications
// ---------------------------------------------------------------------------

/// JSON form of a [`RuleSet`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSetSpec {
    /// Record identifier path.
    #[serde(default)]
    pub record_identifier: Option<String>,
    /// Dataset template.
    pub dataset: TemplateSpec,
    /// Catalog record template.
    #[serde(default)]
    pub catalog_record: Option<TemplateSpec>,
}

/// JSON form of an [`EntityTemplate`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateSpec {
    /// Role name.
    pub role: String,
    /// Classes as IRIs or CURIEs.
    #[serde(default)]
    pub classes: Vec<String>,
    /// Key path.
    #[serde(default)]
    pub key: Option<String>,
    /// Rules.
    #[serde(default)]
    pub rules: Vec<RuleSpec>,
}

/// JSON form of a [`FieldRule`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSpec {
    /// Rule identifier.
    pub id: String,
    /// Property as IRI or CURIE.
    pub property: String,
    /// Source path expression.
    pub path: String,
    /// Multiplicity (defaults to `one`).
    #[serde(default)]
    pub cardinality: Cardinality,
    /// Transformation (defaults to `literal`).
    #[serde(default)]
    pub transform: TransformSpec,
}

/// JSON form of a [`Transform`], tagged by `kind`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum TransformSpec {
    /// See [`Transform::Literal`].
    #[default]
    Literal,
    /// See [`Transform::Iri`].
    Iri {
        /// Optional prefix.
        #[serde(default)]
        prefix: Option<String>,
        /// See [`Transform::Iri`].
        #[serde(default)]
        lenient: bool,
    },
    /// See [`Transform::Date`].
    Date,
    /// See [`Transform::Decimal`].
    Decimal,
    /// See [`Transform::Vocabulary`].
    Vocabulary {
        /// Table name.
        table: String,
    },
    /// See [`Transform::BoundingBox`].
    BoundingBox,
    /// See [`Transform::Nested`].
    Nested {
        /// Nested template.
        entity: TemplateSpec,
    },
}

fn checked_iri(value: &str, what: &str) -> Result<String> {
    let iri = expand_curie(value)?;
    NamedNode::new(iri.as_str()).map_err(|e| {
        ConversionError::Configuration(format!("{what} '{value}' is not a valid IRI: {e}"))
    })?;
    Ok(iri)
}

fn compile_template(
    spec: TemplateSpec,
    registry: &NamespaceRegistry,
    vocabularies: &Vocabularies,
) -> Result<EntityTemplate> {
    if !ROLE_NAME.is_match(&spec.role) {
        return Err(ConversionError::Configuration(format!(
            "invalid entity role '{}'",
            spec.role
        )));
    }
    let classes = spec
        .classes
        .iter()
        .map(|c| checked_iri(c, "class"))
        .collect::<Result<Vec<_>>>()?;
    let key = spec
        .key
        .as_deref()
        .map(|k| PathExpr::compile(k, registry))
        .transpose()?;

    let mut seen = HashSet::new();
    let mut rules = Vec::with_capacity(spec.rules.len());
    for rule in spec.rules {
        if !seen.insert(rule.id.clone()) {
            return Err(ConversionError::Configuration(format!(
                "duplicate rule id '{}' in template '{}'",
                rule.id, spec.role
            )));
        }
        rules.push(compile_rule(rule, registry, vocabularies)?);
    }

    Ok(EntityTemplate {
        role: spec.role,
        classes,
        key,
        rules,
    })
}

fn compile_rule(
    spec: RuleSpec,
    registry: &NamespaceRegistry,
    vocabularies: &Vocabularies,
) -> Result<FieldRule> {
    let property = checked_iri(&spec.property, "property")?;
    let path = PathExpr::compile(&spec.path, registry)?;
    let transform = match spec.transform {
        TransformSpec::Literal => Transform::Literal,
        TransformSpec::Iri { prefix, lenient } => Transform::Iri { prefix, lenient },
        TransformSpec::Date => Transform::Date,
        TransformSpec::Decimal => Transform::Decimal,
        TransformSpec::Vocabulary { table } => {
            if !vocabularies.contains(&table) {
                return Err(ConversionError::Configuration(format!(
                    "rule '{}' refers to unknown vocabulary '{table}'",
                    spec.id
                )));
            }
            Transform::Vocabulary { table }
        },
        TransformSpec::BoundingBox => Transform::BoundingBox,
        TransformSpec::Nested { entity } => {
            Transform::Nested(Box::new(compile_template(entity, registry, vocabularies)?))
        },
    };
    Ok(FieldRule {
        id: spec.id,
        property,
        path,
        cardinality: spec.cardinality,
        transform,
    })
}
