//! Graph assembly: applies a profile's rules to one document.
//!
//! The assembler walks the dataset template against the document element,
//! expands nested templates where rules reference them, adds the catalog
//! record, and validates the result before anything is serialized.

use log::{debug, warn};

use crate::config::{ConversionConfig, DistributionPolicy};
use crate::document::{Element, SourceDocument};
use crate::error::{ConversionError, Result, Warning};
use crate::graph::{record_segment, Entity, IdMinter, OutputGraph, PropertyValue};
use crate::mapper::{map_value, Mapped, MapperContext};
use crate::namespaces::properties;
use crate::profile::MappingProfile;
use crate::rules::{Cardinality, EntityTemplate, FieldRule, RuleSet};

/// A validated graph and the warnings raised while building it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembly {
    /// The output graph.
    pub graph: OutputGraph,
    /// Recoverable conditions, in the order they were met.
    pub warnings: Vec<Warning>,
}

/// Builds the output graph for `document`.
///
/// # Errors
///
/// - [`ConversionError::MissingMandatoryField`] when a `one` rule resolves nothing
/// - [`ConversionError::MalformedValue`] when a value cannot be normalized
/// - [`ConversionError::UnmappedCode`] for unknown codes in strict mode
/// - [`ConversionError::IncompleteGraph`] when validation fails
pub fn assemble(
    document: &SourceDocument,
    profile: &MappingProfile,
    config: &ConversionConfig,
) -> Result<Assembly> {
    GraphAssembler::new(document, profile, config).assemble()
}

/// Internal assembler state.
struct GraphAssembler<'a> {
    document: &'a SourceDocument,
    rules: &'a RuleSet,
    config: &'a ConversionConfig,
    mappers: MapperContext<'a>,
    minter: IdMinter,
    graph: OutputGraph,
    warnings: Vec<Warning>,
}

impl<'a> GraphAssembler<'a> {
    fn new(
        document: &'a SourceDocument,
        profile: &'a MappingProfile,
        config: &'a ConversionConfig,
    ) -> Self {
        let rules = profile.rules();
        let file_identifier = rules
            .record_identifier
            .as_ref()
            .and_then(|path| path.resolve(document, document.root()).into_iter().next())
            .map(|value| value.text().into_owned());
        let record = record_segment(file_identifier.as_deref(), document.digest());

        Self {
            document,
            rules,
            config,
            mappers: MapperContext {
                vocabularies: profile.vocabularies(),
                config,
            },
            minter: IdMinter::new(config.id_prefix.as_str(), record),
            graph: OutputGraph::new(),
            warnings: Vec::new(),
        }
    }

    fn assemble(mut self) -> Result<Assembly> {
        let root = self.document.root();
        let rules = self.rules;

        if !rules
            .top_level_rules()
            .any(|rule| rule.path.exists(self.document, root))
        {
            warn!(
                "record {}: no mappable fields in <{}>",
                self.minter.record(),
                root.local_name
            );
            self.warnings.push(Warning::EmptyRecord);
            return Ok(Assembly {
                graph: OutputGraph::new(),
                warnings: self.warnings,
            });
        }

        // Dataset
        let dataset_id = self.minter.singleton(&rules.dataset.role);
        self.build_entity(&rules.dataset, root, Some(dataset_id.clone()))?;
        self.graph.set_root(dataset_id.as_str());

        // Catalog record
        if self.config.include_catalog_record {
            if let Some(record) = &rules.catalog_record {
                let record_id = self.minter.singleton(&record.role);
                self.build_entity(record, root, Some(record_id.clone()))?;
                if let Some(entity) = self.graph.entity_mut(&record_id) {
                    entity.add(
                        properties::PRIMARY_TOPIC,
                        PropertyValue::Reference(dataset_id.clone()),
                    );
                }
            }
        }

        self.validate(&dataset_id)?;
        debug!(
            "record {}: assembled {} entities, {} warnings",
            self.minter.record(),
            self.graph.len(),
            self.warnings.len()
        );

        Ok(Assembly {
            graph: self.graph,
            warnings: self.warnings,
        })
    }

    /// Builds one entity from `element`; returns its id, or `None` when a
    /// nested entity ended up with no properties and was dropped.
    fn build_entity(
        &mut self,
        template: &'a EntityTemplate,
        element: &'a Element,
        fixed_id: Option<String>,
    ) -> Result<Option<String>> {
        let singleton = fixed_id.is_some();
        let id = match fixed_id {
            Some(id) => id,
            None => {
                let key = template
                    .key
                    .as_ref()
                    .and_then(|path| path.resolve(self.document, element).into_iter().next())
                    .map(|value| value.identity().into_owned());
                self.minter.nested(&template.role, key.as_deref())
            },
        };

        let existed = self.graph.contains(&id);
        self.graph
            .upsert(Entity::new(id.as_str(), template.role.as_str(), &template.classes));

        let mut added = 0;
        for rule in &template.rules {
            added += self.apply_rule(rule, element, &id)?;
        }

        if added == 0 && !existed && !singleton {
            debug!("dropping empty {} entity <{id}>", template.role);
            self.graph.remove(&id);
            return Ok(None);
        }
        Ok(Some(id))
    }

    /// Applies one rule to `element`, adding values to `subject`.
    /// Returns the number of new values.
    fn apply_rule(
        &mut self,
        rule: &'a FieldRule,
        element: &'a Element,
        subject: &str,
    ) -> Result<usize> {
        let mut values = rule.path.resolve(self.document, element);
        match rule.cardinality {
            Cardinality::One if values.is_empty() => {
                return Err(ConversionError::MissingMandatoryField {
                    rule: rule.id.clone(),
                    property: rule.property.clone(),
                    path: rule.path.source().to_string(),
                });
            },
            Cardinality::One | Cardinality::Optional => values.truncate(1),
            Cardinality::Many => {},
        }

        let mut added = 0;
        for value in &values {
            let property_value = match map_value(rule, value, self.mappers, &mut self.warnings)? {
                Mapped::Term(node) => PropertyValue::Term(node),
                Mapped::Entity { element, template } => {
                    match self.build_entity(template, element, None)? {
                        Some(id) => PropertyValue::Reference(id),
                        None => continue,
                    }
                },
            };
            let inserted = self
                .graph
                .entity_mut(subject)
                .is_some_and(|entity| entity.add(rule.property.as_str(), property_value));
            if inserted {
                added += 1;
            }
        }
        Ok(added)
    }

    fn validate(&mut self, dataset_id: &str) -> Result<()> {
        let dataset = self.graph.entity(dataset_id).ok_or_else(|| {
            ConversionError::IncompleteGraph(format!("dataset <{dataset_id}> was not created"))
        })?;
        if !dataset.has(properties::TITLE) {
            return Err(ConversionError::IncompleteGraph(format!(
                "dataset <{dataset_id}> has no dct:title"
            )));
        }
        if !dataset.has(properties::DISTRIBUTION) {
            match self.config.distribution_policy {
                DistributionPolicy::Require => {
                    return Err(ConversionError::IncompleteGraph(format!(
                        "dataset <{dataset_id}> has no distribution"
                    )));
                },
                DistributionPolicy::FlagAbsence => {
                    warn!("dataset <{dataset_id}> has no distribution");
                    self.warnings.push(Warning::MissingDistribution);
                },
            }
        }
        self.graph.check_references()
    }
}
