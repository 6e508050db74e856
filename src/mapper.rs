//! Field mappers: turn resolved source values into RDF terms.
//!
//! Each [`Transform`] variant has one mapper. Mappers are pure apart from the
//! warnings they report; nested entities are handed back to the assembler as
//! [`Mapped::Entity`] so that identifier minting stays in one place.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use lazy_static::lazy_static;
use log::{debug, warn};
use oxrdf::NamedNode;
use regex::Regex;

use crate::config::ConversionConfig;
use crate::document::Element;
use crate::error::{ConversionError, Result, Warning};
use crate::namespaces::{datatypes, GMD};
use crate::path::ResolvedValue;
use crate::rdf::RdfNode;
use crate::rules::{EntityTemplate, FieldRule, Transform};
use crate::vocabulary::Vocabularies;

lazy_static! {
    static ref YEAR: Regex = Regex::new(r"^\d{4}$").expect("valid regex");
    static ref YEAR_MONTH: Regex = Regex::new(r"^(\d{4})-(\d{2})$").expect("valid regex");
    static ref DATE: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid regex");
    static ref DECIMAL: Regex =
        Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)$").expect("valid regex");
}

/// Read-only inputs shared by all mappers during one conversion.
#[derive(Debug, Clone, Copy)]
pub struct MapperContext<'a> {
    /// Vocabulary tables.
    pub vocabularies: &'a Vocabularies,
    /// Conversion settings.
    pub config: &'a ConversionConfig,
}

/// Result of mapping one resolved value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mapped<'a> {
    /// A finished RDF term.
    Term(RdfNode),
    /// A source element to expand with a nested template.
    Entity {
        /// Source element of the nested entity.
        element: &'a Element,
        /// Template to apply to it.
        template: &'a EntityTemplate,
    },
}

/// Maps one resolved value according to `rule.transform`.
///
/// # Errors
///
/// [`ConversionError::MalformedValue`] when the value cannot be normalized,
/// [`ConversionError::UnmappedCode`] for unknown codes in strict mode.
pub fn map_value<'a>(
    rule: &'a FieldRule,
    value: &ResolvedValue<'a>,
    ctx: MapperContext<'_>,
    warnings: &mut Vec<Warning>,
) -> Result<Mapped<'a>> {
    let path = rule.path.source();
    match &rule.transform {
        Transform::Literal => Ok(Mapped::Term(map_literal(&value.text(), ctx.config))),
        Transform::Iri { prefix, lenient } => {
            match map_iri(&value.text(), prefix.as_deref(), path) {
                Err(ConversionError::MalformedValue { value, .. })
                    if *lenient && !ctx.config.strict =>
                {
                    warn!("'{value}' at {} is not an absolute IRI; kept as literal", rule.path);
                    warnings.push(Warning::InvalidIri {
                        value: value.clone(),
                        path: path.to_string(),
                        property: rule.property.clone(),
                    });
                    Ok(Mapped::Term(map_literal(&value, ctx.config)))
                },
                other => other.map(Mapped::Term),
            }
        },
        Transform::Date => map_date(&value.text(), path).map(Mapped::Term),
        Transform::Decimal => map_decimal(&value.text(), path).map(Mapped::Term),
        Transform::Vocabulary { table } => {
            map_code(&value.text(), table, rule, ctx, warnings).map(Mapped::Term)
        },
        Transform::BoundingBox => {
            let element = expect_element(value, path)?;
            map_bounding_box(element, path).map(Mapped::Term)
        },
        Transform::Nested(template) => Ok(Mapped::Entity {
            element: expect_element(value, path)?,
            template: template.as_ref(),
        }),
    }
}

fn expect_element<'a>(value: &ResolvedValue<'a>, path: &str) -> Result<&'a Element> {
    value.as_element().ok_or_else(|| ConversionError::MalformedValue {
        path: path.to_string(),
        value: value.text().into_owned(),
        reason: "expected an element, found text".into(),
    })
}

fn malformed(path: &str, value: &str, reason: impl Into<String>) -> ConversionError {
    ConversionError::MalformedValue {
        path: path.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// Plain literal, language-tagged when the configuration asks for it.
#[must_use]
pub fn map_literal(text: &str, config: &ConversionConfig) -> RdfNode {
    match &config.literal_language {
        Some(language) => RdfNode::literal_with_lang(text, language.as_str()),
        None => RdfNode::literal(text),
    }
}

fn map_iri(text: &str, prefix: Option<&str>, path: &str) -> Result<RdfNode> {
    let iri = match prefix {
        Some(prefix) if !text.starts_with(prefix) => format!("{prefix}{text}"),
        _ => text.to_string(),
    };
    NamedNode::new(iri.as_str())
        .map_err(|e| malformed(path, text, format!("not an absolute IRI: {e}")))?;
    Ok(RdfNode::uri(iri))
}

/// Normalizes an ISO 8601 date or date-time to its XSD lexical form.
///
/// Returns the normalized value and its datatype: `xsd:gYear`,
/// `xsd:gYearMonth`, `xsd:date` or `xsd:dateTime`. Zoned date-times are
/// converted to UTC; naive ones are kept naive.
#[must_use]
pub fn normalize_date(raw: &str) -> Option<(String, &'static str)> {
    let text = raw.trim();
    if YEAR.is_match(text) {
        return Some((text.to_string(), datatypes::G_YEAR));
    }
    if let Some(caps) = YEAR_MONTH.captures(text) {
        let month: u32 = caps[2].parse().ok()?;
        return (1..=12)
            .contains(&month)
            .then(|| (text.to_string(), datatypes::G_YEAR_MONTH));
    }
    if DATE.is_match(text) {
        let date = NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()?;
        return Some((date.format("%Y-%m-%d").to_string(), datatypes::DATE));
    }
    if let Ok(zoned) = DateTime::parse_from_rfc3339(text) {
        let utc = zoned.with_timezone(&Utc);
        return Some((
            utc.format("%Y-%m-%dT%H:%M:%S%.fZ").to_string(),
            datatypes::DATE_TIME,
        ));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| {
            (
                naive.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
                datatypes::DATE_TIME,
            )
        })
}

fn map_date(text: &str, path: &str) -> Result<RdfNode> {
    normalize_date(text)
        .map(|(value, datatype)| RdfNode::typed_literal(value, datatype))
        .ok_or_else(|| malformed(path, text, "not an ISO 8601 date or date-time"))
}

/// Normalizes a decimal number: trims, drops a leading `+`, and rejects
/// anything that is not a plain decimal.
#[must_use]
pub fn normalize_decimal(raw: &str) -> Option<String> {
    let text = raw.trim();
    DECIMAL
        .is_match(text)
        .then(|| text.strip_prefix('+').unwrap_or(text).to_string())
}

fn map_decimal(text: &str, path: &str) -> Result<RdfNode> {
    normalize_decimal(text)
        .map(|value| RdfNode::typed_literal(value, datatypes::DECIMAL))
        .ok_or_else(|| malformed(path, text, "not a decimal number"))
}

fn map_code(
    code: &str,
    table_name: &str,
    rule: &FieldRule,
    ctx: MapperContext<'_>,
    warnings: &mut Vec<Warning>,
) -> Result<RdfNode> {
    let table = ctx.vocabularies.get(table_name).ok_or_else(|| {
        ConversionError::Configuration(format!("unknown vocabulary '{table_name}'"))
    })?;
    if let Some(iri) = table.lookup(code) {
        debug!("{}: '{code}' -> <{iri}>", rule.id);
        return Ok(RdfNode::uri(iri));
    }
    if ctx.config.strict {
        return Err(ConversionError::UnmappedCode {
            table: table_name.to_string(),
            code: code.to_string(),
            path: rule.path.source().to_string(),
        });
    }
    warn!(
        "unmapped code '{code}' in vocabulary '{table_name}' at {}",
        rule.path
    );
    warnings.push(Warning::UnmappedCode {
        table: table_name.to_string(),
        code: code.to_string(),
        path: rule.path.source().to_string(),
        property: rule.property.clone(),
    });
    Ok(map_literal(code, ctx.config))
}

fn bound(element: &Element, name: &str) -> Option<String> {
    element
        .child_elements()
        .find(|child| child.local_name == name && child.namespace.as_deref() == Some(GMD))
        .map(Element::text)
        .filter(|text| !text.is_empty())
}

fn coordinate(element: &Element, name: &str, limit: f64, path: &str) -> Result<String> {
    let text = bound(element, name)
        .ok_or_else(|| malformed(path, "", format!("bounding box lacks {name}")))?;
    let value = normalize_decimal(&text)
        .ok_or_else(|| malformed(path, &text, format!("{name} is not a number")))?;
    let number: f64 = value
        .parse()
        .map_err(|_| malformed(path, &text, format!("{name} is not a number")))?;
    if number.abs() > limit {
        return Err(malformed(path, &text, format!("{name} out of range")));
    }
    Ok(value)
}

/// Converts a `gmd:EX_GeographicBoundingBox` into a WKT polygon in
/// longitude/latitude order, closed ring starting at the south-west corner.
///
/// # Errors
///
/// [`ConversionError::MalformedValue`] when a bound is missing, not a
/// number, out of range, or south lies north of north.
pub fn bounding_box_wkt(element: &Element, path: &str) -> Result<String> {
    let west = coordinate(element, "westBoundLongitude", 180.0, path)?;
    let east = coordinate(element, "eastBoundLongitude", 180.0, path)?;
    let south = coordinate(element, "southBoundLatitude", 90.0, path)?;
    let north = coordinate(element, "northBoundLatitude", 90.0, path)?;
    let (s, n): (f64, f64) = (
        south.parse().unwrap_or_default(),
        north.parse().unwrap_or_default(),
    );
    if s > n {
        return Err(malformed(
            path,
            &format!("{south} > {north}"),
            "southBoundLatitude is north of northBoundLatitude",
        ));
    }
    Ok(format!(
        "POLYGON(({west} {south}, {west} {north}, {east} {north}, {east} {south}, {west} {south}))"
    ))
}

fn map_bounding_box(element: &Element, path: &str) -> Result<RdfNode> {
    bounding_box_wkt(element, path).map(|wkt| RdfNode::typed_literal(wkt, datatypes::WKT_LITERAL))
}
