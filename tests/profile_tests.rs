//! Custom mapping profiles and configuration validation.

mod common;

use std::io::Write;
use std::str::FromStr;

use common::{fixture, frequency, make_config, minimal_record};
use geodcat::namespaces::properties;
use geodcat::{
    ConversionConfig, ConversionError, Converter, MappingProfile, PropertyValue, RdfFormat,
    RdfNode, Warning,
};
use tempfile::NamedTempFile;

const CUSTOM_PROFILE: &str = r#"{
  "name": "minimal",
  "record_identifier": "gmd:fileIdentifier/gco:CharacterString",
  "vocabularies": {
    "frequency": { "weekly": "http://example.org/freq/w" },
    "status": { "completed": "http://example.org/status/done" }
  },
  "dataset": {
    "role": "dataset",
    "classes": ["dcat:Dataset"],
    "rules": [
      {"id": "title", "property": "dct:title",
       "path": "gmd:identificationInfo/*/gmd:citation/*/gmd:title/*"},
      {"id": "frequency", "property": "dct:accrualPeriodicity", "cardinality": "optional",
       "path": "gmd:identificationInfo/*/gmd:resourceMaintenance/*/gmd:maintenanceAndUpdateFrequency/*/@codeListValue",
       "transform": {"kind": "vocabulary", "table": "frequency"}},
      {"id": "theme", "property": "dcat:theme", "cardinality": "many",
       "path": "gmd:identificationInfo/*/gmd:topicCategory/gmd:MD_TopicCategoryCode",
       "transform": {"kind": "vocabulary", "table": "topic_category"}}
    ]
  }
}"#;

fn write_profile(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn expect_configuration(result: geodcat::Result<MappingProfile>, needle: &str) {
    match result {
        Err(ConversionError::Configuration(msg)) => {
            assert!(msg.contains(needle), "'{msg}' does not mention '{needle}'");
        },
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("profile should have been rejected"),
    }
}

fn profile_with_rule(rule: &str) -> String {
    format!(
        r#"{{"dataset": {{"role": "dataset", "classes": ["dcat:Dataset"], "rules": [
            {{"id": "title", "property": "dct:title", "path": "gmd:title/*"}},
            {rule}
        ]}}}}"#
    )
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_load_profile_from_file() {
    let file = write_profile(CUSTOM_PROFILE);
    let profile = MappingProfile::from_path(file.path()).unwrap();
    assert_eq!(profile.name(), "minimal");
    assert!(profile.rules().catalog_record.is_none());
    assert_eq!(profile.rules().dataset.rules.len(), 3);
    // Built-in tables stay available next to the custom ones.
    assert!(profile.vocabularies().contains("topic_category"));
    assert!(profile.vocabularies().contains("status"));
}

#[test]
fn test_custom_vocabulary_replaces_builtin_table() {
    let profile = MappingProfile::from_json(CUSTOM_PROFILE).unwrap();
    let table = profile.vocabularies().get("frequency").unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(table.lookup("weekly"), Some("http://example.org/freq/w"));
    assert_eq!(table.lookup("annually"), None);
}

#[test]
fn test_convert_with_custom_profile() {
    let profile = MappingProfile::from_json(CUSTOM_PROFILE).unwrap();
    let converter = Converter::new(profile, make_config()).unwrap();

    let xml = minimal_record("rec-9", "Custom", &frequency("weekly"));
    let conversion = converter.convert(xml.as_bytes()).unwrap();
    let graph = &conversion.graph;

    // No catalog record template: only the dataset.
    assert_eq!(graph.len(), 1);
    let dataset = graph.root().unwrap();
    assert_eq!(dataset.id, "urn:geodcat:dataset/rec-9");
    let frequency: Vec<_> = dataset
        .values(properties::ACCRUAL_PERIODICITY)
        .filter_map(PropertyValue::as_term)
        .collect();
    assert_eq!(frequency, vec![&RdfNode::uri("http://example.org/freq/w")]);
}

#[test]
fn test_custom_table_reports_unmapped_builtin_codes() {
    let profile = MappingProfile::from_json(CUSTOM_PROFILE).unwrap();
    let converter = Converter::new(profile, make_config()).unwrap();
    let xml = minimal_record("rec-9", "Custom", &frequency("annually"));
    let conversion = converter.convert(xml.as_bytes()).unwrap();
    assert!(conversion
        .warnings
        .iter()
        .any(|w| matches!(w, Warning::UnmappedCode { code, .. } if code == "annually")));
}

#[test]
fn test_unnamed_profile_defaults_to_custom() {
    let json = profile_with_rule(r#"{"id": "abstract", "property": "dct:description", "path": "gmd:abstract/*", "cardinality": "optional"}"#);
    let profile = MappingProfile::from_json(&json).unwrap();
    assert_eq!(profile.name(), "custom");
}

#[test]
fn test_builtin_profile_converts_fixture() {
    let profile = MappingProfile::geodcat_ap().unwrap();
    assert_eq!(profile.name(), "geodcat-ap");
    let converter = Converter::new(profile, make_config()).unwrap();
    assert!(converter.convert(&fixture("full_record.xml")).is_ok());
}

// ============================================================================
// Rejected profiles
// ============================================================================

#[test]
fn test_missing_profile_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = MappingProfile::from_path(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, ConversionError::Io(_)));
}

#[test]
fn test_malformed_json() {
    expect_configuration(MappingProfile::from_json("{ not json"), "invalid profile");
}

#[test]
fn test_unknown_field() {
    let json = CUSTOM_PROFILE.replacen("\"name\"", "\"extra\": 1, \"name\"", 1);
    expect_configuration(MappingProfile::from_json(&json), "extra");
}

#[test]
fn test_unknown_transform_kind() {
    let json = profile_with_rule(
        r#"{"id": "x", "property": "dct:type", "path": "gmd:x", "transform": {"kind": "magic"}}"#,
    );
    expect_configuration(MappingProfile::from_json(&json), "magic");
}

#[test]
fn test_unknown_vocabulary_table() {
    let json = profile_with_rule(
        r#"{"id": "x", "property": "dct:type", "path": "gmd:x",
            "transform": {"kind": "vocabulary", "table": "no_such_table"}}"#,
    );
    expect_configuration(MappingProfile::from_json(&json), "no_such_table");
}

#[test]
fn test_unknown_path_prefix() {
    let json = profile_with_rule(r#"{"id": "x", "property": "dct:type", "path": "foo:bar"}"#);
    expect_configuration(MappingProfile::from_json(&json), "foo");
}

#[test]
fn test_invalid_path_syntax() {
    let json = profile_with_rule(r#"{"id": "x", "property": "dct:type", "path": "gmd:a//["}"#);
    expect_configuration(MappingProfile::from_json(&json), "invalid path expression");
}

#[test]
fn test_attribute_step_must_be_last() {
    let json =
        profile_with_rule(r#"{"id": "x", "property": "dct:type", "path": "gmd:a/@codeList/gmd:b"}"#);
    expect_configuration(MappingProfile::from_json(&json), "attribute step must be last");
}

#[test]
fn test_unknown_output_prefix() {
    let json = profile_with_rule(r#"{"id": "x", "property": "nope:type", "path": "gmd:x"}"#);
    expect_configuration(MappingProfile::from_json(&json), "nope");
}

#[test]
fn test_duplicate_rule_id() {
    let json = profile_with_rule(r#"{"id": "title", "property": "dct:alternative", "path": "gmd:x"}"#);
    expect_configuration(MappingProfile::from_json(&json), "duplicate rule id");
}

#[test]
fn test_invalid_role_name() {
    let json = CUSTOM_PROFILE.replacen("\"role\": \"dataset\"", "\"role\": \"data set\"", 1);
    expect_configuration(MappingProfile::from_json(&json), "invalid entity role");
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_output_format_names() {
    assert_eq!(RdfFormat::from_str("ttl").unwrap(), RdfFormat::Turtle);
    assert_eq!(RdfFormat::from_str("JSON-LD").unwrap(), RdfFormat::JsonLd);
    assert_eq!(RdfFormat::from_str("nt").unwrap(), RdfFormat::NTriples);
    assert_eq!(RdfFormat::from_str("rdf/xml").unwrap(), RdfFormat::RdfXml);
    assert!(matches!(
        RdfFormat::from_str("n3"),
        Err(ConversionError::Configuration(_))
    ));
}

#[test]
fn test_invalid_configurations_rejected() {
    for config in [
        ConversionConfig::new().with_id_prefix(""),
        ConversionConfig::new().with_id_prefix("not an iri "),
        ConversionConfig::new().with_literal_language("not a tag!"),
    ] {
        let err = Converter::geodcat_ap(config).unwrap_err();
        assert!(matches!(err, ConversionError::Configuration(_)), "{err}");
    }
}
