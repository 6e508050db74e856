//! Behavioural properties of the conversion: idempotence, completeness,
//! multiplicity, code-list handling and boundary inputs.

mod common;

use common::{
    bbox, fixture, frequency, keywords, make_config, make_converter, minimal_record,
    topic_categories,
};
use geodcat::namespaces::{datatypes, properties};
use geodcat::{
    ConversionError, DistributionPolicy, PropertyValue, RdfFormat, RdfNode, Warning,
};

const ALL_FORMATS: [RdfFormat; 4] = [
    RdfFormat::RdfXml,
    RdfFormat::Turtle,
    RdfFormat::NTriples,
    RdfFormat::JsonLd,
];

// ============================================================================
// Idempotence
// ============================================================================

#[test]
fn test_idempotent_output_in_every_format() {
    let input = fixture("full_record.xml");
    for format in ALL_FORMATS {
        let converter = make_converter(make_config().with_output_format(format));
        let first = converter.convert(&input).unwrap();
        let second = converter.convert(&input).unwrap();
        assert_eq!(first.output, second.output, "{format} output differs");
        assert!(!first.output.is_empty());
    }
}

#[test]
fn test_fresh_converters_agree() {
    let input = fixture("full_record.xml");
    let a = make_converter(make_config()).convert(&input).unwrap();
    let b = make_converter(make_config()).convert(&input).unwrap();
    assert_eq!(a.output, b.output);
    assert_eq!(a.graph, b.graph);
}

#[test]
fn test_record_without_identifier_is_stable() {
    let xml = minimal_record("", "No identifier", "");
    let converter = make_converter(make_config());
    let first = converter.convert(xml.as_bytes()).unwrap();
    let second = converter.convert(xml.as_bytes()).unwrap();
    assert_eq!(first.output, second.output);

    let id = &first.graph.root().unwrap().id;
    let segment = id.strip_prefix("urn:geodcat:dataset/").unwrap();
    assert_eq!(segment.len(), 16);
    assert!(segment.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn test_unsafe_identifier_is_hashed() {
    let xml = minimal_record("id with spaces/and slashes", "Hashed", "");
    let conversion = make_converter(make_config()).convert(xml.as_bytes()).unwrap();
    let root = conversion.graph.root().unwrap();
    assert_eq!(
        root.id,
        format!(
            "urn:geodcat:dataset/{}",
            geodcat::graph::short_hash("id with spaces/and slashes")
        )
    );
}

#[test]
fn test_parallel_batch_matches_sequential() {
    let inputs: Vec<Vec<u8>> = (0..24)
        .map(|i| {
            minimal_record(&format!("rec-{i}"), &format!("Record {i}"), &keywords(&["a", "b"]))
                .into_bytes()
        })
        .collect();
    let converter = make_converter(make_config().with_output_format(RdfFormat::Turtle));

    let parallel = converter.convert_batch(&inputs);
    for (input, result) in inputs.iter().zip(parallel) {
        let sequential = converter.convert(input).unwrap();
        assert_eq!(result.unwrap().output, sequential.output);
    }
}

// ============================================================================
// Completeness
// ============================================================================

#[test]
fn test_mandatory_title_yields_exactly_one_value() {
    let xml = minimal_record("rec-1", "Only title", "");
    let conversion = make_converter(make_config()).convert(xml.as_bytes()).unwrap();
    let dataset = conversion.graph.root().unwrap();
    assert_eq!(dataset.values(properties::TITLE).count(), 1);
}

#[test]
fn test_optional_field_absent_gives_no_triple_and_no_error() {
    let xml = minimal_record("rec-1", "No abstract", "");
    let conversion = make_converter(make_config()).convert(xml.as_bytes()).unwrap();
    let dataset = conversion.graph.root().unwrap();
    assert!(!dataset.has(properties::DESCRIPTION));
    assert!(!dataset.has(properties::ACCRUAL_PERIODICITY));
    assert!(!conversion
        .output_str()
        .contains(properties::DESCRIPTION));
}

#[test]
fn test_missing_title_names_title_path() {
    let xml = minimal_record("rec-1", "", "");
    let err = make_converter(make_config())
        .convert(xml.as_bytes())
        .unwrap_err();
    match err {
        ConversionError::MissingMandatoryField { rule, path, .. } => {
            assert_eq!(rule, "title");
            assert!(path.contains("gmd:title"), "{path}");
        },
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_missing_date_stamp_fails_on_catalog_record() {
    let xml = minimal_record("rec-1", "Title", "").replace(
        "<gmd:dateStamp><gco:Date>2020-05-01</gco:Date></gmd:dateStamp>",
        "",
    );
    let err = make_converter(make_config())
        .convert(xml.as_bytes())
        .unwrap_err();
    assert!(
        matches!(err, ConversionError::MissingMandatoryField { ref rule, .. } if rule == "date-stamp")
    );

    // Without the catalog record the date stamp is not needed.
    let conversion = make_converter(make_config().with_catalog_record(false))
        .convert(xml.as_bytes())
        .unwrap();
    assert_eq!(conversion.graph.len(), 1);
}

#[test]
fn test_date_stamp_scenario() {
    let xml = minimal_record("rec-1", "Dated", "");
    let conversion = make_converter(make_config()).convert(xml.as_bytes()).unwrap();
    let record = conversion.graph.entity("urn:geodcat:record/rec-1").unwrap();
    let modified: Vec<_> = record
        .values(properties::MODIFIED)
        .filter_map(PropertyValue::as_term)
        .collect();
    assert_eq!(
        modified,
        vec![&RdfNode::typed_literal("2020-05-01", datatypes::DATE)]
    );
    assert!(conversion.output_str().contains(
        "\"2020-05-01\"^^<http://www.w3.org/2001/XMLSchema#date>"
    ));
}

#[test]
fn test_require_distribution_policy() {
    let xml = minimal_record("rec-1", "No distribution", "");
    let flagged = make_converter(make_config()).convert(xml.as_bytes()).unwrap();
    assert_eq!(flagged.warnings, vec![Warning::MissingDistribution]);

    let err = make_converter(make_config().with_distribution_policy(DistributionPolicy::Require))
        .convert(xml.as_bytes())
        .unwrap_err();
    assert!(matches!(err, ConversionError::IncompleteGraph(_)));
}

// ============================================================================
// Multiplicity
// ============================================================================

#[test]
fn test_many_rule_preserves_count_and_order() {
    let words = ["zeta", "alpha", "mu", "beta", "omega"];
    let xml = minimal_record("rec-1", "Keywords", &keywords(&words));
    let conversion = make_converter(make_config()).convert(xml.as_bytes()).unwrap();
    let dataset = conversion.graph.root().unwrap();
    assert_eq!(
        dataset.literals(properties::KEYWORD).collect::<Vec<_>>(),
        words.to_vec()
    );

    // Triple order in the serialized output follows source order too.
    let output = conversion.output_str();
    let positions: Vec<_> = words
        .iter()
        .map(|w| output.find(&format!("\"{w}\"")).unwrap())
        .collect();
    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn test_optional_rule_takes_first_match() {
    let extra = format!("{}{}", frequency("monthly"), frequency("daily"));
    let xml = minimal_record("rec-1", "Two frequencies", &extra);
    let conversion = make_converter(make_config()).convert(xml.as_bytes()).unwrap();
    let values: Vec<_> = conversion
        .graph
        .root()
        .unwrap()
        .values(properties::ACCRUAL_PERIODICITY)
        .filter_map(PropertyValue::as_term)
        .filter_map(RdfNode::as_uri)
        .collect();
    assert_eq!(
        values,
        vec!["http://publications.europa.eu/resource/authority/frequency/MONTHLY"]
    );
}

// ============================================================================
// Coded values
// ============================================================================

#[test]
fn test_known_code_maps_to_uri() {
    let xml = minimal_record("rec-1", "Codes", &topic_categories(&["oceans", "Biota"]));
    let conversion = make_converter(make_config()).convert(xml.as_bytes()).unwrap();
    let themes: Vec<_> = conversion
        .graph
        .root()
        .unwrap()
        .values(properties::THEME)
        .filter_map(PropertyValue::as_term)
        .cloned()
        .collect();
    assert_eq!(
        themes,
        vec![
            RdfNode::uri("http://inspire.ec.europa.eu/metadata-codelist/TopicCategory/oceans"),
            RdfNode::uri("http://inspire.ec.europa.eu/metadata-codelist/TopicCategory/biota"),
        ]
    );
    assert_eq!(conversion.warnings, vec![Warning::MissingDistribution]);
}

#[test]
fn test_unknown_code_kept_as_literal_with_warning() {
    let xml = minimal_record("rec-1", "Codes", &frequency("everySecondTuesday"));
    let conversion = make_converter(make_config()).convert(xml.as_bytes()).unwrap();
    let dataset = conversion.graph.root().unwrap();
    assert_eq!(
        dataset
            .literals(properties::ACCRUAL_PERIODICITY)
            .collect::<Vec<_>>(),
        vec!["everySecondTuesday"]
    );
    assert!(conversion.warnings.iter().any(|w| matches!(
        w,
        Warning::UnmappedCode { table, code, property, .. }
            if table == "frequency"
                && code == "everySecondTuesday"
                && property == properties::ACCRUAL_PERIODICITY
    )));
}

#[test]
fn test_unknown_code_in_strict_mode_fails() {
    let xml = minimal_record("rec-1", "Codes", &frequency("everySecondTuesday"));
    let err = make_converter(make_config().with_strict_mode(true))
        .convert(xml.as_bytes())
        .unwrap_err();
    assert!(matches!(
        err,
        ConversionError::UnmappedCode { ref table, ref code, .. }
            if table == "frequency" && code == "everySecondTuesday"
    ));
}

// ============================================================================
// Malformed values
// ============================================================================

#[test]
fn test_bad_date_is_malformed() {
    let xml = minimal_record("rec-1", "Bad date", "")
        .replace("<gco:Date>2020-05-01</gco:Date>", "<gco:Date>May 2020</gco:Date>");
    let err = make_converter(make_config())
        .convert(xml.as_bytes())
        .unwrap_err();
    assert!(matches!(
        err,
        ConversionError::MalformedValue { ref value, .. } if value == "May 2020"
    ));
}

#[test]
fn test_out_of_range_bounding_box_is_malformed() {
    let xml = minimal_record("rec-1", "Bad box", &bbox("-200", "10", "0", "10"));
    let err = make_converter(make_config())
        .convert(xml.as_bytes())
        .unwrap_err();
    assert!(matches!(err, ConversionError::MalformedValue { .. }));
}

// ============================================================================
// Boundary
// ============================================================================

#[test]
fn test_iso_root_without_fields_gives_empty_graph() {
    let xml = r#"<gmd:MD_Metadata xmlns:gmd="http://www.isotc211.org/2005/gmd"/>"#;
    for format in ALL_FORMATS {
        let conversion = make_converter(make_config().with_output_format(format))
            .convert(xml.as_bytes())
            .unwrap();
        assert!(conversion.graph.is_empty());
        assert_eq!(conversion.warnings, vec![Warning::EmptyRecord]);
    }
}

#[test]
fn test_empty_rdf_xml_parses_back() {
    let xml = r#"<gmd:MD_Metadata xmlns:gmd="http://www.isotc211.org/2005/gmd"/>"#;
    let conversion = make_converter(make_config().with_output_format(RdfFormat::RdfXml))
        .convert(xml.as_bytes())
        .unwrap();
    let parsed = geodcat::RdfGraph::parse(&conversion.output, RdfFormat::RdfXml).unwrap();
    assert!(parsed.is_empty());
}
