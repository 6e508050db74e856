//! Common test helpers shared across the integration suites.

#![allow(dead_code)]

use std::path::PathBuf;

use geodcat::{ConversionConfig, Converter, RdfFormat};

/// Absolute path of a file under `tests/data`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

/// Raw bytes of a file under `tests/data`.
pub fn fixture(name: &str) -> Vec<u8> {
    std::fs::read(fixture_path(name))
        .unwrap_or_else(|e| panic!("cannot read fixture {name}: {e}"))
}

/// Default configuration with N-Triples output, the easiest format to grep.
pub fn make_config() -> ConversionConfig {
    ConversionConfig::new().with_output_format(RdfFormat::NTriples)
}

/// Converter over the built-in profile.
pub fn make_converter(config: ConversionConfig) -> Converter {
    Converter::geodcat_ap(config).expect("built-in profile loads")
}

/// A small but complete record: identifier, title, date stamp and the
/// given extra content inside `MD_DataIdentification`.
pub fn minimal_record(file_identifier: &str, title: &str, identification_extra: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<gmd:MD_Metadata xmlns:gmd="http://www.isotc211.org/2005/gmd"
                 xmlns:gco="http://www.isotc211.org/2005/gco"
                 xmlns:gmx="http://www.isotc211.org/2005/gmx"
                 xmlns:gml="http://www.opengis.net/gml/3.2"
                 xmlns:xlink="http://www.w3.org/1999/xlink">
  <gmd:fileIdentifier><gco:CharacterString>{file_identifier}</gco:CharacterString></gmd:fileIdentifier>
  <gmd:dateStamp><gco:Date>2020-05-01</gco:Date></gmd:dateStamp>
  <gmd:identificationInfo>
    <gmd:MD_DataIdentification>
      <gmd:citation><gmd:CI_Citation>
        <gmd:title><gco:CharacterString>{title}</gco:CharacterString></gmd:title>
      </gmd:CI_Citation></gmd:citation>
      {identification_extra}
    </gmd:MD_DataIdentification>
  </gmd:identificationInfo>
</gmd:MD_Metadata>"#
    )
}

/// One `gmd:keyword` block per entry.
pub fn keywords(words: &[&str]) -> String {
    let inner: String = words
        .iter()
        .map(|w| format!("<gmd:keyword><gco:CharacterString>{w}</gco:CharacterString></gmd:keyword>"))
        .collect();
    format!("<gmd:descriptiveKeywords><gmd:MD_Keywords>{inner}</gmd:MD_Keywords></gmd:descriptiveKeywords>")
}

/// One `gmd:topicCategory` per code.
pub fn topic_categories(codes: &[&str]) -> String {
    codes
        .iter()
        .map(|c| {
            format!("<gmd:topicCategory><gmd:MD_TopicCategoryCode>{c}</gmd:MD_TopicCategoryCode></gmd:topicCategory>")
        })
        .collect()
}

/// A `gmd:resourceMaintenance` block with the given frequency code.
pub fn frequency(code: &str) -> String {
    format!(
        r#"<gmd:resourceMaintenance><gmd:MD_MaintenanceInformation>
  <gmd:maintenanceAndUpdateFrequency>
    <gmd:MD_MaintenanceFrequencyCode codeList="x" codeListValue="{code}"/>
  </gmd:maintenanceAndUpdateFrequency>
</gmd:MD_MaintenanceInformation></gmd:resourceMaintenance>"#
    )
}

/// A geographic bounding box extent.
pub fn bbox(west: &str, east: &str, south: &str, north: &str) -> String {
    format!(
        r#"<gmd:extent><gmd:EX_Extent><gmd:geographicElement><gmd:EX_GeographicBoundingBox>
  <gmd:westBoundLongitude><gco:Decimal>{west}</gco:Decimal></gmd:westBoundLongitude>
  <gmd:eastBoundLongitude><gco:Decimal>{east}</gco:Decimal></gmd:eastBoundLongitude>
  <gmd:southBoundLatitude><gco:Decimal>{south}</gco:Decimal></gmd:southBoundLatitude>
  <gmd:northBoundLatitude><gco:Decimal>{north}</gco:Decimal></gmd:northBoundLatitude>
</gmd:EX_GeographicBoundingBox></gmd:geographicElement></gmd:EX_Extent></gmd:extent>"#
    )
}
