//! Namespace definitions for ISO 19139 input and DCAT-AP output.
//!
//! Input prefixes are held in a [`NamespaceRegistry`] that is passed explicitly
//! to the path compiler. Output namespaces, classes and properties are plain
//! constants following the DCAT-AP 2 and GeoDCAT-AP 2 vocabularies.

use indexmap::IndexMap;

use crate::error::{ConversionError, Result};

/// ISO 19139 geographic metadata (`gmd`).
pub const GMD: &str = "http://www.isotc211.org/2005/gmd";
/// ISO 19139 basic types (`gco`).
pub const GCO: &str = "http://www.isotc211.org/2005/gco";
/// ISO 19139 extended types (`gmx`).
pub const GMX: &str = "http://www.isotc211.org/2005/gmx";
/// ISO 19139 services (`srv`).
pub const SRV: &str = "http://www.isotc211.org/2005/srv";
/// ISO 19139 temporal schema (`gts`).
pub const GTS: &str = "http://www.isotc211.org/2005/gts";
/// ISO 19139 spatial referencing (`gsr`).
pub const GSR: &str = "http://www.isotc211.org/2005/gsr";
/// ISO 19139 spatial schema (`gss`).
pub const GSS: &str = "http://www.isotc211.org/2005/gss";
/// ISO 19139-2 imagery extension (`gmi`).
pub const GMI: &str = "http://www.isotc211.org/2005/gmi";
/// GML 3.2.
pub const GML32: &str = "http://www.opengis.net/gml/3.2";
/// GML 3.1, still common in older records.
pub const GML31: &str = "http://www.opengis.net/gml";
/// `XLink`.
pub const XLINK: &str = "http://www.w3.org/1999/xlink";
/// XML Schema instance.
pub const XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// DCAT namespace.
pub const DCAT: &str = "http://www.w3.org/ns/dcat#";
/// DCMI terms namespace.
pub const DCT: &str = "http://purl.org/dc/terms/";
/// FOAF namespace.
pub const FOAF: &str = "http://xmlns.com/foaf/0.1/";
/// vCard namespace.
pub const VCARD: &str = "http://www.w3.org/2006/vcard/ns#";
/// ADMS namespace.
pub const ADMS: &str = "http://www.w3.org/ns/adms#";
/// ISA Core Location namespace.
pub const LOCN: &str = "http://www.w3.org/ns/locn#";
/// SKOS namespace.
pub const SKOS: &str = "http://www.w3.org/2004/02/skos/core#";
/// RDF namespace.
pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
/// RDF Schema namespace.
pub const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";
/// XML Schema datatypes namespace.
pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";
/// `GeoSPARQL` namespace.
pub const GSP: &str = "http://www.opengis.net/ont/geosparql#";
/// PROV-O namespace.
pub const PROV: &str = "http://www.w3.org/ns/prov#";
/// OWL namespace.
pub const OWL: &str = "http://www.w3.org/2002/07/owl#";

/// Prefixes declared in Turtle and RDF/XML output, in declaration order.
pub const OUTPUT_PREFIXES: &[(&str, &str)] = &[
    ("rdf", RDF),
    ("rdfs", RDFS),
    ("dcat", DCAT),
    ("dct", DCT),
    ("foaf", FOAF),
    ("vcard", VCARD),
    ("adms", ADMS),
    ("locn", LOCN),
    ("skos", SKOS),
    ("xsd", XSD),
    ("gsp", GSP),
    ("prov", PROV),
    ("owl", OWL),
];

/// Expands a CURIE such as `dct:title` using [`OUTPUT_PREFIXES`].
///
/// Values that already look like absolute IRIs are returned unchanged.
///
/// # Errors
///
/// Returns [`ConversionError::Configuration`] for an unknown prefix.
pub fn expand_curie(value: &str) -> Result<String> {
    if value.contains("://") || value.starts_with("urn:") || value.starts_with("mailto:") {
        return Ok(value.to_string());
    }
    let (prefix, local) = value.split_once(':').ok_or_else(|| {
        ConversionError::Configuration(format!("'{value}' is neither an IRI nor a CURIE"))
    })?;
    OUTPUT_PREFIXES
        .iter()
        .find(|(p, _)| *p == prefix)
        .map(|(_, ns)| format!("{ns}{local}"))
        .ok_or_else(|| ConversionError::Configuration(format!("unknown output prefix '{prefix}'")))
}

/// Registry of the input prefixes allowed in path expressions.
///
/// A prefix may bind to several namespace URIs; an element matches the prefix
/// when its namespace is any of them.
#[derive(Debug, Clone)]
pub struct NamespaceRegistry {
    bindings: IndexMap<String, Vec<String>>,
}

impl Default for NamespaceRegistry {
    fn default() -> Self {
        Self::iso19139()
    }
}

impl NamespaceRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            bindings: IndexMap::new(),
        }
    }

    /// Creates the registry of ISO 19139 prefixes.
    #[must_use]
    pub fn iso19139() -> Self {
        let mut registry = Self::empty();
        registry.bind("gmd", GMD);
        registry.bind("gco", GCO);
        registry.bind("gmx", GMX);
        registry.bind("srv", SRV);
        registry.bind("gts", GTS);
        registry.bind("gsr", GSR);
        registry.bind("gss", GSS);
        registry.bind("gmi", GMI);
        registry.bind("gml", GML32);
        registry.bind("gml", GML31);
        registry.bind("xlink", XLINK);
        registry.bind("xsi", XSI);
        registry
    }

    /// Binds `prefix` to an additional namespace URI.
    pub fn bind(&mut self, prefix: impl Into<String>, uri: impl Into<String>) {
        let uri = uri.into();
        let uris = self.bindings.entry(prefix.into()).or_default();
        if !uris.contains(&uri) {
            uris.push(uri);
        }
    }

    /// Returns the namespace URIs bound to `prefix`.
    #[must_use]
    pub fn lookup(&self, prefix: &str) -> Option<&[String]> {
        self.bindings.get(prefix).map(Vec::as_slice)
    }

    /// Returns true if `prefix` is known.
    #[must_use]
    pub fn contains(&self, prefix: &str) -> bool {
        self.bindings.contains_key(prefix)
    }
}

/// DCAT-AP class IRIs.
pub mod classes {
    /// `dcat:Dataset`.
    pub const DATASET: &str = "http://www.w3.org/ns/dcat#Dataset";
    /// `dcat:Distribution`.
    pub const DISTRIBUTION: &str = "http://www.w3.org/ns/dcat#Distribution";
    /// `dcat:CatalogRecord`.
    pub const CATALOG_RECORD: &str = "http://www.w3.org/ns/dcat#CatalogRecord";
    /// `vcard:Kind`.
    pub const VCARD_KIND: &str = "http://www.w3.org/2006/vcard/ns#Kind";
    /// `foaf:Agent`.
    pub const AGENT: &str = "http://xmlns.com/foaf/0.1/Agent";
    /// `dct:Location`.
    pub const LOCATION: &str = "http://purl.org/dc/terms/Location";
    /// `dct:PeriodOfTime`.
    pub const PERIOD_OF_TIME: &str = "http://purl.org/dc/terms/PeriodOfTime";
    /// `dct:ProvenanceStatement`.
    pub const PROVENANCE_STATEMENT: &str = "http://purl.org/dc/terms/ProvenanceStatement";
    /// `dct:RightsStatement`.
    pub const RIGHTS_STATEMENT: &str = "http://purl.org/dc/terms/RightsStatement";
    /// `prov:Attribution`.
    pub const ATTRIBUTION: &str = "http://www.w3.org/ns/prov#Attribution";
}

/// DCAT-AP property IRIs.
pub mod properties {
    /// `rdf:type`.
    pub const TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
    /// `rdfs:label`.
    pub const LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";
    /// `dct:title`.
    pub const TITLE: &str = "http://purl.org/dc/terms/title";
    /// `dct:description`.
    pub const DESCRIPTION: &str = "http://purl.org/dc/terms/description";
    /// `dct:identifier`.
    pub const IDENTIFIER: &str = "http://purl.org/dc/terms/identifier";
    /// `dct:issued`.
    pub const ISSUED: &str = "http://purl.org/dc/terms/issued";
    /// `dct:modified`.
    pub const MODIFIED: &str = "http://purl.org/dc/terms/modified";
    /// `dct:created`.
    pub const CREATED: &str = "http://purl.org/dc/terms/created";
    /// `dct:language`.
    pub const LANGUAGE: &str = "http://purl.org/dc/terms/language";
    /// `dct:type`.
    pub const DC_TYPE: &str = "http://purl.org/dc/terms/type";
    /// `dct:accrualPeriodicity`.
    pub const ACCRUAL_PERIODICITY: &str = "http://purl.org/dc/terms/accrualPeriodicity";
    /// `dct:spatial`.
    pub const SPATIAL: &str = "http://purl.org/dc/terms/spatial";
    /// `dct:temporal`.
    pub const TEMPORAL: &str = "http://purl.org/dc/terms/temporal";
    /// `dct:provenance`.
    pub const PROVENANCE: &str = "http://purl.org/dc/terms/provenance";
    /// `dct:publisher`.
    pub const PUBLISHER: &str = "http://purl.org/dc/terms/publisher";
    /// `dct:creator`.
    pub const CREATOR: &str = "http://purl.org/dc/terms/creator";
    /// `dct:rightsHolder`.
    pub const RIGHTS_HOLDER: &str = "http://purl.org/dc/terms/rightsHolder";
    /// `dct:format`.
    pub const FORMAT: &str = "http://purl.org/dc/terms/format";
    /// `dct:rights`.
    pub const RIGHTS: &str = "http://purl.org/dc/terms/rights";
    /// `dcat:keyword`.
    pub const KEYWORD: &str = "http://www.w3.org/ns/dcat#keyword";
    /// `dcat:theme`.
    pub const THEME: &str = "http://www.w3.org/ns/dcat#theme";
    /// `dcat:distribution`.
    pub const DISTRIBUTION: &str = "http://www.w3.org/ns/dcat#distribution";
    /// `dcat:accessURL`.
    pub const ACCESS_URL: &str = "http://www.w3.org/ns/dcat#accessURL";
    /// `dcat:contactPoint`.
    pub const CONTACT_POINT: &str = "http://www.w3.org/ns/dcat#contactPoint";
    /// `dcat:bbox`.
    pub const BBOX: &str = "http://www.w3.org/ns/dcat#bbox";
    /// `dcat:startDate`.
    pub const START_DATE: &str = "http://www.w3.org/ns/dcat#startDate";
    /// `dcat:endDate`.
    pub const END_DATE: &str = "http://www.w3.org/ns/dcat#endDate";
    /// `dcat:spatialResolutionInMeters`.
    pub const SPATIAL_RESOLUTION: &str = "http://www.w3.org/ns/dcat#spatialResolutionInMeters";
    /// `adms:representationTechnique`.
    pub const REPRESENTATION_TECHNIQUE: &str = "http://www.w3.org/ns/adms#representationTechnique";
    /// `prov:qualifiedAttribution`.
    pub const QUALIFIED_ATTRIBUTION: &str = "http://www.w3.org/ns/prov#qualifiedAttribution";
    /// `prov:agent`.
    pub const PROV_AGENT: &str = "http://www.w3.org/ns/prov#agent";
    /// `dcat:hadRole`.
    pub const HAD_ROLE: &str = "http://www.w3.org/ns/dcat#hadRole";
    /// `foaf:primaryTopic`.
    pub const PRIMARY_TOPIC: &str = "http://xmlns.com/foaf/0.1/primaryTopic";
    /// `foaf:name`.
    pub const FOAF_NAME: &str = "http://xmlns.com/foaf/0.1/name";
    /// `vcard:fn`.
    pub const VCARD_FN: &str = "http://www.w3.org/2006/vcard/ns#fn";
    /// `vcard:organization-name`.
    pub const VCARD_ORGANIZATION: &str = "http://www.w3.org/2006/vcard/ns#organization-name";
    /// `vcard:hasEmail`.
    pub const VCARD_EMAIL: &str = "http://www.w3.org/2006/vcard/ns#hasEmail";
    /// `vcard:hasURL`.
    pub const VCARD_URL: &str = "http://www.w3.org/2006/vcard/ns#hasURL";
}

/// XML Schema datatype IRIs.
pub mod datatypes {
    /// `xsd:date`.
    pub const DATE: &str = "http://www.w3.org/2001/XMLSchema#date";
    /// `xsd:dateTime`.
    pub const DATE_TIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";
    /// `xsd:gYear`.
    pub const G_YEAR: &str = "http://www.w3.org/2001/XMLSchema#gYear";
    /// `xsd:gYearMonth`.
    pub const G_YEAR_MONTH: &str = "http://www.w3.org/2001/XMLSchema#gYearMonth";
    /// `xsd:decimal`.
    pub const DECIMAL: &str = "http://www.w3.org/2001/XMLSchema#decimal";
    /// `gsp:wktLiteral`.
    pub const WKT_LITERAL: &str = "http://www.opengis.net/ont/geosparql#wktLiteral";
}
