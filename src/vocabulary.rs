//! Controlled-vocabulary tables.
//!
//! A [`VocabularyTable`] maps ISO 19139 code-list values to DCAT-AP / INSPIRE /
//! EU authority IRIs. Tables are validated when built (every target must be an
//! absolute IRI) and are read-only afterwards, so a [`Vocabularies`] set can be
//! shared by any number of concurrent conversions.

use indexmap::IndexMap;
use oxrdf::NamedNode;

use crate::error::{ConversionError, Result};

const INSPIRE_CODELIST: &str = "http://inspire.ec.europa.eu/metadata-codelist/";
const EU_AUTHORITY: &str = "http://publications.europa.eu/resource/authority/";

/// A single code → IRI table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabularyTable {
    name: String,
    entries: IndexMap<String, String>,
    /// ASCII-lowercased code → IRI, first entry wins.
    folded: IndexMap<String, String>,
}

impl VocabularyTable {
    /// Builds a table, validating every code and target IRI.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::Configuration`] for a blank code or a target
    /// that is not an absolute IRI.
    pub fn new<I, K, V>(name: impl Into<String>, entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let name = name.into();
        let mut table = IndexMap::new();
        let mut folded = IndexMap::new();
        for (code, iri) in entries {
            let code = code.into();
            let iri = iri.into();
            if code.trim().is_empty() {
                return Err(ConversionError::Configuration(format!(
                    "vocabulary '{name}' contains a blank code"
                )));
            }
            NamedNode::new(iri.as_str()).map_err(|e| {
                ConversionError::Configuration(format!(
                    "vocabulary '{name}': '{iri}' for code '{code}' is not an IRI: {e}"
                ))
            })?;
            folded
                .entry(code.to_ascii_lowercase())
                .or_insert_with(|| iri.clone());
            table.insert(code, iri);
        }
        Ok(Self {
            name,
            entries: table,
            folded,
        })
    }

    /// The table name rules refer to.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Looks up a code: exact match first, then ASCII case-insensitive.
    #[must_use]
    pub fn lookup(&self, code: &str) -> Option<&str> {
        let code = code.trim();
        self.entries
            .get(code)
            .or_else(|| self.folded.get(&code.to_ascii_lowercase()))
            .map(String::as_str)
    }

    /// Number of codes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the table has no codes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(code, iri)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// A named set of vocabulary tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabularies {
    tables: IndexMap<String, VocabularyTable>,
}

impl Vocabularies {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a table.
    pub fn insert(&mut self, table: VocabularyTable) {
        self.tables.insert(table.name.clone(), table);
    }

    /// Returns the table called `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&VocabularyTable> {
        self.tables.get(name)
    }

    /// Returns true if a table called `name` exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Table names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Consumes the set, yielding its tables in insertion order.
    pub fn into_tables(self) -> impl Iterator<Item = VocabularyTable> {
        self.tables.into_values()
    }

    /// Builds a set from a plain `name → (code → iri)` map, validating it.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::Configuration`] if any table is invalid.
    pub fn from_map(raw: IndexMap<String, IndexMap<String, String>>) -> Result<Self> {
        let mut set = Self::new();
        for (name, entries) in raw {
            set.insert(VocabularyTable::new(name, entries)?);
        }
        Ok(set)
    }

    /// The built-in GeoDCAT-AP tables.
    ///
    /// # Errors
    ///
    /// Only fails if a built-in table is malformed.
    pub fn geodcat_ap() -> Result<Self> {
        let mut set = Self::new();
        set.insert(suffix_table(
            "topic_category",
            &format!("{INSPIRE_CODELIST}TopicCategory/"),
            &[
                "farming",
                "biota",
                "boundaries",
                "climatologyMeteorologyAtmosphere",
                "economy",
                "elevation",
                "environment",
                "geoscientificInformation",
                "health",
                "imageryBaseMapsEarthCover",
                "intelligenceMilitary",
                "inlandWaters",
                "location",
                "oceans",
                "planningCadastre",
                "society",
                "structure",
                "transportation",
                "utilitiesCommunication",
            ],
        )?);
        set.insert(suffix_table(
            "resource_type",
            &format!("{INSPIRE_CODELIST}ResourceType/"),
            &["dataset", "series", "service"],
        )?);
        set.insert(suffix_table(
            "spatial_representation",
            &format!("{INSPIRE_CODELIST}SpatialRepresentationType/"),
            &["vector", "grid", "textTable", "tin", "stereoModel", "video"],
        )?);
        set.insert(suffix_table(
            "role",
            &format!("{INSPIRE_CODELIST}ResponsiblePartyRole/"),
            &[
                "resourceProvider",
                "custodian",
                "owner",
                "user",
                "distributor",
                "originator",
                "pointOfContact",
                "principalInvestigator",
                "processor",
                "publisher",
                "author",
            ],
        )?);
        set.insert(mapped_table(
            "language",
            &format!("{EU_AUTHORITY}language/"),
            &[
                ("eng", "ENG"),
                ("en", "ENG"),
                ("fre", "FRA"),
                ("fra", "FRA"),
                ("fr", "FRA"),
                ("ger", "DEU"),
                ("deu", "DEU"),
                ("de", "DEU"),
                ("spa", "SPA"),
                ("es", "SPA"),
                ("ita", "ITA"),
                ("it", "ITA"),
                ("dut", "NLD"),
                ("nld", "NLD"),
                ("nl", "NLD"),
                ("por", "POR"),
                ("pol", "POL"),
                ("swe", "SWE"),
                ("dan", "DAN"),
                ("fin", "FIN"),
                ("cze", "CES"),
                ("ces", "CES"),
                ("gre", "ELL"),
                ("ell", "ELL"),
                ("hun", "HUN"),
                ("rum", "RON"),
                ("ron", "RON"),
                ("slo", "SLK"),
                ("slk", "SLK"),
                ("slv", "SLV"),
                ("est", "EST"),
                ("lav", "LAV"),
                ("lit", "LIT"),
                ("bul", "BUL"),
                ("hrv", "HRV"),
                ("gle", "GLE"),
                ("mlt", "MLT"),
                ("nor", "NOR"),
                ("ice", "ISL"),
                ("isl", "ISL"),
            ],
        )?);
        set.insert(mapped_table(
            "frequency",
            &format!("{EU_AUTHORITY}frequency/"),
            &[
                ("continual", "CONT"),
                ("daily", "DAILY"),
                ("weekly", "WEEKLY"),
                ("fortnightly", "BIWEEKLY"),
                ("monthly", "MONTHLY"),
                ("quarterly", "QUARTERLY"),
                ("biannually", "ANNUAL_2"),
                ("annually", "ANNUAL"),
                ("asNeeded", "IRREG"),
                ("irregular", "IRREG"),
                ("notPlanned", "NEVER"),
                ("unknown", "UNKNOWN"),
            ],
        )?);
        set.insert(mapped_table(
            "format",
            &format!("{EU_AUTHORITY}file-type/"),
            &[
                ("ESRI Shapefile", "SHP"),
                ("Shapefile", "SHP"),
                ("SHP", "SHP"),
                ("GML", "GML"),
                ("GeoJSON", "GEOJSON"),
                ("KML", "KML"),
                ("CSV", "CSV"),
                ("GeoTIFF", "TIFF"),
                ("TIFF", "TIFF"),
                ("GeoPackage", "GPKG"),
                ("JSON", "JSON"),
                ("XML", "XML"),
                ("PDF", "PDF"),
                ("ZIP", "ZIP"),
                ("NetCDF", "NETCDF"),
                ("WMS", "WMS_SRVC"),
                ("WFS", "WFS_SRVC"),
            ],
        )?);
        Ok(set)
    }
}

fn suffix_table(name: &str, base: &str, codes: &[&str]) -> Result<VocabularyTable> {
    VocabularyTable::new(
        name,
        codes.iter().map(|code| (*code, format!("{base}{code}"))),
    )
}

fn mapped_table(name: &str, base: &str, codes: &[(&str, &str)]) -> Result<VocabularyTable> {
    VocabularyTable::new(
        name,
        codes
            .iter()
            .map(|(code, target)| (*code, format!("{base}{target}"))),
    )
}
