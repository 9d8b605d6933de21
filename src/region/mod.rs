//! Mapping from reverse-geocoded county names to police-district codes.
//!
//! The incident feed only accepts its own fixed district vocabulary, while
//! reverse geocoding returns free-text county names (including pre-2024
//! merged counties such as "Viken" or "Troms og Finnmark").

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Police districts accepted by the incident feed's `Districts` filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DistrictCode {
    Oslo,
    #[serde(rename = "Øst")]
    Ost,
    Innlandet,
    Agder,
    Vest,
    #[serde(rename = "Trøndelag")]
    Trondelag,
    Nordland,
    #[serde(rename = "SørØst")]
    SorOst,
    #[serde(rename = "SørVest")]
    SorVest,
    #[serde(rename = "MøreOgRomsdal")]
    MoreOgRomsdal,
    Troms,
    Finnmark,
}

impl DistrictCode {
    /// The identifier as sent to the incident feed
    pub fn as_api_str(&self) -> &'static str {
        match self {
            DistrictCode::Oslo => "Oslo",
            DistrictCode::Ost => "Øst",
            DistrictCode::Innlandet => "Innlandet",
            DistrictCode::Agder => "Agder",
            DistrictCode::Vest => "Vest",
            DistrictCode::Trondelag => "Trøndelag",
            DistrictCode::Nordland => "Nordland",
            DistrictCode::SorOst => "SørØst",
            DistrictCode::SorVest => "SørVest",
            DistrictCode::MoreOgRomsdal => "MøreOgRomsdal",
            DistrictCode::Troms => "Troms",
            DistrictCode::Finnmark => "Finnmark",
        }
    }
}

impl fmt::Display for DistrictCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_api_str())
    }
}

/// Built-in county table. Order matters for the substring fallback:
/// "Troms og Finnmark" must hit "Troms" before "Finnmark".
const COUNTY_TABLE: &[(&str, DistrictCode)] = &[
    ("Oslo", DistrictCode::Oslo),
    ("Viken", DistrictCode::Ost),
    ("Akershus", DistrictCode::Ost),
    ("Østfold", DistrictCode::Ost),
    ("Innlandet", DistrictCode::Innlandet),
    ("Agder", DistrictCode::Agder),
    ("Vestland", DistrictCode::Vest),
    ("Trøndelag", DistrictCode::Trondelag),
    ("Nordland", DistrictCode::Nordland),
    ("Vestfold og Telemark", DistrictCode::SorOst),
    ("Telemark", DistrictCode::SorOst),
    ("Vestfold", DistrictCode::SorOst),
    ("Buskerud", DistrictCode::SorOst),
    ("Rogaland", DistrictCode::SorVest),
    ("Møre og Romsdal", DistrictCode::MoreOgRomsdal),
    ("Troms", DistrictCode::Troms),
    ("Finnmark", DistrictCode::Finnmark),
    ("Troms og Finnmark", DistrictCode::Troms),
];

/// Outcome of a county lookup.
///
/// `Unresolved` carries the raw county name so the caller can still try it as
/// a best-effort filter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DistrictResolution {
    Resolved(DistrictCode),
    Unresolved(String),
}

impl DistrictResolution {
    /// Value to put in the incident feed's `Districts` parameter
    pub fn filter_value(&self) -> &str {
        match self {
            DistrictResolution::Resolved(code) => code.as_api_str(),
            DistrictResolution::Unresolved(raw) => raw,
        }
    }

    pub fn code(&self) -> Option<DistrictCode> {
        match self {
            DistrictResolution::Resolved(code) => Some(*code),
            DistrictResolution::Unresolved(_) => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, DistrictResolution::Resolved(_))
    }
}

/// County name → district lookup with optional configured overrides
#[derive(Debug, Clone)]
pub struct RegionMapper {
    entries: Vec<(String, DistrictCode)>,
}

impl Default for RegionMapper {
    fn default() -> Self {
        Self {
            entries: COUNTY_TABLE
                .iter()
                .map(|(county, code)| (county.to_string(), *code))
                .collect(),
        }
    }
}

impl RegionMapper {
    /// Built-in table with `overrides` placed in front, so they win both the
    /// exact and the substring phase.
    pub fn with_overrides(overrides: &BTreeMap<String, DistrictCode>) -> Self {
        let mut entries: Vec<(String, DistrictCode)> = overrides
            .iter()
            .map(|(county, code)| (county.clone(), *code))
            .collect();
        entries.extend(Self::default().entries);
        Self { entries }
    }

    /// Map a county name to its police district.
    ///
    /// 1. exact match against the table
    /// 2. first table key contained in `county`
    /// 3. otherwise the raw name, unresolved
    pub fn map_county_to_district(&self, county: &str) -> DistrictResolution {
        let county = county.trim();

        if let Some((_, code)) = self.entries.iter().find(|(key, _)| key == county) {
            return DistrictResolution::Resolved(*code);
        }

        if let Some((key, code)) = self
            .entries
            .iter()
            .find(|(key, _)| !key.is_empty() && county.contains(key.as_str()))
        {
            log::debug!("County '{}' matched district table key '{}'", county, key);
            return DistrictResolution::Resolved(*code);
        }

        log::warn!(
            "Could not map county '{}' to a police district, using it as-is",
            county
        );
        DistrictResolution::Unresolved(county.to_string())
    }
}

/// Query parameters for the incident feed, derived from the user's position
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncidentFilter {
    pub district: Option<String>,
    pub municipality: Option<String>,
}

impl IncidentFilter {
    /// Build a filter from a resolved (or unresolved) district and a municipality.
    ///
    /// With `strict` set, an unresolved district is left out of the filter
    /// instead of being passed through.
    pub fn new(
        district: Option<&DistrictResolution>,
        municipality: Option<&str>,
        strict: bool,
    ) -> Self {
        let district = district.and_then(|d| match d {
            DistrictResolution::Unresolved(_) if strict => None,
            DistrictResolution::Unresolved(raw) if raw.is_empty() => None,
            other => Some(other.filter_value().to_string()),
        });
        let municipality = municipality
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string);
        Self {
            district,
            municipality,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.district.is_none() && self.municipality.is_none()
    }

    /// Repeated query pairs in the form the incident feed expects
    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = Vec::new();
        if let Some(ref d) = self.district {
            pairs.push(("Districts", d.as_str()));
        }
        if let Some(ref m) = self.municipality {
            pairs.push(("Municipalities", m.as_str()));
        }
        pairs
    }
}
