use std::fmt;
use std::str::FromStr;

use super::GeoPoint;

/// The three facility layers shown on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FacilityKind {
    Shelter,
    PoliceStation,
    Hospital,
}

impl FacilityKind {
    pub const ALL: [FacilityKind; 3] = [
        FacilityKind::Shelter,
        FacilityKind::PoliceStation,
        FacilityKind::Hospital,
    ];

    /// Layer name used for rendering and GeoJSON export
    pub fn layer_name(&self) -> &'static str {
        match self {
            FacilityKind::Shelter => "shelters",
            FacilityKind::PoliceStation => "police-stations",
            FacilityKind::Hospital => "hospitals",
        }
    }
}

impl fmt::Display for FacilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FacilityKind::Shelter => "shelter",
            FacilityKind::PoliceStation => "police",
            FacilityKind::Hospital => "hospital",
        };
        f.write_str(name)
    }
}

/// Identifies one facility within its layer, as carried by a click event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FacilityRef {
    pub kind: FacilityKind,
    pub id: i64,
}

impl FacilityRef {
    pub fn new(kind: FacilityKind, id: i64) -> Self {
        Self { kind, id }
    }
}

impl FromStr for FacilityRef {
    type Err = String;

    /// Parses `kind:id`, e.g. `shelter:42`, `police:3`, `hospital:7`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s
            .split_once(':')
            .ok_or_else(|| format!("expected KIND:ID, got '{}'", s))?;
        let kind = match kind.trim().to_lowercase().as_str() {
            "shelter" => FacilityKind::Shelter,
            "police" | "police-station" => FacilityKind::PoliceStation,
            "hospital" => FacilityKind::Hospital,
            other => return Err(format!("unknown facility kind '{}'", other)),
        };
        let id = id
            .trim()
            .parse()
            .map_err(|_| format!("invalid facility id '{}'", id))?;
        Ok(Self { kind, id })
    }
}

/// Anything with an id and a position that can be ranked by distance.
pub trait Facility {
    fn id(&self) -> i64;
    fn location(&self) -> GeoPoint;
}

/// A civil-defense shelter.
///
/// `coverage_ratio` is capacity as a percentage of the population in the
/// service area, and may exceed 100.
#[derive(Debug, Clone, PartialEq)]
pub struct Shelter {
    pub id: i64,
    pub location: GeoPoint,
    pub address: String,
    pub capacity: i64,
    pub population_served: Option<i64>,
    pub coverage_ratio: Option<f64>,
}

impl Shelter {
    /// Capacity does not cover the population of its service area
    pub fn is_under_provisioned(&self) -> bool {
        self.coverage_ratio.is_some_and(|r| r < 100.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PoliceStation {
    pub id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub location: GeoPoint,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hospital {
    pub id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub location: GeoPoint,
}

impl Facility for Shelter {
    fn id(&self) -> i64 {
        self.id
    }
    fn location(&self) -> GeoPoint {
        self.location
    }
}

impl Facility for PoliceStation {
    fn id(&self) -> i64 {
        self.id
    }
    fn location(&self) -> GeoPoint {
        self.location
    }
}

impl Facility for Hospital {
    fn id(&self) -> i64 {
        self.id
    }
    fn location(&self) -> GeoPoint {
        self.location
    }
}
