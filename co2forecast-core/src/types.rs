use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifier of a data source (production, projection or reserves dataset)
pub type SourceId = u32;

/// Low, mid and high values of an uncertain quantity
pub type Triple = [f64; 3];

/// Index of the mid estimate in a [`Triple`]
pub const MID: usize = 1;

/// Global-warming-potential horizon used to weight non-CO2 gases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Gwp {
    /// 20-year horizon
    Gwp20,
    /// 100-year horizon
    #[default]
    Gwp100,
}

impl FromStr for Gwp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "20" | "gwp20" => Ok(Gwp::Gwp20),
            "100" | "gwp100" => Ok(Gwp::Gwp100),
            other => Err(format!("Unknown GWP horizon: {}", other)),
        }
    }
}

impl fmt::Display for Gwp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gwp::Gwp20 => write!(f, "GWP20"),
            Gwp::Gwp100 => write!(f, "GWP100"),
        }
    }
}

/// One pairwise conversion constant from the constants feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionConstant {
    pub from_unit: String,
    pub to_unit: String,
    /// `None` applies the constant to every fuel graph
    #[serde(default)]
    pub fossil_fuel_type: Option<String>,
    #[serde(default)]
    pub subtype: Option<String>,
    /// Appended to the destination unit when present
    #[serde(default)]
    pub modifier: Option<String>,
    pub factor: f64,
    #[serde(default)]
    pub low: Option<f64>,
    #[serde(default)]
    pub high: Option<f64>,
    /// `None` is the default used wherever no country-specific constant exists
    #[serde(default)]
    pub country: Option<String>,
}

impl ConversionConstant {
    /// Plain constant without subtype, modifier or country
    pub fn new(
        fuel: Option<&str>,
        from_unit: &str,
        to_unit: &str,
        factor: f64,
        low: Option<f64>,
        high: Option<f64>,
    ) -> Self {
        Self {
            from_unit: from_unit.to_string(),
            to_unit: to_unit.to_string(),
            fossil_fuel_type: fuel.map(str::to_string),
            subtype: None,
            modifier: None,
            factor,
            low,
            high,
            country: None,
        }
    }

    pub fn with_subtype(mut self, subtype: &str) -> Self {
        self.subtype = Some(subtype.to_string());
        self
    }

    pub fn with_modifier(mut self, modifier: &str) -> Self {
        self.modifier = Some(modifier.to_string());
        self
    }

    pub fn with_country(mut self, country: &str) -> Self {
        self.country = Some(country.to_string());
        self
    }

    /// Whether the constant is bound to a specific fuel
    pub fn is_fuel_specific(&self) -> bool {
        self.fossil_fuel_type
            .as_deref()
            .map_or(false, |fuel| !fuel.is_empty())
    }

    /// Graph node for the destination, `toUnit` plus an optional `|modifier`
    pub fn destination(&self, separator: &str) -> String {
        match self.modifier.as_deref() {
            Some(modifier) if !modifier.is_empty() => {
                format!("{}{}{}", self.to_unit, separator, modifier)
            }
            _ => self.to_unit.clone(),
        }
    }
}

/// A production, projection or stable-rate datapoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionDatapoint {
    pub volume: f64,
    /// Required; a missing unit is reported as malformed input
    #[serde(default)]
    pub unit: Option<String>,
    pub fossil_fuel_type: String,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub year: i32,
    #[serde(default)]
    pub source_id: SourceId,
    /// Methane intensity proxy for sparse projects
    #[serde(default)]
    pub methane_m3_ton: Option<f64>,
    /// Country whose conversion constants override the defaults
    #[serde(default)]
    pub country: Option<String>,
}

impl ProductionDatapoint {
    pub fn new(fuel: &str, volume: f64, unit: &str, year: i32, source_id: SourceId) -> Self {
        Self {
            volume,
            unit: Some(unit.to_string()),
            fossil_fuel_type: fuel.to_string(),
            subtype: None,
            year,
            source_id,
            methane_m3_ton: None,
            country: None,
        }
    }

    /// The unit, if present and non-empty
    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref().filter(|unit| !unit.is_empty())
    }
}

/// One entry of a reserves snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReserveEntry {
    pub source_id: SourceId,
    pub fossil_fuel_type: String,
    #[serde(default)]
    pub subtype: Option<String>,
    /// Two-character code, the second character is `p` (planned) or `c` (contingent)
    pub grade: String,
    pub year: i32,
    pub volume: f64,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl ReserveEntry {
    /// Reserve class encoded in the grade code
    pub fn class(&self) -> Option<ReserveClass> {
        ReserveClass::of_grade(&self.grade)
    }

    /// View the reserve volume as a datapoint so it can be estimated
    pub fn to_datapoint(&self) -> ProductionDatapoint {
        ProductionDatapoint {
            volume: self.volume,
            unit: self.unit.clone(),
            fossil_fuel_type: self.fossil_fuel_type.clone(),
            subtype: self.subtype.clone(),
            year: self.year,
            source_id: self.source_id,
            methane_m3_ton: None,
            country: self.country.clone(),
        }
    }
}

/// Reserve certainty category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReserveClass {
    Planned,
    Contingent,
}

impl ReserveClass {
    /// Class of a grade code such as `2p` or `1c`
    pub fn of_grade(grade: &str) -> Option<Self> {
        match grade.chars().nth(1) {
            Some('p') => Some(ReserveClass::Planned),
            Some('c') => Some(ReserveClass::Contingent),
            _ => None,
        }
    }
}

/// Data source metadata used for attribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    pub source_id: SourceId,
    pub name: String,
    #[serde(default)]
    pub name_pretty: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Scope 1 and Scope 3 emissions in megatons CO2e, each as low/mid/high
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EmissionEstimate {
    pub scope1: Triple,
    pub scope3: Triple,
}

impl EmissionEstimate {
    pub fn zero() -> Self {
        Self::default()
    }

    /// Every value multiplied by `k`
    pub fn scaled(&self, k: f64) -> Self {
        Self {
            scope1: self.scope1.map(|v| v * k),
            scope3: self.scope3.map(|v| v * k),
        }
    }

    /// Scope 1 plus Scope 3 mid value
    pub fn total_mid(&self) -> f64 {
        self.scope1[MID] + self.scope3[MID]
    }
}
