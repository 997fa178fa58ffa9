use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::{Gwp, SourceId};

/// Tokens naming the two accepted global-warming-potential horizons
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GwpHorizons {
    /// 20-year horizon token
    pub gwp20: String,
    /// 100-year horizon token
    pub gwp100: String,
}

impl Default for GwpHorizons {
    fn default() -> Self {
        Self {
            gwp20: "GWP20".to_string(),
            gwp100: "GWP100".to_string(),
        }
    }
}

/// Units and fuel key used by the methane-intensity Scope 1 path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparseScope1Config {
    /// Mass unit the production volume is first converted to
    pub production_mass_unit: String,
    /// Volume unit of the derived methane quantity
    pub methane_volume_unit: String,
    /// Mass unit the methane factor is resolved from
    pub methane_mass_unit: String,
    /// Modifier tagging the methane mass edge
    pub methane_mass_modifier: String,
    /// Fuel graph the methane factor is resolved in
    pub fuel: String,
}

impl Default for SparseScope1Config {
    fn default() -> Self {
        Self {
            production_mass_unit: "e6ton".to_string(),
            methane_volume_unit: "e6m3".to_string(),
            methane_mass_unit: "e3ton".to_string(),
            methane_mass_modifier: "sparse-scope1".to_string(),
            fuel: "gas".to_string(),
        }
    }
}

/// Configuration for the conversion and estimation engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Base fuels that always get a conversion graph
    pub supported_fuels: Vec<String>,

    /// Separator used to build composite fuel and unit keys
    pub fuel_type_separator: String,

    /// Accepted GWP horizon tokens
    pub gwp_horizons: GwpHorizons,

    /// Scope 1 target unit before the GWP suffix is appended
    pub scope1_base_unit: String,

    /// Horizon-agnostic Scope 3 target unit
    pub scope3_unit: String,

    /// Methane-intensity path for sparse projects
    pub sparse_scope1: SparseScope1Config,

    /// Unit used for the megaton production figure of a project
    pub megaton_unit: String,

    /// Divisor turning kilograms into megatons
    pub emission_divisor: f64,

    /// Fuels whose year limits bound the production/projection gap
    pub allocation_fuels: Vec<String>,

    /// Planned-class grades, most preferred first
    pub planned_grade_preference: Vec<String>,

    /// Contingent-class grades, most preferred first
    pub contingent_grade_preference: Vec<String>,

    /// Production source counted as authoritative per fuel
    pub principal_production_source_ids: BTreeMap<String, SourceId>,

    /// Source id of the synthetic stable-production projection
    pub stable_production_source_id: SourceId,

    /// Display name of the stable-production scenario in forecast totals
    pub stable_production_name: String,

    /// Projects whose data ends before this year are not current
    pub min_current_project_year: i32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            supported_fuels: vec!["oil".to_string(), "gas".to_string(), "coal".to_string()],
            fuel_type_separator: "|".to_string(),
            gwp_horizons: GwpHorizons::default(),
            scope1_base_unit: "kgco2e".to_string(),
            scope3_unit: "kgco2e".to_string(),
            sparse_scope1: SparseScope1Config::default(),
            megaton_unit: "e9ton".to_string(),
            emission_divisor: 1e9,
            allocation_fuels: vec!["oil".to_string(), "gas".to_string()],
            planned_grade_preference: vec!["2p".to_string(), "1p".to_string(), "3p".to_string()],
            contingent_grade_preference: vec![
                "2c".to_string(),
                "1c".to_string(),
                "3c".to_string(),
            ],
            principal_production_source_ids: BTreeMap::new(),
            stable_production_source_id: 100,
            stable_production_name: "Stable production".to_string(),
            min_current_project_year: 2015,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from TOML text and validate it
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Reject settings the engine cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fuel_type_separator.is_empty() {
            return Err(ConfigError::Invalid(
                "fuel_type_separator must not be empty".to_string(),
            ));
        }
        if self.supported_fuels.is_empty() {
            return Err(ConfigError::Invalid(
                "supported_fuels must list at least one fuel".to_string(),
            ));
        }
        if self.gwp_horizons.gwp20 == self.gwp_horizons.gwp100 {
            return Err(ConfigError::Invalid(format!(
                "GWP horizon tokens must differ, both are {}",
                self.gwp_horizons.gwp20
            )));
        }
        if !(self.emission_divisor > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "emission_divisor must be positive, got {}",
                self.emission_divisor
            )));
        }
        Ok(())
    }

    /// Token for the given GWP horizon
    pub fn gwp_token(&self, gwp: Gwp) -> &str {
        match gwp {
            Gwp::Gwp20 => &self.gwp_horizons.gwp20,
            Gwp::Gwp100 => &self.gwp_horizons.gwp100,
        }
    }

    /// Scope 1 target unit for the given horizon, e.g. `kgco2e|GWP100`
    pub fn scope1_unit(&self, gwp: Gwp) -> String {
        format!(
            "{}{}{}",
            self.scope1_base_unit,
            self.fuel_type_separator,
            self.gwp_token(gwp)
        )
    }

    /// Destination node of the methane mass edge, e.g. `e3ton|sparse-scope1`
    pub fn sparse_methane_target(&self) -> String {
        format!(
            "{}{}{}",
            self.sparse_scope1.methane_mass_unit,
            self.fuel_type_separator,
            self.sparse_scope1.methane_mass_modifier
        )
    }
}
