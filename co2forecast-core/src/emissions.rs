//! Scope 1 and Scope 3 emission estimates for production datapoints
//!
//! Conversion constants are expressed per kilogram CO2e; every estimate is
//! divided by the configured divisor so results come out in megatons.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::conversion::{ConversionCache, ConversionSet, GraphBuilder, ResolvedFactor};
use crate::error::{ConversionError, ForecastResult, MalformedInputError};
use crate::fuel::full_fuel_type;
use crate::types::{ConversionConstant, EmissionEstimate, Gwp, ProductionDatapoint, Triple};

/// Derives emission estimates from production volumes
#[derive(Debug, Clone)]
pub struct EmissionsCalculator {
    config: EngineConfig,
    builder: GraphBuilder,
    constants: Arc<Vec<ConversionConstant>>,
    set: Arc<ConversionSet>,
}

impl EmissionsCalculator {
    /// Calculator over an already built set for the default country
    pub fn new(
        config: EngineConfig,
        constants: Arc<Vec<ConversionConstant>>,
        set: Arc<ConversionSet>,
    ) -> Self {
        let builder = GraphBuilder::new(&config);
        Self {
            config,
            builder,
            constants,
            set,
        }
    }

    /// Calculator whose default set comes from (and is kept in) `cache`
    pub fn from_cache(
        config: EngineConfig,
        cache: &ConversionCache,
        constants: Arc<Vec<ConversionConstant>>,
        country: Option<&str>,
    ) -> Self {
        let set = cache.get_or_build(&constants, country);
        Self::new(config, constants, set)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Set used for datapoints without a country of their own
    pub fn conversion_set(&self) -> &Arc<ConversionSet> {
        &self.set
    }

    /// Scope 1 and Scope 3 estimate of one datapoint
    ///
    /// A Scope 1 failure is logged and leaves Scope 1 at zero. A Scope 3
    /// failure is returned as [`ConversionError::Scope3`].
    pub fn estimate(&self, datapoint: &ProductionDatapoint, gwp: Gwp) -> ForecastResult<EmissionEstimate> {
        let unit = datapoint
            .unit()
            .ok_or_else(|| MalformedInputError::MissingUnit {
                context: "production".to_string(),
                datapoint: format!("{:?}", datapoint),
            })?;

        let overridden;
        let set: &ConversionSet = match datapoint.country.as_deref() {
            Some(country) if Some(country) != self.set.country() => {
                overridden = self.builder.build(&self.constants, Some(country));
                &overridden
            }
            _ => &self.set,
        };

        let fuel = full_fuel_type(
            &datapoint.fossil_fuel_type,
            datapoint.subtype.as_deref(),
            &self.config.fuel_type_separator,
        );
        if set.graph(&fuel).is_none() {
            return Err(ConversionError::NoGraph { fuel }.into());
        }

        let scope1_unit = self.config.scope1_unit(gwp);
        let mut scope1 = match set.resolve(unit, &scope1_unit, &fuel) {
            Ok(resolved) => Some(resolved),
            Err(e) => {
                warn!("Scope 1 {} conversion error: {}", scope1_unit, e);
                None
            }
        };

        let scope3_unit = &self.config.scope3_unit;
        let scope3 = set
            .resolve(unit, scope3_unit, &fuel)
            .map_err(|e| ConversionError::Scope3 {
                fuel: fuel.clone(),
                unit: unit.to_string(),
                target: scope3_unit.clone(),
                source: Box::new(e),
            })?;

        let mut scope1_volume = datapoint.volume;
        if let Some(methane_m3_ton) = datapoint.methane_m3_ton.filter(|m| *m > 0.0) {
            let (volume, resolved) =
                self.sparse_scope1(set, datapoint, unit, methane_m3_ton, &scope1_unit);
            scope1_volume = volume;
            scope1 = resolved;
        }

        let divisor = self.config.emission_divisor;
        let scale = |volume: f64, resolved: Option<&ResolvedFactor>| -> Triple {
            match resolved {
                Some(r) => r.apply(volume).map(|v| v / divisor),
                None => [0.0; 3],
            }
        };

        Ok(EmissionEstimate {
            scope1: scale(scope1_volume, scope1.as_ref()),
            scope3: scale(datapoint.volume, Some(&scope3)),
        })
    }

    /// Methane-intensity Scope 1 for projects without direct measurements
    ///
    /// Returns the methane mass to apply the factor to, and the factor itself
    /// resolved in the configured sparse fuel graph.
    fn sparse_scope1(
        &self,
        set: &ConversionSet,
        datapoint: &ProductionDatapoint,
        unit: &str,
        methane_m3_ton: f64,
        scope1_unit: &str,
    ) -> (f64, Option<ResolvedFactor>) {
        let sparse = &self.config.sparse_scope1;
        let fuel = datapoint.fossil_fuel_type.as_str();

        let production_mass =
            set.convert_volume(datapoint.volume, unit, fuel, &sparse.production_mass_unit);
        let methane_volume = production_mass * methane_m3_ton;
        let methane_mass = set.convert_volume(
            methane_volume,
            &sparse.methane_volume_unit,
            fuel,
            &self.config.sparse_methane_target(),
        );

        let resolved = match set.resolve(&sparse.methane_mass_unit, scope1_unit, &sparse.fuel) {
            Ok(resolved) => Some(resolved),
            Err(e) => {
                warn!(
                    "Scope 1 {} project {} equivalent conversion error: {}",
                    scope1_unit, sparse.fuel, e
                );
                None
            }
        };

        debug!(
            volume = datapoint.volume,
            production_mass,
            methane_volume,
            methane_m3_ton,
            methane_mass,
            "Project specific Scope 1"
        );

        (methane_mass, resolved)
    }

    /// Production volume in the megaton unit, unchanged if it cannot be converted
    pub fn megatons(&self, datapoint: &ProductionDatapoint) -> f64 {
        match datapoint.unit() {
            Some(unit) => self.set.convert_volume(
                datapoint.volume,
                unit,
                &datapoint.fossil_fuel_type,
                &self.config.megaton_unit,
            ),
            None => datapoint.volume,
        }
    }
}
