use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use super::{ConversionSet, EdgeFactor, FuelConversions};
use crate::config::EngineConfig;
use crate::fuel::{full_fuel_type, FuelRegistry};
use crate::types::ConversionConstant;

/// Identity of a constant for override purposes; the country is not part of it
type OverrideKey<'a> = (
    Option<&'a str>,
    &'a str,
    &'a str,
    Option<&'a str>,
    Option<&'a str>,
);

fn override_key(c: &ConversionConstant) -> OverrideKey<'_> {
    (
        c.fossil_fuel_type.as_deref(),
        c.from_unit.as_str(),
        c.to_unit.as_str(),
        c.subtype.as_deref(),
        c.modifier.as_deref(),
    )
}

/// Builds one graph and table per full fuel type from the constants feed
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    separator: String,
    base_fuels: Vec<String>,
}

impl GraphBuilder {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            separator: config.fuel_type_separator.clone(),
            base_fuels: config.supported_fuels.clone(),
        }
    }

    /// Build graphs and tables for the active country
    ///
    /// Constants tagged for another country are dropped. A default constant is
    /// dropped when the active country has a constant with the same fuel, units,
    /// subtype and modifier. Fuel-agnostic constants join every fuel's graph.
    pub fn build(&self, constants: &[ConversionConstant], country: Option<&str>) -> ConversionSet {
        let mut fuels = FuelRegistry::with_base(self.base_fuels.iter().cloned());
        fuels.extend_from_constants(constants, &self.separator);

        let applicable = self.resolve_overrides(constants, country);

        let mut by_fuel = HashMap::with_capacity(fuels.len());
        for fuel in fuels.iter() {
            let conversions = self.build_fuel(fuel, &applicable);
            debug!(
                "Built conversion graph for {} ({} units, {} edges)",
                fuel,
                conversions.graph.node_count(),
                conversions.graph.edge_count()
            );
            by_fuel.insert(fuel.to_string(), conversions);
        }

        ConversionSet::new(country.map(str::to_string), fuels, by_fuel)
    }

    /// Constants that survive country filtering and shadowing, in feed order
    fn resolve_overrides<'a>(
        &self,
        constants: &'a [ConversionConstant],
        country: Option<&str>,
    ) -> Vec<&'a ConversionConstant> {
        let shadowed: HashSet<OverrideKey<'a>> = match country {
            Some(active) => constants
                .iter()
                .filter(|c| c.country.as_deref() == Some(active))
                .map(override_key)
                .collect(),
            None => HashSet::new(),
        };

        constants
            .iter()
            .filter(|c| match c.country.as_deref() {
                Some(tagged) => Some(tagged) == country,
                None => !shadowed.contains(&override_key(c)),
            })
            .collect()
    }

    fn build_fuel(&self, fuel: &str, applicable: &[&ConversionConstant]) -> FuelConversions {
        let mut conversions = FuelConversions::default();

        for constant in applicable {
            let applies = match constant.fossil_fuel_type.as_deref() {
                Some(base) if !base.is_empty() => {
                    full_fuel_type(base, constant.subtype.as_deref(), &self.separator) == fuel
                }
                _ => true,
            };
            if !applies {
                continue;
            }

            let to = constant.destination(&self.separator);
            conversions.graph.add_edge(&constant.from_unit, &to);
            let replaced = conversions.table.insert(
                &constant.from_unit,
                &to,
                EdgeFactor::from_constant(constant),
            );
            if replaced.is_some() {
                warn!(
                    "Duplicate conversion {} > {} for {}, keeping the later constant",
                    constant.from_unit, to, fuel
                );
            }
        }

        conversions
    }
}
