//! Unit conversion graphs
//!
//! One [`ConversionGraph`] and one [`ConversionTable`] per full fuel type,
//! built from the flat constants feed by [`GraphBuilder`] and queried through
//! [`FactorResolver`]. A built [`ConversionSet`] is immutable; a change of
//! country or constants produces a new set.

pub mod builder;
pub mod cache;
pub mod graph;
pub mod resolver;
pub mod table;

use std::collections::HashMap;

pub use builder::GraphBuilder;
pub use cache::{CacheKey, ConversionCache};
pub use graph::ConversionGraph;
pub use resolver::{ConversionPathLog, FactorResolver, ResolvedFactor};
pub use table::{ConversionTable, EdgeFactor};

use crate::error::ConversionError;
use crate::fuel::FuelRegistry;

/// Graph and table of one full fuel type
#[derive(Debug, Clone, Default)]
pub struct FuelConversions {
    pub graph: ConversionGraph,
    pub table: ConversionTable,
}

/// Every fuel's graph and table for one country context
#[derive(Debug, Default)]
pub struct ConversionSet {
    country: Option<String>,
    fuels: FuelRegistry,
    by_fuel: HashMap<String, FuelConversions>,
    path_log: ConversionPathLog,
}

impl ConversionSet {
    pub(crate) fn new(
        country: Option<String>,
        fuels: FuelRegistry,
        by_fuel: HashMap<String, FuelConversions>,
    ) -> Self {
        Self {
            country,
            fuels,
            by_fuel,
            path_log: ConversionPathLog::default(),
        }
    }

    /// Country the overrides were resolved for
    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }

    /// Registered fuel types, base fuels first
    pub fn fuels(&self) -> &FuelRegistry {
        &self.fuels
    }

    pub fn conversions(&self, fuel: &str) -> Option<&FuelConversions> {
        self.by_fuel.get(fuel)
    }

    pub fn graph(&self, fuel: &str) -> Option<&ConversionGraph> {
        self.by_fuel.get(fuel).map(|c| &c.graph)
    }

    pub fn table(&self, fuel: &str) -> Option<&ConversionTable> {
        self.by_fuel.get(fuel).map(|c| &c.table)
    }

    /// Diagnostic log of resolved paths
    pub fn path_log(&self) -> &ConversionPathLog {
        &self.path_log
    }

    pub fn resolver(&self) -> FactorResolver<'_> {
        FactorResolver::new(self)
    }

    /// Compose the factor from `from` to `to` along the shortest path
    pub fn resolve(&self, from: &str, to: &str, fuel: &str) -> Result<ResolvedFactor, ConversionError> {
        self.resolver().resolve(from, to, fuel)
    }

    /// Convert a volume, returning it unchanged when no conversion exists
    pub fn convert_volume(&self, volume: f64, unit: &str, fuel: &str, to_unit: &str) -> f64 {
        self.resolver().convert_volume(volume, unit, fuel, to_unit)
    }

    /// Factor of the single edge `from > to`
    pub fn direct_factor(&self, from: &str, to: &str, fuel: &str) -> Result<&EdgeFactor, ConversionError> {
        self.resolver().direct_factor(from, to, fuel)
    }
}
