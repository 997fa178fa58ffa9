//! Runtime registry of fully qualified fuel types
//!
//! The base fuels come from configuration. Subtypes such as `gas|sparse`
//! are discovered from the constants feed and appended in the order they
//! are first seen.

use std::collections::HashSet;

use crate::types::ConversionConstant;

/// Combine a fuel and an optional subtype into the key graphs are partitioned by
pub fn full_fuel_type(fuel: &str, subtype: Option<&str>, separator: &str) -> String {
    match subtype {
        Some(subtype) if !subtype.is_empty() => format!("{}{}{}", fuel, separator, subtype),
        _ => fuel.to_string(),
    }
}

/// Ordered set of full fuel types
#[derive(Debug, Clone, Default)]
pub struct FuelRegistry {
    fuels: Vec<String>,
    index: HashSet<String>,
}

impl FuelRegistry {
    /// Registry seeded with the always-supported base fuels
    pub fn with_base<I, S>(fuels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut registry = Self::default();
        for fuel in fuels {
            registry.register(fuel);
        }
        registry
    }

    /// Append a fuel type if it is new; returns whether it was added
    pub fn register(&mut self, fuel: impl Into<String>) -> bool {
        let fuel = fuel.into();
        if self.index.contains(&fuel) {
            return false;
        }
        self.index.insert(fuel.clone());
        self.fuels.push(fuel);
        true
    }

    /// Register every full fuel type named by a fuel-specific constant
    pub fn extend_from_constants(&mut self, constants: &[ConversionConstant], separator: &str) {
        for constant in constants {
            let Some(fuel) = constant.fossil_fuel_type.as_deref().filter(|f| !f.is_empty()) else {
                continue;
            };
            let full = full_fuel_type(fuel, constant.subtype.as_deref(), separator);
            if self.register(full.clone()) {
                tracing::debug!("Registered fuel type {} from constants feed", full);
            }
        }
    }

    pub fn contains(&self, fuel: &str) -> bool {
        self.index.contains(fuel)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.fuels.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fuels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fuels.is_empty()
    }
}
