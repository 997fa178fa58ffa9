use std::collections::BTreeSet;
use std::sync::Mutex;

use serde::Serialize;
use tracing::{debug, warn};

use super::{ConversionSet, EdgeFactor};
use crate::error::ConversionError;
use crate::types::Triple;

/// Composite factor of a multi-hop conversion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedFactor {
    pub factor: f64,
    pub low: f64,
    pub high: f64,
    /// Units visited, both ends included
    pub path: Vec<String>,
}

impl ResolvedFactor {
    pub fn triple(&self) -> Triple {
        [self.low, self.factor, self.high]
    }

    /// `volume` multiplied by low, mid and high
    pub fn apply(&self, volume: f64) -> Triple {
        [volume * self.low, volume * self.factor, volume * self.high]
    }
}

/// Deduplicated record of conversion paths taken, for diagnostics
///
/// Recording never blocks and never fails: if the lock is busy or poisoned the
/// entry is dropped.
#[derive(Debug, Default)]
pub struct ConversionPathLog {
    paths: Mutex<BTreeSet<String>>,
}

impl ConversionPathLog {
    pub fn record(&self, fuel: &str, path: &[&str]) {
        if let Ok(mut paths) = self.paths.try_lock() {
            paths.insert(format!("[{}] {}", fuel, path.join(" > ")));
        }
    }

    /// Paths recorded since the last flush, sorted
    pub fn snapshot(&self) -> Vec<String> {
        match self.paths.try_lock() {
            Ok(paths) => paths.iter().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Emit every recorded path at debug level and clear the log
    pub fn flush(&self) {
        let Ok(mut paths) = self.paths.try_lock() else {
            return;
        };
        if paths.is_empty() {
            return;
        }
        debug!("----- Conversions logged -----");
        for path in paths.iter() {
            debug!("{}", path);
        }
        paths.clear();
    }

    pub fn reset(&self) {
        if let Ok(mut paths) = self.paths.try_lock() {
            paths.clear();
        }
    }
}

/// Walks shortest paths in a [`ConversionSet`] and composes hop factors
#[derive(Debug, Clone, Copy)]
pub struct FactorResolver<'a> {
    set: &'a ConversionSet,
}

impl<'a> FactorResolver<'a> {
    pub fn new(set: &'a ConversionSet) -> Self {
        Self { set }
    }

    /// Compose low, mid and high factors from `from` to `to` for `fuel`
    ///
    /// Edges without a low or high bound contribute their mid factor to that bound.
    pub fn resolve(&self, from: &str, to: &str, fuel: &str) -> Result<ResolvedFactor, ConversionError> {
        let conversions = self
            .set
            .conversions(fuel)
            .ok_or_else(|| ConversionError::NoGraph {
                fuel: fuel.to_string(),
            })?;

        let path = conversions
            .graph
            .shortest_path(from, to)
            .ok_or_else(|| ConversionError::NoPath {
                fuel: fuel.to_string(),
                from: from.to_string(),
                to: to.to_string(),
            })?;

        let mut composed = [1.0_f64; 3];
        for hop in path.windows(2) {
            let edge = conversions.table.get(hop[0], hop[1]).ok_or_else(|| {
                ConversionError::IncompleteEdgeData {
                    fuel: fuel.to_string(),
                    from: hop[0].to_string(),
                    to: hop[1].to_string(),
                }
            })?;
            let step = edge.triple();
            for (acc, factor) in composed.iter_mut().zip(step) {
                *acc *= factor;
            }
        }

        self.set.path_log().record(fuel, &path);

        Ok(ResolvedFactor {
            low: composed[0],
            factor: composed[1],
            high: composed[2],
            path: path.into_iter().map(str::to_string).collect(),
        })
    }

    /// Convert using mid factors, falling back to the unconverted volume
    pub fn convert_volume(&self, volume: f64, unit: &str, fuel: &str, to_unit: &str) -> f64 {
        match self.resolve(unit, to_unit, fuel) {
            Ok(resolved) => volume * resolved.factor,
            Err(e) => {
                warn!("{}: {} {} -> {}, using volume as is", e, unit, fuel, to_unit);
                volume
            }
        }
    }

    /// Table entry of the single edge `from > to`
    pub fn direct_factor(&self, from: &str, to: &str, fuel: &str) -> Result<&'a EdgeFactor, ConversionError> {
        let table = self.set.table(fuel).ok_or_else(|| ConversionError::NoGraph {
            fuel: fuel.to_string(),
        })?;
        table
            .get(from, to)
            .ok_or_else(|| ConversionError::IncompleteEdgeData {
                fuel: fuel.to_string(),
                from: from.to_string(),
                to: to.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::conversion::GraphBuilder;
    use crate::types::ConversionConstant;

    fn oil_set() -> ConversionSet {
        let constants = vec![
            ConversionConstant::new(Some("oil"), "bbl", "e6bbl", 1e-6, None, None),
            ConversionConstant::new(
                Some("oil"),
                "e6bbl",
                "kgco2e",
                420_000.0,
                Some(380_000.0),
                Some(460_000.0),
            ),
            ConversionConstant::new(Some("oil"), "e6bbl", "bbl", 1e6, None, None),
            ConversionConstant::new(Some("oil"), "tcf", "tcf", 1.0, None, None),
        ];
        GraphBuilder::new(&EngineConfig::default()).build(&constants, None)
    }

    #[test]
    fn test_composes_path_factors() {
        let set = oil_set();
        let resolved = set.resolve("bbl", "kgco2e", "oil").unwrap();

        assert_eq!(resolved.path, vec!["bbl", "e6bbl", "kgco2e"]);
        assert!((resolved.factor - 0.42).abs() < 1e-12);
        assert!((resolved.low - 0.38).abs() < 1e-12);
        assert!((resolved.high - 0.46).abs() < 1e-12);

        let kg = resolved.apply(1_000_000.0);
        assert!((kg[1] - 420_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_error_kinds() {
        let set = oil_set();

        let err = set.resolve("kgco2e", "bbl", "oil").unwrap_err();
        assert!(err.is_no_path());

        let err = set.resolve("bbl", "kgco2e", "lignite").unwrap_err();
        assert!(err.is_missing_graph());

        let err = set.direct_factor("bbl", "kgco2e", "oil").unwrap_err();
        assert!(err.is_data_defect());
    }

    #[test]
    fn test_convert_volume_falls_back_to_identity() {
        let set = oil_set();
        assert_eq!(set.convert_volume(5.0, "kgco2e", "oil", "bbl"), 5.0);
        assert!((set.convert_volume(2.0, "bbl", "oil", "e6bbl") - 2e-6).abs() < 1e-18);
    }

    #[test]
    fn test_round_trip_with_inverse_constants() {
        let set = oil_set();
        let there = set.convert_volume(1234.5, "bbl", "oil", "e6bbl");
        let back = set.convert_volume(there, "e6bbl", "oil", "bbl");
        assert!((back - 1234.5).abs() < 1e-9);
    }

    #[test]
    fn test_path_log_is_deduplicated() {
        let set = oil_set();
        set.path_log().reset();
        set.resolve("bbl", "kgco2e", "oil").unwrap();
        set.resolve("bbl", "kgco2e", "oil").unwrap();
        assert_eq!(set.path_log().snapshot(), vec!["[oil] bbl > e6bbl > kgco2e"]);

        set.path_log().flush();
        assert!(set.path_log().snapshot().is_empty());
    }
}
