//! Allocation of projected production against planned and contingent reserves
//!
//! Each fuel starts with the CO2e content of its most recent preferred planned
//! and contingent reserve. Projection periods are visited in year order and
//! draw on the planned balance first, then on the contingent balance. Balances
//! only ever shrink; production beyond both balances stays unallocated.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::EngineConfig;
use crate::emissions::EmissionsCalculator;
use crate::error::{ForecastResult, MalformedInputError};
use crate::types::{
    EmissionEstimate, Gwp, ProductionDatapoint, ReserveClass, ReserveEntry, SourceId,
};

/// First and last year of a fuel's series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearRange {
    pub first_year: i32,
    pub last_year: i32,
}

/// Year limits of the production and projection series, per fuel
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YearLimits {
    #[serde(default)]
    pub production: BTreeMap<String, YearRange>,
    #[serde(default)]
    pub projection: BTreeMap<String, YearRange>,
}

/// Held-over production rate per fuel, used to fill the production/projection gap
pub type StableProduction = BTreeMap<String, ProductionDatapoint>;

/// The grade pair reserves are read from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferredGrades {
    pub planned: Option<String>,
    pub contingent: Option<String>,
}

impl PreferredGrades {
    fn class_of(&self, grade: &str) -> Option<ReserveClass> {
        if self.planned.as_deref() == Some(grade) {
            Some(ReserveClass::Planned)
        } else if self.contingent.as_deref() == Some(grade) {
            Some(ReserveClass::Contingent)
        } else {
            None
        }
    }
}

/// Chooses which planned and contingent grade of a reserves source to use
pub trait GradeSelector {
    fn preferred_grades(&self, reserves: &[ReserveEntry], source_id: SourceId) -> PreferredGrades;
}

/// Picks the first grade from a preference list that the source reports
///
/// When none of the listed grades is present, the first grade of the right
/// class seen in the data is used.
#[derive(Debug, Clone)]
pub struct PreferenceOrderGrades {
    planned: Vec<String>,
    contingent: Vec<String>,
}

impl PreferenceOrderGrades {
    pub fn new(planned: Vec<String>, contingent: Vec<String>) -> Self {
        Self {
            planned,
            contingent,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            config.planned_grade_preference.clone(),
            config.contingent_grade_preference.clone(),
        )
    }

    fn pick(preference: &[String], available: &[&str], class: ReserveClass) -> Option<String> {
        preference
            .iter()
            .find(|grade| available.contains(&grade.as_str()))
            .cloned()
            .or_else(|| {
                available
                    .iter()
                    .find(|grade| ReserveClass::of_grade(grade) == Some(class))
                    .map(|grade| grade.to_string())
            })
    }
}

impl GradeSelector for PreferenceOrderGrades {
    fn preferred_grades(&self, reserves: &[ReserveEntry], source_id: SourceId) -> PreferredGrades {
        let mut available: Vec<&str> = Vec::new();
        for r in reserves.iter().filter(|r| r.source_id == source_id) {
            if !available.contains(&r.grade.as_str()) {
                available.push(&r.grade);
            }
        }

        PreferredGrades {
            planned: Self::pick(&self.planned, &available, ReserveClass::Planned),
            contingent: Self::pick(&self.contingent, &available, ReserveClass::Contingent),
        }
    }
}

/// A projection or gap-filling datapoint with its estimate and reserve split
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocatedDatapoint {
    #[serde(flatten)]
    pub datapoint: ProductionDatapoint,
    pub co2: EmissionEstimate,
    /// Part of this period's CO2e drawn from planned reserves
    pub planned_prod: f64,
    /// Part of this period's CO2e drawn from contingent reserves
    pub contin_prod: f64,
    /// Filled in from the stable production rate
    pub synthesized: bool,
}

/// Remaining reserve of one fuel, in megatons CO2e
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ReserveBalance {
    pub planned: f64,
    pub contingent: f64,
}

impl ReserveBalance {
    /// Draw one period's production, returning `(planned, contingent)` drawn
    pub fn draw(&mut self, production: f64) -> (f64, f64) {
        let production = production.max(0.0);

        if self.planned > production {
            self.planned -= production;
            (production, 0.0)
        } else if self.planned > 0.0 {
            let planned = self.planned;
            let contingent = (production - planned).min(self.contingent.max(0.0));
            self.planned = 0.0;
            self.contingent -= contingent;
            (planned, contingent)
        } else if self.contingent > 0.0 {
            let contingent = self.contingent.min(production);
            self.contingent -= contingent;
            (0.0, contingent)
        } else {
            (0.0, 0.0)
        }
    }
}

/// Per-fuel balances carried across the allocation fold
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReserveBalances {
    pub by_fuel: BTreeMap<String, ReserveBalance>,
}

impl ReserveBalances {
    pub fn get(&self, fuel: &str) -> ReserveBalance {
        self.by_fuel.get(fuel).copied().unwrap_or_default()
    }

    /// Draw from `fuel`'s balance; fuels without reserves draw nothing
    pub fn draw(&mut self, fuel: &str, production: f64) -> (f64, f64) {
        match self.by_fuel.get_mut(fuel) {
            Some(balance) => balance.draw(production),
            None => (0.0, 0.0),
        }
    }
}

/// Allocated datapoints together with what is left of the reserves
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub datapoints: Vec<AllocatedDatapoint>,
    pub initial: ReserveBalances,
    pub remaining: ReserveBalances,
}

/// Splits projected production between planned and contingent reserves
pub struct ReservesAllocator<'a> {
    calculator: &'a EmissionsCalculator,
    grades: &'a dyn GradeSelector,
    stable_production: &'a StableProduction,
    gwp: Gwp,
}

impl<'a> ReservesAllocator<'a> {
    pub fn new(
        calculator: &'a EmissionsCalculator,
        grades: &'a dyn GradeSelector,
        stable_production: &'a StableProduction,
        gwp: Gwp,
    ) -> Self {
        Self {
            calculator,
            grades,
            stable_production,
            gwp,
        }
    }

    /// Gap-filling datapoints followed by annotated projection datapoints
    ///
    /// Returns an empty list without a projection source, with fewer than two
    /// projection datapoints, or without production and projection limits.
    pub fn allocate(
        &self,
        projection: &[ProductionDatapoint],
        reserves: &[ReserveEntry],
        projection_source_id: Option<SourceId>,
        reserves_source_id: Option<SourceId>,
        limits: Option<&YearLimits>,
    ) -> ForecastResult<Vec<AllocatedDatapoint>> {
        Ok(self
            .allocate_detailed(projection, reserves, projection_source_id, reserves_source_id, limits)?
            .datapoints)
    }

    /// Same as [`allocate`](Self::allocate), also reporting the reserve balances
    pub fn allocate_detailed(
        &self,
        projection: &[ProductionDatapoint],
        reserves: &[ReserveEntry],
        projection_source_id: Option<SourceId>,
        reserves_source_id: Option<SourceId>,
        limits: Option<&YearLimits>,
    ) -> ForecastResult<Allocation> {
        let Some(projection_source_id) = projection_source_id else {
            return Ok(Allocation::default());
        };
        if projection.len() < 2 {
            return Ok(Allocation::default());
        }
        let Some(limits) = limits.filter(|l| !l.production.is_empty() && !l.projection.is_empty())
        else {
            return Ok(Allocation::default());
        };

        let initial = match reserves_source_id {
            Some(source_id) => self.latest_reserves(reserves, source_id)?,
            None => ReserveBalances::default(),
        };

        let (gap_start, gap_end) = self.gap_window(limits);
        debug!(gap_start, gap_end, ?initial, "Reserves allocation");

        let mut datapoints = self.fill_gap(limits, gap_start, gap_end, projection_source_id)?;

        let mut periods: Vec<&ProductionDatapoint> = projection
            .iter()
            .filter(|dp| dp.source_id == projection_source_id && dp.year >= gap_end)
            .collect();
        periods.sort_by_key(|dp| dp.year);

        let (allocated, remaining) = periods.into_iter().try_fold(
            (Vec::new(), initial.clone()),
            |(mut out, mut balances), datapoint| -> ForecastResult<_> {
                require_unit(datapoint, "projection")?;
                let co2 = self.calculator.estimate(datapoint, self.gwp)?;
                let (planned_prod, contin_prod) =
                    balances.draw(&datapoint.fossil_fuel_type, co2.total_mid());
                out.push(AllocatedDatapoint {
                    datapoint: datapoint.clone(),
                    co2,
                    planned_prod,
                    contin_prod,
                    synthesized: false,
                });
                Ok((out, balances))
            },
        )?;
        datapoints.extend(allocated);

        Ok(Allocation {
            datapoints,
            initial,
            remaining,
        })
    }

    /// CO2e of the most recent preferred planned and contingent reserve per fuel
    fn latest_reserves(
        &self,
        reserves: &[ReserveEntry],
        source_id: SourceId,
    ) -> ForecastResult<ReserveBalances> {
        let grades = self.grades.preferred_grades(reserves, source_id);

        let mut latest: HashMap<(&str, ReserveClass), &ReserveEntry> = HashMap::new();
        for r in reserves.iter().filter(|r| r.source_id == source_id) {
            let Some(class) = grades.class_of(&r.grade) else {
                continue;
            };
            // Latest year wins; on a tie the first entry in the feed is kept
            let slot = latest.entry((r.fossil_fuel_type.as_str(), class)).or_insert(r);
            if r.year > slot.year {
                *slot = r;
            }
        }

        let mut balances = ReserveBalances::default();
        for ((fuel, class), entry) in latest {
            let value = self
                .calculator
                .estimate(&entry.to_datapoint(), self.gwp)?
                .total_mid();
            let balance = balances.by_fuel.entry(fuel.to_string()).or_default();
            match class {
                ReserveClass::Planned => balance.planned = value,
                ReserveClass::Contingent => balance.contingent = value,
            }
        }
        Ok(balances)
    }

    /// Years between the end of production and the start of the projection
    fn gap_window(&self, limits: &YearLimits) -> (i32, i32) {
        let fuels = &self.calculator.config().allocation_fuels;

        let gap_start = fuels
            .iter()
            .filter_map(|f| limits.production.get(f))
            .map(|r| r.last_year)
            .min()
            .unwrap_or(0);
        let gap_end = fuels
            .iter()
            .filter_map(|f| limits.projection.get(f))
            .map(|r| r.first_year)
            .max()
            .unwrap_or(0)
            .max(gap_start);

        (gap_start, gap_end)
    }

    fn fill_gap(
        &self,
        limits: &YearLimits,
        gap_start: i32,
        gap_end: i32,
        projection_source_id: SourceId,
    ) -> ForecastResult<Vec<AllocatedDatapoint>> {
        let mut filled = Vec::new();
        if gap_start <= 0 {
            return Ok(filled);
        }

        for year in gap_start..gap_end {
            for fuel in &self.calculator.config().allocation_fuels {
                let ended = limits
                    .production
                    .get(fuel)
                    .map_or(false, |r| r.last_year <= year);
                if !ended {
                    continue;
                }

                let stable = self.stable_production.get(fuel).ok_or_else(|| {
                    MalformedInputError::MissingStableProduction {
                        fuel: fuel.clone(),
                        year,
                    }
                })?;
                let datapoint = ProductionDatapoint {
                    year,
                    fossil_fuel_type: fuel.clone(),
                    source_id: projection_source_id,
                    ..stable.clone()
                };
                require_unit(&datapoint, "production")?;

                let co2 = self.calculator.estimate(&datapoint, self.gwp)?;
                filled.push(AllocatedDatapoint {
                    datapoint,
                    co2,
                    planned_prod: 0.0,
                    contin_prod: 0.0,
                    synthesized: true,
                });
            }
        }
        Ok(filled)
    }
}

fn require_unit(datapoint: &ProductionDatapoint, context: &str) -> ForecastResult<()> {
    if datapoint.unit().is_none() {
        let serialized = serde_json::to_string(datapoint).unwrap_or_else(|_| format!("{:?}", datapoint));
        return Err(MalformedInputError::MissingUnit {
            context: context.to_string(),
            datapoint: serialized,
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion::GraphBuilder;
    use crate::error::ForecastError;
    use crate::types::ConversionConstant;
    use std::sync::Arc;

    const PROJECTION: SourceId = 3;
    const RESERVES: SourceId = 7;

    fn calculator() -> EmissionsCalculator {
        let config = EngineConfig::default();
        // One megaton of fuel in "mt" is exactly one megaton CO2e (Scope 3)
        let constants = Arc::new(vec![ConversionConstant::new(
            None, "mt", "kgco2e", 1e9, None, None,
        )]);
        let set = Arc::new(GraphBuilder::new(&config).build(&constants, None));
        EmissionsCalculator::new(config, constants, set)
    }

    fn reserve(grade: &str, year: i32, volume: f64) -> ReserveEntry {
        ReserveEntry {
            source_id: RESERVES,
            fossil_fuel_type: "oil".to_string(),
            subtype: None,
            grade: grade.to_string(),
            year,
            volume,
            unit: Some("mt".to_string()),
            country: None,
        }
    }

    fn limits() -> YearLimits {
        let range = |first_year, last_year| YearRange {
            first_year,
            last_year,
        };
        YearLimits {
            production: BTreeMap::from([
                ("oil".to_string(), range(2000, 2020)),
                ("gas".to_string(), range(2000, 2020)),
            ]),
            projection: BTreeMap::from([
                ("oil".to_string(), range(2021, 2030)),
                ("gas".to_string(), range(2021, 2030)),
            ]),
        }
    }

    fn stable() -> StableProduction {
        BTreeMap::from([
            ("oil".to_string(), ProductionDatapoint::new("oil", 10.0, "mt", 0, 0)),
            ("gas".to_string(), ProductionDatapoint::new("gas", 5.0, "mt", 0, 0)),
        ])
    }

    fn projection() -> Vec<ProductionDatapoint> {
        vec![
            ProductionDatapoint::new("oil", 80.0, "mt", 2022, PROJECTION),
            ProductionDatapoint::new("oil", 80.0, "mt", 2021, PROJECTION),
            ProductionDatapoint::new("oil", 999.0, "mt", 2021, 99),
        ]
    }

    #[test]
    fn test_planned_then_contingent_depletion() {
        let calc = calculator();
        let grades = PreferenceOrderGrades::from_config(calc.config());
        let stable = stable();
        let allocator = ReservesAllocator::new(&calc, &grades, &stable, Gwp::Gwp100);
        let reserves = vec![
            reserve("2p", 2020, 100.0),
            reserve("2p", 2018, 999.0),
            reserve("2p", 2020, 70.0),
            reserve("2c", 2020, 50.0),
            reserve("1p", 2021, 5000.0),
        ];

        let allocation = allocator
            .allocate_detailed(&projection(), &reserves, Some(PROJECTION), Some(RESERVES), Some(&limits()))
            .unwrap();

        assert_eq!(allocation.initial.get("oil"), ReserveBalance { planned: 100.0, contingent: 50.0 });

        let gap: Vec<_> = allocation.datapoints.iter().filter(|d| d.synthesized).collect();
        assert_eq!(gap.len(), 2);
        assert!(gap.iter().all(|d| d.datapoint.year == 2020 && d.datapoint.source_id == PROJECTION));

        let periods: Vec<_> = allocation.datapoints.iter().filter(|d| !d.synthesized).collect();
        assert_eq!(periods.len(), 2);
        assert_eq!(periods[0].datapoint.year, 2021);
        assert_eq!((periods[0].planned_prod, periods[0].contin_prod), (80.0, 0.0));
        assert_eq!(periods[1].datapoint.year, 2022);
        assert_eq!((periods[1].planned_prod, periods[1].contin_prod), (20.0, 50.0));

        assert_eq!(allocation.remaining.get("oil"), ReserveBalance { planned: 0.0, contingent: 0.0 });
    }

    #[test]
    fn test_latest_reserve_tie_keeps_first_entry() {
        let calc = calculator();
        let grades = PreferenceOrderGrades::from_config(calc.config());
        let stable = stable();
        let allocator = ReservesAllocator::new(&calc, &grades, &stable, Gwp::Gwp100);
        let reserves = vec![reserve("2p", 2020, 70.0), reserve("2p", 2020, 100.0)];

        let allocation = allocator
            .allocate_detailed(&projection(), &reserves, Some(PROJECTION), Some(RESERVES), Some(&limits()))
            .unwrap();

        assert_eq!(allocation.initial.get("oil"), ReserveBalance { planned: 70.0, contingent: 0.0 });
        let periods: Vec<_> = allocation.datapoints.iter().filter(|d| !d.synthesized).collect();
        assert_eq!((periods[0].planned_prod, periods[0].contin_prod), (70.0, 0.0));
        assert_eq!((periods[1].planned_prod, periods[1].contin_prod), (0.0, 0.0));
    }

    #[test]
    fn test_preconditions_return_empty() {
        let calc = calculator();
        let grades = PreferenceOrderGrades::from_config(calc.config());
        let stable = stable();
        let allocator = ReservesAllocator::new(&calc, &grades, &stable, Gwp::Gwp100);
        let projection = projection();

        let none = allocator.allocate(&projection, &[], None, Some(RESERVES), Some(&limits())).unwrap();
        assert!(none.is_empty());

        let single = allocator
            .allocate(&projection[..1], &[], Some(PROJECTION), Some(RESERVES), Some(&limits()))
            .unwrap();
        assert!(single.is_empty());

        let no_limits = allocator.allocate(&projection, &[], Some(PROJECTION), Some(RESERVES), None).unwrap();
        assert!(no_limits.is_empty());
    }

    #[test]
    fn test_missing_unit_is_fatal() {
        let calc = calculator();
        let grades = PreferenceOrderGrades::from_config(calc.config());
        let stable = stable();
        let allocator = ReservesAllocator::new(&calc, &grades, &stable, Gwp::Gwp100);
        let mut projection = projection();
        projection[0].unit = None;

        let err = allocator
            .allocate(&projection, &[], Some(PROJECTION), None, Some(&limits()))
            .unwrap_err();
        assert!(matches!(
            err,
            ForecastError::MalformedInput(MalformedInputError::MissingUnit { .. })
        ));
    }

    #[test]
    fn test_missing_stable_production_is_fatal() {
        let calc = calculator();
        let grades = PreferenceOrderGrades::from_config(calc.config());
        let stable = StableProduction::new();
        let allocator = ReservesAllocator::new(&calc, &grades, &stable, Gwp::Gwp100);

        let err = allocator
            .allocate(&projection(), &[], Some(PROJECTION), None, Some(&limits()))
            .unwrap_err();
        assert!(matches!(
            err,
            ForecastError::MalformedInput(MalformedInputError::MissingStableProduction { .. })
        ));
    }

    #[test]
    fn test_balance_draw_from_contingent_only() {
        let mut balance = ReserveBalance {
            planned: 0.0,
            contingent: 30.0,
        };
        assert_eq!(balance.draw(20.0), (0.0, 20.0));
        assert_eq!(balance.draw(20.0), (0.0, 10.0));
        assert_eq!(balance.draw(20.0), (0.0, 0.0));
        assert_eq!(balance.draw(-5.0), (0.0, 0.0));
    }

    #[test]
    fn test_grade_preference_with_fallback() {
        let grades = PreferenceOrderGrades::new(vec!["2p".into()], vec!["2c".into()]);
        let reserves = vec![reserve("1p", 2020, 1.0), reserve("3c", 2020, 1.0), reserve("2c", 2019, 1.0)];
        let preferred = grades.preferred_grades(&reserves, RESERVES);
        assert_eq!(preferred.planned.as_deref(), Some("1p"));
        assert_eq!(preferred.contingent.as_deref(), Some("2c"));

        let other = grades.preferred_grades(&reserves, 1);
        assert_eq!(other, PreferredGrades::default());
    }
}
