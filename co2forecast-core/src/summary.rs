//! Country, project and forecast totals handed to the presentation layer

use std::collections::BTreeMap;
use std::fmt;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::emissions::EmissionsCalculator;
use crate::error::ForecastResult;
use crate::project::Project;
use crate::reserves::AllocatedDatapoint;
use crate::types::{EmissionEstimate, Gwp, ProductionDatapoint, Source, SourceId, Triple};

/// Scope 1 plus Scope 3 at `index` (0 low, 1 mid, 2 high)
pub fn sum_of_co2(estimate: &EmissionEstimate, index: usize) -> f64 {
    estimate.scope1[index] + estimate.scope3[index]
}

/// Element-wise accumulation of an estimate into a running total
pub fn add_to_total(total: &mut EmissionEstimate, add: &EmissionEstimate) {
    for i in 0..3 {
        total.scope1[i] += add.scope1[i];
        total.scope3[i] += add.scope3[i];
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn current_year() -> i32 {
    chrono::Utc::now().year()
}

/// Current CO2e of a country, per fuel and overall, in megatons
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CountryCo2 {
    pub by_fuel: BTreeMap<String, f64>,
    pub total: f64,
}

/// Sum Scope 1 and Scope 3 mid values of the principal source of each fuel
pub fn country_current_co2(
    calculator: &EmissionsCalculator,
    production: &[ProductionDatapoint],
    principal_sources: &BTreeMap<String, SourceId>,
    gwp: Gwp,
) -> ForecastResult<CountryCo2> {
    let mut co2 = CountryCo2::default();
    for point in production {
        if principal_sources.get(&point.fossil_fuel_type) != Some(&point.source_id) {
            continue;
        }
        let mid = calculator.estimate(point, gwp)?.total_mid();
        *co2.by_fuel.entry(point.fossil_fuel_type.clone()).or_insert(0.0) += mid;
        co2.total += mid;
    }
    tracing::debug!(total = co2.total, "Country production CO2e");
    Ok(co2)
}

/// A production volume with its unit and fuel, e.g. `12.5 e6bbl oil`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionVolume {
    pub volume: f64,
    pub unit: String,
    pub fuel: String,
}

impl fmt::Display for ProductionVolume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.volume, self.unit, self.fuel)
    }
}

/// Latest-year emissions of a single project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectCo2 {
    pub year: i32,
    pub scope1: Triple,
    pub scope3: Triple,
    /// Production in the megaton unit
    pub megatons: f64,
    pub production: ProductionVolume,
    pub sources: Vec<Source>,
}

/// Emissions of a project's latest production year, rounded to two decimals
///
/// Returns `None` when the project has no production data.
pub fn project_co2(
    calculator: &EmissionsCalculator,
    project: &Project,
    sources: &[Source],
    gwp: Gwp,
) -> ForecastResult<Option<ProjectCo2>> {
    let Some(latest) = project.latest_production() else {
        return Ok(None);
    };

    let datapoint = ProductionDatapoint {
        methane_m3_ton: project.methane_m3_ton,
        ..latest.clone()
    };
    let estimate = calculator.estimate(&datapoint, gwp)?;

    let sources = project
        .source_ids()
        .into_iter()
        .filter_map(|id| sources.iter().find(|s| s.source_id == id).cloned())
        .collect();

    Ok(Some(ProjectCo2 {
        year: datapoint.year,
        scope1: estimate.scope1.map(round2),
        scope3: estimate.scope3.map(round2),
        megatons: calculator.megatons(&datapoint),
        production: ProductionVolume {
            volume: datapoint.volume,
            unit: datapoint.unit.clone().unwrap_or_default(),
            fuel: datapoint.fossil_fuel_type.clone(),
        },
        sources,
    }))
}

/// Forecast totals of one projection source, per fuel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceTotal {
    pub source_id: SourceId,
    pub name: String,
    pub total: BTreeMap<String, EmissionEstimate>,
}

/// Sources that contributed at least one of the `projection` datapoints, in feed order
pub fn projection_sources(sources: &[Source], projection: &[ProductionDatapoint]) -> Vec<Source> {
    sources
        .iter()
        .filter(|s| projection.iter().any(|d| d.source_id == s.source_id))
        .cloned()
        .collect()
}

/// Forecast totals per projection source plus the stable-production scenario
///
/// The window runs from `max(first_year, earliest dataset year)` to the latest
/// dataset year. The stable scenario multiplies the per-year stable estimate
/// by the number of years in the window. Returns an empty list when the
/// dataset is empty or a fuel has no stable estimate.
pub fn future_summary(
    config: &EngineConfig,
    dataset: &[AllocatedDatapoint],
    projection_sources: &[Source],
    stable: &BTreeMap<String, EmissionEstimate>,
    first_year: i32,
) -> Vec<SourceTotal> {
    let fuels = &config.allocation_fuels;
    if dataset.is_empty() || fuels.iter().any(|f| !stable.contains_key(f)) {
        return Vec::new();
    }

    let (min_year, last) = dataset.iter().fold((i32::MAX, i32::MIN), |(lo, hi), d| {
        (lo.min(d.datapoint.year), hi.max(d.datapoint.year))
    });
    let first = first_year.max(min_year);
    let years = (1 + last - first).max(0) as f64;

    let empty_totals = || -> BTreeMap<String, EmissionEstimate> {
        fuels
            .iter()
            .map(|f| (f.clone(), EmissionEstimate::zero()))
            .collect()
    };

    let mut seen: Vec<SourceId> = Vec::new();
    let mut totals = Vec::new();
    for source in projection_sources {
        if source.source_id == config.stable_production_source_id
            || seen.contains(&source.source_id)
        {
            continue;
        }
        seen.push(source.source_id);

        let mut total = empty_totals();
        for d in dataset
            .iter()
            .filter(|d| d.datapoint.source_id == source.source_id && d.datapoint.year >= first)
        {
            let fuel_total = total.entry(d.datapoint.fossil_fuel_type.clone()).or_default();
            add_to_total(fuel_total, &d.co2);
        }

        totals.push(SourceTotal {
            source_id: source.source_id,
            name: source.name.clone(),
            total,
        });
    }

    totals.push(SourceTotal {
        source_id: config.stable_production_source_id,
        name: config.stable_production_name.clone(),
        total: fuels
            .iter()
            .map(|f| (f.clone(), stable[f].scaled(years)))
            .collect(),
    });

    totals
}
