use super::{fmt_triple, format_output, print_info, print_warning, read_json, table, Session};
use crate::config::OutputFormat;
use anyhow::Result;
use co2forecast_core::{
    future_summary, projection_sources, AllocatedDatapoint, PreferenceOrderGrades,
    ProductionDatapoint, ReserveBalances, ReserveEntry, ReservesAllocator, Source, SourceId,
    SourceTotal, StableProduction, YearLimits,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Allocation run parameters; datasets left out are taken from the feed
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AllocationRequest {
    pub projection_source_id: Option<SourceId>,
    pub reserves_source_id: Option<SourceId>,
    /// First year of the forecast summary, the current year when unset
    pub first_year: Option<i32>,
    pub projection: Option<Vec<ProductionDatapoint>>,
    pub reserves: Option<Vec<ReserveEntry>>,
    pub stable_production: Option<StableProduction>,
    pub limits: Option<YearLimits>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AllocationReport {
    datapoints: Vec<AllocatedDatapoint>,
    initial: ReserveBalances,
    remaining: ReserveBalances,
    summary: Vec<SourceTotal>,
}

pub fn run(session: &Session, path: &Path) -> Result<()> {
    let request: AllocationRequest = read_json(path)?;
    let feed = &session.feed;
    let config = session.calculator.config();

    let projection = request.projection.as_deref().unwrap_or(&feed.projection);
    let reserves = request.reserves.as_deref().unwrap_or(&feed.reserves);
    let stable_production = request
        .stable_production
        .as_ref()
        .unwrap_or(&feed.stable_production);
    let limits = request.limits.as_ref().or(feed.limits.as_ref());

    let grades = PreferenceOrderGrades::from_config(config);
    let allocator = ReservesAllocator::new(&session.calculator, &grades, stable_production, session.gwp);
    let allocation = allocator.allocate_detailed(
        projection,
        reserves,
        request.projection_source_id,
        request.reserves_source_id,
        limits,
    )?;

    if allocation.datapoints.is_empty() {
        print_warning("Nothing to allocate: check the projection source, projection size and year limits");
    }

    let mut stable = BTreeMap::new();
    for (fuel, datapoint) in stable_production {
        stable.insert(fuel.clone(), session.calculator.estimate(datapoint, session.gwp)?);
    }
    let first_year = request.first_year.unwrap_or_else(co2forecast_core::summary::current_year);
    let sources = summary_sources(&feed.sources, projection, request.projection_source_id);
    let summary = future_summary(config, &allocation.datapoints, &sources, &stable, first_year);
    session.flush_paths();

    let report = AllocationReport {
        datapoints: allocation.datapoints,
        initial: allocation.initial,
        remaining: allocation.remaining,
        summary,
    };

    match session.format {
        OutputFormat::Table => print_tables(&report),
        format => format_output(&report, &format, Some("Reserves allocation"))?,
    }
    Ok(())
}

/// Feed sources behind the allocated projection, limited to the requested source
fn summary_sources(
    sources: &[Source],
    projection: &[ProductionDatapoint],
    projection_source_id: Option<SourceId>,
) -> Vec<Source> {
    let allocated: Vec<ProductionDatapoint> = projection
        .iter()
        .filter(|d| projection_source_id.map_or(true, |id| d.source_id == id))
        .cloned()
        .collect();
    projection_sources(sources, &allocated)
}

fn print_tables(report: &AllocationReport) {
    let mut t = table(vec!["Year", "Fuel", "Source", "CO2e mid (Mt)", "Planned", "Contingent", ""]);
    for d in &report.datapoints {
        t.add_row(vec![
            d.datapoint.year.to_string(),
            d.datapoint.fossil_fuel_type.clone(),
            d.datapoint.source_id.to_string(),
            format!("{:.6}", d.co2.total_mid()),
            format!("{:.6}", d.planned_prod),
            format!("{:.6}", d.contin_prod),
            if d.synthesized { "gap".to_string() } else { String::new() },
        ]);
    }
    println!("{t}");

    let mut balances = table(vec!["Fuel", "Planned start", "Contingent start", "Planned left", "Contingent left"]);
    for (fuel, start) in &report.initial.by_fuel {
        let left = report.remaining.get(fuel);
        balances.add_row(vec![
            fuel.clone(),
            format!("{:.6}", start.planned),
            format!("{:.6}", start.contingent),
            format!("{:.6}", left.planned),
            format!("{:.6}", left.contingent),
        ]);
    }
    println!("{balances}");

    if report.summary.is_empty() {
        print_info("No forecast summary for this allocation");
        return;
    }
    let mut summary = table(vec!["Source", "Fuel", "Scope 1 (Mt)", "Scope 3 (Mt)"]);
    for source in &report.summary {
        for (fuel, total) in &source.total {
            summary.add_row(vec![
                source.name.clone(),
                fuel.clone(),
                fmt_triple(&total.scope1),
                fmt_triple(&total.scope3),
            ]);
        }
    }
    println!("{summary}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use co2forecast_core::{EmissionEstimate, EngineConfig};

    #[test]
    fn test_request_defaults_to_feed_data() {
        let request: AllocationRequest =
            serde_json::from_str(r#"{"projectionSourceId": 3, "reservesSourceId": 7}"#).unwrap();
        assert_eq!(request.projection_source_id, Some(3));
        assert!(request.projection.is_none());
        assert!(request.limits.is_none());
        assert!(request.first_year.is_none());
    }

    fn source(source_id: SourceId, name: &str) -> Source {
        Source {
            source_id,
            name: name.to_string(),
            name_pretty: None,
            description: None,
        }
    }

    #[test]
    fn test_summary_covers_projection_sources_only() {
        let sources = vec![source(2, "Sodir"), source(3, "Rystad"), source(7, "Reserves")];
        let projection = vec![
            ProductionDatapoint::new("oil", 80.0, "mt", 2023, 3),
            ProductionDatapoint::new("oil", 80.0, "mt", 2024, 3),
            ProductionDatapoint::new("oil", 999.0, "mt", 2023, 2),
        ];

        let kept = summary_sources(&sources, &projection, Some(3));
        assert_eq!(kept.iter().map(|s| s.source_id).collect::<Vec<_>>(), vec![3]);

        let dataset: Vec<AllocatedDatapoint> = projection[..2]
            .iter()
            .map(|datapoint| AllocatedDatapoint {
                datapoint: datapoint.clone(),
                co2: EmissionEstimate::zero(),
                planned_prod: 0.0,
                contin_prod: 0.0,
                synthesized: false,
            })
            .collect();
        let stable = BTreeMap::from([
            ("oil".to_string(), EmissionEstimate::zero()),
            ("gas".to_string(), EmissionEstimate::zero()),
        ]);
        let summary = future_summary(&EngineConfig::default(), &dataset, &kept, &stable, 2023);
        assert_eq!(summary.iter().map(|t| t.source_id).collect::<Vec<_>>(), vec![3, 100]);
        assert_eq!(summary[1].name, "Stable production");

        let unfiltered = summary_sources(&sources, &projection, None);
        assert_eq!(unfiltered.iter().map(|s| s.source_id).collect::<Vec<_>>(), vec![2, 3]);
    }
}
