use super::{fmt_triple, format_output, print_warning, table, Session};
use crate::config::OutputFormat;
use anyhow::Result;
use co2forecast_core::Triple;
use colored::*;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FuelInfo {
    fuel: String,
    nodes: usize,
    edges: usize,
}

/// Registered fuel types with the size of their graphs
pub fn fuels(session: &Session) -> Result<()> {
    let set = session.calculator.conversion_set();
    let fuels: Vec<FuelInfo> = set
        .fuels()
        .iter()
        .map(|fuel| {
            let (nodes, edges) = set
                .graph(fuel)
                .map_or((0, 0), |g| (g.node_count(), g.edge_count()));
            FuelInfo {
                fuel: fuel.to_string(),
                nodes,
                edges,
            }
        })
        .collect();

    match session.format {
        OutputFormat::Table => {
            let mut t = table(vec!["Fuel", "Units", "Conversions"]);
            for f in &fuels {
                t.add_row(vec![f.fuel.clone(), f.nodes.to_string(), f.edges.to_string()]);
            }
            println!("{t}");
        }
        format => format_output(&fuels, &format, Some("Fuel types"))?,
    }
    Ok(())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConversionReport {
    fuel: String,
    from: String,
    to: String,
    country: Option<String>,
    factor: Triple,
    path: Vec<String>,
    volume: f64,
    converted: Triple,
}

pub fn convert(session: &Session, fuel: &str, from: &str, to: &str, volume: f64) -> Result<()> {
    let set = session.calculator.conversion_set();
    let resolved = match set.resolve(from, to, fuel) {
        Ok(resolved) => resolved,
        Err(e) if e.is_no_path() || e.is_missing_graph() => {
            print_warning(&format!("No conversion from {} to {} for {}", from, to, fuel));
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };
    session.flush_paths();

    let report = ConversionReport {
        fuel: fuel.to_string(),
        from: from.to_string(),
        to: to.to_string(),
        country: set.country().map(str::to_string),
        factor: resolved.triple(),
        path: resolved.path.clone(),
        volume,
        converted: resolved.apply(volume),
    };

    match session.format {
        OutputFormat::Json => format_output(&report, &OutputFormat::Json, None)?,
        _ => {
            println!("{}", format!("{} {} -> {}", fuel, from, to).bold().green());
            println!("  Path:      {}", report.path.join(" > ").cyan());
            println!("  Factor:    {}", fmt_triple(&report.factor));
            println!("  {} {}: {} {}", "Converted".bold(), volume, fmt_triple(&report.converted), to);
        }
    }
    Ok(())
}
