use super::{fmt_triple, format_output, read_json, table, Session};
use crate::config::OutputFormat;
use anyhow::Result;
use co2forecast_core::{EmissionEstimate, Gwp, ProductionDatapoint};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EstimateReport<'a> {
    datapoint: &'a ProductionDatapoint,
    gwp: Gwp,
    estimate: EmissionEstimate,
}

/// Estimate every datapoint in a file holding one datapoint or a list of them
pub fn run(session: &Session, path: &Path, gwp: Gwp) -> Result<()> {
    let datapoints: Vec<ProductionDatapoint> = match read_json::<serde_json::Value>(path)? {
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<ProductionDatapoint>, _>>()?,
        single => vec![serde_json::from_value(single)?],
    };

    let mut reports = Vec::with_capacity(datapoints.len());
    for datapoint in &datapoints {
        let Some(estimate) = session.estimate_or_skip(datapoint, gwp)? else {
            continue;
        };
        reports.push(EstimateReport {
            datapoint,
            gwp,
            estimate,
        });
    }
    session.flush_paths();

    match session.format {
        OutputFormat::Table => {
            let mut t = table(vec!["Fuel", "Year", "Volume", "Scope 1 (Mt)", "Scope 3 (Mt)"]);
            for r in &reports {
                t.add_row(vec![
                    r.datapoint.fossil_fuel_type.clone(),
                    r.datapoint.year.to_string(),
                    format!("{} {}", r.datapoint.volume, r.datapoint.unit().unwrap_or("")),
                    fmt_triple(&r.estimate.scope1),
                    fmt_triple(&r.estimate.scope3),
                ]);
            }
            println!("{t}");
        }
        format => format_output(&reports, &format, Some(&format!("Estimates ({})", gwp)))?,
    }
    Ok(())
}
