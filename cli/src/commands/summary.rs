use super::{fmt_triple, format_output, print_warning, table, Session};
use crate::config::OutputFormat;
use anyhow::{anyhow, Result};
use co2forecast_core::{country_current_co2, current_projects, project_co2, ForecastError, SourceId};
use colored::*;
use std::collections::BTreeMap;

/// Current CO2e of the country from the principal production sources
pub fn country(session: &Session) -> Result<()> {
    let config = session.calculator.config();
    let principal: BTreeMap<String, SourceId> = if config.principal_production_source_ids.is_empty() {
        print_warning("No principal production sources configured, using the first source per fuel");
        first_source_per_fuel(session)
    } else {
        config.principal_production_source_ids.clone()
    };

    let mut production = Vec::new();
    for point in &session.feed.production {
        if principal.get(&point.fossil_fuel_type) != Some(&point.source_id) {
            continue;
        }
        if session.estimate_or_skip(point, session.gwp)?.is_some() {
            production.push(point.clone());
        }
    }
    let co2 = country_current_co2(&session.calculator, &production, &principal, session.gwp)?;
    session.flush_paths();

    match session.format {
        OutputFormat::Table => {
            let mut t = table(vec!["Fuel", "Source", "CO2e (Mt)"]);
            for (fuel, value) in &co2.by_fuel {
                let source = principal.get(fuel).map(|id| id.to_string()).unwrap_or_default();
                t.add_row(vec![fuel.clone(), source, format!("{:.4}", value)]);
            }
            t.add_row(vec!["total".to_string(), String::new(), format!("{:.4}", co2.total)]);
            println!("{t}");
        }
        format => format_output(&co2, &format, Some("Current CO2e"))?,
    }
    Ok(())
}

fn first_source_per_fuel(session: &Session) -> BTreeMap<String, SourceId> {
    let mut principal = BTreeMap::new();
    for point in &session.feed.production {
        principal
            .entry(point.fossil_fuel_type.clone())
            .or_insert(point.source_id);
    }
    principal
}

/// Latest-year emissions of one current project
pub fn project(session: &Session, identifier: &str) -> Result<()> {
    let min_year = session.calculator.config().min_current_project_year;
    let projects = current_projects(&session.feed.projects, min_year);
    let project = projects
        .iter()
        .find(|p| p.project_identifier == identifier)
        .ok_or_else(|| anyhow!("No current project named {}", identifier))?;

    let co2 = match project_co2(&session.calculator, project, &session.feed.sources, session.gwp) {
        Ok(Some(co2)) => co2,
        Ok(None) => {
            print_warning(&format!("Project {} has no production data", identifier));
            return Ok(());
        }
        Err(ForecastError::Conversion(e)) if e.is_missing_graph() => {
            print_warning(&format!("Skipping project {}: {}", identifier, e));
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    session.flush_paths();

    match session.format {
        OutputFormat::Table => {
            println!("{} ({})", project.project_identifier.bold().green(), co2.year);
            let mut t = table(vec!["", "Low", "Mid", "High"]);
            for (label, triple) in [("Scope 1 (Mt)", co2.scope1), ("Scope 3 (Mt)", co2.scope3)] {
                t.add_row(vec![
                    label.to_string(),
                    format!("{:.2}", triple[0]),
                    format!("{:.2}", triple[1]),
                    format!("{:.2}", triple[2]),
                ]);
            }
            println!("{t}");
            println!("  Production: {} ({:.4} Mt)", co2.production, co2.megatons);
            let names: Vec<&str> = co2.sources.iter().map(|s| s.name.as_str()).collect();
            println!("  Sources:    {}", names.join(", ").cyan());
        }
        OutputFormat::Text => {
            println!("{} {}", project.project_identifier.bold(), co2.year);
            println!("  Scope 1: {}", fmt_triple(&co2.scope1));
            println!("  Scope 3: {}", fmt_triple(&co2.scope3));
            println!("  Production: {}", co2.production);
        }
        OutputFormat::Json => format_output(&co2, &OutputFormat::Json, None)?,
    }
    Ok(())
}
