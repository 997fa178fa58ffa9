pub mod allocate;
pub mod config;
pub mod conversion;
pub mod estimate;
pub mod summary;

use crate::config::{CliConfig, OutputFormat};
use anyhow::{Context, Result};
use co2forecast_core::{
    ConversionCache, EmissionEstimate, EmissionsCalculator, EngineConfig, FeedBundle,
    ForecastError, GraphBuilder, Gwp, ProductionDatapoint, Triple,
};
use colored::*;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// Everything a command needs: settings, the loaded feed and a calculator over it
pub struct Session {
    pub format: OutputFormat,
    pub gwp: Gwp,
    pub country: Option<String>,
    pub feed: FeedBundle,
    pub calculator: EmissionsCalculator,
}

impl Session {
    pub fn open(config: &CliConfig, engine: EngineConfig, feed_path: &Path) -> Result<Self> {
        let feed = FeedBundle::load(feed_path)
            .with_context(|| format!("Failed to load feed {}", feed_path.display()))?;
        tracing::info!(
            constants = feed.conversions.len(),
            production = feed.production.len(),
            projection = feed.projection.len(),
            "Loaded feed {}",
            feed_path.display()
        );

        let cache = ConversionCache::new(GraphBuilder::new(&engine));
        let constants = Arc::new(feed.conversions.clone());
        let calculator =
            EmissionsCalculator::from_cache(engine, &cache, constants, config.country.as_deref());

        Ok(Self {
            format: config.output_format,
            gwp: config.gwp,
            country: config.country.clone(),
            feed,
            calculator,
        })
    }

    /// Log the conversion paths taken by this command
    pub fn flush_paths(&self) {
        self.calculator.conversion_set().path_log().flush();
    }

    /// Estimate a datapoint; a fuel type without a graph is reported and skipped
    pub fn estimate_or_skip(
        &self,
        datapoint: &ProductionDatapoint,
        gwp: Gwp,
    ) -> Result<Option<EmissionEstimate>> {
        match self.calculator.estimate(datapoint, gwp) {
            Ok(estimate) => Ok(Some(estimate)),
            Err(ForecastError::Conversion(e)) if e.is_missing_graph() => {
                print_warning(&format!(
                    "Skipping {} datapoint for {}: {}",
                    datapoint.fossil_fuel_type, datapoint.year, e
                ));
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Read a JSON document from disk
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Format output based on user preference
pub fn format_output<T: Serialize>(data: T, format: &OutputFormat, title: Option<&str>) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        OutputFormat::Text | OutputFormat::Table => {
            if let Some(title) = title {
                println!("{}", title.bold().green());
                println!("{}", "=".repeat(title.len()));
            }
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
    }
    Ok(())
}

/// `low / mid / high` with a fixed precision
pub fn fmt_triple(triple: &Triple) -> String {
    format!("{:.6} / {:.6} / {:.6}", triple[0], triple[1], triple[2])
}

pub fn table(header: Vec<&str>) -> comfy_table::Table {
    let mut table = comfy_table::Table::new();
    table
        .load_preset(comfy_table::presets::UTF8_FULL)
        .set_header(header);
    table
}

/// Print success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message.green());
}

/// Print error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message.red());
}

/// Print warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message.yellow());
}

/// Print info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message.blue());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_triple() {
        assert_eq!(fmt_triple(&[0.00038, 0.00042, 0.00046]), "0.000380 / 0.000420 / 0.000460");
    }

    #[test]
    fn test_session_reads_feed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feed.json");
        std::fs::write(
            &path,
            r#"{"conversions": [
                {"fromUnit": "e6bbl", "toUnit": "kgco2e", "fossilFuelType": "oil", "factor": 420000}
            ]}"#,
        )
        .unwrap();

        let config = CliConfig::default();
        let session = Session::open(&config, EngineConfig::default(), &path).unwrap();
        assert_eq!(session.feed.conversions.len(), 1);
        assert!(session.calculator.conversion_set().graph("oil").is_some());

        assert!(Session::open(&config, EngineConfig::default(), &dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_missing_graph_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feed.json");
        std::fs::write(
            &path,
            r#"{"conversions": [
                {"fromUnit": "e6bbl", "toUnit": "kgco2e", "fossilFuelType": "oil", "factor": 420000}
            ]}"#,
        )
        .unwrap();
        let session = Session::open(&CliConfig::default(), EngineConfig::default(), &path).unwrap();

        let oil = ProductionDatapoint::new("oil", 1.0, "e6bbl", 2022, 2);
        let estimate = session.estimate_or_skip(&oil, Gwp::Gwp100).unwrap().unwrap();
        assert!((estimate.scope3[1] - 0.00042).abs() < 1e-12);

        let peat = ProductionDatapoint::new("peat", 1.0, "e6ton", 2022, 2);
        assert!(session.estimate_or_skip(&peat, Gwp::Gwp100).unwrap().is_none());

        let condensate = ProductionDatapoint {
            subtype: Some("condensate".to_string()),
            ..oil.clone()
        };
        assert!(session.estimate_or_skip(&condensate, Gwp::Gwp100).unwrap().is_none());

        // A unit with no path is still fatal
        let tons = ProductionDatapoint::new("oil", 1.0, "e6ton", 2022, 2);
        assert!(session.estimate_or_skip(&tons, Gwp::Gwp100).is_err());
    }
}
