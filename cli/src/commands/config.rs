use crate::commands::{print_info, print_success, print_warning, table};
use crate::config::{CliConfig, OutputFormat};
use anyhow::{anyhow, bail, Result};
use co2forecast_core::Gwp;
use colored::*;
use std::path::PathBuf;

pub fn show(config: &CliConfig) -> Result<()> {
    match &config.output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        _ => {
            println!("\n{}", "Current Configuration".bold().green());

            let mut t = table(vec!["Setting", "Value"]);
            t.add_row(vec!["GWP horizon".to_string(), config.gwp.to_string()]);
            t.add_row(vec![
                "Country".to_string(),
                config.country.clone().unwrap_or_else(|| "(defaults)".to_string()),
            ]);
            t.add_row(vec!["Output format".to_string(), format!("{:?}", config.output_format)]);
            t.add_row(vec![
                "Engine config".to_string(),
                config
                    .engine_config
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(built-in)".to_string()),
            ]);
            t.add_row(vec![
                "Debug mode".to_string(),
                if config.debug { "Enabled" } else { "Disabled" }.to_string(),
            ]);
            println!("{t}");

            println!("\nConfig file: {}", CliConfig::config_path()?.display().to_string().cyan());
        }
    }

    Ok(())
}

/// Write the default configuration unless a file already exists
pub fn init() -> Result<()> {
    let path = CliConfig::config_path()?;
    if path.exists() {
        print_info(&format!("Configuration already exists at {}", path.display()));
        return Ok(());
    }
    let path = CliConfig::default().save()?;
    print_success(&format!("Configuration written to {}", path.display()));
    Ok(())
}

pub fn set(key: &str, value: &str) -> Result<()> {
    let mut config = CliConfig::load()?;
    let message = apply_setting(&mut config, key, value)?;
    config.save()?;
    print_success(&message);
    Ok(())
}

/// Update one setting in place; invalid keys and values are errors
fn apply_setting(config: &mut CliConfig, key: &str, value: &str) -> Result<String> {
    match key.to_lowercase().as_str() {
        "gwp" => {
            config.gwp = value.parse::<Gwp>().map_err(|e| anyhow!(e))?;
            Ok(format!("Set GWP horizon to: {}", config.gwp))
        }
        "country" => {
            config.country = match value {
                "" | "none" => None,
                code => Some(code.to_uppercase()),
            };
            Ok(format!("Set country to: {}", config.country.as_deref().unwrap_or("none")))
        }
        "format" | "output" | "output_format" => {
            config.output_format = value
                .parse::<OutputFormat>()
                .map_err(|_| anyhow!("Invalid output format. Must be: json, table, or text"))?;
            Ok(format!("Output format set to: {:?}", config.output_format))
        }
        "engine" | "engine_config" => {
            let engine_config = match value {
                "" | "none" => None,
                path => Some(PathBuf::from(path)),
            };
            let candidate = CliConfig {
                engine_config: engine_config.clone(),
                ..config.clone()
            };
            candidate.engine()?;
            config.engine_config = engine_config;
            Ok("Engine config updated".to_string())
        }
        "debug" => {
            config.debug = match value.to_lowercase().as_str() {
                "true" | "on" | "1" | "yes" => true,
                "false" | "off" | "0" | "no" => false,
                _ => bail!("Invalid debug value. Use: true/false, on/off, yes/no, 1/0"),
            };
            Ok(format!("Debug mode {}", if config.debug { "enabled" } else { "disabled" }))
        }
        _ => bail!(
            "Unknown configuration key: {} (valid keys: gwp, country, output_format, engine_config, debug)",
            key
        ),
    }
}

pub fn reset(confirmed: bool) -> Result<()> {
    if !confirmed {
        print_warning("This will reset all configuration to default values. Re-run with --yes to confirm.");
        return Ok(());
    }

    let config = CliConfig::default();
    config.save()?;

    print_success("Configuration reset to defaults");
    show(&config)
}
