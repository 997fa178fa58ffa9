// CO2 Forecast CLI Client
// Converts fossil fuel volumes, estimates emissions and allocates reserves from a JSON feed

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use co2forecast_cli::commands::{self, Session};
use co2forecast_cli::config::{CliConfig, OutputFormat};
use co2forecast_cli::logging;
use co2forecast_core::Gwp;
use colored::*;
use std::path::PathBuf;

fn print_banner() {
    println!(
        "{}",
        format!("  co2forecast v{}", co2forecast_core::VERSION).bright_cyan().bold()
    );
    println!(
        "{}",
        "  CO2e of fossil fuel production, projections and reserves".bright_white()
    );
    println!();
}

#[derive(Parser)]
#[command(name = "co2forecast")]
#[command(about = "Fossil fuel CO2e estimates and reserve forecasts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Feed document with constants, sources and datapoints (JSON)
    #[arg(long, global = true, env = "CO2FORECAST_FEED")]
    feed: Option<PathBuf>,

    /// Engine configuration (TOML), overrides the configured path
    #[arg(long, global = true)]
    engine_config: Option<PathBuf>,

    /// GWP horizon for Scope 1: 20 or 100
    #[arg(short, long, global = true)]
    gwp: Option<Gwp>,

    /// Country whose conversion constants override the defaults
    #[arg(short, long, global = true)]
    country: Option<String>,

    #[arg(short, long, global = true)]
    debug: bool,

    /// Output format: json, table or text
    #[arg(short, long, global = true)]
    format: Option<OutputFormat>,

    #[arg(long, global = true)]
    no_banner: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List fuel types known to the conversion graphs
    Fuels,

    /// Convert a volume between two units of a fuel
    Convert {
        #[arg(long)]
        fuel: String,

        #[arg(long)]
        from: String,

        #[arg(long)]
        to: String,

        #[arg(long, default_value_t = 1.0)]
        volume: f64,
    },

    /// Estimate Scope 1 and Scope 3 emissions of datapoints
    Estimate {
        /// JSON file with one datapoint or a list of datapoints
        #[arg(long, value_name = "FILE")]
        datapoint: PathBuf,
    },

    /// Allocate projected production against reserves
    Allocate {
        /// JSON file with the allocation request
        #[arg(long, value_name = "FILE")]
        input: PathBuf,
    },

    /// Current CO2e of the country's production
    Country,

    /// Latest-year emissions of a project
    Project {
        /// Project identifier
        #[arg(long)]
        id: String,
    },

    /// Manage CLI configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Write the default configuration file
    Init,
    /// Set configuration value
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },
    /// Reset to defaults
    Reset {
        #[arg(long)]
        yes: bool,
    },
}

fn main() {
    if let Err(e) = run() {
        commands::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = CliConfig::load()?;

    // Override with CLI arguments
    if let Some(format) = cli.format {
        config.output_format = format;
    }
    if let Some(gwp) = cli.gwp {
        config.gwp = gwp;
    }
    if let Some(country) = cli.country {
        config.country = Some(country.to_uppercase());
    }
    if let Some(path) = cli.engine_config {
        config.engine_config = Some(path);
    }
    if cli.debug {
        config.debug = true;
    }

    logging::init_logging(config.debug)?;

    if !cli.no_banner && config.output_format != OutputFormat::Json {
        print_banner();
    }

    if let Commands::Config(cmd) = &cli.command {
        return match cmd {
            ConfigCommands::Show => commands::config::show(&config),
            ConfigCommands::Init => commands::config::init(),
            ConfigCommands::Set { key, value } => commands::config::set(key, value),
            ConfigCommands::Reset { yes } => commands::config::reset(*yes),
        };
    }

    let engine = config.engine()?;
    engine.validate().context("Invalid engine configuration")?;
    let feed = cli
        .feed
        .context("A feed is required: pass --feed or set CO2FORECAST_FEED")?;
    let session = Session::open(&config, engine, &feed)?;

    match cli.command {
        Commands::Fuels => commands::conversion::fuels(&session),
        Commands::Convert {
            fuel,
            from,
            to,
            volume,
        } => commands::conversion::convert(&session, &fuel, &from, &to, volume),
        Commands::Estimate { datapoint } => commands::estimate::run(&session, &datapoint, session.gwp),
        Commands::Allocate { input } => commands::allocate::run(&session, &input),
        Commands::Country => commands::summary::country(&session),
        Commands::Project { id } => commands::summary::project(&session, &id),
        Commands::Config(_) => Ok(()),
    }
}
