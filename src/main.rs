//! welllog: command-line front end for the well-log engine

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use welllog_engine::query::{parse_curve_list, DepthBounds};
use welllog_engine::service::InterpretRequest;
use welllog_engine::{narrative, EngineConfig, WellLogService};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "welllog")]
#[command(about = "LAS well-log ingestion and depth-series analytics")]
#[command(version)]
struct CliArgs {
    /// Config file (overrides WELLLOG_CONFIG and ./welllog.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Owner identity used for every well operation
    #[arg(long, env = "WELLLOG_OWNER", default_value = "1")]
    owner: u64,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Args, Debug)]
struct RangeArgs {
    /// Comma-separated curve mnemonics, e.g. GR,RHOB
    #[arg(long, default_value = "")]
    curves: String,

    /// Start depth (defaults to the well's STRT)
    #[arg(long, allow_hyphen_values = true)]
    start: Option<f64>,

    /// End depth (defaults to the well's STOP)
    #[arg(long, allow_hyphen_values = true)]
    end: Option<f64>,
}

impl RangeArgs {
    fn curve_list(&self) -> Vec<String> {
        parse_curve_list(&self.curves)
    }

    fn bounds(&self) -> DepthBounds {
        DepthBounds::new(self.start, self.end)
    }
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Parse and ingest a LAS file
    Ingest {
        file: PathBuf,
    },
    /// List wells, newest first
    Wells,
    /// List a well's curves
    Curves {
        well: u64,
    },
    /// Rows in a depth range projected onto curves
    Query {
        well: u64,
        #[command(flatten)]
        range: RangeArgs,
    },
    /// Per-curve statistics (all curves when --curves is omitted)
    Aggregate {
        well: u64,
        #[command(flatten)]
        range: RangeArgs,
    },
    /// Evenly strided subset of a range query
    Sample {
        well: u64,
        #[command(flatten)]
        range: RangeArgs,
        #[arg(long, default_value = "60")]
        max: usize,
    },
    /// Delete a well with its curves and rows
    Delete {
        well: u64,
    },
    /// Print the interpretation payload and prompt for a range
    Prompt {
        well: u64,
        #[command(flatten)]
        range: RangeArgs,
    },
    /// Print the effective configuration as TOML
    Config,
}

fn load_config(path: Option<&PathBuf>) -> Result<EngineConfig> {
    let config = match path {
        Some(p) => EngineConfig::load_from_file(p)?,
        None => EngineConfig::load(),
    };
    config.validate()?;
    Ok(config)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    let config = load_config(args.config.as_ref())?;

    if let SubCommand::Config = args.command {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let service = WellLogService::open(config)?;
    let owner = args.owner;

    match args.command {
        SubCommand::Ingest { file } => {
            let bytes = std::fs::read(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "upload.las".to_string());
            let receipt = service.upload(owner, &name, &bytes)?;
            info!(well_id = receipt.well_id, "LAS file processed successfully");
            print_json(&receipt)?;
        }
        SubCommand::Wells => print_json(&service.list_wells(owner)?)?,
        SubCommand::Curves { well } => print_json(&service.curves(well, owner)?)?,
        SubCommand::Query { well, range } => {
            print_json(&service.query_range(well, owner, &range.curve_list(), range.bounds())?)?
        }
        SubCommand::Aggregate { well, range } => {
            let stats = service
                .aggregate(well, owner, &range.curve_list(), range.bounds())
                .await?;
            print_json(&stats)?;
        }
        SubCommand::Sample { well, range, max } => print_json(&service.sample(
            well,
            owner,
            &range.curve_list(),
            range.bounds(),
            max,
        )?)?,
        SubCommand::Delete { well } => {
            service.delete_well(well, owner)?;
            println!("Well {} deleted", well);
        }
        SubCommand::Prompt { well, range } => {
            let request = InterpretRequest {
                well_id: well,
                curves: range.curve_list(),
                start_depth: range.start,
                end_depth: range.end,
            };
            let payload = service.prepare_interpretation(owner, &request)?;
            print_json(&payload)?;
            println!();
            println!("{}", narrative::analysis_prompt(&payload)?);
        }
        SubCommand::Config => {}
    }

    Ok(())
}
