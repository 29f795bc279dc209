//! # Forgeable CLI
//!
//! Terminal front end for the BOM explosion and buildability engine.
//! Reads a data folder (`assemblies.csv`, `parts.csv`, `bom_items.csv`,
//! `stock.csv`), runs one calculation and prints a table or JSON.
//!
//! ```text
//! forge --data ./data explode PANEL-A
//! forge --data ./data buildable PANEL-A --format json
//! forge --data ./data plan PANEL-A --qty 25
//! forge --data ./data report --output report.json
//! forge --data ./data check
//! ```
//!
//! Logging goes to stderr; set `RUST_LOG` or pass `--debug`.

mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use forge_core::bom::{explode, BomIndex};
use forge_core::buildability::compute_max_buildable;
use forge_core::file_io::{load_settings, load_snapshot_dir, save_json};
use forge_core::report::{assembly_report, plan_build};
use forge_core::settings::CalcSettings;
use forge_core::snapshot::DataSnapshot;
use forge_core::ForgeError;

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Parser)]
#[command(name = "forge")]
#[command(about = "BOM explosion and buildability calculator", long_about = None)]
#[command(version)]
struct Cli {
    /// Data folder holding the CSV snapshot
    #[arg(long, global = true, value_name = "DIR", default_value = "data")]
    data: PathBuf,

    /// JSON settings file; flags below override it
    #[arg(long, global = true, value_name = "FILE")]
    settings: Option<PathBuf>,

    #[command(flatten)]
    overrides: SettingsOverrides,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Enable debug logging
    #[arg(short = 'd', long = "debug", global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Default)]
struct SettingsOverrides {
    /// Ignore scrap rates
    #[arg(long, global = true)]
    no_scrap: bool,

    /// Yield floor applied before dividing by yield
    #[arg(long, global = true, value_name = "FRACTION")]
    min_yield: Option<f64>,

    /// Count reserved stock as available
    #[arg(long, global = true)]
    ignore_reservations: bool,

    /// Maximum BOM nesting depth
    #[arg(long, global = true, value_name = "LEVELS")]
    max_depth: Option<usize>,
}

impl SettingsOverrides {
    fn apply(&self, mut settings: CalcSettings) -> CalcSettings {
        if self.no_scrap {
            settings.include_scrap = false;
        }
        if let Some(min_yield) = self.min_yield {
            settings.min_yield = min_yield;
        }
        if self.ignore_reservations {
            settings.respect_reservations = false;
        }
        if let Some(max_depth) = self.max_depth {
            settings.max_depth = max_depth;
        }
        settings
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Leaf requirements for one unit of an assembly
    #[command(alias = "e")]
    Explode(RootArgs),

    /// Maximum buildable quantity and limiting components
    #[command(alias = "b")]
    Buildable(RootArgs),

    /// Consumption and shortages for a planned run
    #[command(alias = "p")]
    Plan {
        #[command(flatten)]
        root: RootArgs,

        /// Number of units to build
        #[arg(short, long)]
        qty: u64,
    },

    /// Buildability of every assembly in the catalog
    #[command(alias = "r")]
    Report {
        /// Also write the JSON report to this file
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Validate BOM rows and explode every assembly
    Check,
}

#[derive(Args, Debug)]
struct RootArgs {
    /// Assembly SKU
    sku: String,

    /// Accept a SKU that is in neither the assembly nor the part catalog
    #[arg(long)]
    allow_unknown: bool,
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn resolve_settings(cli: &Cli) -> Result<CalcSettings> {
    let base = match &cli.settings {
        Some(path) => load_settings(path).with_context(|| format!("Reading settings {}", path.display()))?,
        None => CalcSettings::default(),
    };
    let settings = cli.overrides.apply(base);
    settings.validate()?;
    Ok(settings)
}

fn load_data(cli: &Cli) -> Result<DataSnapshot> {
    load_snapshot_dir(&cli.data).with_context(|| format!("Loading data folder {}", cli.data.display()))
}

fn check_root(snapshot: &DataSnapshot, root: &RootArgs) -> Result<()> {
    if !root.allow_unknown {
        snapshot.catalog().ensure_known(&root.sku)?;
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<bool> {
    let settings = resolve_settings(cli)?;
    debug!(?settings, data = %cli.data.display(), "resolved settings");
    let snapshot = load_data(cli)?;
    let format = cli.format;

    match &cli.command {
        Commands::Explode(root) => {
            check_root(&snapshot, root)?;
            let index = BomIndex::build(&snapshot.bom_items);
            let reqs = explode(&root.sku, &index, &settings.explode_options())?;
            output::requirements(format, &snapshot, &root.sku, &reqs)?;
            Ok(true)
        }
        Commands::Buildable(root) => {
            check_root(&snapshot, root)?;
            let index = BomIndex::build(&snapshot.bom_items);
            let reqs = explode(&root.sku, &index, &settings.explode_options())?;
            let result = compute_max_buildable(&reqs, &snapshot.stock, settings.respect_reservations);
            output::buildability(format, &snapshot, &root.sku, &result)?;
            Ok(true)
        }
        Commands::Plan { root, qty } => {
            check_root(&snapshot, root)?;
            let index = BomIndex::build(&snapshot.bom_items);
            let plan = plan_build(&root.sku, *qty, &index, &snapshot.stock, &settings)?;
            output::plan(format, &snapshot, &plan)?;
            Ok(plan.feasible)
        }
        Commands::Report { output: path } => {
            let report = assembly_report(&snapshot, &settings)?;
            if let Some(path) = path {
                save_json(&report, path).with_context(|| format!("Writing report {}", path.display()))?;
            }
            output::report(format, &report)?;
            let clean = report.failures().next().is_none();
            Ok(clean)
        }
        Commands::Check => {
            let findings = output::check(format, &snapshot, &settings)?;
            Ok(findings == 0)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.debug);

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {e:#}");
            if cli.format == OutputFormat::Json {
                if let Some(forge_error) = e.downcast_ref::<ForgeError>() {
                    if let Ok(json) = serde_json::to_string_pretty(forge_error) {
                        eprintln!();
                        eprintln!("Error JSON:");
                        eprintln!("{}", json);
                    }
                }
            }
            ExitCode::from(2)
        }
    }
}
