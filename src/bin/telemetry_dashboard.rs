//! telemetry-dashboard: upload, browse, chart and export telemetry exports
//!
//! Usage:
//!   # Unify and store one or more JSON exports
//!   telemetry-dashboard upload pumps.json presses.json
//!
//!   # Table view with filters
//!   telemetry-dashboard show --status Healthy --temp-min 40
//!
//!   # Export the filtered view as CSV into ./exports
//!   telemetry-dashboard export --date-from 2024-01-01 --output-dir ./exports
//!
//!   # Drop every stored record
//!   telemetry-dashboard clear --yes

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use log::LevelFilter;
use telemetry_unifier::config::DashboardConfig;
use telemetry_unifier::export::write_export;
use telemetry_unifier::report::{render_table, status_counts, temperature_series, DashboardView};
use telemetry_unifier::{
    ingest_files, init_logger, FilterForm, FilterSpec, JsonFileStore, RawFile, TelemetryStore,
};

#[derive(Parser, Debug)]
#[command(name = "telemetry-dashboard")]
#[command(about = "Unify, filter and export telemetry JSON exports", long_about = None)]
struct Cli {
    /// Store file holding accumulated records [env: TELEMETRY_STORE_PATH]
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Default log level, RUST_LOG still applies [env: TELEMETRY_LOG_LEVEL]
    #[arg(long, global = true)]
    log_level: Option<LevelFilter>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Unify JSON exports and append them to the store
    Upload {
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,
    },
    /// Print the filtered table view
    Show(FilterArgs),
    /// List distinct statuses in the store
    Statuses,
    /// Print the status distribution and temperature series
    Charts(FilterArgs),
    /// Write the filtered view as CSV
    Export {
        #[command(flatten)]
        filters: FilterArgs,

        /// Directory for the CSV file
        #[arg(long, short = 'o', default_value = ".")]
        output_dir: PathBuf,
    },
    /// Remove every stored record
    Clear {
        /// Confirm the irreversible clear
        #[arg(long)]
        yes: bool,
    },
}

/// Filter panel fields. Numeric bounds take the leading number of the
/// text (`12abc` is 12); text with no leading number is no constraint.
#[derive(Args, Debug)]
struct FilterArgs {
    /// Case-insensitive match on device ID or location
    #[arg(long, default_value = "")]
    search: String,

    /// Exact status ("all" for any)
    #[arg(long, default_value = "")]
    status: String,

    #[arg(long, default_value = "", allow_hyphen_values = true)]
    temp_min: String,

    #[arg(long, default_value = "", allow_hyphen_values = true)]
    temp_max: String,

    #[arg(long, default_value = "", allow_hyphen_values = true)]
    duration_min: String,

    #[arg(long, default_value = "", allow_hyphen_values = true)]
    duration_max: String,

    /// First day included (YYYY-MM-DD)
    #[arg(long, default_value = "")]
    date_from: String,

    /// Last day included, through 23:59:59.999 (YYYY-MM-DD)
    #[arg(long, default_value = "")]
    date_to: String,
}

impl From<FilterArgs> for FilterForm {
    fn from(args: FilterArgs) -> Self {
        FilterForm {
            search: args.search,
            status: args.status,
            temperature_min: args.temp_min,
            temperature_max: args.temp_max,
            duration_min: args.duration_min,
            duration_max: args.duration_max,
            date_from: args.date_from,
            date_to: args.date_to,
        }
    }
}

impl FilterArgs {
    fn into_spec(self) -> Result<FilterSpec> {
        let form = FilterForm::from(self);
        FilterSpec::from_form(&form).context("Invalid filter")
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = DashboardConfig::from_env();
    if let Some(path) = cli.store {
        config = config.with_store_path(path);
    }
    if let Some(level) = cli.log_level {
        config = config.with_log_level(level);
    }
    init_logger(config.log_level);
    config.warn_rejected();

    let store = JsonFileStore::new(&config.store_path);

    match cli.command {
        Command::Upload { files } => upload(&store, files),
        Command::Show(filters) => show(&store, filters.into_spec()?),
        Command::Statuses => statuses(&store),
        Command::Charts(filters) => charts(&store, filters.into_spec()?),
        Command::Export {
            filters,
            output_dir,
        } => export(&store, filters.into_spec()?, output_dir),
        Command::Clear { yes } => clear(&store, yes),
    }
}

fn upload(store: &JsonFileStore, paths: Vec<PathBuf>) -> Result<()> {
    let files: Vec<RawFile> = paths.into_iter().map(RawFile::from_path).collect();
    for file in files.iter().filter(|f| !f.has_json_extension()) {
        log::warn!("UPLOAD_NON_JSON_NAME file={}", file.name());
    }

    let result = ingest_files(store, &files).context("Failed to process files")?;
    for summary in &result.files {
        println!(
            "{}: {} records ({} flat, {} nested)",
            summary.name, summary.records, summary.flat, summary.nested
        );
    }
    println!(
        "Uploaded {} records; {} records loaded in {}",
        result.record_count(),
        store.len()?,
        store.path().display()
    );
    Ok(())
}

fn show(store: &JsonFileStore, spec: FilterSpec) -> Result<()> {
    let view = DashboardView::load(store, &spec)?;
    if view.total == 0 {
        println!("No telemetry data loaded");
        return Ok(());
    }
    println!("{}", view.summary_line());
    println!("{}", render_table(&view.filtered));
    Ok(())
}

fn statuses(store: &JsonFileStore) -> Result<()> {
    let view = DashboardView::load(store, &FilterSpec::default())?;
    for status in view.statuses {
        println!("{}", status);
    }
    Ok(())
}

fn charts(store: &JsonFileStore, spec: FilterSpec) -> Result<()> {
    let view = DashboardView::load(store, &spec)?;
    if view.filtered.is_empty() {
        println!("No data to chart");
        return Ok(());
    }

    println!("Status distribution");
    for (status, count) in status_counts(&view.filtered) {
        println!("  {:<20} {}", status, count);
    }

    println!("Temperature over time");
    for point in temperature_series(&view.filtered) {
        let value = point
            .value
            .map(|v| format!("{}°C", v))
            .unwrap_or_else(|| "-".to_string());
        println!("  {:<14} {}", point.label, value);
    }
    Ok(())
}

fn export(store: &JsonFileStore, spec: FilterSpec, output_dir: PathBuf) -> Result<()> {
    let view = DashboardView::load(store, &spec)?;
    let path = write_export(&output_dir, &view.filtered, Utc::now())
        .with_context(|| format!("Failed to export to {}", output_dir.display()))?;
    println!("Exported {} records to {}", view.filtered.len(), path.display());
    Ok(())
}

fn clear(store: &JsonFileStore, confirmed: bool) -> Result<()> {
    let count = store.len()?;
    if count == 0 {
        println!("No data to clear");
        return Ok(());
    }
    if !confirmed {
        bail!(
            "Refusing to clear {} records without --yes; this action cannot be undone",
            count
        );
    }
    store.clear()?;
    println!("Cleared {} records", count);
    Ok(())
}
