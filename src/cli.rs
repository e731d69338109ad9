use crate::columns::{generate_column_config, migrate_config_widths, reconcile_column_config, ColumnConfig};
use crate::config::RenderOptions;
use crate::pipeline::{prepare_job, ReportJob};
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "reportxl")]
#[command(about = "Render query results into template-preserving xlsx reports")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render a report job (title, query result, column config, formatting) to .xlsx
    Render {
        /// Job JSON file
        job: PathBuf,
        /// Output file or directory (defaults to the dated attachment name)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Render options JSON file
        #[arg(long)]
        options: Option<PathBuf>,
        /// Date stamped into the filename, YYYY-MM-DD (defaults to today)
        #[arg(long)]
        date: Option<String>,
        /// Write the reconciled column config here
        #[arg(long = "save-config")]
        save_config: Option<PathBuf>,
    },
    /// Build a fresh column config for a list of query columns
    Generate {
        #[arg(required = true)]
        columns: Vec<String>,
    },
    /// Reconcile a stored column config against the columns of a new run
    Reconcile {
        /// Column config JSON file
        config: PathBuf,
        /// Column names of the new query result
        #[arg(required = true)]
        columns: Vec<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Convert legacy pixel widths in a column config to character units
    MigrateWidths {
        /// Column config JSON file
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    run_command(cli.command)
}

pub fn run_command(command: Commands) -> Result<()> {
    match command {
        Commands::Render { job, output, options, date, save_config } => {
            handle_render(&job, output.as_deref(), options.as_deref(), date.as_deref(), save_config.as_deref())
        }
        Commands::Generate { columns } => {
            let config = generate_column_config(&columns);
            emit_config(&config, None)
        }
        Commands::Reconcile { config, columns, output } => {
            let existing = read_config(&config)?;
            let reconciled = reconcile_column_config(&existing, &columns);
            print_warnings(&reconciled.warnings);
            emit_config(&reconciled.config, output.as_deref())
        }
        Commands::MigrateWidths { config, output } => {
            let existing = read_config(&config)?;
            emit_config(&migrate_config_widths(&existing), output.as_deref())
        }
    }
}

fn handle_render(
    job_path: &Path,
    output: Option<&Path>,
    options_path: Option<&Path>,
    date: Option<&str>,
    save_config: Option<&Path>,
) -> Result<()> {
    let job = ReportJob::from_json_file(job_path)
        .with_context(|| format!("Failed to load report job {}", job_path.display()))?;
    let options = match options_path {
        Some(path) => RenderOptions::from_json_file(path)
            .with_context(|| format!("Failed to load render options {}", path.display()))?,
        None => RenderOptions::default(),
    };
    let date = match date {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", raw))?,
        None => Local::now().date_naive(),
    };

    let artifact = prepare_job(&job, date, &options)?;
    print_warnings(&artifact.warnings);

    let target = match output {
        Some(path) if path.is_dir() => path.join(&artifact.filename),
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(&artifact.filename),
    };
    fs::write(&target, &artifact.bytes)
        .with_context(|| format!("Failed to write {}", target.display()))?;

    if let Some(path) = save_config {
        emit_config(&artifact.column_config, Some(path))?;
    }

    println!("Wrote {} ({} rows)", target.display(), artifact.row_count);
    Ok(())
}

fn read_config(path: &Path) -> Result<Vec<ColumnConfig>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read column config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid column config {}", path.display()))
}

fn emit_config(config: &[ColumnConfig], output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    match output {
        Some(path) => fs::write(path, json + "\n").with_context(|| format!("Failed to write {}", path.display())),
        None => {
            println!("{}", json);
            Ok(())
        }
    }
}

fn print_warnings(warnings: &[String]) {
    for warning in warnings {
        eprintln!("Warning: {}", warning);
    }
}
