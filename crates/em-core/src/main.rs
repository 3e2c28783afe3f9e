//! Emotion Monitor CLI.
//!
//! Drives the same interactions as the web front end: render a page,
//! analyze a text, and read the monitoring dashboard. Payloads go to
//! stdout as JSON or Markdown; logs and errors go to stderr.

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use em_common::error::format_error_human;
use em_common::{
    ConfigPaths, ConfigResolver, Error, MonitorConfig, OutputFormat, Page, StructuredError,
};
use em_core::dashboard::escape_cell;
use em_core::logging::{init_logging, LogConfig, LogFormat, LogLevel};
use em_core::{Analysis, EmotionMonitor, ExitCode};
use em_telemetry::{PageCount, PageVisitRecord, PredictionRecord, TableName, SCHEMA_VERSION};
use serde::Serialize;

/// Emotion Monitor - text emotion classification with usage telemetry
#[derive(Parser)]
#[command(name = "em-core")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Options shared by every command
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Path to monitor.json
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Telemetry data directory (overrides the config file)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Log level for stderr
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// Log line format for stderr
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create both telemetry tables if missing
    Init,

    /// Record a render of a page
    Visit {
        #[arg(value_enum)]
        page: Page,
    },

    /// Classify a text and record the prediction
    Analyze {
        /// Text to classify
        text: String,
    },

    /// List recorded page visits with per-page counts
    Visits,

    /// List recorded predictions
    Predictions,

    /// Show the monitoring dashboard
    Dashboard,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() {
                ExitCode::ArgsError
            } else {
                ExitCode::Clean
            };
            let _ = err.print();
            std::process::exit(code.as_i32());
        }
    };

    init_logging(&LogConfig::from_env(
        cli.global.log_level,
        cli.global.log_format,
    ));

    let exit_code = match run(&cli) {
        Ok(()) => ExitCode::Clean,
        Err(err) => report_error(&cli.global, &err),
    };
    std::process::exit(exit_code.as_i32());
}

fn run(cli: &Cli) -> Result<(), Error> {
    let global = &cli.global;
    let config = MonitorConfig::load(&ConfigResolver::new(ConfigPaths {
        config_path: global.config.clone(),
        data_dir: global.data_dir.clone(),
    }))?;
    let monitor = EmotionMonitor::from_config(&config)?;

    let payload = match &cli.command {
        Commands::Init => {
            let report = InitReport {
                status: "ok",
                schema_version: SCHEMA_VERSION,
                backend: config.store.backend.to_string(),
                data_dir: config.store.data_dir.clone(),
                tables: TableName::ALL.iter().map(|t| t.as_str()).collect(),
            };
            render(global.format, &report, init_markdown)?
        }
        Commands::Visit { page } => {
            let visit = monitor.render(*page)?;
            render(global.format, &visit, |v| {
                format!("Recorded visit to **{}** at {}\n", v.page_name, v.visit_time)
            })?
        }
        Commands::Analyze { text } => {
            monitor.render(Page::Home)?;
            let analysis = monitor.analyze(text)?;
            render(global.format, &analysis, analysis_markdown)?
        }
        Commands::Visits => {
            let report = VisitsReport {
                visits: monitor.store().visits().all_visits()?,
                page_counts: monitor.store().visits().ranked_visit_counts()?,
            };
            render(global.format, &report, visits_markdown)?
        }
        Commands::Predictions => {
            let predictions = monitor.store().predictions().all_predictions()?;
            render(global.format, &predictions, |p| predictions_markdown(p))?
        }
        Commands::Dashboard => {
            monitor.render(Page::Monitor)?;
            let dashboard = monitor.dashboard()?;
            render(global.format, &dashboard, |d| d.to_markdown())?
        }
    };

    print!("{}", payload);
    Ok(())
}

fn render<T: Serialize + ?Sized>(
    format: OutputFormat,
    value: &T,
    markdown: impl FnOnce(&T) -> String,
) -> Result<String, Error> {
    match format {
        OutputFormat::Json => Ok(format!("{}\n", serde_json::to_string_pretty(value)?)),
        OutputFormat::Md => Ok(markdown(value)),
    }
}

fn report_error(global: &GlobalOpts, err: &Error) -> ExitCode {
    tracing::debug!(code = err.code(), category = %err.category(), "command failed");
    match global.format {
        OutputFormat::Json => eprintln!("{}", StructuredError::from(err).to_json()),
        OutputFormat::Md => {
            let color = !global.no_color && std::io::stderr().is_terminal();
            eprintln!("{}", format_error_human(err, color));
        }
    }
    ExitCode::for_error(err)
}

// ============================================================================
// Payloads
// ============================================================================

#[derive(Serialize)]
struct InitReport {
    status: &'static str,
    schema_version: &'static str,
    backend: String,
    data_dir: PathBuf,
    tables: Vec<&'static str>,
}

#[derive(Serialize)]
struct VisitsReport {
    visits: Vec<PageVisitRecord>,
    page_counts: Vec<PageCount>,
}

fn init_markdown(report: &InitReport) -> String {
    let mut out = String::from("# Telemetry store ready\n\n");
    out.push_str(&format!("- Backend: {}\n", report.backend));
    out.push_str(&format!("- Data dir: {}\n", report.data_dir.display()));
    out.push_str(&format!("- Schema version: {}\n", report.schema_version));
    for table in &report.tables {
        out.push_str(&format!("- Table: `{}`\n", table));
    }
    out
}

fn analysis_markdown(analysis: &Analysis) -> String {
    let mut out = format!(
        "**{}** {} (confidence {:.4})\n\n| Emotion | Probability |\n|---|---:|\n",
        analysis.label.display_name(),
        analysis.emoji,
        analysis.confidence
    );
    let mut classes: Vec<_> = analysis.distribution.iter().collect();
    classes.sort_by(|a, b| b.probability.total_cmp(&a.probability));
    for class in classes {
        out.push_str(&format!("| {} | {:.4} |\n", class.label, class.probability));
    }
    out
}

fn visits_markdown(report: &VisitsReport) -> String {
    let mut out = String::from("| Page | Visits | Share |\n|---|---:|---:|\n");
    for c in &report.page_counts {
        out.push_str(&format!(
            "| {} | {} | {:.1}% |\n",
            escape_cell(&c.page_name),
            c.count,
            c.proportion * 100.0
        ));
    }
    out.push_str(&format!("\n{} visits recorded.\n", report.visits.len()));
    out
}

fn predictions_markdown(predictions: &[PredictionRecord]) -> String {
    let mut out = String::from("| Time | Text | Prediction | Probability |\n|---|---|---|---:|\n");
    for p in predictions {
        out.push_str(&format!(
            "| {} | {} | {} | {:.4} |\n",
            p.time,
            escape_cell(&p.text),
            escape_cell(&p.prediction),
            p.probability
        ));
    }
    out
}
