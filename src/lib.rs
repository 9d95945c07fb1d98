pub mod config;
pub mod error;
pub mod models;
pub mod recurrence; // Next occurrence, active-on-date, daily dose times
pub mod agenda; // Soonest-across-items reduction + daily agenda
pub mod report;

use std::path::PathBuf;

use chrono::NaiveDateTime;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use error::RunError;

fn parse_now(raw: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .map_err(|e| format!("expected YYYY-MM-DDTHH:MM:SS: {e}"))
}

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "cuidar")]
#[command(about = "Next task, next dose and today's agenda from an exported set of rows", long_about = None)]
#[command(version)]
pub struct Args {
    /// JSON export with "tarefas" and "medicamentos" arrays
    pub export: PathBuf,

    /// Reference instant instead of the local clock
    #[arg(long, value_parser = parse_now)]
    pub now: Option<NaiveDateTime>,
}

pub fn run() -> Result<(), RunError> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let now = args
        .now
        .unwrap_or_else(|| chrono::Local::now().naive_local());

    let export = report::load_export(&args.export)?;
    print!("{}", report::render(&export, now));
    Ok(())
}
