use crate::bonus::{run_bonus, BonusArgs};
use crate::pairing::{run_compare, run_notices, run_pair, CompareArgs, NoticesArgs, PairArgs};
use crate::report::{run_stats, StatsArgs};
use clap::{Args, Parser, Subcommand};
use picata::config::AppConfig;
use picata::error::AppError;
use picata::telemetry;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "picata",
    about = "Pair students for quiz review sessions and track matching-answer bonuses",
    version
)]
pub(crate) struct Cli {
    #[command(flatten)]
    runtime: RuntimeArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Pair today's students and write the pairing record
    Pair(PairArgs),
    /// Run every pairing method over the same class and compare distances
    Compare(CompareArgs),
    /// Award bonuses to recorded groups whose answers now match
    Bonus(BonusArgs),
    /// Per-question score statistics for a quiz export
    Stats(StatsArgs),
    /// Draft the review-session message for each recorded group
    Notices(NoticesArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct RuntimeArgs {
    /// Override the configured directory for pairing and bonus records
    #[arg(long, global = true)]
    pub(crate) data_dir: Option<PathBuf>,
    /// Override the configured directory for comparison reports
    #[arg(long, global = true)]
    pub(crate) report_dir: Option<PathBuf>,
    /// Override the configured log level or filter
    #[arg(long, global = true)]
    pub(crate) log_level: Option<String>,
}

pub(crate) fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = load_config(cli.runtime)?;
    telemetry::init(&config.telemetry)?;

    tracing::debug!(
        data_dir = %config.paths.data_dir.display(),
        metric = config.pairing.metric.label(),
        "configuration loaded"
    );

    match cli.command {
        Command::Pair(args) => run_pair(args, &config),
        Command::Compare(args) => run_compare(args, &config),
        Command::Bonus(args) => run_bonus(args, &config),
        Command::Stats(args) => run_stats(args, &config),
        Command::Notices(args) => run_notices(args, &config),
    }
}

fn load_config(mut runtime: RuntimeArgs) -> Result<AppConfig, AppError> {
    let mut config = AppConfig::load()?;

    if let Some(data_dir) = runtime.data_dir.take() {
        config.paths.data_dir = data_dir;
    }
    if let Some(report_dir) = runtime.report_dir.take() {
        config.paths.report_dir = report_dir;
    }
    if let Some(log_level) = runtime.log_level.take() {
        config.telemetry.log_level = log_level;
    }

    Ok(config)
}
