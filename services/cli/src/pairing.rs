use chrono::{Local, NaiveDate};
use clap::Args;
use picata::config::AppConfig;
use picata::error::AppError;
use picata::workflows::pairing::{
    compare_policies, NoticeSender, PairingEngine, PairingNotice, PairingPolicy, StudentId,
};
use picata::workflows::records::{write_json_to_path, PairingRecord};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::infra::DraftNoticeSender;
use crate::report::{render_comparison, render_pairings};
use crate::session::{resolve, Session, SessionArgs};

#[derive(Args, Debug)]
pub(crate) struct PairArgs {
    #[command(flatten)]
    pub(crate) session: SessionArgs,
    /// Pairing method: max, med, min or rand. Defaults to the configured method.
    #[arg(long, value_parser = crate::infra::parse_policy)]
    pub(crate) policy: Option<PairingPolicy>,
    /// Seed for the rand method
    #[arg(long)]
    pub(crate) seed: Option<u64>,
    /// Print the pairing without writing the record file
    #[arg(long)]
    pub(crate) no_write: bool,
    /// Print the run as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct CompareArgs {
    #[command(flatten)]
    pub(crate) session: SessionArgs,
    /// Seed for the rand method
    #[arg(long)]
    pub(crate) seed: Option<u64>,
    /// Skip writing the JSON report
    #[arg(long)]
    pub(crate) no_write: bool,
    /// Print the comparison as JSON instead of text
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct NoticesArgs {
    /// Pairing record written by `picata pair`
    #[arg(long)]
    pub(crate) pairings: PathBuf,
    /// Review session date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) date: Option<NaiveDate>,
    /// Quiz question shown to students as a preview
    #[arg(long, default_value = "")]
    pub(crate) question_text: String,
}

pub(crate) fn run_pair(args: PairArgs, config: &AppConfig) -> Result<(), AppError> {
    let session = Session::load(&args.session, config)?;
    let matrix = session.matrix()?;
    let policy = args.policy.unwrap_or(config.pairing.policy);

    let run = match args.seed.or(config.pairing.seed) {
        Some(seed) => PairingEngine::seeded(&matrix, seed).run(policy)?,
        None => PairingEngine::new(&matrix).run(policy)?,
    };
    let record = PairingRecord::from_pairings(&run.pairings, &session.table.names())?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&run).map_err(std::io::Error::from)?);
    } else {
        print!("{}", render_pairings(policy, &record, &run.summary));
    }

    if args.no_write {
        return Ok(());
    }
    let path = config
        .paths
        .data_dir
        .join(session.label.pairing_file_name(policy));
    record.write_to_path(&path)?;
    Ok(())
}

pub(crate) fn run_compare(args: CompareArgs, config: &AppConfig) -> Result<(), AppError> {
    let session = Session::load(&args.session, config)?;
    let matrix = session.matrix()?;
    let rng = match args.seed.or(config.pairing.seed) {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    };
    let comparison = compare_policies(&matrix, rng)?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&comparison).map_err(std::io::Error::from)?
        );
    } else {
        print!("{}", render_comparison(&comparison));
    }

    if !args.no_write {
        let path = config
            .paths
            .report_dir
            .join(session.label.comparison_file_name());
        write_json_to_path(&path, &comparison)?;
    }
    Ok(())
}

pub(crate) fn run_notices(args: NoticesArgs, config: &AppConfig) -> Result<(), AppError> {
    let record = PairingRecord::from_path(resolve(&args.pairings, &config.paths.data_dir))?;
    let date = args.date.unwrap_or_else(|| Local::now().date_naive());
    let names = record_names(&record);
    let sender = DraftNoticeSender;

    for group in record.groups() {
        let notice = PairingNotice::for_group(&group, &names, date, &args.question_text)?;
        sender.send(&notice)?;
    }
    tracing::info!(groups = record.rows().len(), "notices drafted");
    Ok(())
}

fn record_names(record: &PairingRecord) -> BTreeMap<StudentId, String> {
    let mut names = BTreeMap::new();
    for row in record.rows() {
        names.insert(row.id1, row.person1.clone());
        names.insert(row.id2, row.person2.clone());
        if let (Some(id), Some(name)) = (row.id3, &row.person3) {
            names.insert(id, name.clone());
        }
    }
    names
}
