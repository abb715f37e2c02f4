use clap::Args;
use picata::config::AppConfig;
use picata::error::AppError;
use picata::workflows::bonus::{
    BonusAmount, BonusAwarder, BonusPolicy, BonusReconciler, BonusRecord,
};
use picata::workflows::records::{load_prior_bonus, PairingRecord};
use std::path::PathBuf;
use std::sync::Arc;

use crate::infra::DryRunGateway;
use crate::report::render_bonus;
use crate::session::{resolve, Session, SessionArgs};

#[derive(Args, Debug)]
pub(crate) struct BonusArgs {
    #[command(flatten)]
    pub(crate) session: SessionArgs,
    /// Pairing record from the earlier session
    #[arg(long)]
    pub(crate) pairings: PathBuf,
    /// Bonus ledger from an earlier run. Defaults to the newest ledger for
    /// this quiz in the data directory dated on or before the session date.
    #[arg(long)]
    pub(crate) prior_bonus: Option<PathBuf>,
    /// Points possible on today's quiz
    #[arg(long)]
    pub(crate) points_possible: f64,
    /// Bonus as a fraction of points possible (< 1) or absolute points (>= 1)
    #[arg(long)]
    pub(crate) bonus: Option<f64>,
    /// Largest distance counted as matching answers
    #[arg(long)]
    pub(crate) threshold: Option<f64>,
    /// Print results without writing the ledger
    #[arg(long)]
    pub(crate) no_write: bool,
}

pub(crate) fn run_bonus(args: BonusArgs, config: &AppConfig) -> Result<(), AppError> {
    let data_dir = &config.paths.data_dir;
    let session = Session::load(&args.session, config)?;
    let matrix = session.matrix()?;
    let history = PairingRecord::from_path(resolve(&args.pairings, data_dir))?;

    let ledger_path = data_dir.join(session.label.bonus_file_name());
    let prior_path = match args.prior_bonus.as_deref() {
        Some(path) => Some(resolve(path, data_dir)),
        None => session.label.latest_bonus_file(data_dir)?,
    };
    let prior = match &prior_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "using prior bonus ledger");
            load_prior_bonus(path)?
        }
        None => None,
    };

    let amount = BonusAmount::from_setting(args.bonus.unwrap_or(config.bonus.amount));
    let policy = BonusPolicy::new(amount, args.points_possible)
        .with_threshold(args.threshold.unwrap_or(config.bonus.threshold));
    let mut outcome =
        BonusReconciler::new(policy).reconcile(&history, &matrix, prior.as_ref())?;

    let gateway = Arc::new(DryRunGateway::default());
    let mut applied = BonusRecord::new();
    let awarded = BonusAwarder::new(gateway.clone()).award(&outcome, &mut applied);
    if awarded.is_err() {
        outcome.retain_applied(&applied);
    }
    let ledger = outcome.ledger(&session.table);

    if !args.no_write {
        ledger.write_to_path(&ledger_path)?;
    }
    let awarded = awarded?;
    tracing::info!(
        groups = outcome.groups.len(),
        newly_awarded = awarded.len(),
        "bonus reconciliation complete"
    );

    print!("{}", render_bonus(&outcome, &ledger));
    for (student, points) in gateway.applied() {
        println!("dry run: {points} fudge points for student {student} not sent");
    }
    Ok(())
}
