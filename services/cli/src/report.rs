use clap::Args;
use picata::config::AppConfig;
use picata::error::AppError;
use picata::workflows::bonus::{BonusLedger, BonusReconciliation};
use picata::workflows::pairing::{PairingPolicy, PairingSummary, PolicyComparison};
use picata::workflows::quiz::QuestionStats;
use picata::workflows::records::PairingRecord;
use std::fmt::Write as _;

use crate::session::{Session, SessionArgs};

const BAR_WIDTH: usize = 40;

#[derive(Args, Debug)]
pub(crate) struct StatsArgs {
    #[command(flatten)]
    pub(crate) session: SessionArgs,
    /// Print the statistics as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_stats(args: StatsArgs, config: &AppConfig) -> Result<(), AppError> {
    let session = Session::load(&args.session, config)?;
    let stats = QuestionStats::from_table(&session.table);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats).map_err(std::io::Error::from)?);
    } else {
        print!("{}", render_stats(&stats));
    }
    Ok(())
}

pub(crate) fn render_pairings(
    policy: PairingPolicy,
    record: &PairingRecord,
    summary: &PairingSummary,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({} groups)", policy.label(), summary.groups);
    for row in record.rows() {
        let mut members = vec![row.person1.as_str(), row.person2.as_str()];
        members.extend(row.person3.as_deref());
        let _ = writeln!(out, "  {:<60} {:.4}", members.join(" / "), row.distance);
    }
    let _ = writeln!(
        out,
        "mean distance {:.4} | variance {:.4}",
        summary.mean, summary.variance
    );
    out
}

pub(crate) fn render_comparison(comparison: &PolicyComparison) -> String {
    let mut out = String::new();
    for outcome in &comparison.outcomes {
        let _ = writeln!(
            out,
            "{}: mean {:.3} | variance {:.3}",
            outcome.label, outcome.summary.mean, outcome.summary.variance
        );
        let histogram = &outcome.histogram;
        for (bin, count) in histogram.counts.iter().enumerate() {
            let width = if comparison.y_max == 0 {
                0
            } else {
                count * BAR_WIDTH / comparison.y_max
            };
            let _ = writeln!(
                out,
                "  [{:.1}, {:.1}{} {:>3} {}",
                histogram.edges[bin],
                histogram.edges[bin + 1],
                if bin + 1 == histogram.counts.len() { "]" } else { ")" },
                count,
                "#".repeat(width)
            );
        }
    }
    out
}

pub(crate) fn render_stats(stats: &[QuestionStats]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<12} {:>8} {:>8} {:>6} {:>6} {:>8}",
        "question", "mean", "var", "zeros", "ones", "entropy"
    );
    for question in stats {
        let _ = writeln!(
            out,
            "{:<12} {:>8.3} {:>8.3} {:>6} {:>6} {:>8.3}",
            question.question_id,
            question.mean,
            question.variance,
            question.zeros,
            question.ones,
            question.entropy
        );
    }
    out
}

pub(crate) fn render_bonus(outcome: &BonusReconciliation, ledger: &BonusLedger) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "bonus per student: {}", outcome.bonus_points);
    for group in &outcome.groups {
        let members: Vec<String> = group.members.iter().map(|id| id.to_string()).collect();
        let _ = writeln!(
            out,
            "  {:<24} now {:.4} (was {:.4}) {}",
            members.join(" / "),
            group.current_distance,
            group.recorded_distance,
            if group.eligible { "match" } else { "-" }
        );
    }
    for row in ledger.rows().iter().filter(|row| row.bonus > 0.0) {
        let status = outcome.status(row.id);
        let _ = writeln!(
            out,
            "{:<28} {:>6.1} + {:>4.1} = {:>6.1} ({})",
            row.name,
            row.score,
            row.bonus,
            row.score_w_bonus,
            status.label()
        );
    }
    out
}
