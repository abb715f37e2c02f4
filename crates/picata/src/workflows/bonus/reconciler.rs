use itertools::Itertools;
use serde::Serialize;
use std::collections::BTreeMap;

use super::domain::{BonusAmount, BonusLedger, BonusLedgerRow, BonusRecord, BonusStatus};
use crate::workflows::pairing::{DistanceMatrix, PairingError, StudentId};
use crate::workflows::quiz::ScoreTable;
use crate::workflows::records::PairingRecord;

/// Largest current distance at which a recorded group counts as matching.
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BonusPolicy {
    pub amount: BonusAmount,
    pub points_possible: f64,
    pub threshold: f64,
}

impl BonusPolicy {
    pub fn new(amount: BonusAmount, points_possible: f64) -> Self {
        Self {
            amount,
            points_possible,
            threshold: DEFAULT_MATCH_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn bonus_points(&self) -> f64 {
        self.amount.points(self.points_possible)
    }
}

/// A recorded group re-measured against today's answers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupCheck {
    pub members: Vec<StudentId>,
    pub recorded_distance: f64,
    pub current_distance: f64,
    pub eligible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BonusReconciliation {
    pub bonus_points: f64,
    pub groups: Vec<GroupCheck>,
    pub statuses: BTreeMap<StudentId, BonusStatus>,
}

impl BonusReconciliation {
    pub fn status(&self, id: StudentId) -> BonusStatus {
        self.statuses
            .get(&id)
            .copied()
            .unwrap_or(BonusStatus::NotEligible)
    }

    /// Students earning a bonus in this run, excluding anything recorded before.
    pub fn newly_awarded(&self) -> impl Iterator<Item = (StudentId, f64)> + '_ {
        self.statuses.iter().filter_map(|(id, status)| match status {
            BonusStatus::Awarded(points) => Some((*id, *points)),
            _ => None,
        })
    }

    /// Demotes this run's awards that never reached the submission gateway,
    /// so the persisted ledger only lists bonuses that were actually applied.
    pub fn retain_applied(&mut self, applied: &BonusRecord) {
        for (id, status) in self.statuses.iter_mut() {
            if matches!(status, BonusStatus::Awarded(_)) && !applied.already_awarded(*id) {
                *status = BonusStatus::NotEligible;
            }
        }
    }

    /// Bonus record to persist: prior awards plus this run's.
    pub fn record(&self) -> BonusRecord {
        self.statuses
            .iter()
            .filter(|(_, status)| status.points() > 0.0)
            .map(|(id, status)| (*id, status.points()))
            .collect()
    }

    /// Joins the outcome with the current scores, one row per student.
    ///
    /// A previously awarded bonus is assumed to already be part of the
    /// student's current score, so it is listed but not added again.
    /// Awarded students missing from `scores` keep a row with no score so
    /// the award survives into the next run's record.
    pub fn ledger(&self, scores: &ScoreTable) -> BonusLedger {
        let mut rows: Vec<BonusLedgerRow> = scores
            .students()
            .iter()
            .map(|student| {
                let status = self.status(student.id);
                let score = student.raw_score();
                let score_w_bonus = match status {
                    BonusStatus::Awarded(points) => score + points,
                    BonusStatus::NotEligible | BonusStatus::AlreadyAwarded(_) => score,
                };
                BonusLedgerRow {
                    id: student.id,
                    name: student.name.clone(),
                    score,
                    bonus: status.points(),
                    score_w_bonus,
                    started_at: student.started_at,
                    finished_at: student.finished_at,
                    elapsed_minutes: student.elapsed_minutes(),
                }
            })
            .collect();

        let carried = self
            .statuses
            .iter()
            .filter(|(id, status)| status.points() > 0.0 && scores.get(**id).is_none())
            .map(|(id, status)| BonusLedgerRow {
                id: *id,
                name: String::new(),
                score: 0.0,
                bonus: status.points(),
                score_w_bonus: 0.0,
                started_at: None,
                finished_at: None,
                elapsed_minutes: None,
            });
        rows.extend(carried);
        rows.sort_by_key(|row| row.id);

        BonusLedger::new(rows)
    }
}

/// Decides which previously paired students now give matching answers.
#[derive(Debug, Clone)]
pub struct BonusReconciler {
    policy: BonusPolicy,
}

impl BonusReconciler {
    pub fn new(policy: BonusPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &BonusPolicy {
        &self.policy
    }

    pub fn reconcile(
        &self,
        history: &PairingRecord,
        current: &DistanceMatrix,
        prior: Option<&BonusRecord>,
    ) -> Result<BonusReconciliation, PairingError> {
        let bonus_points = self.policy.bonus_points();
        let mut statuses: BTreeMap<StudentId, BonusStatus> = prior
            .into_iter()
            .flat_map(BonusRecord::iter)
            .filter(|(_, points)| *points > 0.0)
            .map(|(id, points)| (id, BonusStatus::AlreadyAwarded(points)))
            .collect();
        let mut groups = Vec::with_capacity(history.rows().len());

        for row in history.rows() {
            let members = row.members();
            let current_distance = representative_distance(current, &members)?;
            let eligible = current_distance <= self.policy.threshold;

            if eligible {
                for id in &members {
                    statuses
                        .entry(*id)
                        .or_insert(BonusStatus::Awarded(bonus_points));
                }
                tracing::info!(
                    members = ?members,
                    current_distance,
                    "recorded group now matches"
                );
            } else {
                for id in &members {
                    statuses.entry(*id).or_insert(BonusStatus::NotEligible);
                }
            }

            groups.push(GroupCheck {
                members,
                recorded_distance: row.distance,
                current_distance,
                eligible,
            });
        }

        Ok(BonusReconciliation {
            bonus_points,
            groups,
            statuses,
        })
    }
}

/// Max pairwise distance among the members, from the given matrix.
fn representative_distance(
    matrix: &DistanceMatrix,
    members: &[StudentId],
) -> Result<f64, PairingError> {
    members
        .iter()
        .tuple_combinations()
        .map(|(a, b)| matrix.require(*a, *b))
        .fold_ok(0.0_f64, f64::max)
}
