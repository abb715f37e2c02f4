use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::workflows::pairing::StudentId;

/// Configured bonus: a fraction of the quiz's points or a fixed point value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum BonusAmount {
    Fraction(f64),
    Points(f64),
}

impl BonusAmount {
    /// Values below 1.0 are fractions of the points possible; fractional
    /// results round half to even.
    pub fn from_setting(value: f64) -> Self {
        if value < 1.0 {
            Self::Fraction(value)
        } else {
            Self::Points(value)
        }
    }

    pub fn points(self, points_possible: f64) -> f64 {
        match self {
            Self::Fraction(fraction) => (fraction * points_possible).round_ties_even(),
            Self::Points(points) => points,
        }
    }

    pub fn resolve(value: f64, points_possible: f64) -> f64 {
        Self::from_setting(value).points(points_possible)
    }
}

/// Where a student stands after reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", content = "points", rename_all = "snake_case")]
pub enum BonusStatus {
    NotEligible,
    /// Earned in this run and not yet applied to the submission.
    Awarded(f64),
    /// Recorded by an earlier run; never applied twice.
    AlreadyAwarded(f64),
}

impl BonusStatus {
    pub fn points(self) -> f64 {
        match self {
            Self::NotEligible => 0.0,
            Self::Awarded(points) | Self::AlreadyAwarded(points) => points,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::NotEligible => "not eligible",
            Self::Awarded(_) => "awarded",
            Self::AlreadyAwarded(_) => "already awarded",
        }
    }
}

/// Bonus points awarded per student, persisted between runs.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct BonusRecord {
    awarded: BTreeMap<StudentId, f64>,
}

impl BonusRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, id: StudentId, points: f64) {
        self.awarded.insert(id, points);
    }

    pub fn points(&self, id: StudentId) -> f64 {
        self.awarded.get(&id).copied().unwrap_or_default()
    }

    pub fn already_awarded(&self, id: StudentId) -> bool {
        self.points(id) > 0.0
    }

    pub fn iter(&self) -> impl Iterator<Item = (StudentId, f64)> + '_ {
        self.awarded.iter().map(|(id, points)| (*id, *points))
    }
}

impl FromIterator<(StudentId, f64)> for BonusRecord {
    fn from_iter<T: IntoIterator<Item = (StudentId, f64)>>(iter: T) -> Self {
        Self {
            awarded: iter.into_iter().collect(),
        }
    }
}

/// One student's line in the bonus/score output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusLedgerRow {
    pub id: StudentId,
    pub name: String,
    pub score: f64,
    pub bonus: f64,
    pub score_w_bonus: f64,
    #[serde(default)]
    pub started_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub finished_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub elapsed_minutes: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BonusLedger {
    rows: Vec<BonusLedgerRow>,
}

impl BonusLedger {
    pub fn new(rows: Vec<BonusLedgerRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[BonusLedgerRow] {
        &self.rows
    }

    pub fn to_record(&self) -> BonusRecord {
        self.rows
            .iter()
            .filter(|row| row.bonus > 0.0)
            .map(|row| (row.id, row.bonus))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fractions_round_against_points_possible() {
        assert_eq!(BonusAmount::resolve(0.1, 14.0), 1.0);
        assert_eq!(BonusAmount::resolve(0.25, 10.0), 2.0);
        assert_eq!(BonusAmount::resolve(0.5, 5.0), 2.0);
        assert_eq!(BonusAmount::resolve(0.5, 3.0), 2.0);
    }

    #[test]
    fn values_of_one_or_more_are_absolute_points() {
        assert_eq!(BonusAmount::from_setting(1.0), BonusAmount::Points(1.0));
        assert_eq!(BonusAmount::resolve(2.0, 40.0), 2.0);
    }

    #[test]
    fn record_treats_zero_as_not_awarded() {
        let record: BonusRecord = [(StudentId(1), 2.0), (StudentId(2), 0.0)].into_iter().collect();
        assert!(record.already_awarded(StudentId(1)));
        assert!(!record.already_awarded(StudentId(2)));
        assert!(!record.already_awarded(StudentId(3)));
    }
}
