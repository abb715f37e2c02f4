//! Distance-based peer review pairing.

pub mod compare;
pub mod distance;
pub mod domain;
pub mod engine;
pub mod notice;

pub use compare::{compare_policies, DistanceHistogram, PolicyComparison, PolicyOutcome};
pub use distance::{DistanceMatrix, DistanceMetric, ZERO_DISTANCE_EPSILON};
pub use domain::{Pairing, PairingSummary, ScoreVector, StudentId};
pub use engine::{pair, PairingEngine, PairingPolicy, PairingRun};
pub use notice::{NoticeSender, PairingNotice};

/// Failures that abort a pairing or reconciliation run.
#[derive(Debug, thiserror::Error)]
pub enum PairingError {
    #[error("student {student} has {found} question scores, expected {expected}")]
    ShapeMismatch {
        student: StudentId,
        expected: usize,
        found: usize,
    },
    #[error("no students to process")]
    EmptyInput,
    #[error("student {student} has a score that is not a finite number")]
    InvalidScore { student: StudentId },
    #[error("distance between students {a} and {b} must be a finite, non-negative number")]
    InvalidDistance { a: StudentId, b: StudentId },
    #[error("invalid pairing method '{0}' (expected max, med, min or rand)")]
    InvalidPolicy(String),
    #[error("student {0} is not present in the current data")]
    MissingStudent(StudentId),
    #[error("at least two students are needed to form a pair, found {found}")]
    InsufficientStudents { found: usize },
    #[error("external service failed: {0}")]
    ExternalDependency(String),
}
