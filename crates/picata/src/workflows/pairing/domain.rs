use serde::{Deserialize, Serialize};
use std::fmt;

/// Course-management identifier for an enrolled student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentId(pub u64);

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for StudentId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Per-question scores for one student, in the quiz's question order.
pub type ScoreVector = Vec<f64>;

/// One peer review group produced by the pairing engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Pairing {
    Pair {
        members: [StudentId; 2],
        distance: f64,
    },
    Triple {
        members: [StudentId; 3],
        distance: f64,
    },
}

impl Pairing {
    pub fn pair(a: StudentId, b: StudentId, distance: f64) -> Self {
        Self::Pair {
            members: [a, b],
            distance,
        }
    }

    pub fn triple(a: StudentId, b: StudentId, c: StudentId, distance: f64) -> Self {
        Self::Triple {
            members: [a, b, c],
            distance,
        }
    }

    pub fn members(&self) -> &[StudentId] {
        match self {
            Self::Pair { members, .. } => members,
            Self::Triple { members, .. } => members,
        }
    }

    /// Representative distance: the pair distance, or the max of the triple's three.
    pub fn distance(&self) -> f64 {
        match self {
            Self::Pair { distance, .. } | Self::Triple { distance, .. } => *distance,
        }
    }

    pub fn size(&self) -> usize {
        self.members().len()
    }

    pub fn contains(&self, id: StudentId) -> bool {
        self.members().contains(&id)
    }
}

/// Mean and population variance of the representative distances of a run.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PairingSummary {
    pub groups: usize,
    pub mean: f64,
    pub variance: f64,
}

impl PairingSummary {
    pub fn from_pairings(pairings: &[Pairing]) -> Self {
        let distances: Vec<f64> = pairings.iter().map(Pairing::distance).collect();
        Self::from_distances(&distances)
    }

    pub fn from_distances(distances: &[f64]) -> Self {
        if distances.is_empty() {
            return Self::default();
        }

        let count = distances.len() as f64;
        let mean = distances.iter().sum::<f64>() / count;
        let variance = distances
            .iter()
            .map(|value| (value - mean).powi(2))
            .sum::<f64>()
            / count;

        Self {
            groups: distances.len(),
            mean,
            variance,
        }
    }
}
