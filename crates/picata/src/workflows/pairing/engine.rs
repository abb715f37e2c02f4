use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use super::distance::DistanceMatrix;
use super::domain::{Pairing, PairingSummary};
use super::PairingError;

/// Rule for choosing which remaining student is paired next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairingPolicy {
    /// Student whose most-different partner is the most different overall.
    Max,
    /// Student at the middle of the sorted column maxima.
    Med,
    /// Student whose most-different partner is the least different overall.
    Min,
    /// Two students drawn uniformly at random.
    Rand,
}

impl PairingPolicy {
    pub const fn ordered() -> [Self; 4] {
        [Self::Med, Self::Max, Self::Min, Self::Rand]
    }

    pub const fn tag(self) -> &'static str {
        match self {
            Self::Max => "max",
            Self::Med => "med",
            Self::Min => "min",
            Self::Rand => "rand",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Max => "Max-Max Approach",
            Self::Med => "Median-Max Approach",
            Self::Min => "Min-Max Approach",
            Self::Rand => "Randomized Pairs",
        }
    }
}

impl fmt::Display for PairingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for PairingPolicy {
    type Err = PairingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "max" => Ok(Self::Max),
            "med" | "median" => Ok(Self::Med),
            "min" => Ok(Self::Min),
            "rand" | "random" => Ok(Self::Rand),
            _ => Err(PairingError::InvalidPolicy(value.to_string())),
        }
    }
}

/// Groups produced by one policy along with their distance summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairingRun {
    pub policy: PairingPolicy,
    pub pairings: Vec<Pairing>,
    pub summary: PairingSummary,
}

impl PairingRun {
    pub fn distances(&self) -> Vec<f64> {
        self.pairings.iter().map(Pairing::distance).collect()
    }
}

/// Greedy pairing over an immutable distance matrix.
pub struct PairingEngine<'m, R = SmallRng> {
    matrix: &'m DistanceMatrix,
    rng: R,
}

impl<'m> PairingEngine<'m, SmallRng> {
    pub fn new(matrix: &'m DistanceMatrix) -> Self {
        Self::with_rng(matrix, SmallRng::from_entropy())
    }

    pub fn seeded(matrix: &'m DistanceMatrix, seed: u64) -> Self {
        Self::with_rng(matrix, SmallRng::seed_from_u64(seed))
    }
}

impl<'m, R: Rng> PairingEngine<'m, R> {
    pub fn with_rng(matrix: &'m DistanceMatrix, rng: R) -> Self {
        Self { matrix, rng }
    }

    pub fn run(&mut self, policy: PairingPolicy) -> Result<PairingRun, PairingError> {
        let pairings = self.pair(policy)?;
        let summary = PairingSummary::from_pairings(&pairings);
        tracing::info!(
            policy = policy.tag(),
            groups = summary.groups,
            mean = summary.mean,
            variance = summary.variance,
            "pairing run complete"
        );
        Ok(PairingRun {
            policy,
            pairings,
            summary,
        })
    }

    /// Partitions every student in the matrix into pairs, folding a single
    /// leftover student into the last pair.
    pub fn pair(&mut self, policy: PairingPolicy) -> Result<Vec<Pairing>, PairingError> {
        let matrix = self.matrix;
        let ids = matrix.ids();
        if ids.len() < 2 {
            return Err(PairingError::InsufficientStudents { found: ids.len() });
        }

        let mut remaining: Vec<usize> = (0..ids.len()).collect();
        let mut pairings = Vec::with_capacity(ids.len() / 2);

        while remaining.len() > 2 {
            let (a, b, distance) = match policy {
                PairingPolicy::Rand => {
                    let drawn: Vec<usize> = remaining
                        .choose_multiple(&mut self.rng, 2)
                        .copied()
                        .collect();
                    (drawn[0], drawn[1], matrix.at(drawn[0], drawn[1]))
                }
                _ => {
                    let maxima = column_maxima(matrix, &remaining);
                    let chosen = select(policy, &maxima);
                    (chosen.student, chosen.partner, chosen.distance)
                }
            };

            tracing::debug!(
                policy = policy.tag(),
                person_a = %ids[a],
                person_b = %ids[b],
                distance,
                "paired students"
            );
            pairings.push(Pairing::pair(ids[a], ids[b], distance));
            remaining.retain(|index| *index != a && *index != b);
        }

        match remaining.as_slice() {
            [a, b] => pairings.push(Pairing::pair(ids[*a], ids[*b], matrix.at(*a, *b))),
            [leftover] => {
                let leftover = ids[*leftover];
                if let Some(last) = pairings.last_mut() {
                    if let Pairing::Pair {
                        members: [a, b],
                        distance,
                    } = *last
                    {
                        let to_a = matrix.require(a, leftover)?;
                        let to_b = matrix.require(b, leftover)?;
                        let representative = distance.max(to_a).max(to_b);
                        tracing::debug!(%leftover, representative, "formed triple");
                        *last = Pairing::triple(a, b, leftover, representative);
                    }
                }
            }
            _ => {}
        }

        Ok(pairings)
    }
}

/// Convenience wrapper running a single policy with an entropy-seeded RNG.
pub fn pair(matrix: &DistanceMatrix, policy: PairingPolicy) -> Result<Vec<Pairing>, PairingError> {
    PairingEngine::new(matrix).pair(policy)
}

#[derive(Debug, Clone, Copy)]
struct ColumnMax {
    student: usize,
    partner: usize,
    distance: f64,
}

/// Largest distance from each remaining student to any other remaining
/// student. Ties go to the partner with the lowest student id.
fn column_maxima(matrix: &DistanceMatrix, remaining: &[usize]) -> Vec<ColumnMax> {
    remaining
        .iter()
        .map(|&student| {
            let mut best: Option<(usize, f64)> = None;
            for &other in remaining.iter().filter(|other| **other != student) {
                let distance = matrix.at(student, other);
                if best.map_or(true, |(_, current)| distance > current) {
                    best = Some((other, distance));
                }
            }
            let (partner, distance) = best.unwrap_or((student, 0.0));
            ColumnMax {
                student,
                partner,
                distance,
            }
        })
        .collect()
}

fn select(policy: PairingPolicy, maxima: &[ColumnMax]) -> ColumnMax {
    let first_by = |wanted: Ordering| {
        maxima
            .iter()
            .copied()
            .reduce(|chosen, candidate| {
                if candidate.distance.total_cmp(&chosen.distance) == wanted {
                    candidate
                } else {
                    chosen
                }
            })
            .unwrap_or(maxima[0])
    };

    match policy {
        PairingPolicy::Max => first_by(Ordering::Greater),
        PairingPolicy::Min => first_by(Ordering::Less),
        // med; random draws never consult the column maxima
        _ => {
            let mut sorted = maxima.to_vec();
            sorted.sort_by(|x, y| x.distance.total_cmp(&y.distance));
            sorted[sorted.len() / 2]
        }
    }
}
