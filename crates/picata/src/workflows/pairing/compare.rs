use rand::Rng;
use serde::Serialize;

use super::distance::DistanceMatrix;
use super::domain::PairingSummary;
use super::engine::{PairingEngine, PairingPolicy};
use super::PairingError;

pub const HISTOGRAM_BIN_WIDTH: f64 = 0.5;
pub const HISTOGRAM_UPPER_BOUND: f64 = 4.0;

/// Fixed-width histogram of representative distances.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistanceHistogram {
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl DistanceHistogram {
    /// Bins cover `[0, 4.0]` in steps of 0.5; the last bin includes its upper
    /// edge and values outside the range are not counted.
    pub fn from_distances(distances: &[f64]) -> Self {
        let bins = (HISTOGRAM_UPPER_BOUND / HISTOGRAM_BIN_WIDTH).round() as usize;
        let edges = (0..=bins)
            .map(|step| step as f64 * HISTOGRAM_BIN_WIDTH)
            .collect();
        let mut counts = vec![0; bins];

        for &distance in distances {
            if !(0.0..=HISTOGRAM_UPPER_BOUND).contains(&distance) {
                continue;
            }
            let bin = ((distance / HISTOGRAM_BIN_WIDTH).floor() as usize).min(bins - 1);
            counts[bin] += 1;
        }

        Self { edges, counts }
    }

    pub fn max_count(&self) -> usize {
        self.counts.iter().copied().max().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyOutcome {
    pub policy: PairingPolicy,
    pub label: &'static str,
    pub distances: Vec<f64>,
    pub summary: PairingSummary,
    pub histogram: DistanceHistogram,
}

/// Side-by-side distance distributions for every pairing policy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyComparison {
    pub outcomes: Vec<PolicyOutcome>,
    /// Shared y-axis ceiling so histograms can be read against each other.
    pub y_max: usize,
}

impl PolicyComparison {
    pub fn outcome(&self, policy: PairingPolicy) -> Option<&PolicyOutcome> {
        self.outcomes.iter().find(|outcome| outcome.policy == policy)
    }
}

pub fn compare_policies<R: Rng>(
    matrix: &DistanceMatrix,
    rng: R,
) -> Result<PolicyComparison, PairingError> {
    let mut engine = PairingEngine::with_rng(matrix, rng);
    let mut outcomes = Vec::with_capacity(PairingPolicy::ordered().len());

    for policy in PairingPolicy::ordered() {
        let run = engine.run(policy)?;
        let distances = run.distances();
        outcomes.push(PolicyOutcome {
            policy,
            label: policy.label(),
            histogram: DistanceHistogram::from_distances(&distances),
            summary: run.summary,
            distances,
        });
    }

    let y_max = outcomes
        .iter()
        .map(|outcome| outcome.histogram.max_count())
        .max()
        .unwrap_or_default();

    Ok(PolicyComparison { outcomes, y_max })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::pairing::StudentId;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn histogram_bins_are_half_wide_and_closed_at_four() {
        let histogram = DistanceHistogram::from_distances(&[0.0, 0.49, 0.5, 3.99, 4.0, 4.2, -1.0]);
        assert_eq!(histogram.edges.len(), 9);
        assert_eq!(histogram.edges[8], 4.0);
        assert_eq!(histogram.counts, vec![2, 1, 0, 0, 0, 0, 0, 2]);
        assert_eq!(histogram.max_count(), 2);
    }

    #[test]
    fn comparison_runs_every_policy_on_the_same_matrix() {
        let ids: Vec<StudentId> = (1..=6).map(StudentId).collect();
        let entries = ids.iter().flat_map(|a| {
            ids.iter()
                .filter(move |b| a < *b)
                .map(move |b| ((*a, *b), (a.0 * b.0) as f64 / 10.0))
        });
        let matrix = DistanceMatrix::from_distances(ids.clone(), entries).expect("matrix");

        let comparison =
            compare_policies(&matrix, SmallRng::seed_from_u64(7)).expect("comparison runs");

        let policies: Vec<_> = comparison.outcomes.iter().map(|o| o.policy).collect();
        assert_eq!(policies, PairingPolicy::ordered().to_vec());
        for outcome in &comparison.outcomes {
            assert_eq!(outcome.distances.len(), 3);
            assert_eq!(outcome.summary.groups, 3);
            assert!(outcome.histogram.max_count() <= comparison.y_max);
        }
        assert!(comparison.outcome(PairingPolicy::Rand).is_some());
    }
}
