use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use super::domain::{ScoreVector, StudentId};
use super::PairingError;
use crate::workflows::quiz::ScoreTable;

/// Value stored in place of an exact zero so zero never appears as a distance.
pub const ZERO_DISTANCE_EPSILON: f64 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    #[default]
    Euclidean,
    Cosine,
}

impl DistanceMetric {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Euclidean => "euclid",
            Self::Cosine => "cosine",
        }
    }

    pub fn between(self, x: &[f64], y: &[f64]) -> f64 {
        match self {
            Self::Euclidean => x
                .iter()
                .zip(y)
                .map(|(a, b)| (a - b).powi(2))
                .sum::<f64>()
                .sqrt(),
            Self::Cosine => {
                let dot: f64 = x.iter().zip(y).map(|(a, b)| a * b).sum();
                let norm_x = x.iter().map(|a| a * a).sum::<f64>().sqrt();
                let norm_y = y.iter().map(|b| b * b).sum::<f64>().sqrt();
                match (norm_x == 0.0, norm_y == 0.0) {
                    (true, true) => 0.0,
                    (true, false) | (false, true) => 1.0,
                    (false, false) => (1.0 - dot / (norm_x * norm_y)).max(0.0),
                }
            }
        }
    }
}

impl FromStr for DistanceMetric {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "euclid" | "euclidean" => Ok(Self::Euclidean),
            "cosine" => Ok(Self::Cosine),
            other => Err(format!("unknown distance metric '{other}'")),
        }
    }
}

/// Symmetric student-by-student dissimilarity matrix.
///
/// Rows and columns follow ascending student id. The diagonal is left at zero
/// and is never returned by [`DistanceMatrix::distance`].
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    ids: Vec<StudentId>,
    index: HashMap<StudentId, usize>,
    values: Vec<f64>,
}

impl DistanceMatrix {
    pub fn build(table: &ScoreTable, metric: DistanceMetric) -> Result<Self, PairingError> {
        let vectors: BTreeMap<StudentId, &ScoreVector> = table
            .students()
            .iter()
            .map(|student| (student.id, &student.scores))
            .collect();
        Self::from_vectors(&vectors, metric)
    }

    pub fn from_vectors(
        vectors: &BTreeMap<StudentId, &ScoreVector>,
        metric: DistanceMetric,
    ) -> Result<Self, PairingError> {
        let expected = vectors
            .values()
            .next()
            .map(|scores| scores.len())
            .ok_or(PairingError::EmptyInput)?;

        if let Some((student, scores)) = vectors.iter().find(|(_, s)| s.len() != expected) {
            return Err(PairingError::ShapeMismatch {
                student: *student,
                expected,
                found: scores.len(),
            });
        }
        if let Some(student) = vectors
            .iter()
            .find(|(_, s)| s.iter().any(|score| !score.is_finite()))
            .map(|(student, _)| *student)
        {
            return Err(PairingError::InvalidScore { student });
        }

        let ids: Vec<StudentId> = vectors.keys().copied().collect();
        let rows: Vec<&ScoreVector> = vectors.values().copied().collect();
        let mut matrix = Self::zeroed(ids);
        let n = matrix.ids.len();

        for i in 0..n {
            for j in (i + 1)..n {
                matrix.set(i, j, metric.between(rows[i], rows[j]));
            }
        }

        tracing::debug!(students = n, metric = metric.label(), "distance matrix built");
        Ok(matrix)
    }

    /// Builds a matrix from explicit pairwise distances.
    ///
    /// Every unordered pair of `ids` must be supplied; entries may be given in
    /// either orientation.
    pub fn from_distances<I>(ids: Vec<StudentId>, entries: I) -> Result<Self, PairingError>
    where
        I: IntoIterator<Item = ((StudentId, StudentId), f64)>,
    {
        if ids.is_empty() {
            return Err(PairingError::EmptyInput);
        }

        let mut ids = ids;
        ids.sort();
        ids.dedup();
        let mut matrix = Self::zeroed(ids);
        let n = matrix.ids.len();
        let mut seen = vec![false; n * n];

        for ((a, b), distance) in entries {
            let i = matrix.position(a).ok_or(PairingError::MissingStudent(a))?;
            let j = matrix.position(b).ok_or(PairingError::MissingStudent(b))?;
            if i == j {
                continue;
            }
            if !distance.is_finite() || distance < 0.0 {
                return Err(PairingError::InvalidDistance { a, b });
            }
            matrix.set(i, j, distance);
            seen[i * n + j] = true;
            seen[j * n + i] = true;
        }

        for i in 0..n {
            for j in (i + 1)..n {
                if !seen[i * n + j] {
                    return Err(PairingError::MissingStudent(matrix.ids[j]));
                }
            }
        }

        Ok(matrix)
    }

    fn zeroed(ids: Vec<StudentId>) -> Self {
        let n = ids.len();
        let index = ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        Self {
            ids,
            index,
            values: vec![0.0; n * n],
        }
    }

    fn set(&mut self, i: usize, j: usize, distance: f64) {
        let distance = if distance == 0.0 {
            ZERO_DISTANCE_EPSILON
        } else {
            distance
        };
        let n = self.ids.len();
        self.values[i * n + j] = distance;
        self.values[j * n + i] = distance;
    }

    pub fn ids(&self) -> &[StudentId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: StudentId) -> bool {
        self.index.contains_key(&id)
    }

    pub(crate) fn position(&self, id: StudentId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// Raw entry by row/column index; the diagonal reads as zero.
    pub(crate) fn at(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.ids.len() + j]
    }

    pub fn distance(&self, a: StudentId, b: StudentId) -> Option<f64> {
        if a == b {
            return None;
        }
        Some(self.at(self.position(a)?, self.position(b)?))
    }

    /// Like [`DistanceMatrix::distance`] but fails for ids not in the matrix.
    pub fn require(&self, a: StudentId, b: StudentId) -> Result<f64, PairingError> {
        for id in [a, b] {
            if !self.contains(id) {
                return Err(PairingError::MissingStudent(id));
            }
        }
        Ok(self.distance(a, b).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::quiz::StudentScores;

    fn table(rows: &[(u64, &[f64])]) -> ScoreTable {
        let students = rows
            .iter()
            .map(|(id, scores)| StudentScores::new(StudentId(*id), format!("s{id}"), scores.to_vec()))
            .collect();
        ScoreTable::new(vec!["q".to_string()], students).expect("table builds")
    }

    #[test]
    fn identical_answers_are_clamped_to_epsilon() {
        let matrix = DistanceMatrix::build(
            &table(&[(1, &[1.0, 0.0]), (2, &[1.0, 0.0]), (3, &[0.0, 0.0])]),
            DistanceMetric::Euclidean,
        )
        .expect("matrix builds");

        assert_eq!(matrix.distance(StudentId(1), StudentId(2)), Some(ZERO_DISTANCE_EPSILON));
        assert_eq!(matrix.distance(StudentId(1), StudentId(3)), Some(1.0));
        assert_eq!(matrix.distance(StudentId(3), StudentId(1)), Some(1.0));
        assert_eq!(matrix.distance(StudentId(1), StudentId(1)), None);
    }

    #[test]
    fn euclidean_sums_squared_differences() {
        let d = DistanceMetric::Euclidean.between(&[0.0, 0.0], &[3.0, 4.0]);
        assert!((d - 5.0).abs() < 1e-12);
    }

    #[test]
    fn cosine_handles_zero_vectors() {
        let metric = DistanceMetric::Cosine;
        assert_eq!(metric.between(&[0.0, 0.0], &[0.0, 0.0]), 0.0);
        assert_eq!(metric.between(&[0.0, 0.0], &[1.0, 0.0]), 1.0);
        assert!((metric.between(&[1.0, 0.0], &[0.0, 1.0]) - 1.0).abs() < 1e-12);
        assert!(metric.between(&[1.0, 1.0], &[2.0, 2.0]).abs() < 1e-12);
    }

    #[test]
    fn mismatched_vectors_fail() {
        match DistanceMatrix::build(&table(&[(1, &[1.0]), (2, &[1.0, 0.0])]), DistanceMetric::Euclidean) {
            Err(PairingError::ShapeMismatch {
                student,
                expected,
                found,
            }) => {
                assert_eq!(student, StudentId(2));
                assert_eq!(expected, 1);
                assert_eq!(found, 2);
            }
            other => panic!("expected shape mismatch, got {other:?}"),
        }
    }

    #[test]
    fn empty_table_fails() {
        match DistanceMatrix::build(&table(&[]), DistanceMetric::Cosine) {
            Err(PairingError::EmptyInput) => {}
            other => panic!("expected empty input, got {other:?}"),
        }
    }

    #[test]
    fn non_finite_scores_fail() {
        let rows: &[(u64, &[f64])] = &[(1, &[1.0, 0.0]), (2, &[f64::NAN, 1.0]), (3, &[0.0, 1.0])];
        match DistanceMatrix::build(&table(rows), DistanceMetric::Euclidean) {
            Err(PairingError::InvalidScore { student }) => assert_eq!(student, StudentId(2)),
            other => panic!("expected invalid score, got {other:?}"),
        }
    }

    #[test]
    fn from_distances_rejects_unusable_distances() {
        let ids = vec![StudentId(1), StudentId(2)];
        for bad in [f64::NAN, f64::INFINITY, -0.5] {
            match DistanceMatrix::from_distances(ids.clone(), [((StudentId(2), StudentId(1)), bad)]) {
                Err(PairingError::InvalidDistance { a, b }) => {
                    assert_eq!((a, b), (StudentId(2), StudentId(1)));
                }
                other => panic!("expected invalid distance for {bad}, got {other:?}"),
            }
        }
    }

    #[test]
    fn from_distances_requires_every_pair() {
        let ids = vec![StudentId(1), StudentId(2), StudentId(3)];
        let result = DistanceMatrix::from_distances(
            ids,
            [((StudentId(1), StudentId(2)), 0.5), ((StudentId(2), StudentId(3)), 0.0)],
        );
        match result {
            Err(PairingError::MissingStudent(id)) => assert_eq!(id, StudentId(3)),
            other => panic!("expected missing pair, got {other:?}"),
        }
    }

    #[test]
    fn metric_parses_from_config_strings() {
        assert_eq!("euclid".parse::<DistanceMetric>(), Ok(DistanceMetric::Euclidean));
        assert_eq!(" Cosine ".parse::<DistanceMetric>(), Ok(DistanceMetric::Cosine));
        assert!("manhattan".parse::<DistanceMetric>().is_err());
    }
}
