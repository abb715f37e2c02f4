use serde::Serialize;

use super::table::ScoreTable;

/// Descriptive statistics for one question's score column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionStats {
    pub question_id: String,
    pub mean: f64,
    /// Sample variance (n - 1 denominator); NaN with fewer than two scores.
    pub variance: f64,
    pub zeros: usize,
    pub ones: usize,
    /// Shannon entropy, natural log, of the column normalized to sum to one.
    pub entropy: f64,
}

impl QuestionStats {
    pub fn from_table(table: &ScoreTable) -> Vec<QuestionStats> {
        table
            .questions()
            .iter()
            .enumerate()
            .map(|(index, question_id)| {
                let column: Vec<f64> = table
                    .students()
                    .iter()
                    .filter_map(|student| student.scores.get(index).copied())
                    .collect();
                Self::from_column(question_id, &column)
            })
            .collect()
    }

    fn from_column(question_id: &str, column: &[f64]) -> Self {
        let count = column.len() as f64;
        let mean = if column.is_empty() {
            f64::NAN
        } else {
            column.iter().sum::<f64>() / count
        };
        let variance = if column.len() < 2 {
            f64::NAN
        } else {
            column.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (count - 1.0)
        };

        Self {
            question_id: question_id.to_string(),
            mean,
            variance,
            zeros: column.iter().filter(|x| **x == 0.0).count(),
            ones: column.iter().filter(|x| **x == 1.0).count(),
            entropy: entropy(column),
        }
    }
}

fn entropy(column: &[f64]) -> f64 {
    let total: f64 = column.iter().sum();
    if total <= 0.0 {
        return f64::NAN;
    }

    column
        .iter()
        .filter(|x| **x > 0.0)
        .map(|x| {
            let p = x / total;
            -p * p.ln()
        })
        .sum()
}
