//! Quiz report import: score tables, attendance filtering and per-question statistics.

mod normalizer;
mod parser;
pub mod roster;
pub mod stats;
pub mod table;

use std::io::Read;
use std::path::Path;

use crate::workflows::records::RecordError;

pub use roster::{AttendanceRoster, RosterEntry};
pub use stats::QuestionStats;
pub use table::{ScoreTable, StudentScores};

/// Loads a quiz "student analysis" export into a [`ScoreTable`].
///
/// Question score columns are detected from the header row; pass the quiz's
/// question ids to pin the selection when the export carries extra numeric
/// columns.
#[derive(Debug, Default, Clone)]
pub struct QuizReportImporter {
    question_ids: Vec<String>,
}

impl QuizReportImporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_questions<I, S>(question_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            question_ids: question_ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_path<P: AsRef<Path>>(&self, path: P) -> Result<ScoreTable, RecordError> {
        let file = std::fs::File::open(path)?;
        self.from_reader(file)
    }

    pub fn from_reader<R: Read>(&self, reader: R) -> Result<ScoreTable, RecordError> {
        let table = parser::parse_table(reader, &self.question_ids)?;
        tracing::debug!(
            students = table.len(),
            questions = table.questions().len(),
            "quiz report imported"
        );
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::pairing::StudentId;
    use std::io::Cursor;

    const EXPORT: &str = "name,id,sis_id,section,submitted,attempt,\
48213: Which sort is stable?,1.0,48214: Name a heap operation,1.0,n correct,n incorrect,score\n\
Avery Stone,101,s1,A,2024-02-06 14:03:55 UTC,1,Merge sort,1,push,0.5,1,1,1.5\n\
Blair Quinn,102,s2,A,2024-02-06 14:05:00 UTC,1,Quick sort,0,,,0,2,0\n";

    #[test]
    fn importer_reads_raw_export_columns() {
        let table = QuizReportImporter::new()
            .from_reader(Cursor::new(EXPORT))
            .expect("export parses");

        assert_eq!(table.questions(), ["48213".to_string(), "48214".to_string()]);
        let avery = table.get(StudentId(101)).expect("avery present");
        assert_eq!(avery.name, "Avery Stone");
        assert_eq!(avery.scores, vec![1.0, 0.5]);
        assert_eq!(avery.total, Some(1.5));
        assert!(avery.finished_at.is_some());

        let blair = table.get(StudentId(102)).expect("blair present");
        assert_eq!(blair.scores, vec![0.0, 0.0]);
    }

    #[test]
    fn importer_reads_normalized_score_tables() {
        let csv = "id,name,q1_score,q2_score\n2,Blair,0,1\n1,Avery,1,1\n";
        let table = QuizReportImporter::new()
            .from_reader(Cursor::new(csv))
            .expect("table parses");

        assert_eq!(table.questions(), ["q1".to_string(), "q2".to_string()]);
        assert_eq!(table.students()[0].id, StudentId(1));
        assert_eq!(table.students()[1].scores, vec![0.0, 1.0]);
    }

    #[test]
    fn importer_requires_an_id_column() {
        let csv = "name,q1_score\nAvery,1\n";
        match QuizReportImporter::new().from_reader(Cursor::new(csv)) {
            Err(RecordError::MissingColumn(column)) => assert_eq!(column, "id"),
            other => panic!("expected missing id column, got {other:?}"),
        }
    }

    #[test]
    fn importer_rejects_non_numeric_ids() {
        let csv = "id,name,q1_score\nabc,Avery,1\n";
        match QuizReportImporter::new().from_reader(Cursor::new(csv)) {
            Err(RecordError::InvalidValue { column, .. }) => assert_eq!(column, "id"),
            other => panic!("expected invalid id, got {other:?}"),
        }
    }

    #[test]
    fn importer_rejects_non_finite_scores() {
        let csv = "id,name,q1_score\n1,Avery,NaN\n2,Blair,1\n";
        match QuizReportImporter::new().from_reader(Cursor::new(csv)) {
            Err(RecordError::InvalidValue { value, .. }) => assert_eq!(value, "NaN"),
            other => panic!("expected invalid score, got {other:?}"),
        }
    }
}
