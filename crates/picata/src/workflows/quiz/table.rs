use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;

use super::roster::AttendanceRoster;
use crate::workflows::pairing::{ScoreVector, StudentId};
use crate::workflows::records::RecordError;

/// One row of a quiz score table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentScores {
    pub id: StudentId,
    pub name: String,
    pub scores: ScoreVector,
    pub total: Option<f64>,
    pub started_at: Option<NaiveDateTime>,
    pub finished_at: Option<NaiveDateTime>,
}

impl StudentScores {
    pub fn new(id: StudentId, name: impl Into<String>, scores: ScoreVector) -> Self {
        Self {
            id,
            name: name.into(),
            scores,
            total: None,
            started_at: None,
            finished_at: None,
        }
    }

    /// Quiz total as exported, falling back to the sum of question scores.
    pub fn raw_score(&self) -> f64 {
        self.total.unwrap_or_else(|| self.scores.iter().sum())
    }

    pub fn elapsed_minutes(&self) -> Option<f64> {
        match (self.started_at, self.finished_at) {
            (Some(started), Some(finished)) => {
                Some((finished - started).num_seconds() as f64 / 60.0)
            }
            _ => None,
        }
    }
}

/// Score vectors for every student who took a quiz, ordered by student id.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScoreTable {
    questions: Vec<String>,
    students: Vec<StudentScores>,
}

impl ScoreTable {
    pub fn new(
        questions: Vec<String>,
        mut students: Vec<StudentScores>,
    ) -> Result<Self, RecordError> {
        students.sort_by_key(|student| student.id);
        if let Some(window) = students.windows(2).find(|pair| pair[0].id == pair[1].id) {
            return Err(RecordError::DuplicateStudent(window[0].id));
        }

        Ok(Self {
            questions,
            students,
        })
    }

    pub fn questions(&self) -> &[String] {
        &self.questions
    }

    pub fn students(&self) -> &[StudentScores] {
        &self.students
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    pub fn get(&self, id: StudentId) -> Option<&StudentScores> {
        self.students
            .binary_search_by_key(&id, |student| student.id)
            .ok()
            .map(|index| &self.students[index])
    }

    pub fn names(&self) -> BTreeMap<StudentId, String> {
        self.students
            .iter()
            .map(|student| (student.id, student.name.clone()))
            .collect()
    }

    /// Restricts the table to students marked present on the roster.
    ///
    /// Present students without a submission get zero scores so they can
    /// still be paired.
    pub fn only_present(&self, roster: &AttendanceRoster) -> ScoreTable {
        let mut students = roster
            .present()
            .map(|entry| match self.get(entry.id) {
                Some(found) => StudentScores {
                    name: entry.name.clone(),
                    ..found.clone()
                },
                None => StudentScores {
                    total: Some(0.0),
                    ..StudentScores::new(
                        entry.id,
                        entry.name.clone(),
                        vec![0.0; self.questions.len()],
                    )
                },
            })
            .collect::<Vec<_>>();
        students.sort_by_key(|student| student.id);
        students.dedup_by_key(|student| student.id);

        ScoreTable {
            questions: self.questions.clone(),
            students,
        }
    }
}
