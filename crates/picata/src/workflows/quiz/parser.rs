use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::io::Read;

use super::normalizer::{is_question_id, normalize_column};
use super::table::{ScoreTable, StudentScores};
use crate::workflows::pairing::StudentId;
use crate::workflows::records::RecordError;

const SCORE_SUFFIX: &str = "_score";

/// Where each question's score lives in the exported header row.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct QuestionColumn {
    pub(crate) question_id: String,
    pub(crate) index: usize,
}

#[derive(Debug)]
struct Layout {
    id: usize,
    name: usize,
    total: Option<usize>,
    started: Option<usize>,
    finished: Option<usize>,
    questions: Vec<QuestionColumn>,
}

pub(crate) fn parse_table<R: Read>(
    reader: R,
    known_questions: &[String],
) -> Result<ScoreTable, RecordError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(normalize_column)
        .collect();
    let layout = resolve_layout(&headers, known_questions)?;

    let mut students = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let field = |index: usize| record.get(index).unwrap_or_default();

        let raw_id = field(layout.id);
        let id = raw_id
            .parse::<u64>()
            .map_err(|_| invalid("id", raw_id))?;

        let scores = layout
            .questions
            .iter()
            .map(|column| parse_score(&headers[column.index], field(column.index)))
            .collect::<Result<Vec<_>, _>>()?;

        let total = match layout.total {
            Some(index) if !field(index).is_empty() => Some(parse_score("score", field(index))?),
            _ => None,
        };

        students.push(StudentScores {
            id: StudentId(id),
            name: field(layout.name).to_string(),
            scores,
            total,
            started_at: layout.started.and_then(|index| parse_datetime(field(index))),
            finished_at: layout.finished.and_then(|index| parse_datetime(field(index))),
        });
    }

    let questions = layout
        .questions
        .into_iter()
        .map(|column| column.question_id)
        .collect();
    ScoreTable::new(questions, students)
}

fn resolve_layout(headers: &[String], known_questions: &[String]) -> Result<Layout, RecordError> {
    let position = |names: &[&str]| headers.iter().position(|h| names.contains(&h.as_str()));

    let id = position(&["id"]).ok_or_else(|| RecordError::MissingColumn("id".to_string()))?;
    let name =
        position(&["name"]).ok_or_else(|| RecordError::MissingColumn("name".to_string()))?;

    let questions = question_columns(headers, known_questions);
    if questions.is_empty() {
        return Err(RecordError::MissingColumn("question scores".to_string()));
    }

    Ok(Layout {
        id,
        name,
        total: position(&["score"]),
        started: position(&["started", "started_at"]),
        finished: position(&["submitted", "finished_at"]),
        questions,
    })
}

pub(crate) fn question_columns(headers: &[String], known_questions: &[String]) -> Vec<QuestionColumn> {
    let following = |predicate: &dyn Fn(&str) -> bool| {
        let mut columns = Vec::new();
        let mut index = 0;
        while index + 1 < headers.len() {
            if predicate(&headers[index]) {
                columns.push(QuestionColumn {
                    question_id: headers[index].clone(),
                    index: index + 1,
                });
                index += 2;
            } else {
                index += 1;
            }
        }
        columns
    };

    if !known_questions.is_empty() {
        let columns = following(&|header: &str| known_questions.iter().any(|q| q == header));
        if !columns.is_empty() {
            return columns;
        }
    }

    let suffixed: Vec<QuestionColumn> = headers
        .iter()
        .enumerate()
        .filter_map(|(index, header)| {
            header
                .strip_suffix(SCORE_SUFFIX)
                .filter(|question| !question.is_empty())
                .map(|question| QuestionColumn {
                    question_id: question.to_string(),
                    index,
                })
        })
        .collect();
    if !suffixed.is_empty() {
        return suffixed;
    }

    following(&is_question_id)
}

fn parse_score(column: &str, value: &str) -> Result<f64, RecordError> {
    if value.is_empty() {
        return Ok(0.0);
    }
    match value.parse::<f64>() {
        Ok(score) if score.is_finite() => Ok(score),
        _ => Err(invalid(column, value)),
    }
}

fn invalid(column: &str, value: &str) -> RecordError {
    RecordError::InvalidValue {
        column: column.to_string(),
        value: value.to_string(),
    }
}

pub(crate) fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc());
    }

    let without_zone = trimmed.trim_end_matches(" UTC");
    if let Ok(dt) = NaiveDateTime::parse_from_str(without_zone, "%Y-%m-%d %H:%M:%S") {
        return Some(dt);
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }

    None
}
