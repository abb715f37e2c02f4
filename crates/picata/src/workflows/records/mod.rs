//! CSV persistence for pairing records and bonus ledgers.

mod ledger;
mod pairing;

use chrono::NaiveDate;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::workflows::pairing::{PairingPolicy, StudentId};

pub use ledger::load_prior_bonus;
pub use pairing::{PairingRecord, PairingRow};

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("failed to access record file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("unable to encode report: {0}")]
    Json(#[from] serde_json::Error),
    #[error("required column '{0}' not found")]
    MissingColumn(String),
    #[error("column '{column}' holds invalid value '{value}'")]
    InvalidValue { column: String, value: String },
    #[error("student {0} appears more than once")]
    DuplicateStudent(StudentId),
}

/// Identifies the quiz and session a record file belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLabel {
    pub quiz_prefix: String,
    pub quiz_id: u64,
    pub date: NaiveDate,
}

impl RunLabel {
    pub fn new(quiz_title: &str, quiz_id: u64, date: NaiveDate) -> Self {
        Self {
            quiz_prefix: quiz_prefix(quiz_title),
            quiz_id,
            date,
        }
    }

    fn stamp(&self) -> String {
        self.date.format("%Y%m%d").to_string()
    }

    pub fn pairing_file_name(&self, policy: PairingPolicy) -> String {
        format!(
            "{}{}_pairing_via_{}_{}.csv",
            self.quiz_prefix,
            self.quiz_id,
            policy.tag(),
            self.stamp()
        )
    }

    pub fn bonus_file_name(&self) -> String {
        format!("{}{}_bonus_{}.csv", self.quiz_prefix, self.quiz_id, self.stamp())
    }

    pub fn comparison_file_name(&self) -> String {
        format!(
            "{}{}_compare_pairing_methods_{}.json",
            self.quiz_prefix,
            self.quiz_id,
            self.stamp()
        )
    }

    /// Newest bonus ledger for this quiz dated on or before this run's date.
    pub fn latest_bonus_file(&self, dir: &Path) -> Result<Option<PathBuf>, RecordError> {
        let prefix = format!("{}{}_bonus_", self.quiz_prefix, self.quiz_id);
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let mut latest: Option<(NaiveDate, PathBuf)> = None;
        for entry in entries {
            let path = entry?.path();
            let Some(date) = path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(|name| name.strip_prefix(prefix.as_str()))
                .and_then(|rest| rest.strip_suffix(".csv"))
                .and_then(|stamp| NaiveDate::parse_from_str(stamp, "%Y%m%d").ok())
            else {
                continue;
            };
            if date <= self.date && latest.as_ref().map_or(true, |(best, _)| date > *best) {
                latest = Some((date, path));
            }
        }

        Ok(latest.map(|(_, path)| path))
    }
}

/// File-name prefix derived from a quiz title, e.g. `"Quiz 3"` -> `"quiz_3_"`.
pub fn quiz_prefix(title: &str) -> String {
    format!("{}_", title.trim().to_lowercase().replace(' ', "_"))
}

/// Writes through a sibling temporary file and renames it into place, so a
/// failed write never leaves a partial record behind.
pub(crate) fn write_atomically<F>(path: &Path, write: F) -> Result<(), RecordError>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<(), RecordError>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let staging = staging_path(path);
    let result = File::create(&staging)
        .map_err(RecordError::from)
        .and_then(|file| {
            let mut writer = BufWriter::new(file);
            write(&mut writer)?;
            writer.flush()?;
            Ok(())
        })
        .and_then(|()| fs::rename(&staging, path).map_err(RecordError::from));

    if result.is_err() {
        let _ = fs::remove_file(&staging);
    }
    result
}

/// Writes `value` as pretty-printed JSON through the same staging file as
/// the CSV records.
pub fn write_json_to_path<T: Serialize>(path: &Path, value: &T) -> Result<(), RecordError> {
    write_atomically(path, |writer| {
        serde_json::to_writer_pretty(&mut *writer, value)?;
        Ok(())
    })?;
    tracing::info!(path = %path.display(), "report written");
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
