use serde::Deserialize;
use std::io::Read;
use std::path::Path;

use crate::workflows::pairing::StudentId;
use crate::workflows::records::RecordError;

#[derive(Debug, Clone, PartialEq)]
pub struct RosterEntry {
    pub name: String,
    pub id: StudentId,
    pub present: bool,
}

/// Attendance sheet for a single class session.
#[derive(Debug, Clone, Default)]
pub struct AttendanceRoster {
    entries: Vec<RosterEntry>,
}

impl AttendanceRoster {
    pub fn new(entries: Vec<RosterEntry>) -> Self {
        Self { entries }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, RecordError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, RecordError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut entries = Vec::new();

        for row in csv_reader.deserialize::<RosterRow>() {
            let row = row?;
            entries.push(RosterEntry {
                name: row.name,
                id: StudentId(row.id),
                present: row.present == Some(1.0),
            });
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[RosterEntry] {
        &self.entries
    }

    pub fn present(&self) -> impl Iterator<Item = &RosterEntry> {
        self.entries.iter().filter(|entry| entry.present)
    }

    pub fn present_count(&self) -> usize {
        self.present().count()
    }
}

#[derive(Debug, Deserialize)]
struct RosterRow {
    name: String,
    id: u64,
    #[serde(default)]
    present: Option<f64>,
}
