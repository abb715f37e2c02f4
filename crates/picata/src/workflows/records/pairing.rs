use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::Path;

use super::{write_atomically, RecordError};
use crate::workflows::pairing::{Pairing, PairingError, StudentId};

const NO_STUDENT: &str = "-1";

/// Largest integer an `f64` holds exactly.
const MAX_EXACT_FLOAT_ID: f64 = 9_007_199_254_740_992.0;

/// One persisted review group.
#[derive(Debug, Clone, PartialEq)]
pub struct PairingRow {
    pub person1: String,
    pub person2: String,
    pub person3: Option<String>,
    pub id1: StudentId,
    pub id2: StudentId,
    pub id3: Option<StudentId>,
    pub distance: f64,
}

impl PairingRow {
    pub fn members(&self) -> Vec<StudentId> {
        let mut members = vec![self.id1, self.id2];
        members.extend(self.id3);
        members
    }

    pub fn to_pairing(&self) -> Pairing {
        match self.id3 {
            Some(id3) => Pairing::triple(self.id1, self.id2, id3, self.distance),
            None => Pairing::pair(self.id1, self.id2, self.distance),
        }
    }
}

/// Result of one pairing run as written to disk and later read back as history.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PairingRecord {
    rows: Vec<PairingRow>,
}

impl PairingRecord {
    pub fn new(rows: Vec<PairingRow>) -> Self {
        Self { rows }
    }

    pub fn from_pairings(
        pairings: &[Pairing],
        names: &BTreeMap<StudentId, String>,
    ) -> Result<Self, PairingError> {
        let name = |id: StudentId| {
            names
                .get(&id)
                .cloned()
                .ok_or(PairingError::MissingStudent(id))
        };

        let rows = pairings
            .iter()
            .map(|group| {
                let members = group.members();
                Ok(PairingRow {
                    person1: name(members[0])?,
                    person2: name(members[1])?,
                    person3: members.get(2).copied().map(name).transpose()?,
                    id1: members[0],
                    id2: members[1],
                    id3: members.get(2).copied(),
                    distance: group.distance(),
                })
            })
            .collect::<Result<Vec<_>, PairingError>>()?;

        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[PairingRow] {
        &self.rows
    }

    pub fn groups(&self) -> Vec<Pairing> {
        self.rows.iter().map(PairingRow::to_pairing).collect()
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, RecordError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, RecordError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut rows = Vec::new();

        for row in csv_reader.deserialize::<CsvPairingRow>() {
            let row = row?;
            let id3 = match row.id3.as_deref() {
                Some(value) => parse_member_id(value)?,
                None => None,
            };
            rows.push(PairingRow {
                person1: row.person1,
                person2: row.person2,
                person3: row.person3.filter(|_| id3.is_some()),
                id1: StudentId(row.id1),
                id2: StudentId(row.id2),
                id3,
                distance: row.distance,
            });
        }

        Ok(Self { rows })
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), RecordError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for row in &self.rows {
            csv_writer.serialize(CsvPairingRow {
                person1: row.person1.clone(),
                person2: row.person2.clone(),
                person3: row.person3.clone(),
                id1: row.id1.0,
                id2: row.id2.0,
                id3: Some(
                    row.id3
                        .map_or_else(|| NO_STUDENT.to_string(), |id| id.0.to_string()),
                ),
                distance: row.distance,
            })?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    pub fn write_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), RecordError> {
        let path = path.as_ref();
        write_atomically(path, |writer| self.write_to(writer))?;
        tracing::info!(path = %path.display(), groups = self.rows.len(), "pairing record written");
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CsvPairingRow {
    person1: String,
    person2: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    person3: Option<String>,
    id1: u64,
    id2: u64,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    id3: Option<String>,
    distance: f64,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

/// Third-member id: negative means no third member. Float-formatted ids
/// such as `5.0` are accepted when they are whole and exactly representable.
fn parse_member_id(value: &str) -> Result<Option<StudentId>, RecordError> {
    if let Ok(id) = value.parse::<u64>() {
        return Ok(Some(StudentId(id)));
    }
    if let Ok(id) = value.parse::<i64>() {
        return Ok((id >= 0).then(|| StudentId(id as u64)));
    }
    match value.parse::<f64>() {
        Ok(id) if id.is_finite() && id.fract() == 0.0 && id < 0.0 => Ok(None),
        Ok(id) if id.is_finite() && id.fract() == 0.0 && id <= MAX_EXACT_FLOAT_ID => {
            Ok(Some(StudentId(id as u64)))
        }
        _ => Err(RecordError::InvalidValue {
            column: "id3".to_string(),
            value: value.to_string(),
        }),
    }
}
