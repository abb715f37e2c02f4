use std::io::{Read, Write};
use std::path::Path;

use super::{write_atomically, RecordError};
use crate::workflows::bonus::{BonusLedger, BonusLedgerRow, BonusRecord};

impl BonusLedger {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, RecordError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Reads a ledger written by any earlier run; older files only carry
    /// `name,id,score,score_w_bonus,bonus`.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, RecordError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut rows = Vec::new();
        for row in csv_reader.deserialize::<BonusLedgerRow>() {
            rows.push(row?);
        }
        Ok(Self::new(rows))
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), RecordError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for row in self.rows() {
            csv_writer.serialize(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    pub fn write_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), RecordError> {
        let path = path.as_ref();
        write_atomically(path, |writer| self.write_to(writer))?;
        tracing::info!(
            path = %path.display(),
            students = self.rows().len(),
            awarded = self.rows().iter().filter(|row| row.bonus > 0.0).count(),
            "bonus ledger written"
        );
        Ok(())
    }
}

/// Loads the bonus record kept by a previous run, if the file exists.
pub fn load_prior_bonus<P: AsRef<Path>>(path: P) -> Result<Option<BonusRecord>, RecordError> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no prior bonus ledger");
        return Ok(None);
    }
    Ok(Some(BonusLedger::from_path(path)?.to_record()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::pairing::StudentId;
    use chrono::NaiveDate;
    use std::io::Cursor;

    #[test]
    fn legacy_ledgers_load_without_timestamps() {
        let csv = "name,id,score,score_w_bonus,bonus\n\
Avery Stone,1,8.0,10.0,2.0\n\
Blair Quinn,2,6.0,6.0,0.0\n";
        let ledger = BonusLedger::from_reader(Cursor::new(csv)).expect("ledger parses");

        assert_eq!(ledger.rows().len(), 2);
        assert_eq!(ledger.rows()[0].started_at, None);
        let record = ledger.to_record();
        assert_eq!(record.points(StudentId(1)), 2.0);
        assert!(!record.already_awarded(StudentId(2)));
    }

    #[test]
    fn written_ledger_reads_back() {
        let started = NaiveDate::from_ymd_opt(2024, 2, 6)
            .and_then(|date| date.and_hms_opt(9, 0, 0))
            .expect("valid timestamp");
        let ledger = BonusLedger::new(vec![BonusLedgerRow {
            id: StudentId(7),
            name: "Casey Moss".to_string(),
            score: 9.0,
            bonus: 1.0,
            score_w_bonus: 10.0,
            started_at: Some(started),
            finished_at: None,
            elapsed_minutes: None,
        }]);

        let mut buffer = Vec::new();
        ledger.write_to(&mut buffer).expect("write succeeds");
        let text = String::from_utf8(buffer).expect("utf8");
        assert!(text.starts_with(
            "id,name,score,bonus,score_w_bonus,started_at,finished_at,elapsed_minutes\n"
        ));

        let parsed = BonusLedger::from_reader(Cursor::new(text)).expect("ledger parses");
        assert_eq!(parsed, ledger);
    }

    #[test]
    fn missing_prior_file_means_no_prior_awards() {
        let path = std::env::temp_dir().join("picata-no-such-bonus-ledger.csv");
        let prior = load_prior_bonus(&path).expect("missing file is fine");
        assert!(prior.is_none());
    }
}
