use chrono::{Local, NaiveDate};
use clap::Args;
use picata::config::AppConfig;
use picata::error::AppError;
use picata::workflows::pairing::{DistanceMatrix, DistanceMetric};
use picata::workflows::quiz::{AttendanceRoster, QuizReportImporter, ScoreTable};
use picata::workflows::records::RunLabel;
use std::path::{Path, PathBuf};

/// Inputs shared by every command that works from a quiz export.
#[derive(Args, Debug)]
pub(crate) struct SessionArgs {
    /// Quiz "student analysis" CSV export
    #[arg(long)]
    pub(crate) scores: PathBuf,
    /// Attendance sheet (name,id,present); only present students are kept
    #[arg(long)]
    pub(crate) present: Option<PathBuf>,
    /// Quiz title used to prefix record file names
    #[arg(long, default_value = "Quiz")]
    pub(crate) quiz_title: String,
    /// Course-site quiz id
    #[arg(long)]
    pub(crate) quiz_id: u64,
    /// Session date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) date: Option<NaiveDate>,
    /// Question ids to read scores for, comma separated
    #[arg(long, value_delimiter = ',')]
    pub(crate) questions: Vec<String>,
    /// Override the configured distance metric (euclid or cosine)
    #[arg(long, value_parser = crate::infra::parse_metric)]
    pub(crate) metric: Option<DistanceMetric>,
}

/// A quiz export loaded and filtered for one class session.
pub(crate) struct Session {
    pub(crate) table: ScoreTable,
    pub(crate) label: RunLabel,
    pub(crate) metric: DistanceMetric,
}

impl Session {
    pub(crate) fn load(args: &SessionArgs, config: &AppConfig) -> Result<Self, AppError> {
        let importer = QuizReportImporter::with_questions(args.questions.iter().cloned());
        let mut table = importer.from_path(resolve(&args.scores, &config.paths.data_dir))?;

        if let Some(roster_path) = &args.present {
            let roster = AttendanceRoster::from_path(resolve(roster_path, &config.paths.data_dir))?;
            tracing::info!(
                submitted = table.len(),
                present = roster.present_count(),
                "applying attendance"
            );
            table = table.only_present(&roster);
        }

        let date = args.date.unwrap_or_else(|| Local::now().date_naive());
        Ok(Self {
            table,
            label: RunLabel::new(&args.quiz_title, args.quiz_id, date),
            metric: args.metric.unwrap_or(config.pairing.metric),
        })
    }

    pub(crate) fn matrix(&self) -> Result<DistanceMatrix, AppError> {
        Ok(DistanceMatrix::build(&self.table, self.metric)?)
    }
}

/// Relative input paths that do not exist as given are looked up in the data directory.
pub(crate) fn resolve(path: &Path, data_dir: &Path) -> PathBuf {
    if path.is_relative() && !path.exists() {
        let candidate = data_dir.join(path);
        if candidate.exists() {
            return candidate;
        }
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_relative_paths_fall_back_to_data_dir() {
        let dir = std::env::temp_dir().join(format!("picata-cli-resolve-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("create data dir");
        std::fs::write(dir.join("roster_only_here.csv"), "name,id,present\n").expect("write");

        let resolved = resolve(Path::new("roster_only_here.csv"), &dir);
        assert_eq!(resolved, dir.join("roster_only_here.csv"));

        let untouched = resolve(Path::new("nowhere.csv"), &dir);
        assert_eq!(untouched, PathBuf::from("nowhere.csv"));

        std::fs::remove_dir_all(&dir).expect("cleanup");
    }
}
