use chrono::NaiveDate;
use picata::workflows::bonus::{GatewayError, SubmissionGateway};
use picata::workflows::pairing::{
    DistanceMetric, NoticeSender, PairingError, PairingNotice, PairingPolicy, StudentId,
};
use std::sync::{Arc, Mutex};

/// Records fudge-point updates instead of sending them to the course site.
#[derive(Default, Clone)]
pub(crate) struct DryRunGateway {
    applied: Arc<Mutex<Vec<(StudentId, f64)>>>,
}

impl SubmissionGateway for DryRunGateway {
    fn apply_fudge_points(&self, student: StudentId, points: f64) -> Result<(), GatewayError> {
        tracing::info!(%student, points, "dry run: submission not updated");
        let mut guard = self.applied.lock().expect("gateway mutex poisoned");
        guard.push((student, points));
        Ok(())
    }
}

impl DryRunGateway {
    pub(crate) fn applied(&self) -> Vec<(StudentId, f64)> {
        self.applied.lock().expect("gateway mutex poisoned").clone()
    }
}

/// Prints each notice to stdout as a draft.
#[derive(Default)]
pub(crate) struct DraftNoticeSender;

impl NoticeSender for DraftNoticeSender {
    fn send(&self, notice: &PairingNotice) -> Result<(), PairingError> {
        let recipients: Vec<String> = notice.recipients.iter().map(|id| id.to_string()).collect();
        println!("To: {}", recipients.join(", "));
        println!("Subject: {}", notice.subject);
        println!("{}\n", notice.body);
        Ok(())
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn parse_policy(raw: &str) -> Result<PairingPolicy, String> {
    raw.parse::<PairingPolicy>().map_err(|err| err.to_string())
}

pub(crate) fn parse_metric(raw: &str) -> Result<DistanceMetric, String> {
    raw.parse::<DistanceMetric>()
}
