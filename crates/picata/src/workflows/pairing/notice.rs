use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use super::domain::{Pairing, StudentId};
use super::PairingError;

/// Outbound hook for delivering notices through the course-management service.
pub trait NoticeSender {
    fn send(&self, notice: &PairingNotice) -> Result<(), PairingError>;
}

/// Message sent to the members of one review group before class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairingNotice {
    pub recipients: Vec<StudentId>,
    pub first_names: Vec<String>,
    pub subject: String,
    pub body: String,
}

impl PairingNotice {
    pub fn for_group(
        group: &Pairing,
        names: &BTreeMap<StudentId, String>,
        session: NaiveDate,
        question_text: &str,
    ) -> Result<Self, PairingError> {
        let recipients = group.members().to_vec();
        let mut first_names = recipients
            .iter()
            .map(|id| {
                names
                    .get(id)
                    .map(|name| name.split_whitespace().next().unwrap_or_default().to_string())
                    .ok_or(PairingError::MissingStudent(*id))
            })
            .collect::<Result<Vec<_>, _>>()?;
        first_names.sort();

        let count = match group {
            Pairing::Pair { .. } => "two",
            Pairing::Triple { .. } => "three",
        };

        let body = format!(
            "Hello {names},\n  In our upcoming class session the {count} of you will meet to work \
             out a problem together. If you don't already know one another, then it may be helpful \
             to plan on meeting in a certain section of the room, or share a distinguishing \
             feature (e.g. 'I have a red hat on today').\n\nThere is no preparation required on \
             your part, however, if you want to see the type of problem you'll see today you can \
             refer to the quiz question shown below. Please wait until class for more details.\
             \n\nQuestion from previous quiz: {question_text}",
            names = first_names.join(", "),
        );

        Ok(Self {
            recipients,
            first_names,
            subject: format!("Today's quiz review session - {}", session.format("%Y.%m.%d")),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notice_addresses_sorted_first_names() {
        let names = BTreeMap::from([
            (StudentId(1), "Zoe Park".to_string()),
            (StudentId(2), "Avery Stone".to_string()),
            (StudentId(3), "Mika Lund".to_string()),
        ]);
        let group = Pairing::triple(StudentId(1), StudentId(2), StudentId(3), 1.0);
        let date = NaiveDate::from_ymd_opt(2024, 2, 6).expect("valid date");

        let notice = PairingNotice::for_group(&group, &names, date, "What is 2 + 2?")
            .expect("notice renders");

        assert_eq!(notice.first_names, vec!["Avery", "Mika", "Zoe"]);
        assert_eq!(notice.recipients, vec![StudentId(1), StudentId(2), StudentId(3)]);
        assert_eq!(notice.subject, "Today's quiz review session - 2024.02.06");
        assert!(notice.body.starts_with("Hello Avery, Mika, Zoe,"));
        assert!(notice.body.contains("the three of you"));
        assert!(notice.body.ends_with("What is 2 + 2?"));
    }

    #[test]
    fn notice_requires_known_names() {
        let group = Pairing::pair(StudentId(1), StudentId(9), 0.5);
        let names = BTreeMap::from([(StudentId(1), "Zoe Park".to_string())]);
        let date = NaiveDate::from_ymd_opt(2024, 2, 6).expect("valid date");

        match PairingNotice::for_group(&group, &names, date, "") {
            Err(PairingError::MissingStudent(id)) => assert_eq!(id, StudentId(9)),
            other => panic!("expected missing student, got {other:?}"),
        }
    }
}
