use std::io::Cursor;

use picata::workflows::pairing::{DistanceMatrix, DistanceMetric, StudentId};
use picata::workflows::quiz::{AttendanceRoster, QuestionStats, QuizReportImporter};

const EXPORT: &str = "\u{feff}name,id,sis_id,section,started,submitted,attempt,\
61001: Big-O of binary search?,1.0,61002: Define a stable sort,1.0,n correct,n incorrect,score\n\
Avery Stone,201,s1,A,2024-02-13 09:00:00 UTC,2024-02-13 09:12:00 UTC,1,log n,1,keeps order,1,2,0,2\n\
Blair Quinn,202,s2,A,2024-02-13 09:01:00 UTC,2024-02-13 09:10:30 UTC,1,n,0,keeps order,1,1,1,1\n\
Casey Moss,203,s3,B,2024-02-13 09:02:00 UTC,2024-02-13 09:20:00 UTC,1,n^2,0,fast,0,0,2,0\n";

const ROSTER: &str = "name,id,present\n\
Avery Stone,201,1\n\
Blair Quinn,202,0\n\
Casey Moss,203,1\n\
Devon Hale,204,1\n";

#[test]
fn export_feeds_the_distance_matrix_for_present_students() {
    let table = QuizReportImporter::with_questions(["61001", "61002"])
        .from_reader(Cursor::new(EXPORT))
        .expect("export parses");
    let roster = AttendanceRoster::from_reader(Cursor::new(ROSTER)).expect("roster parses");
    assert_eq!(roster.present_count(), 3);

    let today = table.only_present(&roster);
    let ids: Vec<_> = today.students().iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![StudentId(201), StudentId(203), StudentId(204)]);

    let devon = today.get(StudentId(204)).expect("devon zero-filled");
    assert_eq!(devon.name, "Devon Hale");
    assert_eq!(devon.scores, vec![0.0, 0.0]);

    let avery = today.get(StudentId(201)).expect("avery present");
    assert_eq!(avery.elapsed_minutes(), Some(12.0));

    let matrix = DistanceMatrix::build(&today, DistanceMetric::Euclidean).expect("matrix builds");
    assert_eq!(matrix.len(), 3);
    assert_eq!(matrix.distance(StudentId(203), StudentId(204)), Some(1e-4));
}

#[test]
fn question_statistics_summarize_each_column() {
    let table = QuizReportImporter::new()
        .from_reader(Cursor::new(EXPORT))
        .expect("export parses");

    let stats = QuestionStats::from_table(&table);
    assert_eq!(stats.len(), 2);
    let first = &stats[0];
    assert_eq!(first.question_id, "61001");
    assert!((first.mean - 1.0 / 3.0).abs() < 1e-12);
    assert_eq!((first.zeros, first.ones), (2, 1));
    assert_eq!(first.entropy, 0.0);
}
