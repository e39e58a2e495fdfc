use chrono::NaiveDate;
use menteed::db::SqliteStorage;
use menteed::error::StoreError;
use menteed::directory;
use menteed::model::{ActivityEntry, Grade, MarkEntry, MeetingEntry, Section, Semester};
use menteed::records::{self, table_name, Partition};
use menteed::store::{CsvDirStorage, MemoryStorage, Storage};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn mark(subject: &str, grade: Grade, credits: u32) -> MarkEntry {
    MarkEntry {
        subject: subject.to_string(),
        mse1: 35,
        mse2: 41,
        see: 77,
        task: 18,
        grade,
        credits,
    }
}

/// The same append/load contract, whatever sits underneath.
fn exercise_sections(storage: &mut dyn Storage) {
    let key = directory::resolve_or_create(storage, "mentee@college.edu", "")
        .expect("register")
        .access_key;
    let whole = Partition::student(&key);
    let sem3 = Partition::semester(&key, Semester::new(3).expect("sem"));

    let none: Vec<MarkEntry> = records::load(storage, &whole).expect("load empty");
    assert!(none.is_empty());

    records::append(storage, &sem3, &[mark("Data Structures", Grade::A, 4)]).expect("append 1");
    records::append(
        storage,
        &sem3,
        &[mark("Discrete Maths", Grade::BPlus, 3), mark("Lab, part \"B\"", Grade::O, 1)],
    )
    .expect("append 2");
    let got: Vec<MarkEntry> = records::load(storage, &sem3).expect("load sem3");
    assert_eq!(got.len(), 3);
    assert_eq!(got[0], mark("Data Structures", Grade::A, 4));
    assert_eq!(got[2].subject, "Lab, part \"B\"");

    // Semester partitions never leak into each other.
    let other: Vec<MarkEntry> = records::load(storage, &whole).expect("load whole");
    assert!(other.is_empty());

    let meeting = MeetingEntry {
        date: NaiveDate::from_ymd_opt(2025, 3, 14).expect("date"),
        discussion: "Reviewed MSE1 results.\nPlan: weekly check-ins, more practice".to_string(),
    };
    records::append(storage, &whole, std::slice::from_ref(&meeting)).expect("meeting");
    let meetings: Vec<MeetingEntry> = records::load(storage, &whole).expect("meetings");
    assert_eq!(meetings, vec![meeting]);

    let activity = ActivityEntry {
        activity: "Hackathon runner-up".to_string(),
        certificate_link: "https://example.org/cert?id=7&x=1".to_string(),
    };
    records::append(storage, &whole, std::slice::from_ref(&activity)).expect("activity");
    let activities: Vec<ActivityEntry> = records::load(storage, &whole).expect("activities");
    assert_eq!(activities, vec![activity]);

    let grouped = records::load_all_marks(storage, &key).expect("grouped");
    assert_eq!(grouped.len(), 1);
    assert_eq!(grouped[0].0, Semester::new(3));
}

#[test]
fn memory_backend_append_then_load() {
    let mut storage = MemoryStorage::default();
    exercise_sections(&mut storage);
}

#[test]
fn csv_backend_append_then_load() {
    let dir = temp_dir("menteed-records-csv");
    let mut storage = CsvDirStorage::open(&dir).expect("open csv dir");
    exercise_sections(&mut storage);

    let names = storage.table_names().expect("names");
    assert!(names.iter().any(|n| n == "access_keys"));
    assert!(names.iter().any(|n| n.starts_with("marks_") && n.ends_with("_3rd_Sem")));

    // Reopening sees the same rows.
    let reopened = CsvDirStorage::open(&dir).expect("reopen");
    assert_eq!(reopened.table_names().expect("names"), names);

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn sqlite_backend_append_then_load() {
    let dir = temp_dir("menteed-records-sqlite");
    {
        let mut storage = SqliteStorage::open(&dir).expect("open sqlite");
        exercise_sections(&mut storage);
    }
    let reopened = SqliteStorage::open(&dir).expect("reopen");
    assert_eq!(reopened.table_names().expect("names").len(), 4);

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn table_names_follow_the_partition_convention() {
    let whole = Partition::student("AB12CD");
    let sem1 = Partition::semester("AB12CD", Semester::new(1).expect("sem"));
    assert_eq!(table_name(Section::Marks, &whole).expect("name"), "marks_AB12CD");
    assert_eq!(
        table_name(Section::Marks, &sem1).expect("name"),
        "marks_AB12CD_1st_Sem"
    );
    assert_eq!(
        table_name(Section::Meetings, &sem1).expect("name"),
        "meetings_AB12CD"
    );
    assert_eq!(
        table_name(Section::Activities, &whole).expect("name"),
        "activities_AB12CD"
    );
    assert!(table_name(Section::Marks, &Partition::student("../etc")).is_err());
}

#[test]
fn csv_files_written_by_the_old_tool_still_load() {
    let dir = temp_dir("menteed-records-legacy");
    std::fs::write(
        dir.join("marks_QW12ER_2nd_Sem.csv"),
        "Email/Phone,Semester,Subject,MSE1,MSE2,SEE,Task,Grade,Credits\n\
         q@x.edu,2nd Sem,Physics,40,42,81,19,A+,4\n",
    )
    .expect("seed marks");
    let mut storage = CsvDirStorage::open(&dir).expect("open");
    let part = Partition::semester("QW12ER", Semester::new(2).expect("sem"));

    records::append(&mut storage, &part, &[mark("Chemistry", Grade::B, 3)]).expect("append");
    let got: Vec<MarkEntry> = records::load(&storage, &part).expect("load");
    assert_eq!(got.len(), 2);
    assert_eq!(got[0].grade, Grade::APlus);
    assert_eq!(got[1].subject, "Chemistry");

    let text = std::fs::read_to_string(dir.join("marks_QW12ER_2nd_Sem.csv")).expect("read");
    assert!(text.ends_with(",,Chemistry,35,41,77,18,B,3\n"), "{text}");

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn unreadable_rows_are_reported_with_their_table() {
    let dir = temp_dir("menteed-records-corrupt");
    std::fs::write(
        dir.join("marks_ZX98CV.csv"),
        "Subject,MSE1,MSE2,SEE,Task,Grade,Credits\nMaths,10,10,10,10,F,3\n",
    )
    .expect("seed");
    let storage = CsvDirStorage::open(&dir).expect("open");
    let err = records::load::<MarkEntry>(&storage, &Partition::student("ZX98CV"))
        .expect_err("bad grade");
    let msg = err.to_string();
    assert!(msg.contains("marks_ZX98CV"), "{msg}");
    assert!(msg.contains("row 1"), "{msg}");

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn blank_csv_files_get_a_header_before_the_first_row() {
    let dir = temp_dir("menteed-records-blank");
    let seeds: [(&str, &[u8]); 4] = [
        ("AB12CD", b"\n"),
        ("EF34GH", b"\r\n\r\n"),
        ("IJ56KL", "\u{feff}".as_bytes()),
        ("MN78OP", b""),
    ];
    let mut storage = CsvDirStorage::open(&dir).expect("open");
    for (key, seed) in seeds {
        let file = dir.join(format!("marks_{key}.csv"));
        std::fs::write(&file, seed).expect("seed");
        let part = Partition::student(key);

        records::append(&mut storage, &part, &[mark("Maths", Grade::O, 4)]).expect("append");
        let got: Vec<MarkEntry> = records::load(&storage, &part).expect("load");
        assert_eq!(got, vec![mark("Maths", Grade::O, 4)], "seed {seed:?}");

        let text = std::fs::read_to_string(&file).expect("read");
        assert!(
            text.starts_with("Subject,MSE1,MSE2,SEE,Task,Grade,Credits\n"),
            "{text:?}"
        );
    }

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn non_utf8_csv_files_are_an_error_not_silently_rewritten() {
    let dir = temp_dir("menteed-records-utf8");
    let file = dir.join("activities_QQ11WW.csv");
    let mut bytes = b"Activity,Certificate link\nChess,\n".to_vec();
    bytes.extend_from_slice(b"Quiz \xff\xfe,https://c.example/q\n");
    std::fs::write(&file, &bytes).expect("seed");

    let mut storage = CsvDirStorage::open(&dir).expect("open");
    let part = Partition::student("QQ11WW");
    let err = records::load::<ActivityEntry>(&storage, &part).expect_err("bad bytes");
    assert!(matches!(err, StoreError::NotUtf8 { line: 3, .. }), "{err}");
    assert!(err.to_string().contains("activities_QQ11WW"), "{err}");

    let entry = ActivityEntry {
        activity: "Debate".into(),
        certificate_link: String::new(),
    };
    assert!(records::append(&mut storage, &part, &[entry]).is_err());
    assert_eq!(std::fs::read(&file).expect("read"), bytes);

    let _ = std::fs::remove_dir_all(dir);
}
