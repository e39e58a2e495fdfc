use serde_json::{json, Value};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
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

struct Sidecar {
    child: Child,
    stdin: ChildStdin,
    reader: BufReader<ChildStdout>,
    next_id: u64,
}

impl Sidecar {
    fn spawn(cwd: &Path, backend: &str) -> Self {
        let exe = env!("CARGO_BIN_EXE_menteed");
        let mut child = Command::new(exe)
            .current_dir(cwd)
            .env("MENTEED_DATA_DIR", cwd.join("data"))
            .env("MENTEED_BACKEND", backend)
            .env("MENTEED_MENTOR_PASSWORD", "mentor-pass")
            .env_remove("MENTEED_CONFIG")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .expect("spawn menteed");
        let stdin = child.stdin.take().expect("child stdin");
        let stdout = child.stdout.take().expect("child stdout");
        Self {
            child,
            stdin,
            reader: BufReader::new(stdout),
            next_id: 0,
        }
    }

    fn send_line(&mut self, line: &str) -> Value {
        writeln!(self.stdin, "{}", line).expect("write request");
        self.stdin.flush().expect("flush request");
        let mut out = String::new();
        self.reader.read_line(&mut out).expect("read response line");
        serde_json::from_str(out.trim()).expect("parse response json")
    }

    fn call(&mut self, method: &str, params: Value) -> Value {
        self.next_id += 1;
        let id = self.next_id.to_string();
        let resp = self.send_line(&json!({ "id": id, "method": method, "params": params }).to_string());
        assert_eq!(resp["id"], json!(id));
        resp
    }

    fn ok(&mut self, method: &str, params: Value) -> Value {
        let resp = self.call(method, params);
        assert_eq!(resp["ok"], json!(true), "{method} failed: {resp}");
        resp["result"].clone()
    }

    fn error_code(&mut self, method: &str, params: Value) -> String {
        let resp = self.call(method, params);
        assert_eq!(resp["ok"], json!(false), "{method} unexpectedly ok: {resp}");
        resp["error"]["code"].as_str().unwrap_or("").to_string()
    }

    fn shutdown(mut self) {
        drop(self.stdin);
        let _ = self.child.wait();
    }
}

fn maths_entry(grade: &str, credits: u32) -> Value {
    json!({
        "subject": "Maths", "mse1": 40, "mse2": 45, "see": 90,
        "task": 18, "grade": grade, "credits": credits
    })
}

#[test]
fn student_flow_over_csv_files() {
    let root = temp_dir("menteed-ipc-student");
    let mut sc = Sidecar::spawn(&root, "csv");

    let first = sc.ok(
        "students.register",
        json!({ "email": "priya@college.edu", "phone": "9000000001" }),
    );
    assert_eq!(first["created"], json!(true));
    let key = first["accessKey"].as_str().expect("key").to_string();

    let again = sc.ok("students.register", json!({ "email": "PRIYA@college.edu" }));
    assert_eq!(again["accessKey"], json!(key));
    assert_eq!(again["created"], json!(false));

    assert_eq!(sc.ok("students.login", json!({ "accessKey": "" }))["granted"], json!(false));
    assert_eq!(
        sc.error_code("students.login", json!({ "accessKey": "NOPE00" })),
        "invalid_access_key"
    );
    assert_eq!(sc.ok("students.login", json!({ "accessKey": key }))["granted"], json!(true));

    let empty = sc.ok("marks.list", json!({ "accessKey": key }));
    assert_eq!(empty["entries"], json!([]));
    assert_eq!(empty["cgpa"], Value::Null);

    let appended = sc.ok(
        "marks.append",
        json!({
            "accessKey": key,
            "semester": "2nd Sem",
            "entries": [maths_entry("O", 4), maths_entry("B", 3)]
        }),
    );
    assert_eq!(appended["appended"], json!(2));
    assert_eq!(appended["cgpa"], json!(8.29));

    let listed = sc.ok("marks.list", json!({ "accessKey": key, "semester": 2 }));
    assert_eq!(listed["entries"].as_array().map(|a| a.len()), Some(2));
    assert_eq!(listed["entries"][1]["grade"], json!("B"));
    assert_eq!(listed["semester"], json!("2nd Sem"));
    assert_eq!(listed["totalCredits"], json!(7));
    assert!(root
        .join("data")
        .join(format!("marks_{key}_2nd_Sem.csv"))
        .is_file());

    assert_eq!(
        sc.error_code(
            "marks.append",
            json!({ "accessKey": key, "entries": [maths_entry("O", 9)] })
        ),
        "bad_params"
    );
    assert_eq!(
        sc.error_code(
            "marks.append",
            json!({ "accessKey": key, "entries": [maths_entry("F", 3)] })
        ),
        "bad_params"
    );
    assert_eq!(
        sc.error_code(
            "marks.append",
            json!({ "accessKey": key, "semester": 9, "entries": [maths_entry("O", 3)] })
        ),
        "bad_params"
    );
    assert_eq!(
        sc.error_code(
            "marks.append",
            json!({ "accessKey": "ZZZZZZ", "entries": [maths_entry("O", 3)] })
        ),
        "invalid_access_key"
    );

    sc.ok(
        "meetings.append",
        json!({ "accessKey": key, "date": "2025-02-01", "discussion": "Attendance, MSE2 plan" }),
    );
    assert_eq!(
        sc.error_code(
            "meetings.append",
            json!({ "accessKey": key, "date": "01/02/2025", "discussion": "x" })
        ),
        "bad_params"
    );
    let meetings = sc.ok("meetings.list", json!({ "accessKey": key }));
    assert_eq!(meetings["entries"][0]["date"], json!("2025-02-01"));
    assert_eq!(meetings["entries"][0]["discussion"], json!("Attendance, MSE2 plan"));

    sc.ok(
        "activities.append",
        json!({ "accessKey": key, "activity": "Robotics club", "certificateLink": "https://c.example/r1" }),
    );
    let activities = sc.ok("activities.list", json!({ "accessKey": key }));
    assert_eq!(activities["entries"][0]["certificateLink"], json!("https://c.example/r1"));

    let summary = sc.ok("grades.summary", json!({ "accessKey": key }));
    assert_eq!(summary["overall"]["cgpa"], json!(8.29));
    assert_eq!(summary["semesters"][0]["semester"], json!("2nd Sem"));

    sc.shutdown();
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn mentor_gate_over_sqlite() {
    let root = temp_dir("menteed-ipc-mentor");
    let mut sc = Sidecar::spawn(&root, "sqlite");

    let a = sc.ok("students.register", json!({ "email": "a@college.edu" }))["accessKey"]
        .as_str()
        .expect("a")
        .to_string();
    let b = sc.ok("students.register", json!({ "phone": "9000000002" }))["accessKey"]
        .as_str()
        .expect("b")
        .to_string();
    sc.ok(
        "marks.append",
        json!({ "accessKey": b, "entries": [maths_entry("A+", 5)] }),
    );
    sc.ok(
        "meetings.append",
        json!({ "accessKey": b, "date": "2025-03-03", "discussion": "Internship options" }),
    );
    assert_eq!(
        sc.error_code(
            "students.register",
            json!({ "email": "a@college.edu", "phone": "9000000002" })
        ),
        "identity_conflict"
    );

    assert_eq!(sc.ok("mentor.login", json!({ "password": "" }))["granted"], json!(false));
    assert_eq!(
        sc.error_code("mentor.login", json!({ "password": "guess" })),
        "access_denied"
    );
    assert_eq!(
        sc.ok("mentor.login", json!({ "password": "mentor-pass" }))["granted"],
        json!(true)
    );

    assert_eq!(sc.error_code("mentor.students", json!({})), "access_denied");
    let students = sc.ok("mentor.students", json!({ "password": "mentor-pass" }));
    let keys: Vec<&str> = students["students"]
        .as_array()
        .expect("students")
        .iter()
        .filter_map(|s| s["accessKey"].as_str())
        .collect();
    assert_eq!(keys, vec![a.as_str(), b.as_str()]);

    let rec = sc.ok(
        "mentor.records",
        json!({ "password": "mentor-pass", "accessKey": b }),
    );
    assert_eq!(rec["student"]["phone"], json!("9000000002"));
    assert_eq!(rec["marks"][0]["semester"], Value::Null);
    assert_eq!(rec["marks"][0]["cgpa"], json!(9.0));
    assert_eq!(rec["meetings"][0]["discussion"], json!("Internship options"));
    assert_eq!(rec["activities"], json!([]));
    assert_eq!(rec["grades"]["overall"]["totalCredits"], json!(5));

    assert_eq!(
        sc.error_code(
            "mentor.records",
            json!({ "password": "wrong", "accessKey": b })
        ),
        "access_denied"
    );
    assert_eq!(
        sc.error_code(
            "mentor.records",
            json!({ "password": "mentor-pass", "accessKey": "QQQQQQ" })
        ),
        "invalid_access_key"
    );
    assert!(root.join("data").join("menteed.sqlite3").is_file());

    sc.shutdown();
    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn malformed_and_unknown_requests_get_error_responses() {
    let root = temp_dir("menteed-ipc-errors");
    let mut sc = Sidecar::spawn(&root, "memory");

    let bad = sc.send_line("{not json");
    assert_eq!(bad["ok"], json!(false));
    assert_eq!(bad["error"]["code"], json!("bad_json"));

    assert_eq!(sc.error_code("students.delete", json!({})), "not_implemented");
    assert_eq!(sc.error_code("students.register", json!({})), "bad_params");
    assert_eq!(
        sc.error_code("workspace.select", json!({ "path": "x", "backend": "mongo" })),
        "bad_params"
    );

    let key = sc.ok("students.register", json!({ "email": "pad@college.edu" }))["accessKey"]
        .as_str()
        .expect("key")
        .to_string();
    for semester in [
        json!("0000000003rd Sem"),
        json!("03"),
        json!("3rd Semester"),
        json!("3333333333rd Sem"),
        json!(true),
        json!(-2),
    ] {
        assert_eq!(
            sc.error_code(
                "marks.append",
                json!({ "accessKey": key, "semester": semester, "entries": [maths_entry("O", 3)] })
            ),
            "bad_params",
            "semester {semester}"
        );
        assert_eq!(
            sc.error_code("marks.list", json!({ "accessKey": key, "semester": semester })),
            "bad_params",
            "semester {semester}"
        );
    }
    assert_eq!(
        sc.ok("marks.list", json!({ "accessKey": key, "semester": "3rd_sem" }))["semester"],
        json!("3rd Sem")
    );

    // Still serving after the errors above.
    let health = sc.ok("health", json!({}));
    assert_eq!(health["backend"], json!("memory"));

    sc.shutdown();
    let _ = std::fs::remove_dir_all(root);
}
