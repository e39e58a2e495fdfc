use crate::calc;
use crate::directory;
use crate::ipc::error::ok;
use crate::ipc::helpers::{get_required_str, require_mentor, storage_ref, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::mentor::GateDecision;
use crate::model::{ActivityEntry, MeetingEntry};
use crate::records::{self, Partition};
use serde_json::{json, Value};

/// Empty input is answered with `granted: false` and no error.
fn handle_mentor_login(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let password = req
        .params
        .get("password")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    match state.gate.check(password) {
        GateDecision::Granted => Ok(ok(&req.id, json!({ "granted": true }))),
        GateDecision::NoInput => Ok(ok(&req.id, json!({ "granted": false }))),
        GateDecision::Denied => {
            tracing::warn!("mentor login rejected");
            Err(HandlerErr::new("access_denied", "incorrect mentor password"))
        }
    }
}

fn handle_mentor_students(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    require_mentor(state, &req.params)?;
    let students = directory::list_students(storage_ref(state)?)?;
    Ok(ok(&req.id, json!({ "students": students })))
}

fn handle_mentor_records(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    require_mentor(state, &req.params)?;
    let key = get_required_str(&req.params, "accessKey")?;
    let storage = storage_ref(state)?;
    let Some(student) = directory::find_by_key(storage, &key)? else {
        return Err(HandlerErr::new("invalid_access_key", "no student with that access key"));
    };

    let marks: Vec<Value> = records::load_all_marks(storage, &key)?
        .into_iter()
        .map(|(semester, entries)| {
            json!({
                "semester": semester,
                "cgpa": calc::compute_cgpa(&entries),
                "entries": entries,
            })
        })
        .collect();
    let partition = Partition::student(&key);
    let meetings: Vec<MeetingEntry> = records::load(storage, &partition)?;
    let activities: Vec<ActivityEntry> = records::load(storage, &partition)?;
    let grades = calc::grade_summary(storage, &key)?;

    Ok(ok(
        &req.id,
        json!({
            "student": student,
            "marks": marks,
            "meetings": meetings,
            "activities": activities,
            "grades": grades,
        }),
    ))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "mentor.login" => handle_mentor_login(state, req),
        "mentor.students" => handle_mentor_students(state, req),
        "mentor.records" => handle_mentor_records(state, req),
        _ => return None,
    };
    Some(result.unwrap_or_else(|e| e.response(&req.id)))
}
