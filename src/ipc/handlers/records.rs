use crate::calc;
use crate::ipc::error::ok;
use crate::ipc::helpers::{
    get_semester, get_str_or_empty, storage_mut, storage_ref, student_key, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::model::{parse_date, ActivityEntry, MarkEntry, MeetingEntry};
use crate::records::{self, Partition};
use serde_json::{json, Value};

fn parse_mark_entries(params: &Value) -> Result<Vec<MarkEntry>, HandlerErr> {
    let Some(items) = params.get("entries").and_then(|v| v.as_array()) else {
        return Err(HandlerErr::new("bad_params", "missing entries"));
    };
    if items.is_empty() {
        return Err(HandlerErr::new("bad_params", "entries must not be empty"));
    }
    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let entry: MarkEntry = serde_json::from_value(item.clone()).map_err(|e| {
            HandlerErr::new("bad_params", format!("entries[{i}]: {e}"))
                .with_details(json!({ "index": i }))
        })?;
        entry.validate().map_err(|msg| {
            HandlerErr::new("bad_params", format!("entries[{i}]: {msg}"))
                .with_details(json!({ "index": i }))
        })?;
        out.push(MarkEntry {
            subject: entry.subject.trim().to_string(),
            ..entry
        });
    }
    Ok(out)
}

fn handle_marks_append(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let key = student_key(state, &req.params)?;
    let semester = get_semester(&req.params)?;
    let entries = parse_mark_entries(&req.params)?;
    let partition = Partition {
        access_key: &key,
        semester,
    };

    records::append(storage_mut(state)?, &partition, &entries)?;
    let all: Vec<MarkEntry> = records::load(storage_ref(state)?, &partition)?;
    Ok(ok(
        &req.id,
        json!({
            "appended": entries.len(),
            "total": all.len(),
            "cgpa": calc::compute_cgpa(&all),
        }),
    ))
}

fn handle_marks_list(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let key = student_key(state, &req.params)?;
    let semester = get_semester(&req.params)?;
    let partition = Partition {
        access_key: &key,
        semester,
    };
    let entries: Vec<MarkEntry> = records::load(storage_ref(state)?, &partition)?;
    let breakdown = calc::cgpa_breakdown(&entries);
    Ok(ok(
        &req.id,
        json!({
            "semester": semester,
            "entries": entries,
            "cgpa": breakdown.cgpa,
            "totalCredits": breakdown.total_credits,
        }),
    ))
}

fn handle_meetings_append(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let key = student_key(state, &req.params)?;
    let raw_date = get_str_or_empty(&req.params, "date");
    let date = if raw_date.is_empty() {
        chrono::Local::now().date_naive()
    } else {
        parse_date(&raw_date)
            .ok_or_else(|| HandlerErr::new("bad_params", "date must be YYYY-MM-DD"))?
    };
    let discussion = req
        .params
        .get("discussion")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();
    if discussion.trim().is_empty() {
        return Err(HandlerErr::new("bad_params", "missing discussion"));
    }

    let partition = Partition::student(&key);
    records::append(
        storage_mut(state)?,
        &partition,
        &[MeetingEntry { date, discussion }],
    )?;
    let all: Vec<MeetingEntry> = records::load(storage_ref(state)?, &partition)?;
    Ok(ok(&req.id, json!({ "total": all.len() })))
}

fn handle_meetings_list(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let key = student_key(state, &req.params)?;
    let entries: Vec<MeetingEntry> = records::load(storage_ref(state)?, &Partition::student(&key))?;
    Ok(ok(&req.id, json!({ "entries": entries })))
}

fn handle_activities_append(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let key = student_key(state, &req.params)?;
    let activity = get_str_or_empty(&req.params, "activity");
    if activity.is_empty() {
        return Err(HandlerErr::new("bad_params", "missing activity"));
    }
    let certificate_link = get_str_or_empty(&req.params, "certificateLink");

    let partition = Partition::student(&key);
    records::append(
        storage_mut(state)?,
        &partition,
        &[ActivityEntry {
            activity,
            certificate_link,
        }],
    )?;
    let all: Vec<ActivityEntry> = records::load(storage_ref(state)?, &partition)?;
    Ok(ok(&req.id, json!({ "total": all.len() })))
}

fn handle_activities_list(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let key = student_key(state, &req.params)?;
    let entries: Vec<ActivityEntry> =
        records::load(storage_ref(state)?, &Partition::student(&key))?;
    Ok(ok(&req.id, json!({ "entries": entries })))
}

fn handle_grades_summary(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let key = student_key(state, &req.params)?;
    let summary = calc::grade_summary(storage_ref(state)?, &key)?;
    Ok(ok(&req.id, json!(summary)))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "marks.append" => handle_marks_append(state, req),
        "marks.list" => handle_marks_list(state, req),
        "meetings.append" => handle_meetings_append(state, req),
        "meetings.list" => handle_meetings_list(state, req),
        "activities.append" => handle_activities_append(state, req),
        "activities.list" => handle_activities_list(state, req),
        "grades.summary" => handle_grades_summary(state, req),
        _ => return None,
    };
    Some(result.unwrap_or_else(|e| e.response(&req.id)))
}
