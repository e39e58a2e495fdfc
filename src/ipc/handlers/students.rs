use crate::directory;
use crate::ipc::error::ok;
use crate::ipc::helpers::{get_str_or_empty, storage_mut, storage_ref, HandlerErr};
use crate::ipc::types::{AppState, Request};
use serde_json::{json, Value};

fn handle_students_register(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let email = get_str_or_empty(&req.params, "email");
    let phone = get_str_or_empty(&req.params, "phone");
    if email.is_empty() && phone.is_empty() {
        return Err(HandlerErr::new("bad_params", "missing email or phone"));
    }
    let storage = storage_mut(state)?;
    let resolved = directory::resolve_or_create(storage, &email, &phone)?;
    Ok(ok(
        &req.id,
        json!({
            "accessKey": resolved.access_key,
            "created": resolved.created,
        }),
    ))
}

/// An empty key is not an error; the UI just has nothing to show yet.
fn handle_students_login(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let key = get_str_or_empty(&req.params, "accessKey");
    if key.is_empty() {
        return Ok(ok(&req.id, json!({ "granted": false })));
    }
    let storage = storage_ref(state)?;
    match directory::find_by_key(storage, &key)? {
        Some(student) => Ok(ok(
            &req.id,
            json!({
                "granted": true,
                "student": student,
            }),
        )),
        None => {
            tracing::warn!("student login rejected");
            Err(HandlerErr::new(
                "invalid_access_key",
                "access key not recognised",
            ))
        }
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "students.register" => handle_students_register(state, req),
        "students.login" => handle_students_login(state, req),
        _ => return None,
    };
    Some(result.unwrap_or_else(|e| e.response(&req.id)))
}
