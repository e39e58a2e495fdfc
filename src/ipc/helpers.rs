use serde_json::Value;

use crate::directory;
use crate::error::StoreError;
use crate::ipc::error::err;
use crate::ipc::types::AppState;
use crate::mentor::GateDecision;
use crate::model::Semester;
use crate::store::Storage;

pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<Value>,
}

impl HandlerErr {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn response(self, id: &str) -> Value {
        err(id, self.code, self.message, self.details)
    }
}

impl From<StoreError> for HandlerErr {
    fn from(e: StoreError) -> Self {
        HandlerErr::new(e.code(), e.to_string())
    }
}

pub fn get_required_str(params: &Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| HandlerErr::new("bad_params", format!("missing {}", key)))
}

/// Trimmed string param; absent, null and blank all give "".
pub fn get_str_or_empty(params: &Value, key: &str) -> String {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// `semester` as a number (3) or a label ("3rd Sem"); absent or null means none.
pub fn get_semester(params: &Value) -> Result<Option<Semester>, HandlerErr> {
    let bad = || HandlerErr::new("bad_params", "semester must be 1..8 or a label like \"3rd Sem\"");
    match params.get("semester") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|n| u8::try_from(n).ok())
            .and_then(Semester::new)
            .map(Some)
            .ok_or_else(bad),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Semester::parse(s).map(Some).ok_or_else(bad),
        Some(_) => Err(bad()),
    }
}

pub fn storage_ref(state: &AppState) -> Result<&dyn Storage, HandlerErr> {
    state
        .storage
        .as_deref()
        .ok_or_else(|| HandlerErr::new("no_workspace", "select a workspace first"))
}

pub fn storage_mut(state: &mut AppState) -> Result<&mut dyn Storage, HandlerErr> {
    match state.storage.as_deref_mut() {
        Some(s) => Ok(s),
        None => Err(HandlerErr::new("no_workspace", "select a workspace first")),
    }
}

/// `params.accessKey`, checked against the directory.
pub fn student_key(state: &AppState, params: &Value) -> Result<String, HandlerErr> {
    let key = get_required_str(params, "accessKey")?;
    if !directory::is_valid_key(storage_ref(state)?, &key)? {
        tracing::warn!("rejected unknown access key");
        return Err(HandlerErr::new("invalid_access_key", "access key not recognised"));
    }
    Ok(key)
}

/// `params.password` must open the mentor gate.
pub fn require_mentor(state: &AppState, params: &Value) -> Result<(), HandlerErr> {
    let password = params
        .get("password")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    match state.gate.check(password) {
        GateDecision::Granted => Ok(()),
        GateDecision::Denied | GateDecision::NoInput => {
            tracing::warn!("mentor access denied");
            Err(HandlerErr::new("access_denied", "incorrect mentor password"))
        }
    }
}
