use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store::{self, Backend};
use serde_json::json;
use std::path::PathBuf;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string()),
            "backend": state.storage.as_ref().map(|s| s.backend().as_str()),
            "mentorConfigured": state.gate.is_configured(),
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    let backend = match req.params.get("backend").and_then(|v| v.as_str()) {
        None => state.config.storage.backend,
        Some(raw) => match Backend::parse(raw) {
            Some(b) => b,
            None => {
                return err(
                    &req.id,
                    "bad_params",
                    format!("unknown backend: {raw}"),
                    Some(json!({ "supported": ["csv", "sqlite", "memory"] })),
                )
            }
        },
    };

    match store::open_storage(backend, &path) {
        Ok(storage) => {
            state.workspace = Some(path.clone());
            state.storage = Some(storage);
            ok(
                &req.id,
                json!({
                    "workspacePath": path.to_string_lossy(),
                    "backend": backend.as_str(),
                }),
            )
        }
        Err(e) => err(&req.id, "store_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}
