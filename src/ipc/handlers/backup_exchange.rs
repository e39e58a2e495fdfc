use crate::backup;
use crate::ipc::error::ok;
use crate::ipc::helpers::{get_required_str, storage_mut, storage_ref, HandlerErr};
use crate::ipc::types::{AppState, Request};
use serde_json::{json, Value};
use std::path::PathBuf;

fn handle_backup_export(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let out_path = PathBuf::from(get_required_str(&req.params, "outPath")?);
    let summary = backup::export_bundle(storage_ref(state)?, &out_path)
        .map_err(|e| HandlerErr::new("backup_failed", format!("{e:#}")))?;
    Ok(ok(
        &req.id,
        json!({
            "bundleFormat": summary.bundle_format,
            "bundleId": summary.bundle_id,
            "tableCount": summary.table_count,
            "path": out_path.to_string_lossy(),
        }),
    ))
}

fn handle_backup_import(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let in_path = PathBuf::from(get_required_str(&req.params, "inPath")?);
    let summary = backup::import_bundle(&in_path, storage_mut(state)?)
        .map_err(|e| HandlerErr::new("backup_failed", format!("{e:#}")))?;
    Ok(ok(
        &req.id,
        json!({
            "bundleFormat": summary.bundle_format_detected,
            "tableCount": summary.table_count,
        }),
    ))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "backup.export" => handle_backup_export(state, req),
        "backup.import" => handle_backup_import(state, req),
        _ => return None,
    };
    Some(result.unwrap_or_else(|e| e.response(&req.id)))
}
