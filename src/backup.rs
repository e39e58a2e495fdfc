use anyhow::{anyhow, Context};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::csv_table::{format_table, parse_table};
use crate::store::Storage;

const MANIFEST_ENTRY: &str = "manifest.json";
const TABLES_DIR: &str = "tables/";
pub const BUNDLE_FORMAT_V1: &str = "menteed-tables-v1";

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub bundle_format: String,
    pub bundle_id: String,
    pub table_count: usize,
}

#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub bundle_format_detected: String,
    pub table_count: usize,
}

fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

pub fn export_bundle(storage: &dyn Storage, out_path: &Path) -> anyhow::Result<ExportSummary> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }

    let out_file = File::create(out_path).with_context(|| {
        format!(
            "failed to create output file {}",
            out_path.to_string_lossy()
        )
    })?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut checksums = serde_json::Map::new();
    let names = storage.table_names().context("failed to list tables")?;
    for name in &names {
        let Some(table) = storage
            .load_table(name)
            .with_context(|| format!("failed to load table {name}"))?
        else {
            continue;
        };
        let body = format_table(&table);
        zip.start_file(format!("{TABLES_DIR}{name}.csv"), opts)
            .with_context(|| format!("failed to start entry for {name}"))?;
        zip.write_all(body.as_bytes())
            .with_context(|| format!("failed to write entry for {name}"))?;
        checksums.insert(name.clone(), json!(sha256_hex(body.as_bytes())));
    }

    let table_count = checksums.len();
    let bundle_id = uuid::Uuid::new_v4().to_string();
    let manifest = json!({
        "format": BUNDLE_FORMAT_V1,
        "version": 1,
        "appVersion": env!("CARGO_PKG_VERSION"),
        "bundleId": bundle_id,
        "exportedAt": chrono::Utc::now().to_rfc3339(),
        "backend": storage.backend().as_str(),
        "tables": checksums,
    });
    zip.start_file(MANIFEST_ENTRY, opts)
        .context("failed to start manifest entry")?;
    zip.write_all(
        serde_json::to_string_pretty(&manifest)
            .context("failed to serialize manifest")?
            .as_bytes(),
    )
    .context("failed to write manifest entry")?;

    zip.finish().context("failed to finalize zip bundle")?;
    tracing::info!(tables = table_count, path = %out_path.display(), "bundle exported");

    Ok(ExportSummary {
        bundle_format: BUNDLE_FORMAT_V1.to_string(),
        bundle_id,
        table_count,
    })
}

/// Restore every table of a bundle into `storage`, which must hold no tables.
///
/// All entries are read and verified before anything is written.
pub fn import_bundle(in_path: &Path, storage: &mut dyn Storage) -> anyhow::Result<ImportSummary> {
    let existing = storage.table_names().context("failed to list tables")?;
    if !existing.is_empty() {
        return Err(anyhow!(
            "workspace already holds {} tables; import needs an empty workspace",
            existing.len()
        ));
    }

    let in_file = File::open(in_path)
        .with_context(|| format!("failed to open bundle {}", in_path.to_string_lossy()))?;
    let mut archive = ZipArchive::new(in_file).context("invalid zip archive")?;

    let mut manifest_text = String::new();
    archive
        .by_name(MANIFEST_ENTRY)
        .context("bundle missing manifest.json")?
        .read_to_string(&mut manifest_text)
        .context("failed to read manifest.json")?;
    let manifest: serde_json::Value =
        serde_json::from_str(&manifest_text).context("manifest.json is invalid JSON")?;
    let format = manifest
        .get("format")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    if format != BUNDLE_FORMAT_V1 {
        return Err(anyhow!("unsupported bundle format: {}", format));
    }
    let tables = manifest
        .get("tables")
        .and_then(|v| v.as_object())
        .context("manifest.json has no table list")?;

    let mut restored = Vec::with_capacity(tables.len());
    for (name, expected) in tables {
        let mut body = String::new();
        archive
            .by_name(&format!("{TABLES_DIR}{name}.csv"))
            .with_context(|| format!("bundle missing table {name}"))?
            .read_to_string(&mut body)
            .with_context(|| format!("failed to read table {name}"))?;
        if Some(sha256_hex(body.as_bytes()).as_str()) != expected.as_str() {
            return Err(anyhow!("checksum mismatch for table {}", name));
        }
        if let Some(table) = parse_table(&body) {
            restored.push((name.clone(), table));
        }
    }

    for (name, table) in &restored {
        storage
            .append_rows(name, &table.header, &table.rows)
            .with_context(|| format!("failed to restore table {name}"))?;
    }
    tracing::info!(tables = restored.len(), path = %in_path.display(), "bundle imported");

    Ok(ImportSummary {
        bundle_format_detected: BUNDLE_FORMAT_V1.to_string(),
        table_count: restored.len(),
    })
}
