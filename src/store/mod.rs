//! Storage backends for named, append-only tables.
//!
//! Everything above this layer (directory, records, backup) talks to a
//! `dyn Storage`; which backend sits underneath is chosen once when a
//! workspace is opened.

mod files;
mod memory;

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::csv_table::Table;
use crate::error::Result;

pub use files::CsvDirStorage;
pub use memory::MemoryStorage;

pub trait Storage {
    /// Load a table, or `None` when it has never been written.
    fn load_table(&self, name: &str) -> Result<Option<Table>>;

    /// Append rows to `name`, creating it with `header` on first write.
    /// Rows must already be laid out in the stored header's column order.
    fn append_rows(&mut self, name: &str, header: &[String], rows: &[Vec<String>]) -> Result<()>;

    /// Names of all tables that exist, sorted.
    fn table_names(&self) -> Result<Vec<String>>;

    fn backend(&self) -> Backend;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    #[default]
    Csv,
    Sqlite,
    Memory,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Csv => "csv",
            Backend::Sqlite => "sqlite",
            Backend::Memory => "memory",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Some(Backend::Csv),
            "sqlite" => Some(Backend::Sqlite),
            "memory" => Some(Backend::Memory),
            _ => None,
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Open the backend rooted at `workspace`, creating the directory if needed.
pub fn open_storage(backend: Backend, workspace: &Path) -> Result<Box<dyn Storage>> {
    let storage: Box<dyn Storage> = match backend {
        Backend::Csv => Box::new(CsvDirStorage::open(workspace)?),
        Backend::Sqlite => Box::new(crate::db::SqliteStorage::open(workspace)?),
        Backend::Memory => Box::new(MemoryStorage::default()),
    };
    tracing::info!(
        backend = %backend,
        workspace = %workspace.display(),
        "storage opened"
    );
    Ok(storage)
}

/// Table names double as file names, so only a conservative alphabet is allowed.
pub(crate) fn is_safe_table_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'+' || b == b'-')
}
