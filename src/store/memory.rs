use std::collections::BTreeMap;

use super::{Backend, Storage};
use crate::csv_table::Table;
use crate::error::Result;

/// Process-local tables; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    tables: BTreeMap<String, Table>,
}

impl Storage for MemoryStorage {
    fn load_table(&self, name: &str) -> Result<Option<Table>> {
        Ok(self.tables.get(name).cloned())
    }

    fn append_rows(&mut self, name: &str, header: &[String], rows: &[Vec<String>]) -> Result<()> {
        let table = self
            .tables
            .entry(name.to_string())
            .or_insert_with(|| Table::new(header.to_vec()));
        table.rows.extend(rows.iter().cloned());
        Ok(())
    }

    fn table_names(&self) -> Result<Vec<String>> {
        Ok(self.tables.keys().cloned().collect())
    }

    fn backend(&self) -> Backend {
        Backend::Memory
    }
}
