use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

use crate::csv_table::Table;
use crate::error::{Result, StoreError};
use crate::store::{is_safe_table_name, Backend, Storage};

pub const DB_FILE_NAME: &str = "menteed.sqlite3";

pub fn open_db(workspace: &Path) -> Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE_NAME);
    let conn = Connection::open(db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS record_tables(
            name TEXT PRIMARY KEY,
            header TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS record_rows(
            table_name TEXT NOT NULL,
            seq INTEGER NOT NULL,
            fields TEXT NOT NULL,
            appended_at TEXT,
            PRIMARY KEY(table_name, seq),
            FOREIGN KEY(table_name) REFERENCES record_tables(name)
        )",
        [],
    )?;

    Ok(conn)
}

/// Tables kept as rows of a single SQLite database; field lists are stored as
/// JSON arrays so any header shape fits.
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    pub fn open(workspace: &Path) -> Result<Self> {
        Ok(Self {
            conn: open_db(workspace)?,
        })
    }
}

fn decode_fields(table: &str, row: usize, text: &str) -> Result<Vec<String>> {
    serde_json::from_str(text).map_err(|e| StoreError::CorruptRow {
        table: table.to_string(),
        row,
        reason: e.to_string(),
    })
}

impl Storage for SqliteStorage {
    fn load_table(&self, name: &str) -> Result<Option<Table>> {
        let header: Option<String> = self
            .conn
            .query_row(
                "SELECT header FROM record_tables WHERE name = ?",
                [name],
                |r| r.get(0),
            )
            .optional()?;
        let Some(header) = header else {
            return Ok(None);
        };

        let mut table = Table::new(decode_fields(name, 0, &header)?);
        let mut stmt = self
            .conn
            .prepare("SELECT fields FROM record_rows WHERE table_name = ? ORDER BY seq")?;
        let raw = stmt
            .query_map([name], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        for (i, text) in raw.iter().enumerate() {
            table.rows.push(decode_fields(name, i + 1, text)?);
        }
        Ok(Some(table))
    }

    fn append_rows(&mut self, name: &str, header: &[String], rows: &[Vec<String>]) -> Result<()> {
        if !is_safe_table_name(name) {
            return Err(StoreError::Validation(format!("bad table name: {name:?}")));
        }
        let now = chrono::Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT OR IGNORE INTO record_tables(name, header) VALUES(?, ?)",
            (name, serde_json::to_string(header)?),
        )?;
        let mut next: i64 = tx.query_row(
            "SELECT COALESCE(MAX(seq), 0) + 1 FROM record_rows WHERE table_name = ?",
            [name],
            |r| r.get(0),
        )?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO record_rows(table_name, seq, fields, appended_at) VALUES(?, ?, ?, ?)",
            )?;
            for row in rows {
                stmt.execute((name, next, serde_json::to_string(row)?, &now))?;
                next += 1;
            }
        }
        tx.commit()?;
        tracing::debug!(table = name, rows = rows.len(), "appended rows");
        Ok(())
    }

    fn table_names(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM record_tables ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(names)
    }

    fn backend(&self) -> Backend {
        Backend::Sqlite
    }
}
