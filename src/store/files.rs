use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{is_safe_table_name, Backend, Storage};
use crate::csv_table::{format_record, parse_table, Table};
use crate::error::{Result, StoreError};

const TABLE_EXT: &str = "csv";

/// One `<name>.csv` file per table inside the data directory.
#[derive(Debug)]
pub struct CsvDirStorage {
    dir: PathBuf,
}

impl CsvDirStorage {
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn table_path(&self, name: &str) -> Result<PathBuf> {
        if !is_safe_table_name(name) {
            return Err(StoreError::Validation(format!("bad table name: {name:?}")));
        }
        Ok(self.dir.join(format!("{name}.{TABLE_EXT}")))
    }
}

fn ends_with_newline(path: &Path) -> Result<bool> {
    let mut f = std::fs::File::open(path)?;
    f.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    f.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

impl Storage for CsvDirStorage {
    fn load_table(&self, name: &str) -> Result<Option<Table>> {
        let path = self.table_path(name)?;
        if !path.is_file() {
            return Ok(None);
        }
        let bytes = std::fs::read(&path)?;
        let text = String::from_utf8(bytes).map_err(|e| {
            let valid = &e.as_bytes()[..e.utf8_error().valid_up_to()];
            StoreError::NotUtf8 {
                table: name.to_string(),
                line: valid.iter().filter(|&&b| b == b'\n').count() + 1,
            }
        })?;
        Ok(parse_table(&text))
    }

    fn append_rows(&mut self, name: &str, header: &[String], rows: &[Vec<String>]) -> Result<()> {
        let path = self.table_path(name)?;
        // Files with nothing parseable (blank lines, a lone BOM) are rewritten
        // from scratch so the header lands first.
        let fresh = self.load_table(name)?.is_none();

        let mut out = String::new();
        if fresh {
            out.push_str(&format_record(header));
        } else if !ends_with_newline(&path)? {
            out.push('\n');
        }
        for row in rows {
            out.push_str(&format_record(row));
        }

        let mut opts = OpenOptions::new();
        opts.create(true);
        if fresh {
            opts.write(true).truncate(true);
        } else {
            opts.append(true);
        }
        let mut f = opts.open(&path)?;
        f.write_all(out.as_bytes())?;
        f.flush()?;
        debug!(table = name, rows = rows.len(), "appended rows");
        Ok(())
    }

    fn table_names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for ent in std::fs::read_dir(&self.dir)? {
            let p = ent?.path();
            if !p.is_file() {
                continue;
            }
            if p.extension().and_then(|s| s.to_str()) != Some(TABLE_EXT) {
                continue;
            }
            let Some(stem) = p.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if is_safe_table_name(stem) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn backend(&self) -> Backend {
        Backend::Csv
    }
}
