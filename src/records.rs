//! Per-student append-only tables for marks, meetings and activities.

use crate::error::{Result, StoreError};
use crate::keygen::is_key_format;
use crate::model::{ActivityEntry, MarkEntry, MeetingEntry, Record, Row, Section, Semester};
use crate::store::Storage;

/// Which table a record lives in: the owner's key, plus a semester for marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition<'a> {
    pub access_key: &'a str,
    pub semester: Option<Semester>,
}

impl<'a> Partition<'a> {
    pub fn student(access_key: &'a str) -> Self {
        Self {
            access_key,
            semester: None,
        }
    }

    pub fn semester(access_key: &'a str, semester: Semester) -> Self {
        Self {
            access_key,
            semester: Some(semester),
        }
    }
}

/// Types stored in a per-student section.
pub trait SectionRecord: Record {
    const SECTION: Section;
}

impl SectionRecord for MarkEntry {
    const SECTION: Section = Section::Marks;
}

impl SectionRecord for MeetingEntry {
    const SECTION: Section = Section::Meetings;
}

impl SectionRecord for ActivityEntry {
    const SECTION: Section = Section::Activities;
}

/// `marks_AB12CD`, `marks_AB12CD_3rd_Sem`, `meetings_AB12CD`, ...
///
/// Only marks are split by semester; other sections ignore it.
pub fn table_name(section: Section, partition: &Partition<'_>) -> Result<String> {
    if !is_key_format(partition.access_key) {
        return Err(StoreError::InvalidKey(partition.access_key.to_string()));
    }
    let mut name = format!("{}_{}", section.prefix(), partition.access_key);
    if let (Section::Marks, Some(sem)) = (section, partition.semester) {
        name.push('_');
        name.push_str(&sem.table_suffix());
    }
    Ok(name)
}

pub fn append<R: SectionRecord>(
    storage: &mut dyn Storage,
    partition: &Partition<'_>,
    entries: &[R],
) -> Result<()> {
    if entries.is_empty() {
        return Ok(());
    }
    let name = table_name(R::SECTION, partition)?;
    // Tables written by other tools may carry extra columns; keep their order.
    let header = match storage.load_table(&name)? {
        Some(t) if !t.header.is_empty() => t.header,
        _ => R::default_header(),
    };
    let rows: Vec<Vec<String>> = entries.iter().map(|e| e.to_fields(&header)).collect();
    storage.append_rows(&name, &header, &rows)
}

pub fn load<R: SectionRecord>(storage: &dyn Storage, partition: &Partition<'_>) -> Result<Vec<R>> {
    let name = table_name(R::SECTION, partition)?;
    let Some(table) = storage.load_table(&name)? else {
        return Ok(Vec::new());
    };
    table
        .rows
        .iter()
        .enumerate()
        .map(|(i, fields)| {
            R::from_row(&Row::new(&table.header, fields)).map_err(|reason| {
                StoreError::CorruptRow {
                    table: name.clone(),
                    row: i + 1,
                    reason,
                }
            })
        })
        .collect()
}

/// Marks grouped by partition: the unsplit table first (when present), then
/// each semester that has rows.
pub fn load_all_marks(
    storage: &dyn Storage,
    access_key: &str,
) -> Result<Vec<(Option<Semester>, Vec<MarkEntry>)>> {
    let mut out = Vec::new();
    let unsplit: Vec<MarkEntry> = load(storage, &Partition::student(access_key))?;
    if !unsplit.is_empty() {
        out.push((None, unsplit));
    }
    for sem in Semester::all() {
        let rows: Vec<MarkEntry> = load(storage, &Partition::semester(access_key, sem))?;
        if !rows.is_empty() {
            out.push((Some(sem), rows));
        }
    }
    Ok(out)
}
