//! Comma-delimited tables: one header row followed by data rows.
//!
//! Quoting follows the usual spreadsheet convention: a field containing a
//! comma, a quote or a line break is wrapped in double quotes and embedded
//! quotes are doubled. Line breaks inside quoted fields are part of the field,
//! so records are split on unquoted newlines only.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(header: Vec<String>) -> Self {
        Self {
            header,
            rows: Vec::new(),
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        column_index(&self.header, name)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn column_index(header: &[String], name: &str) -> Option<usize> {
    header
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
}

/// Parse a whole table. Blank records are skipped; an empty input yields `None`.
pub fn parse_table(text: &str) -> Option<Table> {
    let mut records = parse_records(text).into_iter();
    let header = records.next()?;
    let rows = records.collect();
    Some(Table { header, rows })
}

pub fn parse_records(text: &str) -> Vec<Vec<String>> {
    let mut out: Vec<Vec<String>> = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut buf = String::new();
    let mut in_quotes = false;
    let chars: Vec<char> = text.trim_start_matches('\u{feff}').chars().collect();
    let mut i = 0usize;
    while i < chars.len() {
        let ch = chars[i];
        if ch == '"' {
            if in_quotes && i + 1 < chars.len() && chars[i + 1] == '"' {
                buf.push('"');
                i += 2;
                continue;
            }
            in_quotes = !in_quotes;
            i += 1;
            continue;
        }
        if !in_quotes && ch == ',' {
            record.push(std::mem::take(&mut buf));
            i += 1;
            continue;
        }
        if !in_quotes && (ch == '\n' || ch == '\r') {
            // \r\n counts as a single break.
            if ch == '\r' && i + 1 < chars.len() && chars[i + 1] == '\n' {
                i += 1;
            }
            record.push(std::mem::take(&mut buf));
            push_record(&mut out, std::mem::take(&mut record));
            i += 1;
            continue;
        }
        buf.push(ch);
        i += 1;
    }
    if !buf.is_empty() || !record.is_empty() {
        record.push(buf);
        push_record(&mut out, record);
    }
    out
}

fn push_record(out: &mut Vec<Vec<String>>, record: Vec<String>) {
    if record.len() == 1 && record[0].is_empty() {
        return;
    }
    out.push(record);
}

pub fn csv_quote(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

pub fn format_record<S: AsRef<str>>(fields: &[S]) -> String {
    let mut line = fields
        .iter()
        .map(|f| csv_quote(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    line.push('\n');
    line
}

pub fn format_table(table: &Table) -> String {
    let mut out = format_record(&table.header);
    for row in &table.rows {
        out.push_str(&format_record(row));
    }
    out
}
