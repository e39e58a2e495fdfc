use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::csv_table::column_index;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "O")]
    O,
    #[serde(rename = "A+")]
    APlus,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "B+")]
    BPlus,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "C+")]
    CPlus,
    #[serde(rename = "C")]
    C,
    #[serde(rename = "PP")]
    Pp,
}

impl Grade {
    pub const ALL: [Grade; 8] = [
        Grade::O,
        Grade::APlus,
        Grade::A,
        Grade::BPlus,
        Grade::B,
        Grade::CPlus,
        Grade::C,
        Grade::Pp,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Grade::O => "O",
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::CPlus => "C+",
            Grade::C => "C",
            Grade::Pp => "PP",
        }
    }

    /// Grade point on the 10-point scale. PP carries no points.
    pub fn points(&self) -> u32 {
        match self {
            Grade::O => 10,
            Grade::APlus => 9,
            Grade::A => 8,
            Grade::BPlus => 7,
            Grade::B => 6,
            Grade::CPlus => 5,
            Grade::C => 4,
            Grade::Pp => 0,
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Grade {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        Grade::ALL
            .into_iter()
            .find(|g| g.label().eq_ignore_ascii_case(t))
            .ok_or_else(|| format!("unknown grade {t:?}"))
    }
}

/// Semester number 1..=8, labelled "1st Sem" .. "8th Sem".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Semester(u8);

impl Semester {
    pub const COUNT: u8 = 8;

    pub fn new(n: u8) -> Option<Self> {
        (1..=Self::COUNT).contains(&n).then_some(Semester(n))
    }

    pub fn all() -> impl Iterator<Item = Semester> {
        (1..=Self::COUNT).map(Semester)
    }

    pub fn number(&self) -> u8 {
        self.0
    }

    pub fn label(&self) -> String {
        let suffix = match self.0 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        };
        format!("{}{} Sem", self.0, suffix)
    }

    /// Label with spaces replaced, as used in table names.
    pub fn table_suffix(&self) -> String {
        self.label().replace(' ', "_")
    }

    /// Accepts a bare number ("3"), a label ("3rd Sem") or a table suffix ("3rd_Sem").
    /// Zero-padded numbers are rejected.
    pub fn parse(s: &str) -> Option<Self> {
        let t = s.trim();
        let split = t.find(|c: char| !c.is_ascii_digit()).unwrap_or(t.len());
        let (digits, rest) = t.split_at(split);
        if digits.starts_with('0') {
            return None;
        }
        let sem = Semester::new(digits.parse().ok()?)?;
        if rest.is_empty() {
            return Some(sem);
        }
        let label = sem.label();
        let expected = label.strip_prefix(digits)?;
        expected
            .eq_ignore_ascii_case(&rest.replace('_', " "))
            .then_some(sem)
    }
}

impl fmt::Display for Semester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl Serialize for Semester {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Marks,
    Meetings,
    Activities,
}

impl Section {
    pub fn prefix(&self) -> &'static str {
        match self {
            Section::Marks => "marks",
            Section::Meetings => "meetings",
            Section::Activities => "activities",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentIdentity {
    pub email: String,
    pub phone: String,
    pub access_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkEntry {
    pub subject: String,
    pub mse1: u32,
    pub mse2: u32,
    pub see: u32,
    pub task: u32,
    pub grade: Grade,
    pub credits: u32,
}

impl MarkEntry {
    pub const MSE_MAX: u32 = 50;
    pub const SEE_MAX: u32 = 100;
    pub const TASK_MAX: u32 = 20;
    pub const CREDITS_MIN: u32 = 1;
    pub const CREDITS_MAX: u32 = 5;

    /// Range checks applied to entries coming from the UI.
    pub fn validate(&self) -> Result<(), String> {
        if self.subject.trim().is_empty() {
            return Err("subject must not be empty".into());
        }
        let checks = [
            ("mse1", self.mse1, 0, Self::MSE_MAX),
            ("mse2", self.mse2, 0, Self::MSE_MAX),
            ("see", self.see, 0, Self::SEE_MAX),
            ("task", self.task, 0, Self::TASK_MAX),
            ("credits", self.credits, Self::CREDITS_MIN, Self::CREDITS_MAX),
        ];
        for (name, v, lo, hi) in checks {
            if v < lo || v > hi {
                return Err(format!("{name} must be in {lo}..={hi}, got {v}"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingEntry {
    pub date: NaiveDate,
    pub discussion: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub activity: String,
    pub certificate_link: String,
}

/// A stored row seen through its table's header.
pub struct Row<'a> {
    header: &'a [String],
    fields: &'a [String],
}

impl<'a> Row<'a> {
    pub fn new(header: &'a [String], fields: &'a [String]) -> Self {
        Self { header, fields }
    }

    pub fn get(&self, column: &str) -> Option<&'a str> {
        let i = column_index(self.header, column)?;
        self.fields.get(i).map(|s| s.as_str())
    }

    pub fn require(&self, column: &str) -> Result<&'a str, String> {
        self.get(column)
            .ok_or_else(|| format!("missing column {column:?}"))
    }

    fn require_u32(&self, column: &str) -> Result<u32, String> {
        let raw = self.require(column)?.trim();
        // Spreadsheet tools sometimes write integers as "4.0".
        raw.parse::<u32>()
            .or_else(|_| match raw.parse::<f64>() {
                Ok(v) if v >= 0.0 && v.fract() == 0.0 => Ok(v as u32),
                _ => Err(()),
            })
            .map_err(|_| format!("{column}: not a whole number: {raw:?}"))
    }
}

/// Mapping between a record type and the rows of its table.
pub trait Record: Sized {
    /// Columns written when a table is first created.
    const HEADER: &'static [&'static str];

    /// Value for a (case-insensitive) column name, or `None` for foreign columns.
    fn field(&self, column: &str) -> Option<String>;

    fn from_row(row: &Row<'_>) -> Result<Self, String>;

    fn default_header() -> Vec<String> {
        Self::HEADER.iter().map(|s| s.to_string()).collect()
    }

    /// Lay this record out in `header` order; unknown columns are left empty.
    fn to_fields(&self, header: &[String]) -> Vec<String> {
        header
            .iter()
            .map(|c| self.field(c.trim()).unwrap_or_default())
            .collect()
    }
}

impl Record for StudentIdentity {
    const HEADER: &'static [&'static str] = &["email", "phone", "access_key"];

    fn field(&self, column: &str) -> Option<String> {
        match column.to_ascii_lowercase().as_str() {
            "email" => Some(self.email.clone()),
            "phone" => Some(self.phone.clone()),
            "access_key" | "key" => Some(self.access_key.clone()),
            "user" => Some(if self.email.is_empty() {
                self.phone.clone()
            } else {
                self.email.clone()
            }),
            _ => None,
        }
    }

    fn from_row(row: &Row<'_>) -> Result<Self, String> {
        let access_key = row
            .get("access_key")
            .or_else(|| row.get("key"))
            .ok_or_else(|| "missing column \"access_key\"".to_string())?
            .trim()
            .to_string();
        let (email, phone) = match (row.get("email"), row.get("phone"), row.get("user")) {
            (None, None, Some(user)) => {
                let user = user.trim();
                if user.contains('@') {
                    (user.to_string(), String::new())
                } else {
                    (String::new(), user.to_string())
                }
            }
            (email, phone, _) => (
                email.unwrap_or("").trim().to_string(),
                phone.unwrap_or("").trim().to_string(),
            ),
        };
        Ok(StudentIdentity {
            email,
            phone,
            access_key,
        })
    }
}

impl Record for MarkEntry {
    const HEADER: &'static [&'static str] =
        &["Subject", "MSE1", "MSE2", "SEE", "Task", "Grade", "Credits"];

    fn field(&self, column: &str) -> Option<String> {
        match column.to_ascii_lowercase().as_str() {
            "subject" => Some(self.subject.clone()),
            "mse1" => Some(self.mse1.to_string()),
            "mse2" => Some(self.mse2.to_string()),
            "see" => Some(self.see.to_string()),
            "task" => Some(self.task.to_string()),
            "grade" => Some(self.grade.label().to_string()),
            "credits" => Some(self.credits.to_string()),
            _ => None,
        }
    }

    fn from_row(row: &Row<'_>) -> Result<Self, String> {
        Ok(MarkEntry {
            subject: row.require("Subject")?.to_string(),
            mse1: row.require_u32("MSE1")?,
            mse2: row.require_u32("MSE2")?,
            see: row.require_u32("SEE")?,
            task: row.require_u32("Task")?,
            grade: row.require("Grade")?.parse()?,
            credits: row.require_u32("Credits")?,
        })
    }
}

impl Record for MeetingEntry {
    const HEADER: &'static [&'static str] = &["Date", "Discussion"];

    fn field(&self, column: &str) -> Option<String> {
        match column.to_ascii_lowercase().as_str() {
            "date" => Some(self.date.format("%Y-%m-%d").to_string()),
            "discussion" => Some(self.discussion.clone()),
            _ => None,
        }
    }

    fn from_row(row: &Row<'_>) -> Result<Self, String> {
        let raw = row.require("Date")?.trim();
        let date = parse_date(raw).ok_or_else(|| format!("bad date {raw:?}"))?;
        Ok(MeetingEntry {
            date,
            discussion: row.require("Discussion")?.to_string(),
        })
    }
}

impl Record for ActivityEntry {
    const HEADER: &'static [&'static str] = &["Activity", "Certificate link"];

    fn field(&self, column: &str) -> Option<String> {
        match column.to_ascii_lowercase().as_str() {
            "activity" => Some(self.activity.clone()),
            "certificate link" => Some(self.certificate_link.clone()),
            _ => None,
        }
    }

    fn from_row(row: &Row<'_>) -> Result<Self, String> {
        Ok(ActivityEntry {
            activity: row.require("Activity")?.to_string(),
            certificate_link: row.get("Certificate link").unwrap_or("").to_string(),
        })
    }
}

/// ISO dates, optionally followed by a time part (`2025-01-10 00:00:00`).
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let t = s.trim();
    let day = t.split([' ', 'T']).next().unwrap_or(t);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}
