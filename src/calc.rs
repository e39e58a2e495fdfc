use serde::Serialize;

use crate::error::Result;
use crate::model::{MarkEntry, Semester};
use crate::records::load_all_marks;
use crate::store::Storage;

/// Half-away-from-zero rounding to 2 decimals.
pub fn round_off_2_decimals(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CgpaBreakdown {
    pub weighted_points: u64,
    pub total_credits: u64,
    /// Absent when no credits are recorded.
    pub cgpa: Option<f64>,
}

pub fn cgpa_breakdown<'a, I>(marks: I) -> CgpaBreakdown
where
    I: IntoIterator<Item = &'a MarkEntry>,
{
    let mut weighted_points: u64 = 0;
    let mut total_credits: u64 = 0;
    for m in marks {
        weighted_points += u64::from(m.credits) * u64::from(m.grade.points());
        total_credits += u64::from(m.credits);
    }
    let cgpa = if total_credits > 0 {
        Some(round_off_2_decimals(
            weighted_points as f64 / total_credits as f64,
        ))
    } else {
        None
    };
    CgpaBreakdown {
        weighted_points,
        total_credits,
        cgpa,
    }
}

/// Credit-weighted grade point average, `None` for a table with no credits.
pub fn compute_cgpa(marks: &[MarkEntry]) -> Option<f64> {
    cgpa_breakdown(marks).cgpa
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionCgpa {
    /// `None` for marks stored without a semester.
    pub semester: Option<Semester>,
    pub subject_count: usize,
    #[serde(flatten)]
    pub breakdown: CgpaBreakdown,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeSummary {
    pub semesters: Vec<PartitionCgpa>,
    /// Over every partition together.
    pub overall: CgpaBreakdown,
}

pub fn grade_summary(storage: &dyn Storage, access_key: &str) -> Result<GradeSummary> {
    let partitions = load_all_marks(storage, access_key)?;
    let semesters = partitions
        .iter()
        .map(|(semester, rows)| PartitionCgpa {
            semester: *semester,
            subject_count: rows.len(),
            breakdown: cgpa_breakdown(rows),
        })
        .collect();
    let overall = cgpa_breakdown(partitions.iter().flat_map(|(_, rows)| rows.iter()));
    Ok(GradeSummary { semesters, overall })
}
