use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::record::StudentRecord;
use crate::situation::{classify, Situation, PASSING_AVERAGE};

/// Absence count at which a student earns an advisory flag, below the outright
/// failing threshold.
pub const ABSENCE_WATCH: u32 = 10;

/// Label used whenever a record carries no usable course or period value.
/// Result mappings never contain a missing key.
pub const NOT_INFORMED: &str = "Não informado";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupDimension {
    Course,
    Period,
}

impl GroupDimension {
    pub fn parse(raw: &str) -> Option<GroupDimension> {
        match raw {
            "course" => Some(GroupDimension::Course),
            "period" => Some(GroupDimension::Period),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GroupDimension::Course => "course",
            GroupDimension::Period => "period",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicCounts {
    pub total: usize,
    pub approved: usize,
    pub in_progress: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseStats {
    pub total: usize,
    pub approved: usize,
    pub in_progress: usize,
    pub failed: usize,
    pub approval_rate: f64,
    pub average_grade: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedStudent {
    pub record: StudentRecord,
    pub average: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagKind {
    ExcessiveAbsences,
    LowAverage,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttentionFlag {
    pub student_name: String,
    pub course: String,
    pub kind: FlagKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub absences: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionBin {
    pub label: &'static str,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

/// Static origin-code lookup for records that carry a code but no course name.
fn origin_course_label(code: &str) -> Option<&'static str> {
    match code.to_ascii_uppercase().as_str() {
        "ADM" => Some("Administração"),
        "CON" => Some("Contabilidade"),
        "ELE" => Some("Eletrotécnica"),
        "ENF" => Some("Enfermagem"),
        "INF" => Some("Informática"),
        "LOG" => Some("Logística"),
        "MEC" => Some("Mecânica Industrial"),
        "SEG" => Some("Segurança do Trabalho"),
        _ => None,
    }
}

/// Course label fallback chain: explicit course name, then the origin-code
/// table, then the raw code, then the not-informed sentinel.
pub fn course_label(rec: &StudentRecord) -> String {
    if let Some(name) = rec.course_name.as_deref() {
        return name.to_string();
    }
    if let Some(code) = rec.origin_code.as_deref() {
        if let Some(label) = origin_course_label(code) {
            return label.to_string();
        }
        return code.to_string();
    }
    NOT_INFORMED.to_string()
}

pub fn period_label(rec: &StudentRecord) -> String {
    rec.period
        .as_deref()
        .map(|p| p.to_string())
        .unwrap_or_else(|| NOT_INFORMED.to_string())
}

pub fn basic_counts(records: &[StudentRecord]) -> BasicCounts {
    let mut counts = BasicCounts {
        total: records.len(),
        ..BasicCounts::default()
    };
    for rec in records {
        match classify(rec) {
            Situation::Approved => counts.approved += 1,
            Situation::InProgress => counts.in_progress += 1,
            Situation::Failed => counts.failed += 1,
        }
    }
    counts
}

pub fn group_counts(records: &[StudentRecord], dimension: GroupDimension) -> BTreeMap<String, u64> {
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for rec in records {
        let label = match dimension {
            GroupDimension::Course => course_label(rec),
            GroupDimension::Period => period_label(rec),
        };
        *counts.entry(label).or_insert(0) += 1;
    }
    counts
}

pub fn course_stats(records: &[StudentRecord]) -> BTreeMap<String, CourseStats> {
    let mut stats: BTreeMap<String, CourseStats> = BTreeMap::new();
    let mut grade_sums: BTreeMap<String, (f64, usize)> = BTreeMap::new();

    for rec in records {
        let label = course_label(rec);
        let entry = stats.entry(label.clone()).or_default();
        entry.total += 1;
        match classify(rec) {
            Situation::Approved => entry.approved += 1,
            Situation::InProgress => entry.in_progress += 1,
            Situation::Failed => entry.failed += 1,
        }

        // Gradeless records stay out of the course average denominator.
        let average = rec.average();
        if average > 0.0 {
            let sums = grade_sums.entry(label).or_insert((0.0, 0));
            sums.0 += average;
            sums.1 += 1;
        }
    }

    for (label, entry) in stats.iter_mut() {
        if entry.total > 0 {
            entry.approval_rate = (entry.approved as f64) * 100.0 / (entry.total as f64);
        }
        if let Some((sum, n)) = grade_sums.get(label) {
            if *n > 0 {
                entry.average_grade = sum / (*n as f64);
            }
        }
    }
    stats
}

/// Top students by working average, descending. Records with no positive
/// average are excluded; ties keep their original relative order.
pub fn top_students(records: &[StudentRecord], limit: usize) -> Vec<RankedStudent> {
    let mut ranked: Vec<RankedStudent> = records
        .iter()
        .filter_map(|rec| {
            let average = rec.average();
            if average > 0.0 {
                Some(RankedStudent {
                    record: rec.clone(),
                    average,
                })
            } else {
                None
            }
        })
        .collect();
    ranked.sort_by(|a, b| b.average.partial_cmp(&a.average).unwrap_or(Ordering::Equal));
    ranked.truncate(limit);
    ranked
}

/// Advisory flags, in record order. A record can emit both an absence flag
/// and a low-average flag as two separate entries.
pub fn attention_flags(records: &[StudentRecord]) -> Vec<AttentionFlag> {
    let mut flags = Vec::new();
    for rec in records {
        let course = course_label(rec);
        if rec.absences >= ABSENCE_WATCH {
            flags.push(AttentionFlag {
                student_name: rec.name.clone(),
                course: course.clone(),
                kind: FlagKind::ExcessiveAbsences,
                absences: Some(rec.absences),
                average: None,
            });
        }
        let average = rec.average();
        if average > 0.0 && average < PASSING_AVERAGE {
            flags.push(AttentionFlag {
                student_name: rec.name.clone(),
                course,
                kind: FlagKind::LowAverage,
                absences: None,
                average: Some(average),
            });
        }
    }
    flags
}

/// Local six-bucket distribution over working averages. Independent of the
/// four-bucket scheme used for upstream-precomputed distributions; the two
/// are never merged.
pub fn local_grade_distribution(records: &[StudentRecord]) -> Vec<DistributionBin> {
    let edges: [(&'static str, f64, f64); 6] = [
        ("0-3", 0.0, 3.0),
        ("3-5", 3.0, 5.0),
        ("5-7", 5.0, 7.0),
        ("7-8", 7.0, 8.0),
        ("8-9", 8.0, 9.0),
        ("9-10", 9.0, 10.0),
    ];
    let averages: Vec<f64> = records
        .iter()
        .map(|r| r.average())
        .filter(|a| *a > 0.0)
        .collect();

    let last = edges.len() - 1;
    edges
        .iter()
        .enumerate()
        .map(|(i, (label, min, max))| {
            let count = averages
                .iter()
                .filter(|a| {
                    if i == last {
                        **a >= *min && **a <= *max
                    } else {
                        **a >= *min && **a < *max
                    }
                })
                .count();
            DistributionBin {
                label,
                min: *min,
                max: *max,
                count,
            }
        })
        .collect()
}
