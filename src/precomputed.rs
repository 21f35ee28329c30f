use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::record::StudentRecord;
use crate::stats::{
    course_stats, group_counts, local_grade_distribution, CourseStats, DistributionBin,
    GroupDimension,
};

/// Which branch produced an aggregate. Every resolved payload carries this so
/// the two paths stay observable from the outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsSource {
    Precomputed,
    Local,
}

impl StatsSource {
    pub fn as_str(self) -> &'static str {
        match self {
            StatsSource::Precomputed => "precomputed",
            StatsSource::Local => "local",
        }
    }
}

/// Validated upstream aggregate bundle. Each sub-object is independently
/// present; a malformed one is dropped at load time and the matching
/// aggregates fall back to local computation.
#[derive(Debug, Clone, Default)]
pub struct PrecomputedStats {
    pub by_course: Option<CourseBundle>,
    pub by_period: Option<BTreeMap<String, u64>>,
    pub grade_distribution: Option<FourBucketCounts>,
}

/// Per-course bundle: the entries exactly as the upstream sent them, plus the
/// totals projected out for group counting. Values are never recomputed.
#[derive(Debug, Clone)]
pub struct CourseBundle {
    pub entries: Map<String, Value>,
    pub totals: BTreeMap<String, u64>,
}

/// The upstream four-bucket distribution: insufficient [0,5), regular [5,7),
/// good [7,9), excellent [9,10]. Distinct from the local six-bucket scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FourBucketCounts {
    pub insufficient: u64,
    pub regular: u64,
    pub good: u64,
    pub excellent: u64,
}

impl PrecomputedStats {
    pub fn is_empty(&self) -> bool {
        self.by_course.is_none() && self.by_period.is_none() && self.grade_distribution.is_none()
    }
}

/// Parse the optional `statistics` bundle. Returns the validated stats plus
/// the names of sub-objects that were present but malformed (these fall back
/// to local computation).
pub fn parse_statistics(raw: Option<&Value>) -> (PrecomputedStats, Vec<&'static str>) {
    let mut stats = PrecomputedStats::default();
    let mut dropped = Vec::new();

    let Some(raw) = raw else {
        return (stats, dropped);
    };
    if raw.is_null() {
        return (stats, dropped);
    }
    let Some(obj) = raw.as_object() else {
        log::warn!("statistics bundle is not an object; ignoring it");
        dropped.extend(["porCurso", "porPeriodo", "distribuicaoNotas"]);
        return (stats, dropped);
    };

    if let Some(v) = obj.get("porCurso") {
        match parse_course_bundle(v) {
            Some(bundle) => stats.by_course = Some(bundle),
            None => {
                log::warn!("malformed porCurso sub-object; falling back to local course stats");
                dropped.push("porCurso");
            }
        }
    }
    if let Some(v) = obj.get("porPeriodo") {
        match parse_period_counts(v) {
            Some(counts) => stats.by_period = Some(counts),
            None => {
                log::warn!("malformed porPeriodo sub-object; falling back to local period counts");
                dropped.push("porPeriodo");
            }
        }
    }
    if let Some(v) = obj.get("distribuicaoNotas") {
        match parse_four_buckets(v) {
            Some(counts) => stats.grade_distribution = Some(counts),
            None => {
                log::warn!(
                    "malformed distribuicaoNotas sub-object; falling back to local distribution"
                );
                dropped.push("distribuicaoNotas");
            }
        }
    }

    (stats, dropped)
}

fn parse_course_bundle(raw: &Value) -> Option<CourseBundle> {
    let entries = raw.as_object()?;
    let mut totals = BTreeMap::new();
    for (label, entry) in entries {
        let fields = entry.as_object()?;
        let total = fields.get("total")?.as_u64()?;
        fields.get("aprovados")?.as_u64()?;
        fields.get("emCurso")?.as_u64()?;
        fields.get("reprovados")?.as_u64()?;
        totals.insert(label.clone(), total);
    }
    Some(CourseBundle {
        entries: entries.clone(),
        totals,
    })
}

fn parse_period_counts(raw: &Value) -> Option<BTreeMap<String, u64>> {
    let entries = raw.as_object()?;
    let mut counts = BTreeMap::new();
    for (label, value) in entries {
        counts.insert(label.clone(), value.as_u64()?);
    }
    Some(counts)
}

fn parse_four_buckets(raw: &Value) -> Option<FourBucketCounts> {
    let fields = raw.as_object()?;
    Some(FourBucketCounts {
        insufficient: fields.get("insuficiente")?.as_u64()?,
        regular: fields.get("regular")?.as_u64()?,
        good: fields.get("bom")?.as_u64()?,
        excellent: fields.get("otimo")?.as_u64()?,
    })
}

/// Shape the upstream four counts into labeled bins. The counts pass through
/// untouched; only the scheme's own labels and edges are attached.
pub fn four_bucket_bins(counts: FourBucketCounts) -> Vec<DistributionBin> {
    vec![
        DistributionBin {
            label: "Insuficiente",
            min: 0.0,
            max: 5.0,
            count: counts.insufficient as usize,
        },
        DistributionBin {
            label: "Regular",
            min: 5.0,
            max: 7.0,
            count: counts.regular as usize,
        },
        DistributionBin {
            label: "Bom",
            min: 7.0,
            max: 9.0,
            count: counts.good as usize,
        },
        DistributionBin {
            label: "Ótimo",
            min: 9.0,
            max: 10.0,
            count: counts.excellent as usize,
        },
    ]
}

#[derive(Debug, Clone)]
pub enum ResolvedCourseStats {
    /// Upstream per-course entries, verbatim as supplied.
    Precomputed(Map<String, Value>),
    Local(BTreeMap<String, CourseStats>),
}

/// Precomputed counts win whenever the matching sub-object was supplied, even
/// if a local recount over the same records would disagree.
pub fn resolve_group_counts(
    records: &[StudentRecord],
    precomputed: &PrecomputedStats,
    dimension: GroupDimension,
) -> (StatsSource, BTreeMap<String, u64>) {
    match dimension {
        GroupDimension::Course => {
            if let Some(bundle) = precomputed.by_course.as_ref() {
                return (StatsSource::Precomputed, bundle.totals.clone());
            }
        }
        GroupDimension::Period => {
            if let Some(counts) = precomputed.by_period.as_ref() {
                return (StatsSource::Precomputed, counts.clone());
            }
        }
    }
    (StatsSource::Local, group_counts(records, dimension))
}

pub fn resolve_course_stats(
    records: &[StudentRecord],
    precomputed: &PrecomputedStats,
) -> (StatsSource, ResolvedCourseStats) {
    if let Some(bundle) = precomputed.by_course.as_ref() {
        return (
            StatsSource::Precomputed,
            ResolvedCourseStats::Precomputed(bundle.entries.clone()),
        );
    }
    (
        StatsSource::Local,
        ResolvedCourseStats::Local(course_stats(records)),
    )
}

pub fn resolve_grade_distribution(
    records: &[StudentRecord],
    precomputed: &PrecomputedStats,
) -> (StatsSource, Vec<DistributionBin>) {
    if let Some(counts) = precomputed.grade_distribution {
        return (StatsSource::Precomputed, four_bucket_bins(counts));
    }
    (StatsSource::Local, local_grade_distribution(records))
}
