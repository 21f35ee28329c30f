use serde_json::json;

use crate::ipc::error::{err, ok};
use crate::ipc::helpers::current_snapshot;
use crate::ipc::types::{AppState, Request, Snapshot};
use crate::precomputed::{self, ResolvedCourseStats};
use crate::stats::{self, GroupDimension};

fn parse_dimension(req: &Request) -> Result<GroupDimension, serde_json::Value> {
    let Some(raw) = req.params.get("dimension").and_then(|v| v.as_str()) else {
        return Err(err(&req.id, "bad_params", "missing params.dimension", None));
    };
    GroupDimension::parse(raw).ok_or_else(|| {
        err(
            &req.id,
            "bad_params",
            "dimension must be one of: course, period",
            Some(json!({ "dimension": raw })),
        )
    })
}

fn parse_limit(req: &Request) -> Result<usize, serde_json::Value> {
    let Some(value) = req.params.get("limit") else {
        return Ok(5);
    };
    let Some(limit) = value.as_u64() else {
        return Err(err(
            &req.id,
            "bad_params",
            "limit must be a positive integer",
            None,
        ));
    };
    if limit == 0 || limit > 100 {
        return Err(err(
            &req.id,
            "bad_params",
            "limit must be in range 1..=100",
            None,
        ));
    }
    Ok(limit as usize)
}

fn group_by_payload(snapshot: &Snapshot, dimension: GroupDimension) -> serde_json::Value {
    let (source, counts) =
        precomputed::resolve_group_counts(&snapshot.records, &snapshot.precomputed, dimension);
    json!({
        "dimension": dimension.as_str(),
        "source": source.as_str(),
        "counts": counts
    })
}

fn course_stats_payload(snapshot: &Snapshot) -> serde_json::Value {
    let (source, resolved) =
        precomputed::resolve_course_stats(&snapshot.records, &snapshot.precomputed);
    let courses = match resolved {
        ResolvedCourseStats::Precomputed(entries) => json!(entries),
        ResolvedCourseStats::Local(stats) => json!(stats),
    };
    json!({ "source": source.as_str(), "courses": courses })
}

fn grade_distribution_payload(snapshot: &Snapshot) -> serde_json::Value {
    let (source, bins) =
        precomputed::resolve_grade_distribution(&snapshot.records, &snapshot.precomputed);
    json!({ "source": source.as_str(), "bins": bins })
}

fn handle_summary(state: &mut AppState, req: &Request) -> serde_json::Value {
    let snapshot = match current_snapshot(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    ok(&req.id, json!(stats::basic_counts(&snapshot.records)))
}

fn handle_group_by(state: &mut AppState, req: &Request) -> serde_json::Value {
    let dimension = match parse_dimension(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let snapshot = match current_snapshot(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    ok(&req.id, group_by_payload(snapshot, dimension))
}

fn handle_course_stats(state: &mut AppState, req: &Request) -> serde_json::Value {
    let snapshot = match current_snapshot(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    ok(&req.id, course_stats_payload(snapshot))
}

fn handle_top_students(state: &mut AppState, req: &Request) -> serde_json::Value {
    let limit = match parse_limit(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let snapshot = match current_snapshot(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    ok(
        &req.id,
        json!({
            "limit": limit,
            "students": stats::top_students(&snapshot.records, limit)
        }),
    )
}

fn handle_attention_flags(state: &mut AppState, req: &Request) -> serde_json::Value {
    let snapshot = match current_snapshot(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    ok(
        &req.id,
        json!({ "flags": stats::attention_flags(&snapshot.records) }),
    )
}

fn handle_grade_distribution(state: &mut AppState, req: &Request) -> serde_json::Value {
    let snapshot = match current_snapshot(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    ok(&req.id, grade_distribution_payload(snapshot))
}

/// One-call dashboard refresh: everything the overview screen renders, in a
/// single composite payload.
fn handle_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let snapshot = match current_snapshot(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    ok(
        &req.id,
        json!({
            "snapshotId": snapshot.id,
            "loadedAt": snapshot.loaded_at,
            "kpis": stats::basic_counts(&snapshot.records),
            "byCourse": group_by_payload(snapshot, GroupDimension::Course),
            "byPeriod": group_by_payload(snapshot, GroupDimension::Period),
            "courseStats": course_stats_payload(snapshot),
            "gradeDistribution": grade_distribution_payload(snapshot),
            "topStudents": stats::top_students(&snapshot.records, 5),
            "attentionFlags": stats::attention_flags(&snapshot.records)
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "dashboard.summary" => Some(handle_summary(state, req)),
        "dashboard.groupBy" => Some(handle_group_by(state, req)),
        "dashboard.courseStats" => Some(handle_course_stats(state, req)),
        "dashboard.topStudents" => Some(handle_top_students(state, req)),
        "dashboard.attentionFlags" => Some(handle_attention_flags(state, req)),
        "dashboard.gradeDistribution" => Some(handle_grade_distribution(state, req)),
        "dashboard.open" => Some(handle_open(state, req)),
        _ => None,
    }
}
