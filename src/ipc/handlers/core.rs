use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::ipc::error::{err, ok};
use crate::ipc::helpers::current_snapshot;
use crate::ipc::types::{AppState, Request, Snapshot};
use crate::precomputed::{self, PrecomputedStats};
use crate::record::StudentRecord;
use crate::sheet;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "snapshotId": state.snapshot.as_ref().map(|s| s.id.clone())
        }),
    )
}

fn snapshot_summary(snapshot: &Snapshot) -> serde_json::Value {
    let mut out = json!({
        "snapshotId": snapshot.id,
        "loadedAt": snapshot.loaded_at,
        "recordCount": snapshot.records.len(),
        "statisticsProvided": {
            "byCourse": snapshot.precomputed.by_course.is_some(),
            "byPeriod": snapshot.precomputed.by_period.is_some(),
            "gradeDistribution": snapshot.precomputed.grade_distribution.is_some()
        }
    });
    if !snapshot.dropped_statistics.is_empty() {
        out["droppedStatistics"] = json!(snapshot.dropped_statistics);
    }
    out
}

fn install_snapshot(
    state: &mut AppState,
    records: Vec<StudentRecord>,
    precomputed: PrecomputedStats,
    dropped: Vec<&'static str>,
) -> serde_json::Value {
    let snapshot = Snapshot {
        id: Uuid::new_v4().to_string(),
        loaded_at: Utc::now().to_rfc3339(),
        records,
        precomputed,
        dropped_statistics: dropped,
    };
    log::info!(
        "snapshot {} loaded: {} records",
        snapshot.id,
        snapshot.records.len()
    );
    if !snapshot.precomputed.is_empty() {
        log::debug!("snapshot {} carries upstream statistics", snapshot.id);
    }
    let summary = snapshot_summary(&snapshot);
    state.snapshot = Some(snapshot);
    summary
}

fn handle_snapshot_load(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(raw) = req.params.get("records").and_then(|v| v.as_array()) else {
        return err(&req.id, "bad_params", "missing params.records", None);
    };
    let records: Vec<StudentRecord> = raw.iter().map(StudentRecord::from_value).collect();
    let (precomputed, dropped) = precomputed::parse_statistics(req.params.get("statistics"));
    ok(&req.id, install_snapshot(state, records, precomputed, dropped))
}

fn handle_snapshot_load_sheet(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(values) = req.params.get("values") else {
        return err(&req.id, "bad_params", "missing params.values", None);
    };
    let import = match sheet::records_from_values(values) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_sheet", e.to_string(), None),
    };
    let (precomputed, dropped) = precomputed::parse_statistics(req.params.get("statistics"));
    let mut summary = install_snapshot(state, import.records, precomputed, dropped);
    summary["skippedRows"] = json!(import.skipped_rows);
    summary["recognizedColumns"] = json!(import.recognized_columns);
    ok(&req.id, summary)
}

fn handle_snapshot_info(state: &mut AppState, req: &Request) -> serde_json::Value {
    let snapshot = match current_snapshot(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    ok(&req.id, snapshot_summary(snapshot))
}

fn handle_snapshot_clear(state: &mut AppState, req: &Request) -> serde_json::Value {
    let cleared = state.snapshot.take().is_some();
    ok(&req.id, json!({ "cleared": cleared }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "snapshot.load" => Some(handle_snapshot_load(state, req)),
        "snapshot.loadSheet" => Some(handle_snapshot_load_sheet(state, req)),
        "snapshot.info" => Some(handle_snapshot_info(state, req)),
        "snapshot.clear" => Some(handle_snapshot_clear(state, req)),
        _ => None,
    }
}
