use serde::Deserialize;

use crate::precomputed::PrecomputedStats;
use crate::record::StudentRecord;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// One loaded batch of records plus whatever upstream statistics survived
/// validation. Replaced atomically by the next load; queries only ever see
/// a whole snapshot.
pub struct Snapshot {
    pub id: String,
    pub loaded_at: String,
    pub records: Vec<StudentRecord>,
    pub precomputed: PrecomputedStats,
    pub dropped_statistics: Vec<&'static str>,
}

pub struct AppState {
    pub snapshot: Option<Snapshot>,
}
