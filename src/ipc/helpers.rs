use super::error::err;
use super::types::{AppState, Request, Snapshot};

pub fn current_snapshot<'a>(
    state: &'a AppState,
    req: &Request,
) -> Result<&'a Snapshot, serde_json::Value> {
    state
        .snapshot
        .as_ref()
        .ok_or_else(|| err(&req.id, "no_snapshot", "load a snapshot first", None))
}

pub fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Vec<T> {
    // Saturate: an out-of-range page is an empty page, never a wrapped index.
    let start = page.saturating_sub(1).saturating_mul(page_size);
    if start >= items.len() {
        return Vec::new();
    }
    let end = std::cmp::min(start.saturating_add(page_size), items.len());
    items[start..end].to_vec()
}
