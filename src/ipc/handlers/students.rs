use serde::Serialize;
use serde_json::json;
use std::cmp::Ordering;

use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{current_snapshot, paginate, required_str};
use crate::ipc::types::{AppState, Request};
use crate::record::StudentRecord;
use crate::situation::{classify, Situation};
use crate::stats;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct StudentRow {
    name: String,
    course: String,
    period: String,
    absences: u32,
    average: f64,
    has_any_grade: bool,
    situation: Situation,
}

fn row(rec: &StudentRecord) -> StudentRow {
    StudentRow {
        name: rec.name.clone(),
        course: stats::course_label(rec),
        period: stats::period_label(rec),
        absences: rec.absences,
        average: rec.average(),
        has_any_grade: rec.has_any_grade(),
        situation: classify(rec),
    }
}

fn situation_rank(situation: Situation) -> u8 {
    match situation {
        Situation::Approved => 0,
        Situation::InProgress => 1,
        Situation::Failed => 2,
    }
}

#[derive(Debug, Clone)]
struct ListQuery {
    search: Option<String>,
    situation: Option<Situation>,
    sort_by: String,
    sort_dir: String,
    page: usize,
    page_size: usize,
}

fn parse_search(v: Option<&serde_json::Value>) -> Result<Option<String>, String> {
    let Some(value) = v else {
        return Ok(None);
    };
    if value.is_null() {
        return Ok(None);
    }
    let Some(raw) = value.as_str() else {
        return Err("query.search must be string or null".to_string());
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    Ok(Some(trimmed.to_lowercase()))
}

fn parse_situation(v: Option<&serde_json::Value>) -> Result<Option<Situation>, String> {
    let Some(value) = v else {
        return Ok(None);
    };
    if value.is_null() {
        return Ok(None);
    }
    let Some(raw) = value.as_str() else {
        return Err("query.situation must be string or null".to_string());
    };
    if raw.trim().is_empty() {
        return Ok(None);
    }
    Situation::parse(raw.trim())
        .map(Some)
        .ok_or_else(|| "query.situation must be one of: approved, in_progress, failed".to_string())
}

fn parse_sort_by(v: Option<&serde_json::Value>) -> Result<String, String> {
    const ALLOWED: [&str; 4] = ["name", "average", "absences", "situation"];
    let Some(value) = v else {
        return Ok("name".to_string());
    };
    let Some(raw) = value.as_str() else {
        return Err("query.sortBy must be a string".to_string());
    };
    if ALLOWED.iter().any(|a| *a == raw) {
        Ok(raw.to_string())
    } else {
        Err(format!("query.sortBy must be one of: {}", ALLOWED.join(", ")))
    }
}

fn parse_sort_dir(v: Option<&serde_json::Value>) -> Result<String, String> {
    let Some(value) = v else {
        return Ok("asc".to_string());
    };
    let Some(raw) = value.as_str() else {
        return Err("query.sortDir must be a string".to_string());
    };
    if raw.eq_ignore_ascii_case("asc") {
        Ok("asc".to_string())
    } else if raw.eq_ignore_ascii_case("desc") {
        Ok("desc".to_string())
    } else {
        Err("query.sortDir must be one of: asc, desc".to_string())
    }
}

fn parse_page(v: Option<&serde_json::Value>) -> Result<usize, String> {
    let Some(value) = v else {
        return Ok(1);
    };
    let Some(page) = value.as_u64() else {
        return Err("query.page must be a positive integer".to_string());
    };
    if page == 0 {
        return Err("query.page must be >= 1".to_string());
    }
    Ok(page as usize)
}

fn parse_page_size(v: Option<&serde_json::Value>) -> Result<usize, String> {
    let Some(value) = v else {
        return Ok(50);
    };
    let Some(size) = value.as_u64() else {
        return Err("query.pageSize must be a positive integer".to_string());
    };
    if size == 0 || size > 500 {
        return Err("query.pageSize must be in range 1..=500".to_string());
    }
    Ok(size as usize)
}

fn parse_list_query(req: &Request) -> Result<ListQuery, serde_json::Value> {
    let query = req
        .params
        .get("query")
        .and_then(|v| v.as_object())
        .cloned()
        .unwrap_or_default();

    let search = match parse_search(query.get("search")) {
        Ok(v) => v,
        Err(msg) => return Err(err(&req.id, "bad_params", msg, None)),
    };
    let situation = match parse_situation(query.get("situation")) {
        Ok(v) => v,
        Err(msg) => return Err(err(&req.id, "bad_params", msg, None)),
    };
    let sort_by = match parse_sort_by(query.get("sortBy")) {
        Ok(v) => v,
        Err(msg) => return Err(err(&req.id, "bad_params", msg, None)),
    };
    let sort_dir = match parse_sort_dir(query.get("sortDir")) {
        Ok(v) => v,
        Err(msg) => return Err(err(&req.id, "bad_params", msg, None)),
    };
    let page = match parse_page(query.get("page")) {
        Ok(v) => v,
        Err(msg) => return Err(err(&req.id, "bad_params", msg, None)),
    };
    let page_size = match parse_page_size(query.get("pageSize")) {
        Ok(v) => v,
        Err(msg) => return Err(err(&req.id, "bad_params", msg, None)),
    };

    Ok(ListQuery {
        search,
        situation,
        sort_by,
        sort_dir,
        page,
        page_size,
    })
}

fn handle_records_classify(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(raw) = req.params.get("record") else {
        return err(&req.id, "bad_params", "missing params.record", None);
    };
    if !raw.is_object() {
        return err(&req.id, "bad_params", "params.record must be an object", None);
    }
    let rec = StudentRecord::from_value(raw);
    ok(
        &req.id,
        json!({
            "situation": classify(&rec).as_str(),
            "average": rec.average(),
            "hasAnyGrade": rec.has_any_grade()
        }),
    )
}

fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let query = match parse_list_query(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let snapshot = match current_snapshot(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };

    let mut rows: Vec<StudentRow> = snapshot.records.iter().map(row).collect();
    if let Some(search) = query.search.as_ref() {
        rows.retain(|r| r.name.to_lowercase().contains(search));
    }
    if let Some(situation) = query.situation {
        rows.retain(|r| r.situation == situation);
    }

    rows.sort_by(|a, b| {
        let ord = match query.sort_by.as_str() {
            "average" => a
                .average
                .partial_cmp(&b.average)
                .unwrap_or(Ordering::Equal),
            "absences" => a.absences.cmp(&b.absences),
            "situation" => situation_rank(a.situation).cmp(&situation_rank(b.situation)),
            _ => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        };
        if query.sort_dir == "desc" {
            ord.reverse()
        } else {
            ord
        }
    });

    let total_rows = rows.len();
    let paged = paginate(&rows, query.page, query.page_size);

    ok(
        &req.id,
        json!({
            "rows": paged,
            "totalRows": total_rows,
            "page": query.page,
            "pageSize": query.page_size,
            "sortBy": query.sort_by,
            "sortDir": query.sort_dir
        }),
    )
}

fn handle_students_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let name = match required_str(req, "name") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let snapshot = match current_snapshot(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };

    let needle = name.trim().to_lowercase();
    let Some(rec) = snapshot
        .records
        .iter()
        .find(|r| r.name.trim().to_lowercase() == needle)
    else {
        return err(&req.id, "not_found", "student not found in snapshot", None);
    };

    ok(
        &req.id,
        json!({
            "record": rec,
            "situation": classify(rec).as_str(),
            "average": rec.average(),
            "hasAnyGrade": rec.has_any_grade(),
            "attentionFlags": stats::attention_flags(std::slice::from_ref(rec))
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "records.classify" => Some(handle_records_classify(state, req)),
        "students.list" => Some(handle_students_list(state, req)),
        "students.open" => Some(handle_students_open(state, req)),
        _ => None,
    }
}
