mod test_support;

use serde_json::json;
use test_support::{error_code, request, request_ok, spawn_sidecar};

fn sheet_values() -> serde_json::Value {
    json!([
        ["Nome", "Faltas", "Nota 1", "Nota 2", "Nota 3", "Mundo do Trabalho 1", "Convívio 1", "Média", "Situação", "Curso", "Período"],
        ["Ana Souza", "2", "8,5", "9", "8", "9,5", "10", "8,5", "", "Administração", "2024/1"],
        ["Bruno Lima", "17", "4", "", "", "", "", "4,0", "", "Administração", "2024/1"],
        ["", "", "", "", "", "", "", "", "", "", ""],
        ["Carla Mendes"],
        ["Diego Santos", "1", "", "", "", "", "", "", "Aprovado", "Logística", "2024/2"]
    ])
}

#[test]
fn load_sheet_ingests_a_header_and_cell_rows_table() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let loaded = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "snapshot.loadSheet",
        json!({ "values": sheet_values() }),
    );
    assert_eq!(loaded.get("recordCount").and_then(|v| v.as_u64()), Some(4));
    assert_eq!(loaded.get("skippedRows").and_then(|v| v.as_u64()), Some(1));
    assert_eq!(
        loaded.get("recognizedColumns").and_then(|v| v.as_u64()),
        Some(11)
    );

    let summary = request_ok(&mut stdin, &mut reader, "2", "dashboard.summary", json!({}));
    assert_eq!(summary.get("total").and_then(|v| v.as_u64()), Some(4));
    assert_eq!(summary.get("approved").and_then(|v| v.as_u64()), Some(2));
    assert_eq!(summary.get("failed").and_then(|v| v.as_u64()), Some(1));
    assert_eq!(summary.get("inProgress").and_then(|v| v.as_u64()), Some(1));

    let ana = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "students.open",
        json!({ "name": "Ana Souza" }),
    );
    let record = ana.get("record").expect("record");
    assert_eq!(record.get("absences").and_then(|v| v.as_u64()), Some(2));
    assert_eq!(
        record.get("reportedAverage").and_then(|v| v.as_f64()),
        Some(8.5)
    );
    assert_eq!(
        record
            .get("grades")
            .and_then(|v| v.as_array())
            .and_then(|g| g.first())
            .and_then(|v| v.as_f64()),
        Some(8.5)
    );
}

#[test]
fn load_sheet_accepts_plain_unaccented_headers() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let loaded = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "snapshot.loadSheet",
        json!({
            "values": [
                ["nome", "faltas", "media"],
                ["Elisa", "1", "7,8"]
            ]
        }),
    );
    assert_eq!(loaded.get("recordCount").and_then(|v| v.as_u64()), Some(1));

    let elisa = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "students.open",
        json!({ "name": "Elisa" }),
    );
    assert_eq!(elisa.get("average").and_then(|v| v.as_f64()), Some(7.8));
    assert_eq!(elisa.get("situation").and_then(|v| v.as_str()), Some("approved"));
}

#[test]
fn load_sheet_rejects_unusable_tables() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let resp = request(&mut stdin, &mut reader, "1", "snapshot.loadSheet", json!({}));
    assert_eq!(error_code(&resp), "bad_params");

    let resp = request(
        &mut stdin,
        &mut reader,
        "2",
        "snapshot.loadSheet",
        json!({ "values": { "rows": [] } }),
    );
    assert_eq!(error_code(&resp), "bad_sheet");

    let resp = request(
        &mut stdin,
        &mut reader,
        "3",
        "snapshot.loadSheet",
        json!({ "values": [] }),
    );
    assert_eq!(error_code(&resp), "bad_sheet");

    let resp = request(
        &mut stdin,
        &mut reader,
        "4",
        "snapshot.loadSheet",
        json!({ "values": [["Observações", "Responsável"]] }),
    );
    assert_eq!(error_code(&resp), "bad_sheet");

    // A failed sheet load leaves no snapshot behind.
    let info = request(&mut stdin, &mut reader, "5", "snapshot.info", json!({}));
    assert_eq!(error_code(&info), "no_snapshot");
}
