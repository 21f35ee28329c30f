#![allow(dead_code)]

use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

pub fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_boletimd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn boletimd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

pub fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

pub fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(true),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().expect("result object")
}

pub fn error_code(response: &serde_json::Value) -> String {
    response
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
}

/// Six records with known classifications:
/// Ana approved, Bruno failed (low average), Carla approved (flagged for
/// absences), Diego failed (absences over the limit), Elisa approved by
/// reported status, Fábio untouched (in progress).
pub fn sample_records() -> serde_json::Value {
    json!([
        {
            "nome": "Ana Souza",
            "faltas": 2,
            "nota1": "8,5",
            "media": "8,5",
            "curso": "Administração",
            "periodo": "2024/1"
        },
        {
            "nome": "Bruno Lima",
            "faltas": 4,
            "nota1": 5,
            "media": 5.0,
            "curso": "Administração",
            "periodo": "2024/1"
        },
        {
            "nome": "Carla Mendes",
            "faltas": 12,
            "nota1": 7,
            "media": 7.0,
            "curso": "Logística",
            "periodo": "2024/2"
        },
        {
            "nome": "Diego Santos",
            "faltas": 18,
            "nota1": 9,
            "media": 9.0,
            "curso": "Logística"
        },
        {
            "nome": "Elisa Ferreira",
            "faltas": 0,
            "situacao": "Aprovado",
            "media": 6.5,
            "origem": "INF",
            "periodo": "2024/1"
        },
        {
            "nome": "Fábio Rocha",
            "faltas": 0,
            "curso": "Logística",
            "periodo": "2024/2"
        }
    ])
}

/// An upstream statistics bundle that deliberately disagrees with what a local
/// recount of `sample_records` would produce.
pub fn sample_statistics() -> serde_json::Value {
    json!({
        "porCurso": {
            "Administração": { "total": 40, "aprovados": 22, "emCurso": 10, "reprovados": 8 },
            "Logística": { "total": 35, "aprovados": 20, "emCurso": 9, "reprovados": 6, "taxaAprovacao": 57.1 }
        },
        "porPeriodo": { "2024/1": 45, "2024/2": 30 },
        "distribuicaoNotas": { "insuficiente": 12, "regular": 25, "bom": 28, "otimo": 10 }
    })
}
