mod test_support;

use serde_json::json;
use test_support::{request_ok, sample_records, sample_statistics, spawn_sidecar};

#[test]
fn supplied_counts_win_even_when_a_local_recount_disagrees() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "snapshot.load",
        json!({ "records": sample_records(), "statistics": sample_statistics() }),
    );

    // A local recount would say Administração 2 / Logística 3 / Informática 1.
    let by_course = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "dashboard.groupBy",
        json!({ "dimension": "course" }),
    );
    assert_eq!(
        by_course.get("source").and_then(|v| v.as_str()),
        Some("precomputed")
    );
    let counts = by_course.get("counts").expect("counts");
    assert_eq!(counts.get("Administração").and_then(|v| v.as_u64()), Some(40));
    assert_eq!(counts.get("Logística").and_then(|v| v.as_u64()), Some(35));
    assert!(counts.get("Informática").is_none());

    let by_period = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "dashboard.groupBy",
        json!({ "dimension": "period" }),
    );
    assert_eq!(
        by_period.get("source").and_then(|v| v.as_str()),
        Some("precomputed")
    );
    let counts = by_period.get("counts").expect("counts");
    assert_eq!(counts.get("2024/1").and_then(|v| v.as_u64()), Some(45));
    assert_eq!(counts.get("2024/2").and_then(|v| v.as_u64()), Some(30));
    assert!(counts.get("Não informado").is_none());
}

#[test]
fn supplied_course_entries_pass_through_verbatim_with_extras() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "snapshot.load",
        json!({ "records": sample_records(), "statistics": sample_statistics() }),
    );

    let stats = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "dashboard.courseStats",
        json!({}),
    );
    assert_eq!(
        stats.get("source").and_then(|v| v.as_str()),
        Some("precomputed")
    );
    let log = stats
        .get("courses")
        .and_then(|c| c.get("Logística"))
        .expect("Logística");
    // Upstream keys and extra fields survive untouched.
    assert_eq!(log.get("aprovados").and_then(|v| v.as_u64()), Some(20));
    assert_eq!(log.get("taxaAprovacao").and_then(|v| v.as_f64()), Some(57.1));
    assert!(log.get("approvalRate").is_none());
}

#[test]
fn supplied_distribution_keeps_the_four_bucket_scheme() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "snapshot.load",
        json!({ "records": sample_records(), "statistics": sample_statistics() }),
    );

    let dist = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "dashboard.gradeDistribution",
        json!({}),
    );
    assert_eq!(
        dist.get("source").and_then(|v| v.as_str()),
        Some("precomputed")
    );
    let bins = dist.get("bins").and_then(|v| v.as_array()).expect("bins");
    assert_eq!(bins.len(), 4);
    let labels: Vec<&str> = bins
        .iter()
        .filter_map(|b| b.get("label").and_then(|v| v.as_str()))
        .collect();
    assert_eq!(labels, ["Insuficiente", "Regular", "Bom", "Ótimo"]);
    let counts: Vec<u64> = bins
        .iter()
        .filter_map(|b| b.get("count").and_then(|v| v.as_u64()))
        .collect();
    assert_eq!(counts, [12, 25, 28, 10]);
}

#[test]
fn malformed_sub_objects_fall_back_independently() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let loaded = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "snapshot.load",
        json!({
            "records": sample_records(),
            "statistics": {
                "porCurso": {
                    "Administração": { "total": "quarenta", "aprovados": 22, "emCurso": 10, "reprovados": 8 }
                },
                "porPeriodo": { "2024/1": 45, "2024/2": 30 }
            }
        }),
    );
    assert_eq!(
        loaded.get("droppedStatistics"),
        Some(&json!(["porCurso"]))
    );
    let provided = loaded.get("statisticsProvided").expect("statisticsProvided");
    assert_eq!(provided.get("byCourse").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(provided.get("byPeriod").and_then(|v| v.as_bool()), Some(true));

    let by_course = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "dashboard.groupBy",
        json!({ "dimension": "course" }),
    );
    assert_eq!(by_course.get("source").and_then(|v| v.as_str()), Some("local"));
    assert_eq!(
        by_course
            .get("counts")
            .and_then(|c| c.get("Administração"))
            .and_then(|v| v.as_u64()),
        Some(2)
    );

    let by_period = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "dashboard.groupBy",
        json!({ "dimension": "period" }),
    );
    assert_eq!(
        by_period.get("source").and_then(|v| v.as_str()),
        Some("precomputed")
    );
}

#[test]
fn incomplete_distribution_counts_are_dropped() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let loaded = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "snapshot.load",
        json!({
            "records": sample_records(),
            "statistics": {
                "distribuicaoNotas": { "insuficiente": 12, "regular": 25, "bom": 28 }
            }
        }),
    );
    assert_eq!(
        loaded.get("droppedStatistics"),
        Some(&json!(["distribuicaoNotas"]))
    );

    let dist = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "dashboard.gradeDistribution",
        json!({}),
    );
    assert_eq!(dist.get("source").and_then(|v| v.as_str()), Some("local"));
    assert_eq!(
        dist.get("bins").and_then(|v| v.as_array()).map(|v| v.len()),
        Some(6)
    );
}

#[test]
fn non_object_statistics_bundle_is_ignored_entirely() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let loaded = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "snapshot.load",
        json!({ "records": sample_records(), "statistics": [1, 2, 3] }),
    );
    assert_eq!(
        loaded.get("droppedStatistics"),
        Some(&json!(["porCurso", "porPeriodo", "distribuicaoNotas"]))
    );

    let open = request_ok(&mut stdin, &mut reader, "2", "dashboard.open", json!({}));
    assert_eq!(
        open.get("byCourse").and_then(|g| g.get("source")).and_then(|v| v.as_str()),
        Some("local")
    );
    assert_eq!(
        open.get("gradeDistribution")
            .and_then(|d| d.get("source"))
            .and_then(|v| v.as_str()),
        Some("local")
    );
}
