//! Black-box integration tests driving compile -> Pack -> execute end to end,
//! covering the concrete scenarios from spec.md §8.

use std::sync::Arc;

use beingdb_core::{compile, parse_query, Engine, ExecutionConfig, Pack};

async fn build_pack(files: &[(&str, &str)]) -> (tempfile::TempDir, Pack) {
    let source = tempfile::tempdir().unwrap();
    for (file_name, contents) in files {
        std::fs::write(source.path().join(file_name), contents).unwrap();
    }
    let pack_dir = tempfile::tempdir().unwrap();
    let report = compile(source.path(), pack_dir.path()).await.unwrap();
    assert!(report.is_success());
    let pack = Pack::open(pack_dir.path()).unwrap();
    (pack_dir, pack)
}

#[tokio::test]
async fn s1_single_pattern_query() {
    let (_dir, pack) =
        build_pack(&[("created.pl", "created(tina_keane, she).\ncreated(tina_keane, faded_wallpaper).\n")]).await;
    let engine = Engine::new(Arc::new(pack), ExecutionConfig::default());

    let query = parse_query("created(tina_keane, Work)").unwrap();
    let result = engine.execute(&query).await.unwrap();

    assert_eq!(result.total, Some(2));
    let works: Vec<&str> = result.bindings.iter().map(|b| b["Work"].as_str()).collect();
    assert_eq!(works, vec!["she", "faded_wallpaper"]);
}

#[tokio::test]
async fn s2_two_pattern_join() {
    let (_dir, pack) = build_pack(&[
        ("created.pl", "created(tina_keane, she).\ncreated(tina_keane, faded_wallpaper).\n"),
        ("shown_in.pl", "shown_in(she, rewind_1995).\nshown_in(faded_wallpaper, ica_2010).\n"),
    ])
    .await;
    let engine = Engine::new(Arc::new(pack), ExecutionConfig::default());

    let query = parse_query("created(tina_keane, Work), shown_in(Work, E)").unwrap();
    let result = engine.execute(&query).await.unwrap();

    let pairs: Vec<(&str, &str)> = result.bindings.iter().map(|b| (b["Work"].as_str(), b["E"].as_str())).collect();
    assert_eq!(pairs, vec![("she", "rewind_1995"), ("faded_wallpaper", "ica_2010")]);
}

#[tokio::test]
async fn s3_string_argument_encoding() {
    let (_dir, pack) = build_pack(&[("keyword.pl", r#"keyword(doc_456, "neural networks")."#)]).await;

    let facts = pack.facts("keyword").await.unwrap();
    assert_eq!(facts.len(), 1);
    assert_eq!(facts[0].0, "7:doc_456:$:0");
    assert_eq!(facts[0].1, b"15:neural networks");

    let engine = Engine::new(Arc::new(pack), ExecutionConfig::default());
    let query = parse_query(r#"keyword(Doc, "neural networks")"#).unwrap();
    let result = engine.execute(&query).await.unwrap();
    assert_eq!(result.bindings.len(), 1);
    assert_eq!(result.bindings[0]["Doc"], "doc_456");
}

#[tokio::test]
async fn s4_cartesian_product_rejected_before_execution() {
    let (_dir, _pack) = build_pack(&[("created.pl", "created(a, b).\n")]).await;

    let query = parse_query("created(A, W), created(A, W)").unwrap();
    let err = beingdb_core::validate_query(&query, None, None).unwrap_err();
    assert!(matches!(err, beingdb_core::BeingDbError::CartesianProduct(_)));
}

#[tokio::test]
async fn s5_streaming_pagination_window() {
    let lines: String = (1..=10).map(|i| format!("data({i}).\n")).collect();
    let (_dir, pack) = build_pack(&[("data.pl", &lines)]).await;
    let engine = Engine::new(Arc::new(pack), ExecutionConfig::default());

    let query = parse_query("data(X)").unwrap();
    let full = engine.execute(&query).await.unwrap();
    assert_eq!(full.total, Some(10));

    let page = engine.execute_streaming(&query, Some(5), Some(100)).await.unwrap();
    assert_eq!(page.total, None);
    let values: Vec<&str> = page.bindings.iter().map(|b| b["X"].as_str()).collect();
    assert_eq!(values, vec!["6", "7", "8", "9", "10"]);
}

#[tokio::test]
async fn s6_mixed_arity_file_fails_compile_and_serves_nothing() {
    let source = tempfile::tempdir().unwrap();
    let pack_dir = tempfile::tempdir().unwrap();
    std::fs::write(source.path().join("made.pl"), "made(a,b).\nmade(a,b,c).\n").unwrap();

    let report = compile(source.path(), pack_dir.path()).await.unwrap();
    assert!(!report.is_success());
    assert_eq!(report.failed_predicates(), vec!["made"]);

    let pack = Pack::open(pack_dir.path()).unwrap();
    assert!(pack.list_predicates().await.unwrap().is_empty());
}

#[tokio::test]
async fn pagination_windows_cover_the_full_result_set() {
    let lines: String = (1..=10).map(|i| format!("data({i}).\n")).collect();
    let (_dir, pack) = build_pack(&[("data.pl", &lines)]).await;
    let pack = Arc::new(pack);
    let engine = Engine::new(pack, ExecutionConfig::default());
    let query = parse_query("data(X)").unwrap();

    let first = engine.execute_streaming(&query, Some(0), Some(4)).await.unwrap();
    let second = engine.execute_streaming(&query, Some(4), Some(4)).await.unwrap();
    let third = engine.execute_streaming(&query, Some(8), Some(4)).await.unwrap();

    let mut combined: Vec<&str> = Vec::new();
    for window in [&first, &second, &third] {
        combined.extend(window.bindings.iter().map(|b| b["X"].as_str()));
    }

    let full = engine.execute(&query).await.unwrap();
    let full_values: Vec<&str> = full.bindings.iter().map(|b| b["X"].as_str()).collect();
    assert_eq!(combined, full_values);
}
