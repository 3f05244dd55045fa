//! Integration tests for the dotweave pipeline.
//!
//! Library-level tests exercise parse, convert and highlight end to end; the
//! rest drive the `dotweave` binary against files on disk.

use std::io::Write;
use std::process::{Command, Output, Stdio};

use dw_core::{DotErrorCode, Graph};
use dw_parser::{apply_highlight, convert, highlight_path, parse, parse_and_convert};

const PIPELINE: &str = r#"digraph pipeline {
    node [shape=box]
    edge [style=solid]

    subgraph cluster_ingest {
        label = "Ingest"
        fetch -> decode
    }
    subgraph cluster_store {
        label = "Store"; color = green
        write [fillcolor=lightgray, style=filled]
    }

    decode -> validate -> write [label="ok"]
    validate -> quarantine [style=dashed, label="bad"]
}
"#;

fn dotweave(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_dotweave"))
        .args(args)
        .output()
        .expect("dotweave runs")
}

fn dotweave_stdin(args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_dotweave"))
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("dotweave spawns");
    child
        .stdin
        .take()
        .expect("stdin handle")
        .write_all(stdin.as_bytes())
        .expect("write stdin");
    child.wait_with_output().expect("dotweave finishes")
}

fn write_temp(dir: &tempfile::TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("write temp file");
    path.to_string_lossy().into_owned()
}

#[test]
fn pipeline_graph_resolves_groups_and_defaults() {
    let graph = parse_and_convert("pipeline.dot", PIPELINE.as_bytes()).expect("pipeline parses");

    let ids: Vec<&str> = graph.nodes.iter().map(|node| node.id.as_str()).collect();
    assert_eq!(
        ids,
        vec!["fetch", "decode", "write", "validate", "quarantine"]
    );
    assert!(graph.nodes.iter().all(|node| node.shape == "box"));

    assert_eq!(
        graph.node("fetch").and_then(|n| n.group.as_deref()),
        Some("cluster_ingest")
    );
    assert_eq!(graph.node("validate").and_then(|n| n.group.as_deref()), None);

    let write = graph.node("write").expect("write node");
    assert_eq!(write.fill_color, "lightgray");
    assert_eq!(write.style, "filled");

    let store = graph.subgraph("cluster_store").expect("store subgraph");
    assert_eq!(store.color, "green");
    assert_eq!(store.nodes, vec!["write"]);

    let bad = graph.link("validate", "quarantine").expect("quarantine link");
    assert_eq!(bad.style, "dashed");
    assert_eq!(bad.label, "bad");
    assert_eq!(graph.link("decode", "validate").map(|l| l.style.as_str()), Some("solid"));
}

#[test]
fn highlight_marks_a_route_through_the_pipeline() {
    let mut graph = parse_and_convert("", PIPELINE.as_bytes()).expect("pipeline parses");
    let result = highlight_path(
        &mut graph,
        "",
        b"digraph { fetch -> decode -> validate -> write }",
    )
    .expect("path parses");

    assert!(result.valid);
    let on_path: Vec<&str> = graph
        .nodes
        .iter()
        .filter(|node| node.on_path)
        .map(|node| node.id.as_str())
        .collect();
    assert_eq!(on_path, vec!["fetch", "decode", "write", "validate"]);
    assert_eq!(graph.links.iter().filter(|link| link.on_path).count(), 3);
    assert!(!graph.node("quarantine").expect("quarantine").on_path);
}

#[test]
fn highlight_reports_first_unknown_step() {
    let mut graph = parse_and_convert("", PIPELINE.as_bytes()).expect("pipeline parses");
    let path = parse("", b"digraph { fetch -> decode -> archive -> write }");
    let result = apply_highlight(&mut graph, &path.ast);

    assert!(!result.valid);
    assert_eq!(
        result.error.as_deref(),
        Some("edge 'decode -> archive' references unknown node 'archive'")
    );
    assert_eq!(result.last_valid_node.as_deref(), Some("decode"));
    assert!(graph.node("decode").expect("decode").path_invalid);
    assert!(!graph.node("write").expect("write").on_path);
}

#[test]
fn reapplying_after_clear_starts_fresh() {
    let mut graph = parse_and_convert("", PIPELINE.as_bytes()).expect("pipeline parses");
    let first = parse("", b"digraph { fetch -> nowhere }");
    assert!(!apply_highlight(&mut graph, &first.ast).valid);

    graph.clear_highlight();
    let second = parse("", b"digraph { validate -> quarantine }");
    assert!(apply_highlight(&mut graph, &second.ast).valid);
    assert!(graph.nodes.iter().all(|node| !node.path_invalid));
    assert_eq!(graph.nodes.iter().filter(|node| node.on_path).count(), 2);
}

#[test]
fn broken_input_still_yields_best_effort_graph() {
    let result = parse("broken.dot", b"digraph { a -> b; c -> ; d [color=red }");
    assert!(!result.is_clean());
    assert!(result.errors.iter().all(|e| e.code() == DotErrorCode::Parse));

    let graph = convert(&result.ast);
    assert!(graph.contains_node("a"));
    assert!(graph.contains_node("b"));
    assert!(graph.contains_node("c"));
    assert!(graph.link("a", "b").is_some());
}

#[test]
fn file_input_is_read_from_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_temp(&dir, "pipeline.dot", PIPELINE);
    let bytes = std::fs::read(&path).expect("read back");

    let graph = parse_and_convert(&path, &bytes).expect("file parses");
    assert_eq!(graph.graph_id.as_deref(), Some("pipeline"));
}

#[test]
fn cli_convert_emits_graph_json() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = write_temp(&dir, "pipeline.dot", PIPELINE);

    let output = dotweave(&["convert", &input]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let graph: Graph = serde_json::from_slice(&output.stdout).expect("graph json");
    assert_eq!(graph.nodes.len(), 5);
    assert!(graph.directed);
}

#[test]
fn cli_convert_with_path_wraps_validation() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = write_temp(&dir, "pipeline.dot", PIPELINE);
    let path = write_temp(&dir, "route.dot", "digraph { decode -> validate }");
    let out = dir.path().join("out.json");
    let out = out.to_string_lossy().into_owned();

    let output = dotweave(&["convert", &input, "--path", &path, "--output", &out]);
    assert!(output.status.success());

    let text = std::fs::read_to_string(&out).expect("output written");
    let value: serde_json::Value = serde_json::from_str(&text).expect("json");
    assert_eq!(value["pathValidation"]["valid"], true);
    assert_eq!(value["graph"]["nodes"][1]["onPath"], true);
}

#[test]
fn cli_convert_fails_on_invalid_path() {
    let output = dotweave(&["convert", PIPELINE, "--path", "digraph { fetch -> nowhere }"]);
    assert_eq!(output.status.code(), Some(1));

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(value["pathValidation"]["valid"], false);
    assert_eq!(value["pathValidation"]["invalidEdge"]["invalidNode"], "nowhere");
}

#[test]
fn cli_config_can_allow_invalid_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_temp(&dir, "dotweave.toml", "fail_on_invalid_path = false\n");

    let output = dotweave(&[
        "--config",
        &config,
        "convert",
        "digraph { a -> b }",
        "--path",
        "digraph { a -> z }",
    ]);
    assert!(output.status.success());
}

#[test]
fn cli_parse_failure_exits_nonzero() {
    let output = dotweave_stdin(&["convert"], "digraph { a -> }");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("<stdin>:1:16: expected node ID or subgraph after edge operator"));
}

#[test]
fn cli_tokens_lists_positions() {
    let output = dotweave(&["tokens", "graph { a -- b }"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.first().copied(), Some("1:1\tgraph"));
    assert!(lines.contains(&"1:11\t--"));
    assert_eq!(lines.len(), 6);
}

#[test]
fn cli_validate_reports_diagnostics_as_json() {
    let output = dotweave(&["validate", "--json", "digraph { a -> b; \"open }"]);
    assert_eq!(output.status.code(), Some(1));

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(value["valid"], false);
    assert_eq!(value["errors"][0]["code"], "dot/error/lex");
    // The unterminated string still becomes a node.
    assert_eq!(value["node_count"], 3);
}

#[test]
fn cli_validate_accepts_clean_input() {
    let output = dotweave(&["validate", PIPELINE]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Valid digraph"));
    assert!(stdout.contains("Nodes: 5"));
}
