use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::TempDir;

fn astream_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("astream");
    path
}

fn setup_test_env(extra: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[snapshot]
path = "{root}/data/snapshot.json"

[session]
query = "state estimation"
low_water = 2
high_water = 10

[scoring]
provider = "disabled"

[telemetry]
path = "{root}/data/interactions.json"

[download]
dir = "{root}/papers"
{extra}"#,
        root = root.display(),
        extra = extra
    );

    let config_path = config_dir.join("astream.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn seed_snapshot(root: &Path, json: &str) {
    let data = root.join("data");
    fs::create_dir_all(&data).unwrap();
    fs::write(data.join("snapshot.json"), json).unwrap();
}

fn run_astream(config_path: &Path, args: &[&str], stdin: &str) -> (String, String, bool) {
    let binary = astream_binary();
    let mut child = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env("RUST_LOG", "abstract_stream=warn")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap_or_else(|e| panic!("Failed to run astream binary at {:?}: {}", binary, e));

    child
        .stdin
        .take()
        .unwrap()
        .write_all(stdin.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn read_snapshot(root: &Path) -> serde_json::Value {
    let raw = fs::read_to_string(root.join("data").join("snapshot.json")).unwrap();
    serde_json::from_str(&raw).unwrap()
}

const TWO_UNRATED: &str = r#"{
  "rated_items": [],
  "unrated_items": [
    {"id": "a", "title": "Alpha", "abstract": "first", "prng_score": 0.9, "tfidf_score": 0.0},
    {"id": "b", "title": "Beta", "abstract": "second", "prng_score": 0.1, "tfidf_score": 0.0, "venue": "ICRA"}
  ]
}"#;

#[test]
fn test_stats_on_empty_snapshot() {
    let (_tmp, config_path) = setup_test_env("");

    let (stdout, stderr, success) = run_astream(&config_path, &["stats"], "");
    assert!(success, "stats failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Rated:       0"));
    assert!(stdout.contains("never"));
}

#[test]
fn test_sources_lists_configured_arxiv() {
    let (_tmp, config_path) = setup_test_env(
        r#"
[sources.arxiv.robotics]
query = "gyroscope"
page_size = 10
"#,
    );

    let (stdout, _, success) = run_astream(&config_path, &["sources"], "");
    assert!(success);
    assert!(stdout.contains("arxiv:robotics"));
    assert!(stdout.contains("gyroscope"));
}

#[test]
fn test_sources_empty() {
    let (_tmp, config_path) = setup_test_env("");
    let (stdout, _, success) = run_astream(&config_path, &["sources"], "");
    assert!(success);
    assert!(stdout.contains("No sources configured"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("astream.toml");
    fs::write(&config_path, "[session]\nlow_water = 5\nhigh_water = 5\n").unwrap();

    let (_, stderr, success) = run_astream(&config_path, &["stats"], "");
    assert!(!success);
    assert!(stderr.contains("high_water"), "stderr: {}", stderr);
}

#[test]
fn test_session_without_documents() {
    let (tmp, config_path) = setup_test_env("");

    let (stdout, stderr, success) = run_astream(&config_path, &["session"], "q\n");
    assert!(success, "session failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("No more documents"));
    assert!(tmp.path().join("data").join("snapshot.json").exists());
}

#[test]
fn test_session_rates_best_document_first() {
    let (tmp, config_path) = setup_test_env("");
    seed_snapshot(tmp.path(), TWO_UNRATED);

    let (stdout, stderr, success) = run_astream(&config_path, &["session"], "l\nq\n");
    assert!(success, "session failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Alpha"));
    assert!(stdout.contains("Beta"));

    let snapshot = read_snapshot(tmp.path());
    let rated = snapshot["rated_items"].as_array().unwrap();
    assert_eq!(rated.len(), 1);
    assert_eq!(rated[0]["id"], "a");
    assert_eq!(rated[0]["rating"], 3);

    let unrated = snapshot["unrated_items"].as_array().unwrap();
    assert_eq!(unrated.len(), 1);
    assert_eq!(unrated[0]["id"], "b");
    assert_eq!(unrated[0]["venue"], "ICRA");
}

#[test]
fn test_session_skip_folds_back_into_unrated() {
    let (tmp, config_path) = setup_test_env("");
    seed_snapshot(tmp.path(), TWO_UNRATED);

    let (_, _, success) = run_astream(&config_path, &["session"], "s\ns\nq\n");
    assert!(success);

    let snapshot = read_snapshot(tmp.path());
    assert!(snapshot["rated_items"].as_array().unwrap().is_empty());
    let ids: Vec<&str> = snapshot["unrated_items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["a", "b"]);
}

#[test]
fn test_session_rating_without_active_is_reported() {
    let (tmp, config_path) = setup_test_env("");

    let (_, stderr, success) = run_astream(&config_path, &["session"], "l\nq\n");
    assert!(success);
    assert!(stderr.contains("no active document"), "stderr: {}", stderr);

    let counters: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(tmp.path().join("data").join("interactions.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(counters["usage"]["mark_liked"], 1);
    assert_eq!(counters["sequences"]["load:_init"], 1);
}

#[test]
fn test_session_survives_unreachable_source() {
    let (tmp, config_path) = setup_test_env(
        r#"
[sources.arxiv.main]
base_url = "http://127.0.0.1:9/api/query"
wait_secs = 0
timeout_secs = 2
"#,
    );
    seed_snapshot(tmp.path(), TWO_UNRATED);

    let (stdout, stderr, success) = run_astream(&config_path, &["session"], "x\nq\n");
    assert!(success, "session failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stderr.contains("arxiv:main"), "stderr: {}", stderr);

    let snapshot = read_snapshot(tmp.path());
    let ids: Vec<&str> = snapshot["unrated_items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["a", "b"]);
}
