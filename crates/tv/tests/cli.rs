//! End-to-end tests for the `tv` binary against a snapshot file.
//!
//! Every test gets its own temporary snapshot and config file, passed to
//! the child process through `--data` and `TV_CONFIG`.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::{json, Value};
use tempfile::TempDir;

struct Fixture {
    _dir: TempDir,
    data: PathBuf,
    config: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let data = dir.path().join("snapshot.json");
        let config = dir.path().join("config").join("config.toml");
        let snapshot = json!({
            "tasks": [
                {"id": 1, "title": "Buy milk", "project_id": 1, "priority": 4, "labels": [7]},
                {"id": 2, "title": "File taxes", "project_id": 1, "priority": 3, "done": true},
                {"id": 3, "title": "Water plants", "project_id": 1, "priority": 1},
                {"id": 4, "title": "Elsewhere", "project_id": 2}
            ],
            "views": [
                {"id": 10, "project_id": 1, "title": "List"},
                {"id": 11, "project_id": 1, "title": "Open", "filter": "done = false"}
            ],
            "positions": [
                {"task_id": 1, "project_view_id": 10, "position": 500.0},
                {"task_id": 3, "project_view_id": 10, "position": 500.0}
            ]
        });
        fs::write(&data, serde_json::to_string_pretty(&snapshot).unwrap()).unwrap();
        Self {
            _dir: dir,
            data,
            config,
        }
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_tv"))
            .arg("--data")
            .arg(&self.data)
            .arg("--no-color")
            .args(args)
            .env("TV_CONFIG", &self.config)
            .env_remove("TV_DATA")
            .env_remove("TV_TIMEZONE")
            .env_remove("RUST_LOG")
            .output()
            .expect("failed to run tv")
    }

    fn json(&self, args: &[&str]) -> Value {
        let mut full = vec!["--json"];
        full.extend_from_slice(args);
        let output = self.run(&full);
        assert!(
            output.status.success(),
            "tv {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
    }

    fn snapshot(&self) -> Value {
        read_json(&self.data)
    }
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

fn task_ids(listing: &Value) -> Vec<i64> {
    listing["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_i64().unwrap())
        .collect()
}

#[test]
fn test_list_orders_and_persists_positions() {
    let fx = Fixture::new();
    let listing = fx.json(&["list", "10"]);
    // Task 2 has no position yet and gets 2000; 1 and 3 tie at 500.
    assert_eq!(task_ids(&listing), vec![1, 3, 2]);
    assert_eq!(listing["tasks"][2]["position"], 2000.0);

    let positions = fx.snapshot()["positions"].as_array().unwrap().len();
    assert_eq!(positions, 3);
}

#[test]
fn test_list_applies_view_and_request_filters() {
    let fx = Fixture::new();
    assert_eq!(task_ids(&fx.json(&["list", "11"])), vec![1, 3]);
    assert_eq!(
        task_ids(&fx.json(&["list", "11", "--filter", "priority >= 3"])),
        vec![1]
    );
}

#[test]
fn test_check_then_repair() {
    let fx = Fixture::new();
    let groups = fx.json(&["positions", "check"]);
    assert_eq!(groups[0]["task_ids"], json!([1, 3]));

    let dry = fx.json(&["positions", "repair", "--dry-run"]);
    assert_eq!(dry["dry_run"], true);
    assert_eq!(dry["tasks_affected"], 2);
    assert_eq!(fx.json(&["positions", "check"]), groups);

    let real = fx.json(&["positions", "repair"]);
    assert_eq!(real["views_repaired"], 1);
    assert_eq!(fx.json(&["positions", "check"]), json!([]));
}

#[test]
fn test_move_writes_snapshot() {
    let fx = Fixture::new();
    let moved = fx.json(&["move", "2", "10", "100"]);
    assert_eq!(moved["task_id"], 2);
    assert_eq!(moved["position"], 100.0);

    let listing = fx.json(&["list", "10"]);
    assert_eq!(task_ids(&listing)[0], 2);
}

#[test]
fn test_place_between_neighbors() {
    let fx = Fixture::new();
    fx.json(&["positions", "repair"]);

    let placed = fx.json(&["place", "2", "10", "--after", "1", "--before", "3"]);
    assert_eq!(placed["task_id"], 2);
    assert_eq!(task_ids(&fx.json(&["list", "10"])), vec![1, 2, 3]);

    let output = fx.run(&["place", "2", "10", "--after", "99"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_filter_sql_postgres() {
    let fx = Fixture::new();
    let sql = fx.json(&["filter", "sql", "title like milk", "--dialect", "postgres"]);
    assert_eq!(sql["sql"], "title ILIKE $1 ESCAPE '!'");
    assert_eq!(sql["params"], json!(["%milk%"]));
}

#[test]
fn test_invalid_filter_error_envelope() {
    let fx = Fixture::new();
    let output = fx.run(&["--json", "filter", "parse", "dueDat < now"]);
    assert_eq!(output.status.code(), Some(1));

    let error: Value = serde_json::from_slice(&output.stderr).unwrap();
    assert_eq!(error["error"]["code"], "FILTER_ERROR");
    assert!(error["error"]["message"]
        .as_str()
        .unwrap()
        .contains("did you mean 'dueDate'?"));
}

#[test]
fn test_unknown_view_is_not_found() {
    let fx = Fixture::new();
    let output = fx.run(&["--json", "list", "99"]);
    assert_eq!(output.status.code(), Some(2));
    let error: Value = serde_json::from_slice(&output.stderr).unwrap();
    assert_eq!(error["error"]["code"], "NOT_FOUND");
}

#[test]
fn test_config_set_and_show() {
    let fx = Fixture::new();
    let set = fx.json(&["config", "set", "timezone", "Europe/Berlin"]);
    assert_eq!(set["status"], "success");

    let shown = fx.json(&["config", "show"]);
    assert_eq!(shown["exists"], true);
    assert_eq!(shown["config"]["timezone"], "Europe/Berlin");

    let text = fs::read_to_string(&fx.config).unwrap();
    assert!(text.contains("timezone = \"Europe/Berlin\""));
}

#[test]
fn test_config_init_keeps_existing_file() {
    let fx = Fixture::new();
    assert_eq!(fx.json(&["config", "init"])["status"], "created");
    assert_eq!(fx.json(&["config", "init"])["status"], "exists");
}
