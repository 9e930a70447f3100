use std::path::Path;

use assert_cmd::Command;
use tempfile::TempDir;

/// `shelf` pointed at an isolated cache and an unreachable remote.
fn shelf(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("shelf").unwrap();
    cmd.env("SHELF_ENV", "local")
        .env("SHELF_CONFIG_DIR", home)
        .env("SHELF_CATALOG__CACHE_DIR", home.join("cache"))
        .env("SHELF_REMOTE__BASE_URL", "http://127.0.0.1:9/books")
        .env("RUST_LOG", "warn");
    cmd
}

fn stdout(cmd: &mut Command) -> String {
    let output = cmd.assert().success().get_output().stdout.clone();
    String::from_utf8(output).unwrap()
}

#[test]
fn categories_lists_ten_groups() {
    let home = TempDir::new().unwrap();
    let out = stdout(shelf(home.path()).arg("categories"));

    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 10);
    assert!(lines[6].starts_with("600\t"));
}

#[test]
fn books_falls_back_to_defaults_offline() {
    let home = TempDir::new().unwrap();
    let out = stdout(shelf(home.path()).args(["books", "--ddc", "600"]));

    assert_eq!(out.lines().count(), 5);
    assert!(out.contains("React Book"));
    assert!(!out.contains("Bitcoin Book"));
}

#[test]
fn featured_and_search_flags() {
    let home = TempDir::new().unwrap();
    let featured = stdout(shelf(home.path()).args(["books", "--featured"]));
    assert_eq!(featured.lines().count(), 5);

    let found = stdout(shelf(home.path()).args(["books", "--search", "lyra"]));
    assert_eq!(found.lines().count(), 1);
    assert!(found.contains("Lyra and Silent Frequency"));
}

#[test]
fn requests_persist_between_runs() {
    let home = TempDir::new().unwrap();
    shelf(home.path())
        .args(["request", "--title", "X", "--author", "Y", "--requester", "Z"])
        .assert()
        .success();

    let out = stdout(shelf(home.path()).arg("export"));
    let document: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(document["requests"].as_array().unwrap().len(), 1);
    assert_eq!(document["requests"][0]["requester"], "Z");
    assert_eq!(document["books"].as_array().unwrap().len(), 8);
    assert!(document["exportDate"].is_string());
}

#[test]
fn blank_request_fields_are_refused() {
    let home = TempDir::new().unwrap();
    let output = shelf(home.path())
        .args(["request", "--title", "X", "--author", " ", "--requester", "Z"])
        .assert()
        .failure()
        .get_output()
        .stderr
        .clone();
    assert!(String::from_utf8_lossy(&output).contains("author"));
}

#[test]
fn export_to_file() {
    let home = TempDir::new().unwrap();
    let target = home.path().join("backup.json");
    shelf(home.path())
        .arg("export")
        .arg("--output")
        .arg(&target)
        .assert()
        .success();

    let document: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&target).unwrap()).unwrap();
    assert_eq!(document["books"].as_array().unwrap().len(), 8);
}

#[test]
fn reset_keeps_requests() {
    let home = TempDir::new().unwrap();
    shelf(home.path())
        .args(["request", "--title", "Dune", "--author", "Herbert", "--requester", "Mya"])
        .assert()
        .success();

    let out = stdout(shelf(home.path()).arg("reset"));
    assert!(out.contains("8 books restored"));

    let out = stdout(shelf(home.path()).arg("export"));
    let document: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(document["requests"].as_array().unwrap().len(), 1);
}

#[test]
fn sync_against_unreachable_remote_fails() {
    let home = TempDir::new().unwrap();
    let output = shelf(home.path())
        .arg("sync")
        .assert()
        .failure()
        .get_output()
        .stderr
        .clone();
    assert!(String::from_utf8_lossy(&output).contains("unreachable"));
}
