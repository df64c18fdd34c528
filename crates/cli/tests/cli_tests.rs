#![allow(deprecated)] // cargo_bin is deprecated but still functional

use assert_cmd::Command;
use predicates::str::contains;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn dextrack(db: &Path) -> Command {
    let mut cmd = Command::cargo_bin("dextrack").unwrap();
    cmd.env_remove("DEXTRACK_CONFIG")
        .env_remove("DEXTRACK_PASSWORD")
        .env_remove("DATABASE_URL")
        .env("RUST_LOG", "warn")
        .arg("--database-url")
        .arg(db);
    cmd
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn init_creates_sqlite_database() {
    let temp = TempDir::new().unwrap();
    let db = temp.path().join("nested").join("dex.db");

    dextrack(&db)
        .arg("init")
        .assert()
        .success()
        .stdout(contains("sqlite schema ready"));

    assert!(db.exists());
}

#[test]
fn register_twice_reports_duplicate() {
    let temp = TempDir::new().unwrap();
    let db = temp.path().join("dex.db");

    dextrack(&db)
        .args(["register", "ash", "--password", "pikachu123"])
        .assert()
        .success()
        .stdout(contains("user created successfully"));

    dextrack(&db)
        .args(["register", "ash", "--password", "other"])
        .assert()
        .failure()
        .stderr(contains("already registered"));
}

#[test]
fn login_rejects_wrong_password() {
    let temp = TempDir::new().unwrap();
    let db = temp.path().join("dex.db");

    dextrack(&db)
        .args(["register", "misty", "--password", "starmie"])
        .assert()
        .success();

    let output = dextrack(&db)
        .args(["login", "misty"])
        .env("DEXTRACK_PASSWORD", "starmie")
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["username"], "misty");

    dextrack(&db)
        .args(["login", "misty", "--password", "psyduck"])
        .assert()
        .failure()
        .stderr(contains("invalid username or password"));
}

#[test]
fn catch_and_release_round_trip() {
    let temp = TempDir::new().unwrap();
    let db = temp.path().join("dex.db");
    let creds = ["brock", "--password", "onix"];

    dextrack(&db).arg("register").args(creds).assert().success();

    let output = dextrack(&db)
        .arg("catch")
        .args(creds)
        .args(["--generation", "1", "25"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["pokemon_ids"], serde_json::json!([25]));

    dextrack(&db)
        .arg("catch")
        .args(creds)
        .args(["--generation", "1", "25"])
        .assert()
        .failure()
        .stderr(contains("already caught"));

    let output = dextrack(&db)
        .arg("show")
        .args(creds)
        .args(["--generation", "2"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["pokemon_ids"], serde_json::json!([]));

    let output = dextrack(&db)
        .arg("release")
        .args(creds)
        .args(["--generation", "1", "25"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["pokemon_ids"], serde_json::json!([]));
}

#[test]
fn cache_put_then_list() {
    let temp = TempDir::new().unwrap();
    let db = temp.path().join("dex.db");
    let species = temp.path().join("species.json");
    fs::write(
        &species,
        r#"[{"id": 1, "name": "bulbasaur", "img": "https://img/1.png"},
            {"id": 4, "name": "charmander", "img": "https://img/4.png"}]"#,
    )
    .unwrap();

    dextrack(&db)
        .args(["cache", "put", "1", "--file"])
        .arg(&species)
        .assert()
        .success()
        .stdout(contains("cached 2 species for generation 1"));

    let output = dextrack(&db)
        .args(["cache", "list", "1"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let entries = stdout_json(&output);
    let names: Vec<&str> = entries
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["bulbasaur", "charmander"]);

    let output = dextrack(&db)
        .args(["cache", "list", "2", "--all"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_json(&output), serde_json::json!([]));
}

#[test]
fn cache_put_reads_stdin() {
    let temp = TempDir::new().unwrap();
    let db = temp.path().join("dex.db");

    dextrack(&db)
        .args(["cache", "put", "3"])
        .write_stdin(r#"[{"id": 252, "name": "treecko", "img": "t.png"}]"#)
        .assert()
        .success();

    dextrack(&db)
        .args(["cache", "put", "3"])
        .write_stdin("not json")
        .assert()
        .failure()
        .stderr(contains("Expected a JSON array"));
}
