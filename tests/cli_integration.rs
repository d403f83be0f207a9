//! Integration tests for the studentsim CLI
//!
//! These drive the compiled binary against fixture datasets in a temp
//! directory. Only commands that never call a generation backend are covered:
//! - traits show
//! - history show / current / lookback
//! - doctor
//! - config path

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

const API_KEY_ENV: &str = "STUDENTSIM_TEST_API_KEY";

/// Run studentsim with its config directory pointed at `root`
fn run_studentsim(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_studentsim"))
        .current_dir(root)
        .env("STUDENTSIM_DIR", root)
        .env("XDG_DATA_HOME", root.join("data"))
        .env("NO_COLOR", "1")
        .env_remove("STUDENTSIM_CONFIG")
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("Failed to execute studentsim")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn survey_csv() -> String {
    let mut header = String::from("uid,type");
    for n in 1..=44 {
        header.push_str(&format!(",I see myself as someone who... - {}. Item {}", n, n));
    }

    let neutral = vec!["Neither agree nor disagree"; 44].join(",");
    let strong = vec!["Agree strongly"; 44].join(",");
    format!("{}\nu01,pre,{}\nu01,post,{}\n", header, neutral, strong)
}

fn history_line(week: u32, level: i64) -> String {
    format!(
        r#"{{"week":{w},"emotion":{{"stamina":{l},"knowledge":{l},"stress":{l},"happy":{l},"sleep":{l},"social":{l}}},"outcome":"updated","narrative":"week {w}","reasoning":"","assessment":{{"week":{w},"topic":"no exam this week","score":0.0,"max_score":0.0,"correct_answers":0,"total_questions":0}}}}"#,
        w = week,
        l = level
    )
}

/// Write datasets, persona folders and a config file under `root`
fn create_fixture(root: &Path) {
    let dataset = root.join("dataset");
    fs::create_dir_all(&dataset).unwrap();
    fs::write(dataset.join("BigFive.csv"), survey_csv()).unwrap();
    fs::write(dataset.join("class.csv"), "u01,cs65\n").unwrap();
    fs::write(
        dataset.join("class_info.json"),
        r#"{"cs65": {"location": "Sudikoff", "describe": "Smartphone Programming", "periods": [{"day": 1, "start": "10:00", "end": "11:05"}]}}"#,
    )
    .unwrap();
    fs::write(
        dataset.join("lab_assignment.csv"),
        "week,topic,question,answer,point\n1,Intents,What starts an Activity?,B,2\n",
    )
    .unwrap();
    fs::write(dataset.join("deadlines.csv"), "uid,2013-04-01\nu01,1\n").unwrap();

    fs::create_dir_all(root.join("students").join("u01")).unwrap();
    fs::create_dir_all(root.join("students").join("u07")).unwrap();

    let output = root.join("output");
    fs::create_dir_all(&output).unwrap();
    let history = [history_line(1, 40), history_line(2, 50), history_line(3, 60)].join("\n");
    fs::write(output.join("u01_history.jsonl"), format!("{}\n", history)).unwrap();

    let config = format!(
        r#"log_level: debug
paths:
  big_five: {root}/dataset/BigFive.csv
  class_csv: {root}/dataset/class.csv
  class_info: {root}/dataset/class_info.json
  exams: {root}/dataset/lab_assignment.csv
  deadlines: {root}/dataset/deadlines.csv
  students: {root}/students
  output: {root}/output
generator:
  api_key_env: {key}
"#,
        root = root.display(),
        key = API_KEY_ENV
    );
    fs::write(root.join("studentsim.yaml"), config).unwrap();
}

#[test]
fn test_traits_show_json() {
    let temp = TempDir::new().unwrap();
    create_fixture(temp.path());

    let output = run_studentsim(temp.path(), &["traits", "show", "--persona", "u01", "-o", "json"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let view: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(view["uid"], "u01");
    assert_eq!(view["administration"], "pre");
    assert_eq!(view["profile"]["openness"], 60.0);
    assert_eq!(view["profile"]["neuroticism"], 60.0);
}

#[test]
fn test_traits_show_other_administration() {
    let temp = TempDir::new().unwrap();
    create_fixture(temp.path());

    let output = run_studentsim(
        temp.path(),
        &["traits", "show", "-p", "u01", "--administration", "post", "-o", "json"],
    );
    assert!(output.status.success());

    let view: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    // Strong agreement on every item: forward items 5, reverse items 1
    let extraversion = view["profile"]["extraversion"].as_f64().unwrap();
    assert!((extraversion - 70.0).abs() < 1e-9);
}

#[test]
fn test_traits_show_missing_persona_fails() {
    let temp = TempDir::new().unwrap();
    create_fixture(temp.path());

    let output = run_studentsim(temp.path(), &["traits", "show", "-p", "u07", "-o", "json"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("no trait profile"));
}

#[test]
fn test_history_show_and_last() {
    let temp = TempDir::new().unwrap();
    create_fixture(temp.path());

    let output = run_studentsim(temp.path(), &["history", "show", "-p", "u01", "-o", "json"]);
    assert!(output.status.success());
    let entries: Vec<serde_json::Value> = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(entries.len(), 3);

    let output = run_studentsim(temp.path(), &["history", "show", "-p", "u01", "-n", "1", "-o", "json"]);
    let entries: Vec<serde_json::Value> = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["week"], 3);
}

#[test]
fn test_history_current() {
    let temp = TempDir::new().unwrap();
    create_fixture(temp.path());

    let output = run_studentsim(temp.path(), &["history", "current", "-p", "u01", "-o", "json"]);
    let state: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(state["stamina"], 60);

    // No history yet: default state
    let output = run_studentsim(temp.path(), &["history", "current", "-p", "u07", "-o", "json"]);
    let state: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(state["stamina"], 100);
    assert_eq!(state["stress"], 50);
}

#[test]
fn test_history_lookback_is_strict() {
    let temp = TempDir::new().unwrap();
    create_fixture(temp.path());

    let output = run_studentsim(
        temp.path(),
        &["history", "lookback", "-p", "u01", "--week", "3", "--limit", "5", "-o", "json"],
    );
    let entries: Vec<serde_json::Value> = serde_json::from_str(&stdout(&output)).unwrap();
    let weeks: Vec<i64> = entries.iter().map(|e| e["week"].as_i64().unwrap()).collect();
    assert_eq!(weeks, vec![1, 2]);
}

#[test]
fn test_doctor_all_checks_pass() {
    let temp = TempDir::new().unwrap();
    create_fixture(temp.path());

    let output = Command::new(env!("CARGO_BIN_EXE_studentsim"))
        .current_dir(temp.path())
        .env("STUDENTSIM_DIR", temp.path())
        .env("XDG_DATA_HOME", temp.path().join("data"))
        .env("NO_COLOR", "1")
        .env(API_KEY_ENV, "sk-test")
        .arg("doctor")
        .output()
        .unwrap();

    let text = stdout(&output);
    assert!(output.status.success());
    assert!(text.contains("2 persona(s)"), "{}", text);
    assert!(text.contains("1 histories"), "{}", text);
    assert!(text.contains("All checks passed!"), "{}", text);
}

#[test]
fn test_doctor_reports_missing_files() {
    let temp = TempDir::new().unwrap();
    create_fixture(temp.path());
    fs::remove_file(temp.path().join("dataset").join("deadlines.csv")).unwrap();

    let output = run_studentsim(temp.path(), &["doctor"]);
    let text = stdout(&output);
    assert!(output.status.success());
    assert!(text.contains("deadlines missing"), "{}", text);
    assert!(text.contains("issue(s) found"), "{}", text);
}

#[test]
fn test_config_path_uses_app_dir() {
    let temp = TempDir::new().unwrap();

    let output = run_studentsim(temp.path(), &["config", "path"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains(&temp.path().join("studentsim.yaml").display().to_string()));
}
