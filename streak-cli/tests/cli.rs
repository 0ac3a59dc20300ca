use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "streak-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_list_models_writes_output() {
    let exe = env!("CARGO_BIN_EXE_streak-cli");
    let output_path = temp_path("list");
    let status = Command::new(exe)
        .args(["--list-models", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    assert!(content.contains("Available models"));
    assert!(content.contains("truly_streaky"));
}

#[test]
fn cli_simulates_synthetic_league_to_json() {
    let exe = env!("CARGO_BIN_EXE_streak-cli");
    let output_path = temp_path("simulate");
    let status = Command::new(exe)
        .args([
            "--mode",
            "simulate",
            "--models",
            "normal,last_five",
            "--seeds",
            "1..3",
            "--players",
            "8",
            "--games",
            "12",
            "--report",
            "json",
            "--output",
        ])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    let value: serde_json::Value = serde_json::from_str(&content).expect("json report");
    assert_eq!(value["runs"].as_array().map(Vec::len), Some(4));
    assert_eq!(value["models"][0]["model"], "last_five");
    assert_eq!(value["models"][0]["seeds"], 2);
}

#[test]
fn cli_analyzes_records_as_markdown() {
    let exe = env!("CARGO_BIN_EXE_streak-cli");
    let input_path = temp_path("records.json");
    std::fs::write(
        &input_path,
        r#"[
            {"player_id": 7, "game_id": "A", "player_name": "Rowan", "outcomes": ["W", "W", "L", "W", "L", "L", "W", "W", "W"]},
            {"player_id": 7, "game_id": "B", "outcomes": ["L", "W", "W", "L"]}
        ]"#,
    )
    .expect("write input");
    let output_path = temp_path("analysis.md");
    let status = Command::new(exe)
        .args(["--mode", "analyze", "--report", "markdown", "--input"])
        .arg(&input_path)
        .arg("--output")
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    assert!(content.contains("# Streak Analysis"));
    assert!(content.contains("Rowan (2 games)"));
}

#[test]
fn cli_analyze_without_input_fails() {
    let exe = env!("CARGO_BIN_EXE_streak-cli");
    let output = Command::new(exe)
        .args(["--mode", "analyze", "--report", "json"])
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--input is required"));
}
