//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary against a throwaway data directory and
//! verify outputs. None of them reach the real provider.

use std::process::Command;

use tempfile::TempDir;

/// Run a CLI command in `dir` and return (stdout, stderr, exit code).
fn run_cli(dir: &TempDir, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_prayermute"))
        .args(args)
        .env("PRAYERMUTE_DATA_DIR", dir.path())
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn status_json(dir: &TempDir) -> serde_json::Value {
    let (stdout, _, code) = run_cli(dir, &["status"]);
    assert_eq!(code, 0, "status failed");
    serde_json::from_str(&stdout).expect("status is JSON")
}

/// Point the provider at a closed local port so fetches fail fast.
fn offline(dir: &TempDir) {
    let (_, _, code) = run_cli(dir, &["config", "set", "provider.base_url", "http://127.0.0.1:9/"]);
    assert_eq!(code, 0, "config set failed");
}

#[test]
fn test_status_on_empty_data_dir() {
    let dir = TempDir::new().unwrap();
    let status = status_json(&dir);
    assert_eq!(status["enabled"], false);
    assert_eq!(status["stale"], true);
    assert_eq!(status["fetch_failed"], false);
    assert!(status["cached"].is_null());
    assert_eq!(status["mute_state"]["state"], "normal");
}

#[test]
fn test_config_set_persists() {
    let dir = TempDir::new().unwrap();
    let (_, _, code) = run_cli(&dir, &["config", "set", "provider.timeout_secs", "30"]);
    assert_eq!(code, 0, "config set failed");

    let (stdout, _, code) = run_cli(&dir, &["config", "get", "provider.timeout_secs"]);
    assert_eq!(code, 0, "config get failed");
    assert_eq!(stdout.trim(), "30");
    assert!(dir.path().join("config.toml").exists());
}

#[test]
fn test_config_rejects_unknown_key() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(&dir, &["config", "get", "ui.dark_mode"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown key"));

    let (_, _, code) = run_cli(&dir, &["config", "set", "log.journal", "maybe"]);
    assert_eq!(code, 1);
}

#[test]
fn test_config_list() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&dir, &["config", "list"]);
    assert_eq!(code, 0, "config list failed");
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["provider"]["default_country"], "Turkey");
}

#[test]
fn test_offsets_set_and_show() {
    let dir = TempDir::new().unwrap();
    let (_, _, code) = run_cli(&dir, &["offsets", "set", "asr", "0", "0"]);
    assert_eq!(code, 0, "offsets set failed");
    let (_, _, code) = run_cli(&dir, &["offsets", "friday", "15", "60"]);
    assert_eq!(code, 0, "offsets friday failed");

    let (stdout, _, code) = run_cli(&dir, &["offsets", "show"]);
    assert_eq!(code, 0, "offsets show failed");
    let asr = stdout.lines().find(|l| l.starts_with("asr")).unwrap();
    assert!(asr.contains("(off)"));
    let friday = stdout.lines().find(|l| l.starts_with("friday")).unwrap();
    assert!(friday.contains("15") && friday.contains("60"));
}

#[test]
fn test_offsets_reject_unknown_prayer() {
    let dir = TempDir::new().unwrap();
    let (_, _, code) = run_cli(&dir, &["offsets", "set", "tahajjud", "5", "5"]);
    assert_eq!(code, 2);
}

#[test]
fn test_prefs_roundtrip() {
    let dir = TempDir::new().unwrap();
    let (_, _, code) = run_cli(&dir, &["prefs", "mute-mode", "vibrate"]);
    assert_eq!(code, 0, "prefs mute-mode failed");
    let (_, _, code) = run_cli(&dir, &["prefs", "allow-metered", "true"]);
    assert_eq!(code, 0, "prefs allow-metered failed");

    let (stdout, _, _) = run_cli(&dir, &["prefs", "show"]);
    assert!(stdout.contains("mute_mode     = vibrate"));
    assert!(stdout.contains("allow_metered = true"));
}

#[test]
fn test_device_set_and_show() {
    let dir = TempDir::new().unwrap();
    let (_, _, code) = run_cli(&dir, &["device", "set", "--mode", "vibrate", "--media", "3"]);
    assert_eq!(code, 0, "device set failed");

    let (stdout, _, code) = run_cli(&dir, &["device", "show"]);
    assert_eq!(code, 0, "device show failed");
    let snapshot: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(snapshot["ringer_mode"], "vibrate");
    assert_eq!(snapshot["media_volume"], 3);
    assert_eq!(snapshot["ring_volume"], 5);
}

#[test]
fn test_enable_without_location_is_inactive() {
    let dir = TempDir::new().unwrap();
    let (stdout, stderr, code) = run_cli(&dir, &["enable"]);
    assert_eq!(code, 0, "enable failed");
    assert!(stdout.contains("inactive"));
    assert!(stderr.contains("no location selected"));
    assert_eq!(status_json(&dir)["enabled"], true);
}

#[test]
fn test_enable_with_unreachable_provider_queues_retry() {
    let dir = TempDir::new().unwrap();
    offline(&dir);
    let (stdout, _, code) = run_cli(&dir, &["location", "select", "9541", "--city", "ISTANBUL"]);
    assert_eq!(code, 0, "location select failed");
    assert!(stdout.contains("selected ISTANBUL"));

    let (stdout, _, code) = run_cli(&dir, &["enable"]);
    assert_eq!(code, 0, "enable failed");
    assert!(stdout.contains("fetch failed, retry queued"));

    let status = status_json(&dir);
    assert_eq!(status["fetch_failed"], true);
    assert_eq!(status["retry"]["attempt_count"], 1);
    assert_eq!(status["location"]["id"], 9541);

    let (stdout, _, code) = run_cli(&dir, &["history", "--json"]);
    assert_eq!(code, 0, "history failed");
    let entries: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let kinds: Vec<&str> = entries
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|e| e["kind"].as_str())
        .collect();
    assert!(kinds.contains(&"fetch_failed"));
    assert!(kinds.contains(&"retry_scheduled"));
}

#[test]
fn test_disable_after_enable() {
    let dir = TempDir::new().unwrap();
    let _ = run_cli(&dir, &["enable"]);
    let (stdout, _, code) = run_cli(&dir, &["disable"]);
    assert_eq!(code, 0, "disable failed");
    assert!(stdout.contains("disabled"));
    assert_eq!(status_json(&dir)["enabled"], false);
}

#[test]
fn test_tick_with_nothing_due() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&dir, &["tick"]);
    assert_eq!(code, 0, "tick failed");
    assert!(stdout.is_empty());
}

#[test]
fn test_fire_empty_slot_fails() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(&dir, &["fire", "4"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("no trigger pending in slot 4"));

    let (_, _, code) = run_cli(&dir, &["fire", "13"]);
    assert_eq!(code, 1);
}

#[test]
fn test_plan_without_cached_times_fails() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(&dir, &["plan"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("no prayer times cached"));
}

#[test]
fn test_history_on_empty_journal() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&dir, &["history"]);
    assert_eq!(code, 0, "history failed");
    assert!(stdout.contains("journal is empty"));
}

#[test]
fn test_broken_config_falls_back_with_warning() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("config.toml"), "[provider\nbase_url = 1").unwrap();

    let (stdout, stderr, code) = run_cli(&dir, &["status"]);
    assert_eq!(code, 0, "status failed");
    assert!(stderr.contains("warning: Failed to load configuration"));
    assert!(stderr.contains("using default settings"));
    let status: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(status["enabled"], false);

    // Explicit config commands still refuse the broken file.
    let (_, _, code) = run_cli(&dir, &["config", "get", "provider.base_url"]);
    assert_eq!(code, 1);
}
