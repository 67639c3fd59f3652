use std::process::Command;

#[test]
fn init_creates_valid_toml() {
    let dir = tempfile::tempdir().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_repopulse"))
        .arg("init")
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(
        output.status.success(),
        "repopulse init failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let config_path = dir.path().join(".repopulse.toml");
    assert!(config_path.exists(), ".repopulse.toml should exist");

    let content = std::fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("[github]"));
    assert!(content.contains("[fetch]"));
    assert!(content.contains("[freelance]"));

    // The template is fully commented out, so it parses to the defaults.
    let config: repopulse_core::PulseConfig = toml::from_str(&content).unwrap();
    assert_eq!(config.freelance.min_inactive_days, 30);
    assert_eq!(config.fetch.detail_concurrency, 8);
}

#[test]
fn init_refuses_if_exists() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".repopulse.toml"), "# existing").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_repopulse"))
        .arg("init")
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(!output.status.success());
    let content = std::fs::read_to_string(dir.path().join(".repopulse.toml")).unwrap();
    assert_eq!(content, "# existing");
}
