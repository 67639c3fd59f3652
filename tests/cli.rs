use std::path::Path;
use std::process::{Command, Output};

use git2::{Repository, Signature, Time};

fn repopulse(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_repopulse"))
        .args(args)
        .current_dir(dir)
        .env("GITHUB_TOKEN", "test-token")
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn commit_file(repo: &Repository, author: &str, seconds: i64, file: &str, content: &str) {
    let root = repo.workdir().unwrap();
    std::fs::write(root.join(file), content).unwrap();

    let mut index = repo.index().unwrap();
    index.add_path(Path::new(file)).unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();

    let sig = Signature::new(author, &format!("{author}@example.com"), &Time::new(seconds, 0))
        .unwrap();
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, &format!("{author} edits {file}"), &tree, &parents)
        .unwrap();
}

/// Three commits in early 2020: alice twice within two days, bob once.
fn fixture() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let repo = Repository::init(dir.path()).unwrap();
    commit_file(&repo, "alice", 1_577_880_000, "a.txt", "one\ntwo\n");
    commit_file(&repo, "bob", 1_577_966_400, "b.txt", "x\n");
    commit_file(&repo, "alice", 1_578_052_800, "a.txt", "one\nthree\n");
    dir
}

#[test]
fn local_json_reports_activity_and_freelancers() {
    let dir = fixture();
    let output = repopulse(dir.path(), &["local", "--format", "json"]);
    assert!(
        output.status.success(),
        "repopulse local failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["commits_analyzed"], 3);

    let alice = &json["contributors"]["alice"];
    assert_eq!(alice["commit_count"], 2);
    assert_eq!(alice["lines_added"], 3);
    assert_eq!(alice["lines_removed"], 1);
    assert_eq!(json["contributors"]["bob"]["commit_count"], 1);

    let freelancers = &json["freelancers"];
    assert_eq!(freelancers["total_contributors"], 2);
    assert_eq!(freelancers["freelancers_count"], 2);
    assert_eq!(freelancers["freelancers"]["alice"]["activity_span_days"], 2);
}

#[test]
fn local_thresholds_narrow_detection() {
    let dir = fixture();
    let output = repopulse(
        dir.path(),
        &[
            "local",
            "--analysis",
            "freelancers",
            "--max-commit-count",
            "1",
            "--format",
            "json",
        ],
    );
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(json.get("contributors").is_none());
    assert_eq!(json["freelancers"]["freelancers_count"], 1);
    assert!(json["freelancers"]["freelancers"]["bob"].is_object());
}

#[test]
fn local_outside_repository_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = repopulse(dir.path(), &["local"]);
    assert!(!output.status.success());
}

#[test]
fn get_unknown_route_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let output = repopulse(dir.path(), &["get", "/github/repos/octocat/hello/issues"]);
    assert!(!output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json, serde_json::json!({ "detail": "Not found" }));
}

#[test]
fn get_malformed_threshold_is_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let output = repopulse(
        dir.path(),
        &["get", "/github/repos/octocat/hello/freelancers?min_inactive_days=-3"],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("400"));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(json["detail"]
        .as_str()
        .unwrap()
        .contains("min_inactive_days"));
}
