use std::process::Command;
use tempfile::TempDir;

fn threadmap(dir: &TempDir) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_threadmap"));
    command.current_dir(dir.path()).env_remove("RUST_LOG");
    command
}

fn write_corpus(dir: &TempDir, name: &str, body: &str) {
    std::fs::write(dir.path().join(name), body).unwrap();
}

const CORPUS: &str = r#"{
  "twitter": [
    {"id": "t1", "platform": "twitter", "content": "Trench run tonight", "topics": [1]},
    {"id": "t2", "platform": "twitter", "content": "Trench run practice", "topics": [1]}
  ],
  "reddit": [
    {"id": "r1", "platform": "reddit", "content": "Moisture farm yields", "topics": [4]},
    {"id": "r2", "platform": "reddit", "content": "Moisture farm repairs", "topics": [4]}
  ]
}"#;

#[test]
fn test_init_command() {
    let temp_dir = TempDir::new().unwrap();

    let output = threadmap(&temp_dir)
        .arg("init")
        .output()
        .expect("Failed to run init command");
    assert!(output.status.success());

    let config_path = temp_dir.path().join(".threadmap/settings.toml");
    let content = std::fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("version = 1"));
    assert!(content.contains("[pipeline]"));
    assert!(content.contains("clusters = 5"));

    // A second init without --force refuses
    let output = threadmap(&temp_dir).arg("init").output().unwrap();
    assert!(!output.status.success());
}

#[test]
fn test_config_command_reads_workspace_settings() {
    let temp_dir = TempDir::new().unwrap();
    let config_dir = temp_dir.path().join(".threadmap");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("settings.toml"),
        "version = 2\n[pipeline]\nclusters = 9\n",
    )
    .unwrap();

    let output = threadmap(&temp_dir)
        .arg("config")
        .output()
        .expect("Failed to run config command");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("version = 2"));
    assert!(stdout.contains("clusters = 9"));
}

#[test]
fn test_run_writes_augmented_corpus() {
    let temp_dir = TempDir::new().unwrap();
    write_corpus(&temp_dir, "posts.json", CORPUS);

    let output = threadmap(&temp_dir)
        .args(["run", "posts.json", "-o", "out.json", "-k", "2", "-n", "2"])
        .output()
        .expect("Failed to run pipeline");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(temp_dir.path().join("out.json")).unwrap())
            .unwrap();
    for list in ["twitter", "reddit"] {
        for post in written[list].as_array().unwrap() {
            assert!(post["cluster"].as_u64().unwrap() < 2);
            assert_eq!(post["nearest_neighbors"].as_array().unwrap().len(), 2);
        }
    }
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("Clustered 4 posts"));
}

#[test]
fn test_run_exit_codes() {
    let temp_dir = TempDir::new().unwrap();
    write_corpus(&temp_dir, "posts.json", CORPUS);
    write_corpus(&temp_dir, "empty.json", r#"{"twitter": [], "reddit": []}"#);

    // k > N is a configuration error
    let output = threadmap(&temp_dir)
        .args(["run", "posts.json", "-o", "out.json", "-k", "9"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(!temp_dir.path().join("out.json").exists());

    // Empty corpus is an input error
    let output = threadmap(&temp_dir)
        .args(["run", "empty.json", "-o", "out.json", "-k", "1"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));

    // Missing input file is a runtime error
    let output = threadmap(&temp_dir)
        .args(["run", "absent.json", "-o", "out.json"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_env_overrides_cluster_count() {
    let temp_dir = TempDir::new().unwrap();
    write_corpus(&temp_dir, "posts.json", CORPUS);

    let output = threadmap(&temp_dir)
        .env("TM_PIPELINE__CLUSTERS", "7")
        .args(["run", "posts.json", "-o", "out.json"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_dedupe_command() {
    let temp_dir = TempDir::new().unwrap();
    write_corpus(
        &temp_dir,
        "raw.json",
        r#"{
  "twitter": [
    {"id": "t1", "platform": "twitter", "content": "same"},
    {"id": "t2", "platform": "twitter", "content": "same"},
    {"id": "t1", "platform": "twitter", "content": "other"}
  ]
}"#,
    );

    let output = threadmap(&temp_dir)
        .args(["dedupe", "raw.json", "clean.json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let written: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(temp_dir.path().join("clean.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(written["twitter"].as_array().unwrap().len(), 1);
    assert_eq!(written["twitter"][0]["id"], "t1");
}
