use std::process::Command;

const SAMPLE_REPORT: &str = r#"[
    {
        "fileName": "src/app.py",
        "issues": [
            {"startLine": 3, "endLine": 3, "message": "Remove this unused import"},
            {"startLine": 10, "endLine": 12, "message": "Refactor this function"}
        ]
    },
    {"fileName": "src/util.py", "issues": []}
]"#;

#[test]
fn report_lists_files_and_findings() {
    let dir = tempfile::tempdir().unwrap();
    let report_path = dir.path().join("scan-report.json");
    std::fs::write(&report_path, SAMPLE_REPORT).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_mender"))
        .arg("report")
        .arg(&report_path)
        .output()
        .unwrap();

    assert!(
        output.status.success(),
        "mender report failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("src/app.py (2 findings)"));
    assert!(stdout.contains("line 3-3: Remove this unused import"));
    assert!(stdout.contains("src/util.py (0 findings)"));
}

#[test]
fn report_json_output_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let report_path = dir.path().join("scan-report.json");
    std::fs::write(&report_path, SAMPLE_REPORT).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_mender"))
        .args(["report", "--format", "json"])
        .arg(&report_path)
        .output()
        .unwrap();

    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let entries = parsed.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["fileName"], "src/app.py");
    assert_eq!(entries[0]["issues"][0]["startLine"], 3);
}

#[test]
fn report_rejects_malformed_input() {
    let dir = tempfile::tempdir().unwrap();
    let report_path = dir.path().join("scan-report.json");
    std::fs::write(&report_path, r#"[{"issues": []}]"#).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_mender"))
        .arg("report")
        .arg(&report_path)
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("fileName"));
}

#[test]
fn report_missing_file_names_the_path() {
    let output = Command::new(env!("CARGO_BIN_EXE_mender"))
        .args(["report", "does-not-exist.json"])
        .output()
        .unwrap();

    assert!(!output.status.success());
}
