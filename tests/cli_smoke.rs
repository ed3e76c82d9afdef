use std::fs;
use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

fn jbreakdown_bin() -> &'static str {
    env!("CARGO_BIN_EXE_jbreakdown")
}

fn write_file(path: &Path, contents: &str) {
    fs::write(path, contents).expect("failed to write test file");
}

#[test]
fn cli_prints_banner_and_report_for_single_file() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let file = temp_dir.path().join("Main.java");
    write_file(&file, "class Main {\n}\n");

    let output = Command::new(jbreakdown_bin())
        .arg("--sniffer")
        .arg("builtin")
        .arg(&file)
        .output()
        .expect("failed to execute jbreakdown");

    assert!(
        output.status.success(),
        "expected success, got status {:?}, stderr: {}",
        output.status.code(),
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.starts_with(&format!("jbreakdown v{}", env!("CARGO_PKG_VERSION"))),
        "stdout missing banner: {stdout}"
    );
    assert!(
        stdout.contains(&format!("\n{}\n\n", file.display())),
        "stdout missing target header: {stdout}"
    );
    assert!(
        stdout.contains("2 lines of code (100.00%)"),
        "stdout missing code row: {stdout}"
    );
    assert!(
        stdout.contains("2 total lines"),
        "stdout missing total: {stdout}"
    );
}

#[test]
fn cli_invalid_path_returns_error_with_usage() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let missing_path = temp_dir.path().join("missing");
    let output = Command::new(jbreakdown_bin())
        .arg(&missing_path)
        .output()
        .expect("failed to execute jbreakdown");

    assert!(
        !output.status.success(),
        "expected failure for missing path, status: {:?}",
        output.status.code()
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("File does not exist"),
        "stderr did not mention missing path: {stderr}"
    );
    assert!(
        stderr.contains("Usage"),
        "stderr did not include usage text: {stderr}"
    );
}

#[test]
fn cli_named_file_with_wrong_extension_is_fatal() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let file = temp_dir.path().join("Main.kt");
    write_file(&file, "fun main() {}\n");

    let output = Command::new(jbreakdown_bin())
        .arg("--sniffer")
        .arg("builtin")
        .arg(&file)
        .output()
        .expect("failed to execute jbreakdown");

    assert!(!output.status.success(), "expected failure for .kt file");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("does not have the source code extension (.java)"),
        "stderr did not explain rejection: {stderr}"
    );
}

#[test]
fn cli_named_binary_java_file_is_fatal() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let file = temp_dir.path().join("Packed.java");
    fs::write(&file, b"PK\x03\x04\x14\x00\x00\x00").expect("failed to write test file");

    let output = Command::new(jbreakdown_bin())
        .arg("--sniffer")
        .arg("builtin")
        .arg(&file)
        .output()
        .expect("failed to execute jbreakdown");

    assert!(!output.status.success(), "expected failure for binary file");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("application/zip"),
        "stderr did not name the content type: {stderr}"
    );
}

#[test]
fn cli_custom_extension_accepts_other_sources() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let file = temp_dir.path().join("main.c");
    write_file(&file, "/* entry */\nint main(void) { return 0; }\n");

    let output = Command::new(jbreakdown_bin())
        .arg("--sniffer")
        .arg("builtin")
        .arg("--extension")
        .arg("c")
        .arg(&file)
        .output()
        .expect("failed to execute jbreakdown");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("1 comments (50.00%)"), "stdout: {stdout}");
}
