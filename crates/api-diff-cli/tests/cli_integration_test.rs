//! CLI 集成测试
//!
//! 测试命令行接口的各种功能和参数组合

use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

/// 获取编译后的二进制文件路径
fn get_binary_path() -> String {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // 移除测试可执行文件名
    if path.ends_with("deps") {
        path.pop(); // 移除 deps 目录
    }
    path.push("api-diff");
    path.to_string_lossy().to_string()
}

/// 创建一对测试用的快照目录
fn create_snapshots(baseline_source: &str, candidate_source: &str) -> (TempDir, TempDir) {
    let baseline = TempDir::new().expect("Failed to create temp directory");
    let candidate = TempDir::new().expect("Failed to create temp directory");
    std::fs::write(baseline.path().join("api.h"), baseline_source)
        .expect("Failed to write baseline header");
    std::fs::write(candidate.path().join("api.h"), candidate_source)
        .expect("Failed to write candidate header");
    (baseline, candidate)
}

fn run_diff(args: &[&str]) -> std::process::Output {
    Command::new(get_binary_path())
        .args(args)
        .output()
        .expect("Failed to execute command")
}

fn run_on_snapshots(baseline: &Path, candidate: &Path, extra: &[&str]) -> std::process::Output {
    let mut args = vec![
        baseline.to_str().unwrap().to_string(),
        candidate.to_str().unwrap().to_string(),
    ];
    args.extend(extra.iter().map(|s| s.to_string()));
    Command::new(get_binary_path())
        .args(&args)
        .output()
        .expect("Failed to execute command")
}

#[test]
fn test_help_output() {
    let output = run_diff(&["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("api-diff"));
    assert!(stdout.contains("BASELINE"));
    assert!(stdout.contains("CANDIDATE"));
    assert!(stdout.contains("--fail-on-changes"));
    assert!(stdout.contains("--pretty"));
}

#[test]
fn test_version_output() {
    let output = run_diff(&["--version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("0.1.0"));
}

#[test]
fn test_missing_arguments_fail() {
    let output = run_diff(&[]);
    assert!(!output.status.success());

    let output = run_diff(&["only-one-path"]);
    assert!(!output.status.success());
}

#[test]
fn test_nonexistent_paths_exit_with_error() {
    let output = run_diff(&["/no/such/baseline", "/no/such/candidate"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_identical_snapshots_report_no_changes() {
    let source = "struct Point { int x; int y; };\nvoid move_point(struct Point *p);\n";
    let (baseline, candidate) = create_snapshots(source, source);

    let output = run_on_snapshots(baseline.path(), candidate.path(), &[]);
    assert!(output.status.success());

    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is a JSON report");
    assert_eq!(report["metadata"]["changeCount"], 0);
    assert_eq!(report["changes"], serde_json::json!([]));
}

#[test]
fn test_changed_snapshot_is_reported_on_stdout() {
    let (baseline, candidate) = create_snapshots(
        "int get_size(void);\n",
        "long get_size(void);\n",
    );

    let output = run_on_snapshots(baseline.path(), candidate.path(), &[]);
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["metadata"]["changeCount"], 1);
    assert_eq!(report["changes"][0]["tag"], "modified");
    assert_eq!(report["changes"][0]["qualifiedName"], "get_size");
}

#[test]
fn test_fail_on_changes_exit_code() {
    let (baseline, candidate) = create_snapshots("int a;\n", "int a;\nint b;\n");

    let output = run_on_snapshots(baseline.path(), candidate.path(), &["--fail-on-changes"]);
    assert_eq!(output.status.code(), Some(1));

    // 无差异时即使指定 --fail-on-changes 也正常退出
    let (baseline, candidate) = create_snapshots("int a;\n", "int a;\n");
    let output = run_on_snapshots(baseline.path(), candidate.path(), &["--fail-on-changes"]);
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn test_output_file_and_pretty() {
    let (baseline, candidate) = create_snapshots("int a;\n", "long a;\n");
    let out_dir = TempDir::new().unwrap();
    let report_path = out_dir.path().join("nested").join("report.json");

    let output = run_on_snapshots(
        baseline.path(),
        candidate.path(),
        &["--pretty", "--output", report_path.to_str().unwrap()],
    );
    assert!(output.status.success());
    // 报告写入文件时标准输出不再携带 JSON
    assert!(output.stdout.is_empty());

    let content = std::fs::read_to_string(&report_path).expect("report file exists");
    assert!(content.contains('\n'), "pretty output is indented");
    let report: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(report["metadata"]["changeCount"], 1);
}

#[test]
fn test_single_file_snapshots() {
    let dir = TempDir::new().unwrap();
    let baseline = dir.path().join("old.h");
    let candidate = dir.path().join("new.h");
    std::fs::write(&baseline, "void f(int a);\n").unwrap();
    std::fs::write(&candidate, "void f(int a, int b);\n").unwrap();

    let output = run_diff(&[baseline.to_str().unwrap(), candidate.to_str().unwrap()]);
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["changes"][0]["tag"], "modified");
    assert_eq!(
        report["changes"][0]["children"][0]["qualifiedName"],
        "f::b"
    );
    assert_eq!(report["changes"][0]["children"][0]["tag"], "added");
}

#[test]
fn test_threads_option_is_accepted() {
    let (baseline, candidate) = create_snapshots("int a;\n", "int a;\n");
    let output = run_on_snapshots(baseline.path(), candidate.path(), &["--threads", "1"]);
    assert!(output.status.success());
}
