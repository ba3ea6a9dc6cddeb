use std::fs;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tempfile::tempdir;

fn choco(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_choco"))
        .args(args)
        .output()
        .expect("failed to launch choco")
}

fn run_script(dir: &Path, source: &str, flags: &[&str]) -> Output {
    let path = dir.join("script.choco");
    fs::write(&path, source).unwrap();
    let path = path.to_str().unwrap().to_string();
    let mut args: Vec<&str> = flags.to_vec();
    args.push(&path);
    choco(&args)
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn runs_a_script() {
    let dir = tempdir().unwrap();
    let output = run_script(dir.path(), "let n = 3\nputs \"n=#{n}\"\nputs n * 2", &[]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "n=3\n6\n");
}

#[test]
fn missing_script_argument() {
    let output = choco(&[]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("<SCRIPT>"), "{}", stderr(&output));
}

#[test]
fn unreadable_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.choco");
    let path = path.to_str().unwrap();
    let output = choco(&[path]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        stderr(&output).trim_end(),
        format!("Error: Could not open file {}", path)
    );
    assert_eq!(stdout(&output), "");
}

#[test]
fn unterminated_string_exits_with_error() {
    let dir = tempdir().unwrap();
    let output = run_script(dir.path(), "puts 1\nputs \"open", &[]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout(&output), "");
    assert!(stderr(&output).contains("[line 2] Error: Unterminated string."));
}

#[test]
fn malformed_header_reports_and_exits_cleanly() {
    let dir = tempdir().unwrap();
    let output = run_script(
        dir.path(),
        "puts \"before\"\nwhile true puts 1\nputs \"after\"",
        &[],
    );
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "before\n");
    assert!(stderr(&output).contains("[line 2] Error: Expected '{' after while condition"));
}

#[test]
fn tokens_flag_lists_tokens_without_running() {
    let dir = tempdir().unwrap();
    let output = run_script(dir.path(), "puts 1", &["--tokens"]);
    assert_eq!(output.status.code(), Some(0));
    let printed = stdout(&output);
    assert_eq!(printed.lines().next(), Some("   1 Keyword     puts"));
    assert_eq!(printed.lines().count(), 3);
}

#[test]
fn ast_flag_prints_tree_without_running() {
    let dir = tempdir().unwrap();
    let output = run_script(dir.path(), "puts 1 + 2", &["--ast"]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "(puts (+ 1 2))\n");
}

#[test]
fn tokens_flag_tolerates_closed_stdout() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("long.choco");
    fs::write(&path, "puts 1\n".repeat(50_000)).unwrap();
    let mut child = Command::new(env!("CARGO_BIN_EXE_choco"))
        .arg("--tokens")
        .arg(&path)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to launch choco");
    drop(child.stdout.take());
    let output = child.wait_with_output().unwrap();
    assert_eq!(output.status.code(), Some(0));
    assert!(!stderr(&output).contains("panicked"), "{}", stderr(&output));
}
