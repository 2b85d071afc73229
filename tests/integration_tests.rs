//! Integration Tests

use std::fs;
use std::path::Path;

use assert_cli::Assert;
use tempdir::TempDir;

const SQYSH: &str = env!("CARGO_BIN_EXE_sqysh");

/// Runs sqysh inside `dir`, logging to a file in `dir` instead of `~/.sqysh_log`.
fn sqysh(dir: &Path) -> Assert {
    let log_flag = format!("--log={}", dir.join("sqysh.log").display());
    Assert::command(&[SQYSH, log_flag.as_str()]).current_dir(dir)
}

fn temp_dir() -> TempDir {
    TempDir::new("sqysh-cli").expect("unable to generate temp dir")
}

#[test]
fn command_string_redirects_output() {
    let dir = temp_dir();
    sqysh(dir.path())
        .with_args(&["-c", "echo hi > out.txt"])
        .succeeds()
        .and()
        .stdout()
        .is("")
        .unwrap();
    assert_eq!(fs::read_to_string(dir.path().join("out.txt")).unwrap(), "hi\n");
}

#[test]
fn command_string_runs_one_command() {
    let dir = temp_dir();
    sqysh(dir.path())
        .with_args(&["-c", "echo hi there"])
        .succeeds()
        .and()
        .stdout()
        .is("hi there\n")
        .unwrap();
}

#[test]
fn command_flag_without_command_fails() {
    let dir = temp_dir();
    sqysh(dir.path())
        .with_args(&["-c"])
        .fails_with(1)
        .and()
        .stderr()
        .contains("sqysh: -c: option requires an argument")
        .unwrap();
}

#[test]
fn unusable_log_file_is_reported() {
    let dir = temp_dir();
    let log_flag = format!("--log={}", dir.path().join("no/such/dir/sqysh.log").display());
    Assert::command(&[SQYSH, log_flag.as_str(), "-c", "echo still runs"])
        .current_dir(dir.path())
        .succeeds()
        .and()
        .stdout()
        .is("still runs\n")
        .and()
        .stderr()
        .contains("sqysh: unable to initialize logger, continuing without a log file")
        .unwrap();
}

#[test]
fn unwritable_output_is_reported() {
    let dir = temp_dir();
    sqysh(dir.path())
        .stdin("echo x > no/such/dir/f\necho after\n")
        .succeeds()
        .and()
        .stdout()
        .is("after\n")
        .and()
        .stderr()
        .contains("sqysh: no/such/dir/f: No such file or directory")
        .unwrap();
}

#[test]
fn reads_commands_until_end_of_input() {
    let dir = temp_dir();
    sqysh(dir.path())
        .stdin("echo one\n\n   \necho two\n")
        .succeeds()
        .and()
        .stdout()
        .is("one\ntwo\n")
        .unwrap();
}

#[test]
fn exit_stops_reading() {
    let dir = temp_dir();
    sqysh(dir.path())
        .stdin("echo one\nexit 5 extra\necho two\n")
        .succeeds()
        .and()
        .stdout()
        .is("one\n")
        .unwrap();
}

#[test]
fn background_completion_is_reported_on_stderr() {
    let dir = temp_dir();
    sqysh(dir.path())
        .stdin("true &\nsleep 0.5\necho done\n")
        .succeeds()
        .and()
        .stdout()
        .is("done\n")
        .and()
        .stderr()
        .contains("[true (")
        .and()
        .stderr()
        .contains(") completed with status 0]")
        .unwrap();
}

#[test]
fn cd_too_many_arguments() {
    let dir = temp_dir();
    sqysh(dir.path())
        .stdin("cd a b\necho still here\n")
        .succeeds()
        .and()
        .stdout()
        .is("still here\n")
        .and()
        .stderr()
        .contains("sqysh: cd: too many arguments")
        .unwrap();
}

#[test]
fn cd_changes_directory_for_later_commands() {
    let dir = temp_dir();
    fs::create_dir(dir.path().join("sub")).unwrap();
    sqysh(dir.path())
        .stdin("cd sub\necho x > f.txt\n")
        .succeeds()
        .unwrap();
    assert_eq!(fs::read_to_string(dir.path().join("sub/f.txt")).unwrap(), "x\n");
}

#[test]
fn cd_missing_directory() {
    let dir = temp_dir();
    sqysh(dir.path())
        .stdin("cd missing\n")
        .succeeds()
        .and()
        .stderr()
        .contains("sqysh: cd: missing: No such file or directory")
        .unwrap();
}

#[test]
fn unknown_program_is_reported() {
    let dir = temp_dir();
    sqysh(dir.path())
        .stdin("sqysh-no-such-program arg\necho after\n")
        .succeeds()
        .and()
        .stdout()
        .is("after\n")
        .and()
        .stderr()
        .contains("sqysh: sqysh-no-such-program: No such file or directory")
        .unwrap();
}

#[test]
fn redirect_without_command_is_rejected() {
    let dir = temp_dir();
    sqysh(dir.path())
        .stdin("> out.txt echo hi\n")
        .succeeds()
        .and()
        .stderr()
        .contains("syntax error near unexpected token `>'")
        .unwrap();
    assert!(!dir.path().join("out.txt").exists());
}

#[test]
fn missing_input_file_is_reported() {
    let dir = temp_dir();
    sqysh(dir.path())
        .stdin("cat < nope.txt\n")
        .succeeds()
        .and()
        .stderr()
        .contains("sqysh: nope.txt: No such file or directory")
        .unwrap();
}

#[test]
fn runs_script_file() {
    let dir = temp_dir();
    fs::write(dir.path().join("script.sqysh"), "echo from script\nexit\necho never\n").unwrap();
    sqysh(dir.path())
        .with_args(&["script.sqysh"])
        .succeeds()
        .and()
        .stdout()
        .is("from script\n")
        .unwrap();
}

#[test]
fn missing_script_file_fails() {
    let dir = temp_dir();
    sqysh(dir.path())
        .with_args(&["missing.sqysh"])
        .fails_with(1)
        .and()
        .stderr()
        .contains("sqysh: missing.sqysh: No such file or directory")
        .and()
        .stderr()
        .doesnt_contain("os error")
        .unwrap();
}

#[test]
fn version() {
    let dir = temp_dir();
    sqysh(dir.path())
        .with_args(&["--version"])
        .succeeds()
        .and()
        .stdout()
        .contains("sqysh version")
        .unwrap();
}
