use clap::Parser;
use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;

use crate::app::{run_with_args, Output, Quit};
use crate::cli::{Cli, CliCommand};
use osfiles::ErrorKind;

static ENV_MUTEX: Mutex<()> = Mutex::new(());

struct Captured {
    result: Result<(), Quit>,
    stdout: String,
    stderr: String,
}

fn run(args: &[&str]) -> Captured {
    let mut out = Vec::new();
    let mut err = Vec::new();
    let argv: Vec<OsString> = std::iter::once("osfiles")
        .chain(args.iter().copied())
        .map(OsString::from)
        .collect();
    let result = {
        let mut output = Output {
            out: &mut out,
            err: &mut err,
        };
        run_with_args(argv, &mut output)
    };
    Captured {
        result,
        stdout: String::from_utf8_lossy(&out).into_owned(),
        stderr: String::from_utf8_lossy(&err).into_owned(),
    }
}

fn write_config(dir: &Path, contents: &str) -> String {
    let path = dir.join("osfiles.yml");
    fs::write(&path, contents).expect("write config");
    path.display().to_string()
}

fn exit_code(captured: &Captured) -> i32 {
    match &captured.result {
        Ok(()) => 0,
        Err(quit) => quit.code,
    }
}

#[test]
fn clap_parses_mkdir_flags_and_global_options() {
    let cli = Cli::try_parse_from([
        "osfiles", "mkdir", "-p", "-m", "700", "a", "b", "--json", "-c", "cfg.yml",
    ])
    .expect("parse");
    assert!(cli.json);
    assert_eq!(cli.config.as_deref(), Some(Path::new("cfg.yml")));
    match cli.command {
        CliCommand::Mkdir {
            parents,
            mode,
            paths,
        } => {
            assert!(parents);
            assert_eq!(mode.map(|mode| mode.get()), Some(0o700));
            assert_eq!(paths.len(), 2);
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn clap_rejects_bad_mode_and_unknown_kind() {
    assert!(Cli::try_parse_from(["osfiles", "mkdir", "-m", "999", "a"]).is_err());
    assert!(Cli::try_parse_from(["osfiles", "explain", "--kind", "disk_full"]).is_err());
    assert!(Cli::try_parse_from(["osfiles", "remove"]).is_err());
}

#[test]
fn mkdir_parents_creates_nested_directories() {
    let temp = TempDir::new().expect("temp dir");
    let config = write_config(temp.path(), "");
    let target = temp.path().join("a").join("b");

    let captured = run(&["-c", &config, "mkdir", "-p", &target.display().to_string()]);
    assert_eq!(exit_code(&captured), 0, "stderr: {}", captured.stderr);
    assert!(target.is_dir());
    assert!(captured.stderr.is_empty());
}

#[test]
fn mkdir_without_parents_reports_no_such_file() {
    let temp = TempDir::new().expect("temp dir");
    let config = write_config(temp.path(), "");
    let target = temp.path().join("a").join("b");
    let target_str = target.display().to_string();

    let captured = run(&["-c", &config, "mkdir", &target_str]);
    assert_eq!(exit_code(&captured), 1);
    assert!(
        captured
            .stderr
            .starts_with(&format!("File does not exist\npath={}\n", target_str)),
        "got: {:?}",
        captured.stderr
    );
    assert!(captured.stderr.contains("errno=2"), "got: {:?}", captured.stderr);
    assert!(!target.exists());
}

#[test]
fn remove_continues_past_failures() {
    let temp = TempDir::new().expect("temp dir");
    let config = write_config(temp.path(), "");
    let missing = temp.path().join("missing");
    let present = temp.path().join("present");
    fs::write(&present, "x").expect("write file");

    let captured = run(&[
        "-c",
        &config,
        "remove",
        &missing.display().to_string(),
        &present.display().to_string(),
    ]);
    assert_eq!(exit_code(&captured), 1);
    assert!(!present.exists());
    assert!(captured.stderr.starts_with("File does not exist"));
}

#[test]
fn json_flag_prints_structured_failure() {
    let temp = TempDir::new().expect("temp dir");
    let config = write_config(temp.path(), "");
    let missing = temp.path().join("missing");

    let captured = run(&["--json", "-c", &config, "remove", &missing.display().to_string()]);
    assert_eq!(exit_code(&captured), 1);
    let value: serde_json::Value =
        serde_json::from_str(captured.stdout.trim()).expect("stdout should be JSON");
    assert_eq!(value["kind"], "no_such_file");
    assert_eq!(value["context"], "OS:Files");
    assert_eq!(value["attributes"][0]["name"], "path");
    assert_eq!(value["attributes"][2]["value"], 2);
}

#[test]
fn config_templates_and_log_path_are_applied() {
    let temp = TempDir::new().expect("temp dir");
    let log_path = temp.path().join("ops.log");
    let config = write_config(
        temp.path(),
        &format!(
            "context_name: \"Test:Files\"\nlog_path: \"{}\"\ntemplates:\n  no_such_file: \"Nothing at ${{path}}\"\n",
            log_path.display()
        ),
    );
    let missing = temp.path().join("missing");
    let missing_str = missing.display().to_string();

    let captured = run(&["-c", &config, "remove", &missing_str]);
    assert_eq!(exit_code(&captured), 1);
    assert!(
        captured
            .stderr
            .starts_with(&format!("Nothing at {}\npath={}", missing_str, missing_str)),
        "got: {:?}",
        captured.stderr
    );
    let log = fs::read_to_string(&log_path).expect("read log");
    assert!(log.contains("remove path="), "got: {log:?}");
    assert!(log.trim_end().ends_with("result=no_such_file errno=2"));
}

#[test]
fn default_mode_comes_from_config() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().expect("temp dir");
    let config = write_config(temp.path(), "default_mode: \"700\"\n");
    let target = temp.path().join("private");

    let captured = run(&["-c", &config, "mkdir", &target.display().to_string()]);
    assert_eq!(exit_code(&captured), 0);
    let mode = fs::metadata(&target).expect("metadata").permissions().mode();
    assert_eq!(mode & 0o777, 0o700);
}

#[test]
fn explicit_config_must_exist() {
    let temp = TempDir::new().expect("temp dir");
    let missing = temp.path().join("nope.yml");

    let captured = run(&["-c", &missing.display().to_string(), "explain"]);
    assert_eq!(exit_code(&captured), 1);
    assert!(captured.stderr.contains("Failed to read config"), "got: {:?}", captured.stderr);
}

#[test]
fn unknown_config_keys_warn_on_captured_stderr() {
    let temp = TempDir::new().expect("temp dir");
    let config = write_config(temp.path(), "extra_key: true\n");

    let captured = run(&["-c", &config, "explain", "--kind", "file_busy"]);
    assert_eq!(exit_code(&captured), 0);
    assert_eq!(captured.stdout, "file_busy: File in use\n");
    assert_eq!(captured.stderr, "Warning: unknown config key: extra_key\n");
}

#[test]
fn missing_default_config_falls_back_to_defaults() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let temp = TempDir::new().expect("temp dir");
    let original_home = env::var_os("HOME");
    env::set_var("HOME", temp.path());

    let captured = run(&["explain", "--kind", "file_busy"]);

    match original_home {
        Some(value) => env::set_var("HOME", value),
        None => env::remove_var("HOME"),
    }
    assert_eq!(exit_code(&captured), 0, "stderr: {}", captured.stderr);
    assert_eq!(captured.stdout, "file_busy: File in use\n");
}

#[test]
fn explain_lists_every_kind() {
    let temp = TempDir::new().expect("temp dir");
    let config = write_config(temp.path(), "");

    let captured = run(&["-c", &config, "explain"]);
    assert_eq!(exit_code(&captured), 0);
    let lines: Vec<&str> = captured.stdout.lines().collect();
    assert_eq!(lines.len(), ErrorKind::ALL.len());
    assert_eq!(lines[0], "access_denied: No write permission for parent directory");
    assert_eq!(lines[4], "no_such_file: File does not exist");
}

#[test]
fn help_goes_to_stdout_and_succeeds() {
    let captured = run(&["--help"]);
    assert_eq!(exit_code(&captured), 0);
    assert!(captured.stdout.contains("mkdir"), "got: {:?}", captured.stdout);
}

#[test]
fn parse_errors_use_clap_exit_code() {
    let captured = run(&["frobnicate"]);
    assert_eq!(exit_code(&captured), 2);
    assert!(!captured.stderr.is_empty());
}
