use clap::Parser;
use std::env;
use std::ffi::OsString;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use osfiles::config::{load_config, Config};
use osfiles::logger::sanitize_log_value;
use osfiles::{Catalog, ErrorKind, Failure, Files, Outcome};

use crate::cli::{Cli, CliCommand};

const DEFAULT_CONFIG_REL: &str = ".config/osfiles.yml";

#[derive(Debug)]
pub(crate) struct Quit {
    pub(crate) code: i32,
    #[allow(dead_code)]
    pub(crate) reason: String,
}

impl Quit {
    pub(crate) fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.code as u8)
    }

    fn new(code: i32, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }
}

/// Where rendered output goes; split out so tests can capture it.
pub(crate) struct Output<'a> {
    pub(crate) out: &'a mut dyn Write,
    pub(crate) err: &'a mut dyn Write,
}

fn default_config_path() -> Option<PathBuf> {
    env::var_os("HOME").map(|home| PathBuf::from(home).join(DEFAULT_CONFIG_REL))
}

/// An explicit `--config` must exist; the default location is optional.
fn resolve_config(explicit: Option<&Path>, output: &mut Output<'_>) -> Result<Config, Quit> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) if path.is_file() => path,
            _ => return Ok(Config::default()),
        },
    };
    match load_config(&path) {
        Ok(loaded) => {
            for key in &loaded.warnings {
                let _ = writeln!(output.err, "Warning: unknown config key: {}", key);
            }
            Ok(loaded.config)
        }
        Err(err) => {
            let _ = writeln!(output.err, "{}", err);
            Err(Quit::new(1, err.to_string()))
        }
    }
}

fn report(catalog: &Catalog, failure: &Failure, json: bool, output: &mut Output<'_>) {
    if json {
        match serde_json::to_string(failure) {
            Ok(line) => {
                let _ = writeln!(output.out, "{}", line);
            }
            Err(err) => {
                let _ = writeln!(output.err, "failed to serialize failure: {}", err);
            }
        }
        return;
    }
    let text = catalog
        .compose(failure)
        .unwrap_or_else(|_| failure.to_string());
    let _ = writeln!(output.err, "{}", text);
}

fn run_each<F>(
    paths: &[PathBuf],
    catalog: &Catalog,
    json: bool,
    output: &mut Output<'_>,
    mut op: F,
) -> Result<(), Quit>
where
    F: FnMut(&Path) -> Outcome,
{
    let mut last_failure = None;
    for path in paths {
        if let Err(failure) = op(path) {
            report(catalog, &failure, json, output);
            last_failure = Some(failure);
        }
    }
    match last_failure {
        None => Ok(()),
        Some(failure) => Err(Quit::new(1, sanitize_log_value(&failure.to_string()))),
    }
}

fn explain(catalog: &Catalog, files: &Files, kind: Option<ErrorKind>, output: &mut Output<'_>) {
    let kinds: Vec<ErrorKind> = match kind {
        Some(kind) => vec![kind],
        None => ErrorKind::ALL.to_vec(),
    };
    for kind in kinds {
        let failure = files.context().failure(kind);
        let template = catalog
            .template(&failure)
            .unwrap_or_else(|_| files.context().template_text(&failure));
        let _ = writeln!(output.out, "{}: {}", kind, template);
    }
}

pub(crate) fn run_with_cli(cli: Cli, output: &mut Output<'_>) -> Result<(), Quit> {
    let config = resolve_config(cli.config.as_deref(), output)?;
    let files = config.files();
    let catalog = config.catalog().map_err(|err| {
        let _ = writeln!(output.err, "{}", err);
        Quit::new(1, err.to_string())
    })?;

    match cli.command {
        CliCommand::Mkdir {
            parents,
            mode,
            paths,
        } => {
            let mode = mode.unwrap_or(config.default_mode).get();
            run_each(&paths, &catalog, cli.json, output, |path| {
                if parents {
                    files.makedirs(path, mode)
                } else {
                    files.mkdir(path, mode)
                }
            })
        }
        CliCommand::Remove { paths } => {
            run_each(&paths, &catalog, cli.json, output, |path| files.remove(path))
        }
        CliCommand::Explain { kind } => {
            explain(&catalog, &files, kind, output);
            Ok(())
        }
    }
}

pub(crate) fn run_with_args(args: Vec<OsString>, output: &mut Output<'_>) -> Result<(), Quit> {
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => {
            // Render through our writers so help and errors stay capturable.
            let target: &mut dyn Write = if err.use_stderr() {
                &mut *output.err
            } else {
                &mut *output.out
            };
            let _ = write!(target, "{}", err.render());
            if !err.use_stderr() {
                return Ok(());
            }
            return Err(Quit::new(err.exit_code(), "cli_parse"));
        }
    };
    run_with_cli(cli, output)
}

pub(crate) fn main_with_args(args: Vec<OsString>) -> ExitCode {
    let stdout = io::stdout();
    let stderr = io::stderr();
    let mut out = stdout.lock();
    let mut err = stderr.lock();
    let mut output = Output {
        out: &mut out,
        err: &mut err,
    };
    match run_with_args(args, &mut output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(quit) => quit.exit_code(),
    }
}

pub(crate) fn main() -> ExitCode {
    main_with_args(env::args_os().collect())
}
