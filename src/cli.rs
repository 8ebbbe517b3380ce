use clap::{Parser, Subcommand};
use std::path::PathBuf;

use osfiles::config::DirMode;
use osfiles::ErrorKind;

#[derive(Debug, Parser)]
#[command(
    name = "osfiles",
    about = "Create directories and remove files, reporting classified failures.",
    long_about = "Create directories (optionally with all missing parents) and remove files.\n\nFailures are classified as access_denied, file_exists, write_error, file_busy or no_such_file and rendered through the configured message templates.",
    disable_help_subcommand = true
)]
pub(crate) struct Cli {
    /// Load configuration from PATH instead of ~/.config/osfiles.yml.
    #[arg(
        short = 'c',
        long = "config",
        global = true,
        value_name = "PATH",
        help = "Load configuration from PATH instead of ~/.config/osfiles.yml."
    )]
    pub(crate) config: Option<PathBuf>,

    /// Print failures as JSON on stdout instead of rendered text on stderr.
    #[arg(long = "json", global = true)]
    pub(crate) json: bool,

    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub(crate) enum CliCommand {
    /// Create directories.
    Mkdir {
        /// Create missing parent directories; existing directories are not an error.
        #[arg(short = 'p', long = "parents")]
        parents: bool,

        /// Octal permission bits for new directories (before umask).
        #[arg(short = 'm', long = "mode", value_name = "MODE", value_parser = parse_mode)]
        mode: Option<DirMode>,

        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,
    },
    /// Remove files.
    Remove {
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,
    },
    /// Print the message template for an error kind (all kinds by default).
    Explain {
        #[arg(long = "kind", value_name = "KIND", value_parser = parse_kind)]
        kind: Option<ErrorKind>,
    },
}

fn parse_mode(raw: &str) -> Result<DirMode, String> {
    DirMode::parse(raw)
}

fn parse_kind(raw: &str) -> Result<ErrorKind, String> {
    ErrorKind::parse(raw).ok_or_else(|| {
        let known: Vec<&str> = ErrorKind::ALL.iter().map(|kind| kind.as_str()).collect();
        format!("unknown error kind {:?} (expected one of {})", raw, known.join(", "))
    })
}
