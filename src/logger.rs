use chrono::Utc;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::failure::Outcome;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Append-only operation log. A logger without a path records nothing.
///
/// Each entry is one line: `<utc timestamp> <operation> path=<path>
/// result=<ok|kind> [errno=<n|none>]`. The first write error switches the
/// logger off for the rest of its life.
#[derive(Debug, Default)]
pub struct Logger {
    path: Option<PathBuf>,
    disabled: AtomicBool,
}

impl Logger {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            disabled: AtomicBool::new(false),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn log_operation(&self, operation: &str, target: &Path, outcome: &Outcome) {
        let Some(log_path) = self.path.as_deref() else {
            return;
        };
        if self.disabled.load(Ordering::Relaxed) {
            return;
        }
        let entry = operation_entry(operation, target, outcome);
        if let Err(err) = append_entry(log_path, &entry) {
            self.disable(log_path, &err);
        }
    }

    fn disable(&self, log_path: &Path, err: &io::Error) {
        if !self.disabled.swap(true, Ordering::SeqCst) {
            let _ = writeln!(
                io::stderr().lock(),
                "Warning: operation logging disabled log_path={} io_error={}",
                log_path.display(),
                err
            );
        }
    }

    #[cfg(test)]
    pub(crate) fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::Relaxed)
    }
}

fn operation_entry(operation: &str, target: &Path, outcome: &Outcome) -> String {
    let target = sanitize_log_value(&target.to_string_lossy());
    match outcome {
        Ok(()) => format!("{operation} path={target} result=ok"),
        Err(failure) => {
            let errno = failure
                .errno()
                .map_or_else(|| "none".to_string(), |errno| errno.to_string());
            format!(
                "{operation} path={target} result={} errno={errno}",
                failure.kind()
            )
        }
    }
}

fn append_entry(log_path: &Path, entry: &str) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(log_path)?;
    writeln!(file, "{} {}", Utc::now().format(TIMESTAMP_FORMAT), entry)
}

pub fn sanitize_log_value(value: &str) -> String {
    value
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}
