//! Directory creation and file removal reporting [`Failure`]s instead of
//! bare I/O errors.
//!
//! Every call is a single blocking syscall (or, for [`makedirs`], a chain of
//! them). Races with other processes are settled by whatever the kernel
//! reports; nothing is locked, retried or rolled back.

use nix::errno::Errno;
use nix::libc;
use std::ffi::OsStr;
use std::fs::{self, DirBuilder};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::DirBuilderExt;
use std::path::Path;

use crate::context::ErrorContext;
use crate::failure::Outcome;
use crate::logger::Logger;
use crate::translate::{from_errno, translate};

/// Raw permission bits handed to `mkdir(2)`; the umask still applies.
pub type Mode = u32;

pub const DEFAULT_MODE: Mode = 0o777;

/// Filesystem operations bound to one error context and operation log.
#[derive(Debug, Default)]
pub struct Files {
    context: ErrorContext,
    logger: Logger,
}

impl Files {
    pub fn new(context: ErrorContext) -> Self {
        Self {
            context,
            logger: Logger::default(),
        }
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    pub fn context(&self) -> &ErrorContext {
        &self.context
    }

    pub fn mkdir(&self, path: impl AsRef<Path>, mode: Mode) -> Outcome {
        let path = path.as_ref();
        let outcome = mkdir(&self.context, path, mode);
        self.logger.log_operation("mkdir", path, &outcome);
        outcome
    }

    pub fn makedirs(&self, path: impl AsRef<Path>, mode: Mode) -> Outcome {
        let path = path.as_ref();
        let outcome = makedirs(&self.context, path, mode);
        self.logger.log_operation("makedirs", path, &outcome);
        outcome
    }

    pub fn remove(&self, path: impl AsRef<Path>) -> Outcome {
        let path = path.as_ref();
        let outcome = remove(&self.context, path);
        self.logger.log_operation("remove", path, &outcome);
        outcome
    }
}

/// Create exactly one directory level at `path`.
pub fn mkdir(context: &ErrorContext, path: &Path, mode: Mode) -> Outcome {
    DirBuilder::new()
        .mode(mode)
        .create(path)
        .map_err(|err| translate(context, path, &err))
}

/// Create `path` and any missing parents.
///
/// An empty path is a no-op and an existing directory is success. When
/// something other than a directory already holds the name, `mkdir` is
/// still attempted so the caller gets the kernel's error for it. The first
/// failure along the parent chain is returned and directories created
/// before it are left in place.
///
/// A path of `PATH_MAX` bytes or more fails with `ENAMETOOLONG` before
/// anything is created.
pub fn makedirs(context: &ErrorContext, path: &Path, mode: Mode) -> Outcome {
    let len = path.as_os_str().len();
    if len == 0 {
        return Ok(());
    }
    if len >= libc::PATH_MAX as usize {
        return Err(from_errno(context, path, Errno::ENAMETOOLONG as i32));
    }

    // Walk up to the deepest existing ancestor, then create downwards.
    let mut missing = Vec::new();
    let mut current = path;
    while !current.as_os_str().is_empty() {
        match fs::metadata(current) {
            Err(_) => {
                missing.push(current);
                current = parent_path(current);
            }
            Ok(meta) if meta.is_dir() => break,
            Ok(_) => {
                mkdir(context, current, mode)?;
                break;
            }
        }
    }
    for dir in missing.iter().rev() {
        mkdir(context, dir, mode)?;
    }
    Ok(())
}

/// Unlink a single file. Directories are not handled specially.
pub fn remove(context: &ErrorContext, path: &Path) -> Outcome {
    fs::remove_file(path).map_err(|err| translate(context, path, &err))
}

/// The prefix of `path` before its last separator.
///
/// Trailing separators are skipped, a separator at the very start never
/// splits, and a run of separators splits at its first byte. Returns an
/// empty path when there is no parent to create.
pub fn parent_path(path: &Path) -> &Path {
    let bytes = path.as_os_str().as_bytes();
    let mut end = bytes.len();
    while end > 1 && bytes[end - 1] == b'/' {
        end -= 1;
    }
    let mut split = 0;
    for i in 1..end {
        if bytes[i] == b'/' && bytes[i - 1] != b'/' {
            split = i;
        }
    }
    Path::new(OsStr::from_bytes(&bytes[..split]))
}
