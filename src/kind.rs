use nix::errno::Errno;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a failed filesystem call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    AccessDenied,
    FileExists,
    WriteError,
    FileBusy,
    NoSuchFile,
}

/// OS error codes with a dedicated kind. Anything missing here is a
/// [`ErrorKind::WriteError`].
const ERRNO_TABLE: &[(Errno, ErrorKind)] = &[
    (Errno::EACCES, ErrorKind::AccessDenied),
    (Errno::EBUSY, ErrorKind::FileBusy),
    (Errno::EEXIST, ErrorKind::FileExists),
    (Errno::ENOENT, ErrorKind::NoSuchFile),
];

impl ErrorKind {
    pub const ALL: [ErrorKind; 5] = [
        ErrorKind::AccessDenied,
        ErrorKind::FileExists,
        ErrorKind::WriteError,
        ErrorKind::FileBusy,
        ErrorKind::NoSuchFile,
    ];

    /// Map a raw OS error code to its kind, defaulting to `WriteError`.
    pub fn classify(errno: Errno) -> Self {
        ERRNO_TABLE
            .iter()
            .find(|(code, _)| *code == errno)
            .map(|(_, kind)| *kind)
            .unwrap_or(ErrorKind::WriteError)
    }

    /// Message code used when looking up templates.
    pub fn code(self) -> i32 {
        match self {
            Self::AccessDenied => 1,
            Self::FileExists => 2,
            Self::WriteError => 3,
            Self::FileBusy => 4,
            Self::NoSuchFile => 5,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AccessDenied => "access_denied",
            Self::FileExists => "file_exists",
            Self::WriteError => "write_error",
            Self::FileBusy => "file_busy",
            Self::NoSuchFile => "no_such_file",
        }
    }

    pub fn parse(token: &str) -> Option<Self> {
        let trimmed = token.trim();
        Self::ALL.into_iter().find(|kind| kind.as_str() == trimmed)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
