use nix::errno::Errno;
use std::io;
use std::path::Path;

use crate::context::ErrorContext;
use crate::failure::Failure;
use crate::kind::ErrorKind;

/// Build the failure for a syscall on `path` that just returned `err`.
///
/// Errors that carry no OS code (std rejects paths with interior NUL bytes
/// before reaching the kernel) are reported as `EINVAL`, which is what the
/// kernel would have said.
pub fn translate(context: &ErrorContext, path: &Path, err: &io::Error) -> Failure {
    let code = err.raw_os_error().unwrap_or(Errno::EINVAL as i32);
    from_errno(context, path, code)
}

pub fn from_errno(context: &ErrorContext, path: &Path, code: i32) -> Failure {
    let errno = Errno::from_i32(code);
    context
        .failure(ErrorKind::classify(errno))
        .with_path("path", path)
        .with_string("errstr", errno.desc())
        .with_int("errno", code)
}
