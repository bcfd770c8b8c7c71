//! I/O error helpers.
//!
//! Drivers speak `io::Result`; the engine turns their failures into
//! `RelocationError::Backend` with the operation, the identifier and a
//! platform-aware hint in the message.
//!
//! Usage:
//!   // engine code returning crate::Result<_>
//!   driver.delete_file(id).map_err(backend_error("delete file", id))?;
//!
//!   // driver code returning io::Result<_>
//!   fs::create_dir(p).map_err(io_error_with_help_io("create folder", p))?;

use std::io;
use std::path::Path;

use crate::errors::RelocationError;

/// Format a human-friendly message with op/target plus platform-aware hints.
fn build_message(op: &str, target: &str, e: &io::Error) -> String {
    let mut msg = format!("{} '{}': {}", op, target, e);

    if let Some(code) = e.raw_os_error() {
        #[cfg(unix)]
        {
            match code {
                libc::EACCES | libc::EPERM => {
                    msg.push_str("; permission denied, check ownership and write permissions");
                }
                libc::EXDEV => {
                    msg.push_str("; cross-filesystem, atomic rename not possible");
                }
                libc::EBUSY => {
                    msg.push_str("; resource busy, ensure no other process is writing");
                }
                libc::ENOENT => {
                    msg.push_str("; path not found, verify it exists");
                }
                libc::EEXIST | libc::ENOTEMPTY => {
                    msg.push_str("; already exists, pick a unique name or remove the target");
                }
                libc::ENOSPC => {
                    msg.push_str("; insufficient space on device");
                }
                libc::EROFS => {
                    msg.push_str("; read-only filesystem, cannot write here");
                }
                libc::ELOOP => {
                    msg.push_str("; too many symbolic link levels, possible symlink cycle");
                }
                libc::ENAMETOOLONG => {
                    msg.push_str("; filename or path too long, shorten path segments");
                }
                _ => {}
            }
        }
        #[cfg(windows)]
        {
            match code {
                5 => msg.push_str("; access denied, check permissions"),
                17 => msg.push_str("; not same device, cross-filesystem move"),
                32 => msg.push_str("; sharing violation, file is in use"),
                2 | 3 => msg.push_str("; path not found, verify it exists"),
                80 | 183 => msg.push_str("; already exists, pick a unique name"),
                112 => msg.push_str("; insufficient disk space"),
                19 => msg.push_str("; write protected or read-only media"),
                206 => msg.push_str("; filename or path too long"),
                _ => {}
            }
        }
        msg.push_str(&format!(" [os code: {}]", code));
    } else {
        match e.kind() {
            io::ErrorKind::PermissionDenied => {
                msg.push_str("; permission denied, check ownership and write permissions");
            }
            io::ErrorKind::NotFound => {
                msg.push_str("; not found, verify it exists");
            }
            io::ErrorKind::AlreadyExists => {
                msg.push_str("; already exists, remove or choose a unique name");
            }
            io::ErrorKind::InvalidInput => {
                msg.push_str("; rejected by the storage driver");
            }
            _ => {}
        }
    }

    msg
}

/// Adapter for engine code: converts a driver `io::Error` into `RelocationError::Backend`.
pub fn backend_error<'a>(
    op: &'a str,
    identifier: &'a str,
) -> impl FnOnce(io::Error) -> RelocationError + 'a {
    move |e: io::Error| RelocationError::Backend {
        message: build_message(op, identifier, &e),
        source: e,
    }
}

/// Adapter for driver code: enriches the message while preserving the `ErrorKind`.
pub fn io_error_with_help_io<'a>(
    op: &'a str,
    path: &'a Path,
) -> impl FnOnce(io::Error) -> io::Error + 'a {
    move |e: io::Error| io::Error::new(e.kind(), build_message(op, &path.display().to_string(), &e))
}
