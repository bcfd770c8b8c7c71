//! Streaming copy helpers for the local driver.
//!
//! - `copy_streaming` writes into a newly created destination (O_EXCL semantics; never clobbers).
//! - `copy_via_temp` stages the bytes in a temp sibling and renames it into place, so a
//!   half-written file never appears under the final name.
//! - `preserve_metadata` copies timestamps and (Unix) the permission bits.
//!
//! Snapshot semantics: the source is read once from start to EOF; bytes appended
//! concurrently are not included.

use filetime::{FileTime, set_file_times};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

const BUF_SIZE: usize = 1024 * 1024;

/// Copy `src` -> `dst` using buffered I/O, then fsync the destination.
/// Returns the number of bytes written.
pub(super) fn copy_streaming(src: &Path, dst: &Path) -> io::Result<u64> {
    let src_f = File::open(src)?;
    let dst_f = OpenOptions::new().write(true).create_new(true).open(dst)?;

    let mut reader = BufReader::with_capacity(BUF_SIZE, src_f);
    let mut writer = BufWriter::with_capacity(BUF_SIZE, dst_f);
    let bytes = io::copy(&mut reader, &mut writer)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    Ok(bytes)
}

/// Copy `src` into a temp file next to `dest`, then rename it over `dest`.
///
/// With `replace == false` an existing `dest` is an `AlreadyExists` error.
pub(super) fn copy_via_temp(src: &Path, dest: &Path, replace: bool) -> io::Result<u64> {
    if !replace && fs::symlink_metadata(dest).is_ok() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("destination '{}' already exists", dest.display()),
        ));
    }
    let dest_dir = dest.parent().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "destination has no parent directory")
    })?;

    let tmp = unique_temp_path(dest_dir);
    let bytes = match copy_streaming(src, &tmp) {
        Ok(n) => n,
        Err(e) => {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
    };
    if let Err(e) = fs::rename(&tmp, dest) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    #[cfg(unix)]
    {
        // Ignore fsync errors to avoid turning a successful rename into a failure.
        let _ = File::open(dest_dir).and_then(|d| d.sync_all());
    }
    Ok(bytes)
}

/// Copy access/modification times and, on Unix, the permission bits.
pub(super) fn preserve_metadata(src: &Path, dest: &Path) -> io::Result<()> {
    let meta = fs::metadata(src)?;
    let mtime = FileTime::from_last_modification_time(&meta);
    let atime = FileTime::from_last_access_time(&meta);
    set_file_times(dest, atime, mtime)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = meta.permissions().mode() & 0o777;
        fs::set_permissions(dest, fs::Permissions::from_mode(mode))?;
    }
    Ok(())
}

pub(super) fn unique_temp_path(dst_dir: &Path) -> PathBuf {
    let pid = std::process::id();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    dst_dir.join(format!(".relocator.{pid}.{nanos}.tmp"))
}

/// True only for names produced by `unique_temp_path`.
pub(super) fn is_temp_name(name: &str) -> bool {
    let Some(middle) = name.strip_prefix(".relocator.").and_then(|n| n.strip_suffix(".tmp")) else {
        return false;
    };
    let mut parts = middle.split('.');
    let digits = |p: Option<&str>| p.is_some_and(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()));
    digits(parts.next()) && digits(parts.next()) && parts.next().is_none()
}

/// EXDEV / ERROR_NOT_SAME_DEVICE: the rename crossed a mount point.
pub(super) fn is_cross_device(e: &io::Error) -> bool {
    match e.raw_os_error() {
        #[cfg(unix)]
        Some(code) => code == libc::EXDEV,
        #[cfg(windows)]
        Some(code) => code == 17,
        #[cfg(not(any(unix, windows)))]
        Some(_) => false,
        None => false,
    }
}
