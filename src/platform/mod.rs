//! Platform-specific helpers for the config and log files.
//! Hides Unix/Windows differences behind one API.

#[cfg(unix)]
mod unix;
#[cfg(not(unix))]
mod windows;

#[cfg(unix)]
pub use unix::{open_log_file_secure_append, set_dir_mode_0700, write_config_secure_new_0600};

#[cfg(not(unix))]
pub use windows::{open_log_file_secure_append, set_dir_mode_0700, write_config_secure_new_0600};

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Hidden sibling name for atomic writes: `.relocator.config.tmp.<pid>.<nanos>.<seq>`.
fn tmp_sibling_name(target: &Path) -> PathBuf {
    let pid = std::process::id();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
    target
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(format!(".relocator.config.tmp.{pid}.{nanos}.{seq}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sibling_names_are_unique_and_hidden() {
        let target = Path::new("/etc/relocator/config.xml");
        let a = tmp_sibling_name(target);
        let b = tmp_sibling_name(target);
        assert_ne!(a, b);
        assert_eq!(a.parent(), target.parent());
        assert!(a.file_name().unwrap().to_string_lossy().starts_with(".relocator.config.tmp."));
    }
}
