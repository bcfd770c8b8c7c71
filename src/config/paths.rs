//! Default path helpers and symlink checks.
//! Resolves the config file location (honouring `RELOCATOR_CONFIG`) and a log
//! path that sits next to it.

use dirs::config_dir;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::CONFIG_ENV;

const APP_DIR: &str = "relocator";
const CONFIG_FILE: &str = "config.xml";
const LOG_FILE: &str = "relocator.log";

/// Config path: `$RELOCATOR_CONFIG` when set, else `<config dir>/relocator/config.xml`.
///
/// A relative env value is resolved against the current directory; a value
/// naming an existing directory means `config.xml` inside it.
pub fn default_config_path() -> io::Result<PathBuf> {
    if let Some(raw) = env::var_os(CONFIG_ENV) {
        let mut path = PathBuf::from(raw);
        if path.as_os_str().is_empty() {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, format!("{CONFIG_ENV} is set but empty")));
        }
        if path.is_relative() {
            path = env::current_dir()?.join(path);
        }
        if path.is_dir() {
            path.push(CONFIG_FILE);
        }
        return Ok(path);
    }

    let base = config_dir()
        .or_else(|| env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no config directory or HOME available"))?;
    Ok(base.join(APP_DIR).join(CONFIG_FILE))
}

/// Log file colocated with the config file.
pub fn default_log_path() -> io::Result<PathBuf> {
    let cfg = default_config_path()?;
    let dir = cfg
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "config path has no parent"))?;
    Ok(dir.join(LOG_FILE))
}

/// Return true if any existing ancestor of `path` is a symlink.
pub fn path_has_symlink_ancestor(path: &Path) -> io::Result<bool> {
    for anc in path.ancestors().skip(1) {
        if anc.as_os_str().is_empty() {
            continue;
        }
        match fs::symlink_metadata(anc) {
            Ok(meta) if meta.file_type().is_symlink() => return Ok(true),
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
    }
    Ok(false)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::symlink;
    use tempfile::tempdir;

    #[test]
    fn symlinked_parent_is_detected() {
        let td = tempdir().unwrap();
        let base = fs::canonicalize(td.path()).unwrap();
        let real = base.join("real");
        fs::create_dir(&real).unwrap();
        let link = base.join("link");
        symlink(&real, &link).unwrap();

        assert!(path_has_symlink_ancestor(&link.join("x.log")).unwrap());
        assert!(!path_has_symlink_ancestor(&real.join("x.log")).unwrap());
        assert!(!path_has_symlink_ancestor(&base.join("missing/deeper/x.log")).unwrap());
    }
}
