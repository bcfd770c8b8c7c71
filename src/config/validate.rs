//! Config validation logic.
//! Verifies storage entries: at least one, unique uids, existing directories,
//! canonical paths and disjoint base directories.

use anyhow::{Context, Result, bail};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::{debug, error, info};

use super::types::Config;

/// Validate the storages and replace each base path with its canonical form.
pub fn validate_and_normalize(cfg: &mut Config) -> Result<()> {
    if cfg.storages.is_empty() {
        bail!("no storages configured; add at least one <storage> entry to the config");
    }

    let mut seen = BTreeSet::new();
    for sc in &cfg.storages {
        if !seen.insert(sc.uid) {
            error!(uid = sc.uid, "duplicate storage uid");
            bail!("storage uid {} is configured more than once", sc.uid);
        }
    }

    for sc in cfg.storages.iter_mut() {
        let label = format!("storage {} ('{}')", sc.uid, sc.name);
        ensure_dir_exists_and_is_dir(&sc.base_path, &label)?;
        ensure_readable(&sc.base_path, &label)?;
        sc.base_path = dunce::canonicalize(&sc.base_path)
            .with_context(|| format!("canonicalize {label} base '{}'", sc.base_path.display()))?;
    }

    for (i, a) in cfg.storages.iter().enumerate() {
        for b in cfg.storages.iter().skip(i + 1) {
            if a.base_path == b.base_path {
                bail!(
                    "storages {} and {} resolve to the same path: '{}'",
                    a.uid,
                    b.uid,
                    a.base_path.display()
                );
            }
            if a.base_path.starts_with(&b.base_path) || b.base_path.starts_with(&a.base_path) {
                bail!(
                    "storage bases must not be nested: '{}' (uid {}) and '{}' (uid {})",
                    a.base_path.display(),
                    a.uid,
                    b.base_path.display(),
                    b.uid
                );
            }
        }
    }

    info!(
        storages = cfg.storages.len(),
        log_file = %cfg
            .log_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<none>".into()),
        "Config validated"
    );
    Ok(())
}

fn ensure_dir_exists_and_is_dir(path: &Path, name: &str) -> Result<()> {
    if !path.exists() {
        error!("{name} base does not exist: {}", path.display());
        bail!("{name} base does not exist: {}", path.display());
    }
    if !path.is_dir() {
        error!("{name} base is not a directory: {}", path.display());
        bail!("{name} base is not a directory: {}", path.display());
    }
    Ok(())
}

fn ensure_readable(path: &Path, name: &str) -> Result<()> {
    fs::read_dir(path)
        .with_context(|| format!("Cannot read {name} base '{}'; check permissions", path.display()))?;
    debug!("{name} readable: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use tempfile::tempdir;

    fn cfg_with(storages: Vec<StorageConfig>) -> Config {
        Config {
            storages,
            ..Config::default()
        }
    }

    #[test]
    fn empty_storage_list_is_rejected() {
        let mut cfg = Config::default();
        assert!(validate_and_normalize(&mut cfg).is_err());
    }

    #[test]
    fn duplicate_uids_are_rejected() {
        let td = tempdir().unwrap();
        let a = td.path().join("a");
        let b = td.path().join("b");
        fs::create_dir_all(&a).unwrap();
        fs::create_dir_all(&b).unwrap();
        let mut cfg = cfg_with(vec![StorageConfig::new(1, &a), StorageConfig::new(1, &b)]);
        let err = validate_and_normalize(&mut cfg).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn nested_bases_are_rejected() {
        let td = tempdir().unwrap();
        let outer = td.path().join("outer");
        let inner = outer.join("inner");
        fs::create_dir_all(&inner).unwrap();
        let mut cfg = cfg_with(vec![StorageConfig::new(1, &outer), StorageConfig::new(2, &inner)]);
        let err = validate_and_normalize(&mut cfg).unwrap_err();
        assert!(err.to_string().contains("nested"));
    }

    #[test]
    fn bases_are_canonicalized() {
        let td = tempdir().unwrap();
        let a = td.path().join("a");
        fs::create_dir_all(&a).unwrap();
        let mut cfg = cfg_with(vec![StorageConfig::new(1, a.join("."))]);
        validate_and_normalize(&mut cfg).unwrap();
        assert_eq!(cfg.storages[0].base_path, dunce::canonicalize(&a).unwrap());
    }
}
