//! XML configuration support.
//! - Loads settings from config.xml (quick_xml + serde; unknown fields are an error).
//! - Creates a secure template when the default file is missing (unless RELOCATOR_CONFIG is set).
//!
//! This module only reads/writes the config file; directory checks happen in `validate`.

use anyhow::{Context, Result, anyhow, bail};
use quick_xml::de::from_str as from_xml_str;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use super::CONFIG_ENV;
use super::paths::{default_config_path, default_log_path, path_has_symlink_ancestor};
use super::types::{Config, LogLevel, StorageConfig};
use crate::conflict::ConflictMode;
use crate::platform::{set_dir_mode_0700, write_config_secure_new_0600};

#[derive(Debug, Deserialize)]
#[serde(rename = "config", deny_unknown_fields)]
struct XmlConfig {
    log_level: Option<String>,
    log_file: Option<String>,
    #[serde(default, deserialize_with = "de_bool_trimmed_opt")]
    preserve_metadata: Option<bool>,
    file_conflict: Option<String>,
    folder_conflict: Option<String>,
    storages: Option<XmlStorages>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct XmlStorages {
    #[serde(default)]
    storage: Vec<XmlStorage>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct XmlStorage {
    #[serde(rename = "@uid")]
    uid: u32,
    #[serde(rename = "@name")]
    name: Option<String>,
    #[serde(rename = "@writable")]
    writable: Option<bool>,
    base_path: String,
}

// Tolerate whitespace around booleans, e.g. "<preserve_metadata> true </preserve_metadata>".
fn de_bool_trimmed_opt<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s
            .parse::<bool>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("expected true or false, got '{s}'"))),
    }
}

/// Outcome of locating and reading the config file.
#[derive(Debug)]
pub enum LoadResult {
    Loaded { config: Config, path: PathBuf },
    /// The default file was missing; a template was written and nothing was loaded.
    CreatedTemplate(PathBuf),
}

/// Locate the config (`explicit`, then `$RELOCATOR_CONFIG`, then the default path) and load it.
///
/// A missing explicit or env-provided file is an error; a missing default file
/// is replaced by a template.
pub fn load_or_init(explicit: Option<&Path>) -> Result<LoadResult> {
    let env_set = env::var_os(CONFIG_ENV).is_some();
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => default_config_path().context("resolve config path")?,
    };

    if path.exists() {
        let config = load_config_from_xml_path(&path)?;
        return Ok(LoadResult::Loaded { config, path });
    }
    if explicit.is_some() || env_set {
        bail!("config file '{}' does not exist", path.display());
    }
    create_template_config(&path)?;
    Ok(LoadResult::CreatedTemplate(path))
}

/// Load a Config from a specific XML file path.
pub fn load_config_from_xml_path(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path).with_context(|| format!("read config xml '{}'", path.display()))?;
    let parsed: XmlConfig =
        from_xml_str(&contents).with_context(|| format!("parse config xml '{}'", path.display()))?;
    xml_to_config(parsed).with_context(|| format!("invalid value in config xml '{}'", path.display()))
}

fn xml_to_config(parsed: XmlConfig) -> Result<Config> {
    let mut cfg = Config::default();

    if let Some(s) = non_empty(parsed.log_level.as_deref()) {
        cfg.log_level = s.parse::<LogLevel>().map_err(|e| anyhow!(e))?;
    }
    cfg.log_file = non_empty(parsed.log_file.as_deref()).map(PathBuf::from);
    cfg.preserve_metadata = parsed.preserve_metadata.unwrap_or(false);
    if let Some(s) = non_empty(parsed.file_conflict.as_deref()) {
        cfg.file_conflict = s.parse::<ConflictMode>()?;
    }
    if let Some(s) = non_empty(parsed.folder_conflict.as_deref()) {
        cfg.folder_conflict = s.parse::<ConflictMode>()?;
    }

    cfg.storages = parsed
        .storages
        .map(|s| s.storage)
        .unwrap_or_default()
        .into_iter()
        .map(|s| {
            let mut sc = StorageConfig::new(s.uid, s.base_path.trim());
            if let Some(name) = non_empty(s.name.as_deref()) {
                sc.name = name.to_string();
            }
            sc.writable = s.writable.unwrap_or(true);
            sc
        })
        .collect();

    Ok(cfg)
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// Create the template config file and its parent directory (0700 dir, 0600 file).
pub fn create_template_config(path: &Path) -> Result<()> {
    if path_has_symlink_ancestor(path)? {
        bail!("Refusing to create config: ancestor of {} is a symlink", path.display());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create config dir '{}'", parent.display()))?;
        let _ = set_dir_mode_0700(parent);
    }

    let suggested_log = default_log_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "/path/to/relocator.log".into());

    let content = format!(
        r#"<!--
  relocator configuration (XML)

  Fields:
    log_level          -> quiet | normal | info | debug
    log_file           -> path to a log file (optional; stderr logging stays on)
    preserve_metadata  -> true/false; copy timestamps and permission bits on local copies
    file_conflict      -> cancel | renameNewFile (default)
    folder_conflict    -> cancel | renameNewFile | renameNewFolder | integrate (default)
    storages           -> one <storage uid=".." name=".." writable=".."> per base directory;
                          resources are addressed on the command line as <uid>:<identifier>

  CLI flags override XML values.
-->
<config>
  <log_level>normal</log_level>
  <log_file>{suggested_log}</log_file>
  <preserve_metadata>false</preserve_metadata>
  <file_conflict>renameNewFile</file_conflict>
  <folder_conflict>integrate</folder_conflict>
  <storages>
    <storage uid="1" name="primary" writable="true">
      <base_path>/path/to/primary</base_path>
    </storage>
  </storages>
</config>
"#
    );

    write_config_secure_new_0600(path, content.as_bytes())?;
    info!("Created template config at {}", path.display());
    Ok(())
}
