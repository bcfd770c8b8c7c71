//! Application orchestrator.
//! Loads/merges config, initializes logging, validates storages, opens them and
//! dispatches the requested relocation.

use anyhow::{Context, Result, anyhow, bail};
use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;
use tracing::{debug, error};

use relocator::config::{LoadResult, default_config_path, load_or_init, validate_and_normalize};
use relocator::output as out;
use relocator::{
    Config, FileHandle, FolderHandle, MemoryCatalog, RelocationError, Relocator, ResourceFactory, StorageRef,
    WritableStorageGate,
};

use crate::cli::{Args, Command, ResourceLocation};
use crate::logging::init_tracing;

/// Run the CLI application.
pub fn run(args: Args) -> Result<()> {
    if args.print_config {
        print_config_location(args.config.as_deref());
        return Ok(());
    }
    let Some(command) = args.command.clone() else {
        bail!("no command given; run with --help to see the available commands");
    };

    let (mut cfg, cfg_path) = match load_or_init(args.config.as_deref())? {
        LoadResult::CreatedTemplate(path) => {
            out::print_success(&format!("A template relocator config was written to: {}", path.display()));
            out::print_info("Edit the <storages> section so each <storage> points at a real directory, then re-run this command.");
            out::print_info("To use a different location pass --config or set RELOCATOR_CONFIG.");
            return Ok(());
        }
        LoadResult::Loaded { config, path } => (config, path),
    };

    // CLI wins over XML.
    if let Some(level) = args.effective_log_level() {
        cfg.log_level = level;
    }
    if args.preserve_metadata {
        cfg.preserve_metadata = true;
    }

    let _guard = init_tracing(&cfg.log_level, cfg.log_file.as_deref(), args.json).map_err(|e| {
        out::print_error(&format!("Failed to initialize logging: {e}"));
        e
    })?;
    debug!(config = %cfg_path.display(), ?command, "Starting relocator");

    validate_and_normalize(&mut cfg)?;
    let session = Session::open(&cfg);
    let result = session.execute(&command, &cfg);
    if let Err(e) = &result {
        log_failure(e);
    }
    result
}

/// Process exit status for a failed run: the typed error code when there is one.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<RelocationError>()
        .and_then(|e| u8::try_from(e.code()).ok())
        .unwrap_or(1)
}

fn print_config_location(explicit: Option<&Path>) {
    if let Some(p) = explicit {
        out::print_info(&format!("Using --config (explicit):\n  {}\n", p.display()));
        return;
    }
    if let Ok(cfg_env) = std::env::var(relocator::config::CONFIG_ENV) {
        out::print_info(&format!("Using RELOCATOR_CONFIG (explicit):\n  {cfg_env}\n"));
        out::print_info("To override, unset RELOCATOR_CONFIG or set it to another file.");
        return;
    }
    match default_config_path() {
        Ok(p) => {
            out::print_info(&format!("Default relocator config path:\n  {}\n", p.display()));
            if p.exists() {
                out::print_info("A config file already exists at that location.");
            } else {
                out::print_info("No config file exists there yet. Run any command to create a template.");
            }
        }
        Err(e) => out::print_error(&format!("Could not determine a default config path: {e}")),
    }
}

fn log_failure(e: &anyhow::Error) {
    let Some(re) = e.downcast_ref::<RelocationError>() else {
        error!(error = ?e, "Relocation failed");
        return;
    };
    let code = re.code();
    let kind = re.kind();
    match re {
        RelocationError::TargetExists { name, folder } => {
            error!(code, kind, %name, %folder, "Relocation failed")
        }
        RelocationError::NamespaceExhausted { folder, last_candidate } => {
            error!(code, kind, %folder, %last_candidate, "Relocation failed")
        }
        RelocationError::PermissionDenied { identifier, context } => {
            error!(code, kind, %identifier, %context, "Relocation failed")
        }
        RelocationError::NotFound { storage, identifier } => {
            error!(code, kind, storage = *storage, %identifier, "Relocation failed")
        }
        RelocationError::Backend { message, source } => {
            error!(code, kind, %message, io_kind = ?source.kind(), "Relocation failed")
        }
        _ => error!(code, kind, error = %re, "Relocation failed"),
    }
}

/// Storages and the catalog for one invocation.
struct Session {
    storages: BTreeMap<u32, StorageRef>,
    catalog: Rc<MemoryCatalog>,
}

impl Session {
    fn open(cfg: &Config) -> Self {
        Self {
            storages: cfg.open_storages(),
            catalog: Rc::new(MemoryCatalog::new()),
        }
    }

    fn storage(&self, uid: u32) -> Result<StorageRef> {
        self.storages.get(&uid).cloned().ok_or_else(|| {
            let known: Vec<String> = self.storages.keys().map(u32::to_string).collect();
            anyhow!("unknown storage uid {uid}; configured: {}", known.join(", "))
        })
    }

    fn relocator(&self, uid: u32) -> Result<Relocator> {
        Ok(Relocator::new(self.storage(uid)?, self.catalog.clone()).with_permissions(Rc::new(WritableStorageGate)))
    }

    fn file(&self, loc: &ResourceLocation) -> Result<FileHandle> {
        let storage = self.storage(loc.storage)?;
        Ok(self.catalog.resolve(&storage, &loc.identifier)?)
    }

    fn folder(&self, loc: &ResourceLocation) -> Result<FolderHandle> {
        Ok(self.storage(loc.storage)?.folder(&loc.identifier)?)
    }

    fn execute(&self, command: &Command, cfg: &Config) -> Result<()> {
        match command {
            Command::CopyFile(a) => {
                let engine = self.relocator(a.target.storage)?;
                let file = self.file(&a.source)?;
                let target = self.folder(&a.target)?;
                let copy = engine
                    .copy_file(&file, &target, a.name.as_deref(), a.conflict.unwrap_or(cfg.file_conflict))
                    .with_context(|| format!("copy-file {} -> {}", a.source, a.target))?;
                out::print_user(&format!("copied {} -> {}", a.source, describe_file(&copy)));
            }
            Command::MoveFile(m) => {
                let a = &m.file;
                let engine = self.relocator(a.target.storage)?;
                let file = self.file(&a.source)?;
                let target = self.folder(&a.target)?;
                engine
                    .move_file(
                        &file,
                        &target,
                        a.name.as_deref(),
                        a.conflict.unwrap_or(cfg.file_conflict),
                        !m.keep_original,
                    )
                    .with_context(|| format!("move-file {} -> {}", a.source, a.target))?;
                out::print_user(&format!("moved {} -> {}", a.source, describe_file(&file)));
            }
            Command::CopyFolder(a) => {
                let engine = self.relocator(a.target.storage)?;
                let folder = self.folder(&a.source)?;
                let target = self.folder(&a.target)?;
                let copy = engine
                    .copy_folder(&folder, &target, a.name.as_deref(), a.conflict.unwrap_or(cfg.folder_conflict))
                    .with_context(|| format!("copy-folder {} -> {}", a.source, a.target))?;
                out::print_user(&format!("copied {} -> {}", a.source, describe_folder(&copy)));
            }
            Command::MoveFolder(m) => {
                let a = &m.folder;
                let engine = self.relocator(a.target.storage)?;
                let folder = self.folder(&a.source)?;
                let target = self.folder(&a.target)?;
                engine
                    .move_folder(
                        &folder,
                        &target,
                        a.name.as_deref(),
                        a.conflict.unwrap_or(cfg.folder_conflict),
                        !m.keep_original,
                    )
                    .with_context(|| format!("move-folder {} -> {}", a.source, a.target))?;
                out::print_user(&format!("moved {} -> {}", a.source, describe_folder(&folder)));
            }
            Command::RenameFolder(r) => {
                let engine = self.relocator(r.folder.storage)?;
                let folder = self.folder(&r.folder)?;
                let renamed = engine
                    .rename_folder(&folder, &r.new_name)
                    .with_context(|| format!("rename-folder {} -> '{}'", r.folder, r.new_name))?;
                out::print_user(&format!("renamed {} -> {}", r.folder, describe_folder(&renamed)));
            }
        }
        Ok(())
    }
}

fn describe_file(file: &FileHandle) -> String {
    format!("{}:{}", file.storage().uid(), file.identifier())
}

fn describe_folder(folder: &FolderHandle) -> String {
    format!("{}:{}", folder.storage().uid(), folder.identifier())
}
