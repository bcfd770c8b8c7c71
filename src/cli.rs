//! CLI definition and parsing.
//!
//! Resources are addressed as `<storage-uid>:<identifier>`, e.g. `1:/photos/a.jpg`
//! or `2:/archive/`. Global flags override values from the XML config.

use clap::{Args as ClapArgs, Parser, Subcommand, ValueHint};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use relocator::{ConflictMode, LogLevel};

#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Copy and move files and folders between storages, resolving name conflicts"
)]
pub struct Args {
    /// Config file to use instead of $RELOCATOR_CONFIG or the default location.
    #[arg(long, global = true, value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Enable debug logging (equivalent to `--log-level debug`).
    #[arg(short = 'd', long, global = true)]
    pub debug: bool,

    /// Set log level: quiet, normal, info, debug.
    #[arg(long, global = true, value_parser = parse_log_level)]
    pub log_level: Option<LogLevel>,

    /// Emit logs in structured JSON.
    #[arg(long, global = true)]
    pub json: bool,

    /// Copy timestamps and permission bits on local copies.
    #[arg(long, global = true)]
    pub preserve_metadata: bool,

    /// Print the config file location and exit.
    #[arg(long)]
    pub print_config: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Copy a file into a folder.
    CopyFile(FileArgs),
    /// Move a file into a folder.
    MoveFile(MoveFileArgs),
    /// Copy a folder into a parent folder.
    CopyFolder(FolderArgs),
    /// Move a folder into a parent folder.
    MoveFolder(MoveFolderArgs),
    /// Rename a folder in place.
    RenameFolder(RenameArgs),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct FileArgs {
    /// Source file, `<uid>:<identifier>`.
    pub source: ResourceLocation,
    /// Target folder, `<uid>:<identifier>`.
    pub target: ResourceLocation,
    /// Name at the target (defaults to the source name).
    #[arg(long)]
    pub name: Option<String>,
    /// Conflict policy: cancel, renameNewFile.
    #[arg(long, value_parser = parse_conflict)]
    pub conflict: Option<ConflictMode>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct MoveFileArgs {
    #[command(flatten)]
    pub file: FileArgs,
    /// Leave the source where it is.
    #[arg(long)]
    pub keep_original: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct FolderArgs {
    /// Source folder, `<uid>:<identifier>`.
    pub source: ResourceLocation,
    /// Parent folder at the target, `<uid>:<identifier>`.
    pub target: ResourceLocation,
    /// Folder name at the target (defaults to the source name).
    #[arg(long)]
    pub name: Option<String>,
    /// Conflict policy: cancel, renameNewFile, renameNewFolder, integrate.
    #[arg(long, value_parser = parse_conflict)]
    pub conflict: Option<ConflictMode>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct MoveFolderArgs {
    #[command(flatten)]
    pub folder: FolderArgs,
    /// Leave the source where it is.
    #[arg(long)]
    pub keep_original: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RenameArgs {
    /// Folder to rename, `<uid>:<identifier>`.
    pub folder: ResourceLocation,
    /// New folder name.
    pub new_name: String,
}

/// `<storage-uid>:<identifier>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLocation {
    pub storage: u32,
    pub identifier: String,
}

impl FromStr for ResourceLocation {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (uid, id) = s
            .split_once(':')
            .ok_or_else(|| format!("expected <storage-uid>:<identifier>, got '{s}'"))?;
        let storage = uid
            .trim()
            .parse::<u32>()
            .map_err(|_| format!("invalid storage uid '{uid}'"))?;
        let id = id.trim();
        let identifier = if id.is_empty() { "/".to_string() } else { id.to_string() };
        Ok(Self { storage, identifier })
    }
}

impl fmt::Display for ResourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.storage, self.identifier)
    }
}

fn parse_conflict(s: &str) -> Result<ConflictMode, String> {
    s.parse::<ConflictMode>().map_err(|e| e.to_string())
}

fn parse_log_level(s: &str) -> Result<LogLevel, String> {
    s.parse::<LogLevel>()
}

impl Args {
    /// Precedence: --debug > --log-level > None (use config).
    pub fn effective_log_level(&self) -> Option<LogLevel> {
        if self.debug {
            return Some(LogLevel::Debug);
        }
        self.log_level.clone()
    }
}

pub fn parse() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_resource_locations() {
        let loc: ResourceLocation = "2:/photos/a.jpg".parse().unwrap();
        assert_eq!(loc, ResourceLocation { storage: 2, identifier: "/photos/a.jpg".into() });
        let root: ResourceLocation = "1:".parse().unwrap();
        assert_eq!(root.identifier, "/");
        assert!("photos/a.jpg".parse::<ResourceLocation>().is_err());
        assert!("x:/a".parse::<ResourceLocation>().is_err());
    }

    #[test]
    fn move_file_flags() {
        let args = Args::try_parse_from([
            "relocator",
            "-d",
            "move-file",
            "1:/a.txt",
            "2:/in/",
            "--conflict",
            "cancel",
            "--keep-original",
        ])
        .unwrap();
        assert_eq!(args.effective_log_level(), Some(LogLevel::Debug));
        match args.command {
            Some(Command::MoveFile(m)) => {
                assert!(m.keep_original);
                assert_eq!(m.file.conflict, Some(ConflictMode::Cancel));
                assert_eq!(m.file.target.storage, 2);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_conflict_is_rejected() {
        let res = Args::try_parse_from(["relocator", "copy-file", "1:/a", "1:/b/", "--conflict", "overwrite"]);
        assert!(res.is_err());
    }
}
