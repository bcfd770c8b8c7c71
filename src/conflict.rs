//! Conflict policies.
//!
//! Policy:
//! - Cancel: fail with `TargetExists` when the target name is taken.
//! - RenameNewFile: pick a unique name for the incoming file (`name_01.ext`, ...).
//! - RenameNewFolder: pick a unique name for the incoming folder.
//! - Integrate: merge the incoming folder into the existing one, entry by entry.
//!
//! Unknown policy strings are rejected here, at the API boundary.

use std::fmt;
use std::str::FromStr;

use crate::errors::RelocationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictMode {
    Cancel,
    RenameNewFile,
    RenameNewFolder,
    Integrate,
}

impl ConflictMode {
    /// Default policy for file copies and moves.
    pub const FILE_DEFAULT: ConflictMode = ConflictMode::RenameNewFile;
    /// Default policy for folder copies and moves.
    pub const FOLDER_DEFAULT: ConflictMode = ConflictMode::Integrate;

    /// Parse common spellings (camelCase, snake_case, kebab-case; case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "cancel" => Some(ConflictMode::Cancel),
            "renamenewfile" | "rename" => Some(ConflictMode::RenameNewFile),
            "renamenewfolder" => Some(ConflictMode::RenameNewFolder),
            "integrate" | "merge" => Some(ConflictMode::Integrate),
            _ => None,
        }
    }

    /// Whether a file-level collision under this policy aborts the operation.
    ///
    /// Folder-only policies reach file operations through tree integration; there
    /// they pick a fresh name so an existing file is never overwritten.
    pub(crate) fn cancels_on_file_collision(self) -> bool {
        matches!(self, ConflictMode::Cancel)
    }
}

impl fmt::Display for ConflictMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConflictMode::Cancel => "cancel",
            ConflictMode::RenameNewFile => "renameNewFile",
            ConflictMode::RenameNewFolder => "renameNewFolder",
            ConflictMode::Integrate => "integrate",
        };
        f.write_str(s)
    }
}

impl FromStr for ConflictMode {
    type Err = RelocationError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
            .ok_or_else(|| RelocationError::invalid(format!("unsupported conflict mode '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_original_spellings() {
        assert_eq!("cancel".parse::<ConflictMode>().unwrap(), ConflictMode::Cancel);
        assert_eq!("renameNewFile".parse::<ConflictMode>().unwrap(), ConflictMode::RenameNewFile);
        assert_eq!("renameNewFolder".parse::<ConflictMode>().unwrap(), ConflictMode::RenameNewFolder);
        assert_eq!("integrate".parse::<ConflictMode>().unwrap(), ConflictMode::Integrate);
    }

    #[test]
    fn parses_cli_friendly_spellings() {
        assert_eq!(ConflictMode::parse("rename-new-file"), Some(ConflictMode::RenameNewFile));
        assert_eq!(ConflictMode::parse("RENAME_NEW_FOLDER"), Some(ConflictMode::RenameNewFolder));
        assert_eq!(ConflictMode::parse(" Integrate "), Some(ConflictMode::Integrate));
    }

    #[test]
    fn rejects_unknown_policy() {
        let err = "overwrite".parse::<ConflictMode>().unwrap_err();
        assert!(matches!(err, RelocationError::InvalidOperation(_)));
        assert!(err.to_string().contains("unsupported conflict mode"));
    }

    #[test]
    fn display_round_trips_through_parse() {
        for mode in [
            ConflictMode::Cancel,
            ConflictMode::RenameNewFile,
            ConflictMode::RenameNewFolder,
            ConflictMode::Integrate,
        ] {
            assert_eq!(ConflictMode::parse(&mode.to_string()), Some(mode));
        }
    }
}
