//! Typed error definitions for relocator.
//! One variant per failure mode the engine can surface; drivers report plain
//! `io::Error`s which are wrapped into `Backend` with an actionable message.

use std::io;
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T, E = RelocationError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum RelocationError {
    /// Policy `cancel` met an existing file or folder of the same name.
    #[error("Target '{name}' already exists in folder '{folder}'")]
    TargetExists { name: String, folder: String },

    /// Identical source/target, empty name, unsupported policy and similar misuse.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// A move was attempted on a handle that cannot be relocated.
    #[error("Resource '{identifier}' of kind {kind} does not support relocation")]
    UnsupportedResourceType { identifier: String, kind: &'static str },

    /// Every numbered candidate and the random fallback are taken.
    #[error("No free name left in folder '{folder}'; last candidate '{last_candidate}' is already taken")]
    NamespaceExhausted { folder: String, last_candidate: String },

    #[error("Permission denied on '{identifier}': {context}")]
    PermissionDenied { identifier: String, context: String },

    /// Any failure reported by a storage driver.
    #[error("{message}")]
    Backend {
        message: String,
        #[source]
        source: io::Error,
    },

    /// Rehydration miss: the catalog has no record and the backend has no file.
    #[error("Resource '{identifier}' not found in storage {storage}")]
    NotFound { storage: u32, identifier: String },
}

impl RelocationError {
    /// Stable numeric code for logs and process exit status.
    pub fn code(&self) -> i32 {
        match self {
            RelocationError::TargetExists { .. } => 10,
            RelocationError::InvalidOperation(_) => 11,
            RelocationError::UnsupportedResourceType { .. } => 12,
            RelocationError::NamespaceExhausted { .. } => 13,
            RelocationError::PermissionDenied { .. } => 14,
            RelocationError::Backend { .. } => 15,
            RelocationError::NotFound { .. } => 16,
        }
    }

    /// Short machine-friendly kind, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            RelocationError::TargetExists { .. } => "target_exists",
            RelocationError::InvalidOperation(_) => "invalid_operation",
            RelocationError::UnsupportedResourceType { .. } => "unsupported_resource_type",
            RelocationError::NamespaceExhausted { .. } => "namespace_exhausted",
            RelocationError::PermissionDenied { .. } => "permission_denied",
            RelocationError::Backend { .. } => "backend",
            RelocationError::NotFound { .. } => "not_found",
        }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        RelocationError::InvalidOperation(msg.into())
    }

    pub(crate) fn not_found(storage: u32, identifier: impl Into<String>) -> Self {
        RelocationError::NotFound {
            storage,
            identifier: identifier.into(),
        }
    }
}
