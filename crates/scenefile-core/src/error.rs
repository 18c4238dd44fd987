//! Unified error handling for the scenefile exporter
//!
//! Every failure is fatal to the export that raised it. The variants are
//! grouped the way callers need to tell them apart: precondition failures,
//! missing scene dependencies, format failures, external tool failures and
//! plain I/O.

use std::path::PathBuf;
use thiserror::Error;

use crate::types::DataBlockKind;

/// Unified error type for all scenefile operations
#[derive(Error, Debug)]
pub enum Error {
    // ==================== I/O Errors ====================

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Copying an asset into the export directory failed
    #[error("Failed to copy {from} to {to}: {source}")]
    CopyFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ==================== Precondition Errors ====================

    /// The export target already exists
    #[error("Already exists {0}")]
    OutputExists(PathBuf),

    /// The collection to export is not part of the document
    #[error("Collection not found: {name}")]
    CollectionNotFound {
        name: String,
    },

    // ==================== Missing Dependency Errors ====================

    /// A named data-block is referenced but not present in the document
    #[error("{kind} not found: {name}")]
    DataBlockNotFound {
        kind: DataBlockKind,
        name: String,
    },

    /// A mesh object has no material in its first slot
    #[error("{object} - Material slot is empty")]
    MissingMaterial {
        object: String,
    },

    /// A required node is absent from a node tree
    #[error("{owner} - {node} Node is missing")]
    MissingNode {
        owner: String,
        node: String,
    },

    /// A required socket link is absent
    #[error("{owner} - {slot} Node is missing")]
    MissingLink {
        owner: String,
        slot: String,
    },

    /// A texture node does not reference an image
    #[error("{owner} - {slot} Texture is None")]
    MissingImage {
        owner: String,
        slot: String,
    },

    /// The world used for the sky does not exist
    #[error("World not found: {name}")]
    WorldNotFound {
        name: String,
    },

    /// A mesh with faces has no active UV layer
    #[error("{mesh} - active UV layer is missing")]
    MissingUvLayer {
        mesh: String,
    },

    // ==================== Format Errors ====================

    /// The environment texture is not an OpenEXR file
    #[error("Environment Texture must be .exr format: {path}")]
    UnsupportedSkyFormat {
        path: PathBuf,
    },

    /// Mesh topology cannot be serialized
    #[error("Invalid mesh {mesh}: {message}")]
    InvalidMesh {
        mesh: String,
        message: String,
    },

    /// The scene document is malformed
    #[error("Invalid scene document: {message}")]
    InvalidDocument {
        message: String,
    },

    /// A scenefile could not be read back
    #[error("Parse error at line {line}: {message}")]
    Parse {
        line: usize,
        message: String,
    },

    // ==================== External Tool Errors ====================

    /// An IBL baking tool could not be started
    #[error("Failed to launch {tool}: {source}")]
    IblToolLaunch {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// An IBL baking tool exited unsuccessfully
    #[error("{tool} exited with {status}")]
    IblToolFailed {
        tool: String,
        status: String,
    },

    // ==================== Configuration Errors ====================

    /// Invalid configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        message: String,
    },

    // ==================== General Errors ====================

    /// Custom error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

/// Result type using the unified Error
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an error with additional context
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Error::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Create an invalid document error
    pub fn invalid_document(message: impl Into<String>) -> Self {
        Error::InvalidDocument {
            message: message.into(),
        }
    }

    /// Create a missing data-block error
    pub fn not_found(kind: DataBlockKind, name: impl Into<String>) -> Self {
        Error::DataBlockNotFound {
            kind,
            name: name.into(),
        }
    }

    /// Create a scenefile parse error
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            line,
            message: message.into(),
        }
    }

    /// Innermost error, looking through context wrappers
    pub fn root(&self) -> &Error {
        match self {
            Error::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// Check if the export was refused before any scene data was read
    pub fn is_precondition(&self) -> bool {
        matches!(
            self.root(),
            Error::OutputExists(_) | Error::CollectionNotFound { .. }
        )
    }

    /// Check if a required scene dependency was absent
    pub fn is_missing_dependency(&self) -> bool {
        matches!(
            self.root(),
            Error::DataBlockNotFound { .. }
                | Error::MissingMaterial { .. }
                | Error::MissingNode { .. }
                | Error::MissingLink { .. }
                | Error::MissingImage { .. }
                | Error::WorldNotFound { .. }
                | Error::MissingUvLayer { .. }
        )
    }

    /// Check if this is a format error
    pub fn is_format_error(&self) -> bool {
        matches!(
            self.root(),
            Error::UnsupportedSkyFormat { .. }
                | Error::InvalidMesh { .. }
                | Error::InvalidDocument { .. }
                | Error::Parse { .. }
        )
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}
