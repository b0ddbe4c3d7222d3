//! Error types for dagport.
//!
//! Three kinds of failure are raised on misuse of the aggregation layer
//! (validation, empty project, structural); the rest wrap I/O and
//! serialization failures from rendering and manifest loading.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for dagport operations.
pub type Result<T> = std::result::Result<T, Error>;

/// dagport error types.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed entity, or a value of the wrong kind handed to an add-operation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// `render` called on a project without workflows.
    #[error("No workflows to render")]
    EmptyProject,

    /// The dependency walk went deeper than the configured bound.
    #[error("Structural error: dependency walk exceeded depth {limit} at '{path}'")]
    Structural { limit: usize, path: String },

    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for a [`Error::Validation`] with a formatted message.
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    /// Wraps an I/O error with the path it happened at.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Stable error code, suitable for scripts wrapping the CLI.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Validation(_) => "VALIDATION_ERROR",
            Error::EmptyProject => "EMPTY_PROJECT_ERROR",
            Error::Structural { .. } => "STRUCTURAL_ERROR",
            Error::Io { .. } => "IO_ERROR",
            Error::Yaml(_) => "YAML_ERROR",
            Error::Json(_) => "JSON_ERROR",
        }
    }
}

/// Checks that an identity field is present, returning it trimmed.
pub(crate) fn require_key(entity: &str, field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::validation(format!(
            "{} requires a non-empty '{}'",
            entity, field
        )));
    }
    Ok(trimmed.to_string())
}

/// Checks that a path is relative and stays below the directory it is joined to.
pub(crate) fn require_relative_path(entity: &str, path: &str) -> Result<()> {
    use std::path::{Component, Path};

    if path.trim().is_empty() {
        return Err(Error::validation(format!("{} requires a file path", entity)));
    }

    for component in Path::new(path).components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            _ => {
                return Err(Error::validation(format!(
                    "{} path '{}' must be relative and may not leave the output directory",
                    entity, path
                )))
            }
        }
    }
    Ok(())
}
