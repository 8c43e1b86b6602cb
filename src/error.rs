use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DotnetGetError {
    #[error("invalid repository source: {0}")]
    InvalidSource(String),

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("error cloning repository {url}: {message}")]
    Clone { url: String, message: String },

    #[error("couldn't find any tools in repository ({})", root.display())]
    NoToolsFound { root: PathBuf },

    #[error("invalid input: {0}")]
    InvalidSelection(String),

    #[error("failed to build {tool}: {message}")]
    Build { tool: String, message: String },

    #[error("failed to install {tool}: {message}")]
    Install { tool: String, message: String },

    #[error("failed to remove previously installed {tool}: {message}")]
    Uninstall { tool: String, message: String },

    #[error("error deleting cloned repository {}: {source}", path.display())]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DotnetGetError {
    /// Process exit code for a fatal error reaching the top-level handler.
    pub fn exit_code(&self) -> u8 {
        match self {
            DotnetGetError::InvalidSource(_) | DotnetGetError::InvalidSelection(_) => 2,
            _ => 1,
        }
    }
}
