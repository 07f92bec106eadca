use std::{io, process::ExitStatus};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Rejected before any subprocess is started.
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr}")]
    ToolFailed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("malformed alignment output {output:?}: {reason}")]
    MalformedOutput { output: String, reason: String },

    #[error("no usable alignment result after {attempts} attempts")]
    RetriesExhausted { attempts: usize },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("plotting failed: {0}")]
    Plot(String),
}

pub type Result<T> = std::result::Result<T, Error>;
