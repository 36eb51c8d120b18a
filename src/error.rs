//! Errors reported while resolving devices and building hwdb entries

use std::{io, path::PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No event node with this name exists
    #[error("{0}: no such input device")]
    DeviceNotFound(String),
    /// The device exists, but lacks what is needed for a match string
    #[error("{device}: device has no {missing}")]
    IncompleteDeviceInfo {
        device: String,
        missing: &'static str,
    },
    /// A `<hex>=<name>` argument could not be parsed
    #[error("‘{arg}’: {reason}")]
    InvalidMappingSyntax { arg: String, reason: String },
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{}: {reason}", path.display())]
    Keymap { path: PathBuf, reason: String },
    #[error("{0}")]
    Parse(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn mapping(arg: &str, reason: impl Into<String>) -> Self {
        Error::InvalidMappingSyntax {
            arg: arg.to_owned(),
            reason: reason.into(),
        }
    }

    /// Exit code for the command line: usage errors get 2, everything else 1
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidMappingSyntax { .. } | Error::Keymap { .. } => 2,
            _ => 1,
        }
    }
}
