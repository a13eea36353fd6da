// SPDX-License-Identifier: MIT
use std::{io, path::PathBuf};
use thiserror::Error;

/// Errors raised while dumping binary data or resolving structure information.
///
/// A short final chunk is not an error. It is padded by the line formatter.
#[derive(Debug, Error)]
pub enum DumpError {
    /// The input file or handle does not exist.
    #[error("{}: I couldn't find this file", .0.display())]
    SourceNotFound(PathBuf),

    /// Text was passed where raw bytes are expected.
    #[error("Abstract unicode data (expected bytes sequence)")]
    UnsupportedInputType,

    /// The structure description file does not exist.
    #[error("Config File not present! ({})", .0.display())]
    ConfigMissing(PathBuf),

    /// The structure description file could not be parsed.
    #[error("Invalid config file {}: {message}", .path.display())]
    InvalidConfig { path: PathBuf, message: String },

    /// A section or key is absent from the structure description.
    #[error("Missing config value [{section}] {key}")]
    MissingConfigValue { section: String, key: String },

    /// A value of the structure description has an unexpected format.
    #[error("Invalid config value [{section}] {key} = {value}")]
    InvalidConfigValue {
        section: String,
        key: String,
        value: String,
    },

    #[error("Invalid hex group width {0} (must be at least 1)")]
    InvalidGroupWidth(usize),

    #[error("Invalid chunk size 0")]
    InvalidChunkSize,

    #[error("Invalid hex text: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, DumpError>;
