use std::path::PathBuf;
use thiserror::Error;

/// Failure while assembling the namespace. No handle is produced.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("failed to scan config directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse hjson file '{path}': {source}")]
    HjsonParse {
        path: PathBuf,
        source: nu_json::Error,
    },

    #[error("failed to parse json file '{path}': {source}")]
    JsonParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to parse toml file '{path}': {source}")]
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("config file '{0}' does not contain a mapping at the top level")]
    NotAMapping(PathBuf),

    #[error("config file name is not valid UTF-8: {0}")]
    InvalidFileName(PathBuf),

    #[error("failed to load env file '{path}': {source}")]
    EnvFile {
        path: PathBuf,
        source: dotenvy::Error,
    },
}

/// A key path that cannot be walked through the namespace.
///
/// Absent keys are not errors; these cover malformed indexes and shape mismatches.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum PathError {
    #[error("invalid array index in segment '{0}'")]
    InvalidIndex(String),

    #[error("unclosed array index in segment '{0}' (missing ']')")]
    UnclosedIndex(String),

    #[error("index {index} out of range for '{segment}' of length {len}")]
    IndexOutOfRange {
        segment: String,
        index: usize,
        len: usize,
    },

    #[error("cannot index into '{segment}': expected sequence, found {found}")]
    NotASequence { segment: String, found: &'static str },

    #[error("cannot descend into '{segment}': expected mapping, found {found}")]
    NotAMapping { segment: String, found: &'static str },
}
