//! Parsing one document file into a [`Mapping`].

use std::path::Path;

use super::ConfigError;
use crate::node::{Mapping, Node};

/// Document formats recognized by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Permissive JSON superset: comments, unquoted keys, trailing commas.
    ///
    /// A quoteless value that is not exactly a number or keyword is a string
    /// running to the end of the line, so `10.0.0.1` stays text.
    Hjson,
    Json,
    Toml,
}

impl Format {
    /// Returns `None` for files the scanner should skip.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "hjson" => Some(Format::Hjson),
            "json" => Some(Format::Json),
            "toml" => Some(Format::Toml),
            _ => None,
        }
    }

    fn parse(self, path: &Path, contents: &str) -> Result<Node, ConfigError> {
        match self {
            Format::Hjson => {
                nu_json::from_str(contents).map_err(|e| ConfigError::HjsonParse {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
            Format::Json => serde_json::from_str(contents).map_err(|e| ConfigError::JsonParse {
                path: path.to_path_buf(),
                source: e,
            }),
            Format::Toml => toml::from_str::<toml::Table>(contents)
                .map(|table| Node::from(toml::Value::Table(table)))
                .map_err(|e| ConfigError::TomlParse {
                    path: path.to_path_buf(),
                    source: e,
                }),
        }
    }
}

/// Reads and parses a document. Its top level must be a mapping.
pub fn load_document(path: &Path, format: Format) -> Result<Mapping, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    match format.parse(path, &contents)? {
        Node::Mapping(map) => Ok(map),
        _ => Err(ConfigError::NotAMapping(path.to_path_buf())),
    }
}
