//! Folding a directory of documents into one namespace.
//!
//! A document at `<root>/db/replicas/eu.hjson` is reachable as
//! `db.replicas.eu.<field>`: its mapping is wrapped once per relative path
//! segment and merged into the root under the first one.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::file::{load_document, Format};
use super::ConfigError;
use crate::node::{Mapping, Node};

/// Directories with this name are skipped unless test mode is on.
pub const TEST_DIR: &str = "test";

/// How a folded document is combined with what is already in the namespace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MergePolicy {
    /// Later documents replace the whole value at a colliding root key.
    #[default]
    Replace,
    /// Mappings merge recursively; anything else, sequences included, is replaced.
    Deep,
}

/// One parsed document and the key path it contributes under.
#[derive(Debug, Clone)]
pub struct Document {
    pub path: Vec<String>,
    pub value: Mapping,
}

impl Document {
    /// Wraps the document in single-key mappings for every segment after the first.
    ///
    /// Returns the outermost key and the wrapped value.
    fn fold(self) -> Option<(String, Node)> {
        let mut segments = self.path.into_iter();
        let first = segments.next()?;
        let value = segments
            .rev()
            .fold(Node::Mapping(self.value), |inner, key| {
                Node::Mapping(Mapping::from([(key, inner)]))
            });
        Some((first, value))
    }
}

/// Lists recognized document files under `root` in sorted, deterministic order.
pub fn scan(root: &Path, test_mode: bool) -> Result<Vec<(PathBuf, Format)>, ConfigError> {
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            test_mode
                || entry.depth() == 0
                || !entry.file_type().is_dir()
                || entry.file_name() != TEST_DIR
        });

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(format) = Format::from_path(entry.path()) {
            files.push((entry.into_path(), format));
        }
    }
    Ok(files)
}

/// Loads `file` and derives its key path relative to `root`.
pub fn load(root: &Path, file: &Path, format: Format) -> Result<Document, ConfigError> {
    let invalid_name = || ConfigError::InvalidFileName(file.to_path_buf());

    let relative = file.strip_prefix(root).map_err(|_| invalid_name())?;
    let mut path = Vec::new();
    if let Some(parent) = relative.parent() {
        for component in parent.iter() {
            path.push(component.to_str().ok_or_else(invalid_name)?.to_string());
        }
    }
    let stem = file
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(invalid_name)?;
    path.push(stem.to_string());

    let value = load_document(file, format)?;
    tracing::debug!(file = %file.display(), key = %path.join("."), "loaded config document");
    Ok(Document { path, value })
}

/// Merges a document into the namespace according to `policy`.
pub fn merge(root: &mut Mapping, document: Document, policy: MergePolicy) {
    match policy {
        MergePolicy::Replace => {
            if let Some((key, value)) = document.fold() {
                root.insert(key, value);
            }
        }
        MergePolicy::Deep => merge_at_path(root, &document.path, Node::Mapping(document.value)),
    }
}

fn merge_at_path(table: &mut Mapping, path: &[String], value: Node) {
    let Some((first, rest)) = path.split_first() else {
        if let Node::Mapping(overlay) = value {
            deep_merge(table, overlay);
        }
        return;
    };

    if rest.is_empty() {
        match (table.get_mut(first), value) {
            (Some(Node::Mapping(base)), Node::Mapping(overlay)) => deep_merge(base, overlay),
            (_, value) => {
                table.insert(first.clone(), value);
            }
        }
        return;
    }

    if !matches!(table.get(first), Some(Node::Mapping(_))) {
        table.insert(first.clone(), Node::Mapping(Mapping::new()));
    }

    if let Some(Node::Mapping(nested)) = table.get_mut(first) {
        merge_at_path(nested, rest, value);
    }
}

fn deep_merge(base: &mut Mapping, overlay: Mapping) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(Node::Mapping(base_map)), Node::Mapping(overlay_map)) => {
                deep_merge(base_map, overlay_map);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_support::write;
    use tempfile::TempDir;

    fn mapping(json: &str) -> Mapping {
        match serde_json::from_str::<Node>(json).unwrap() {
            Node::Mapping(map) => map,
            other => panic!("expected mapping, got {other:?}"),
        }
    }

    #[test]
    fn test_fold_wraps_inner_segments() {
        let document = Document {
            path: vec!["dir".into(), "inner".into(), "inside".into()],
            value: mapping(r#"{"value": "x"}"#),
        };
        let (key, value) = document.fold().unwrap();
        assert_eq!(key, "dir");
        assert_eq!(value.to_string(), r#"{"inner":{"inside":{"value":"x"}}}"#);
    }

    #[test]
    fn test_scan_is_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "b.json", "{}");
        write(dir.path(), "a.hjson", "{}");
        write(dir.path(), "notes.txt", "ignored");
        write(dir.path(), ".env", "A=1");
        write(dir.path(), "nested/c.toml", "");

        let files: Vec<_> = scan(dir.path(), false)
            .unwrap()
            .into_iter()
            .map(|(path, _)| path.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            files,
            vec![
                PathBuf::from("a.hjson"),
                PathBuf::from("b.json"),
                PathBuf::from("nested/c.toml"),
            ]
        );
    }

    #[test]
    fn test_scan_skips_test_dirs_outside_test_mode() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "app.json", "{}");
        write(dir.path(), "test/fixture.json", "{}");
        write(dir.path(), "nested/test/deep.json", "{}");

        assert_eq!(scan(dir.path(), false).unwrap().len(), 1);
        assert_eq!(scan(dir.path(), true).unwrap().len(), 3);
    }

    #[test]
    fn test_scan_missing_root_is_an_error() {
        let result = scan(Path::new("/nonexistent/treeconf/root"), false);
        assert!(matches!(result, Err(ConfigError::Walk(_))));
    }

    #[test]
    fn test_load_derives_key_path() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "dir/inner/inside.json", r#"{"value": 1}"#);

        let file = dir.path().join("dir/inner/inside.json");
        let document = load(dir.path(), &file, Format::Json).unwrap();
        assert_eq!(document.path, vec!["dir", "inner", "inside"]);
    }

    #[test]
    fn test_replace_policy_is_last_write_wins() {
        let mut root = Mapping::new();
        let first = Document {
            path: vec!["dir".into(), "a".into()],
            value: mapping(r#"{"x": 1}"#),
        };
        let second = Document {
            path: vec!["dir".into(), "b".into()],
            value: mapping(r#"{"y": 2}"#),
        };
        merge(&mut root, first, MergePolicy::Replace);
        merge(&mut root, second, MergePolicy::Replace);

        assert_eq!(Node::Mapping(root).to_string(), r#"{"dir":{"b":{"y":2}}}"#);
    }

    #[test]
    fn test_deep_policy_keeps_siblings() {
        let mut root = Mapping::new();
        let first = Document {
            path: vec!["dir".into(), "a".into()],
            value: mapping(r#"{"x": 1, "list": [1, 2]}"#),
        };
        let second = Document {
            path: vec!["dir".into(), "b".into()],
            value: mapping(r#"{"y": 2}"#),
        };
        let third = Document {
            path: vec!["dir".into(), "a".into()],
            value: mapping(r#"{"list": [3]}"#),
        };
        merge(&mut root, first, MergePolicy::Deep);
        merge(&mut root, second, MergePolicy::Deep);
        merge(&mut root, third, MergePolicy::Deep);

        assert_eq!(
            Node::Mapping(root).to_string(),
            r#"{"dir":{"a":{"list":[3],"x":1},"b":{"y":2}}}"#
        );
    }
}
