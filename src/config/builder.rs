use std::path::{Path, PathBuf};

use super::env::EnvVars;
use super::eval::{EnvEvaluator, Evaluator, EvaluatorRegistry};
use super::source::{self, MergePolicy};
use super::{Config, ConfigError};
use crate::node::Mapping;

/// Builder for assembling a [`Config`] from a directory of documents.
///
/// Every `.hjson`, `.json` and `.toml` file below the root is parsed once at
/// build time. A file's position in the tree decides where it lives in the
/// namespace:
///
/// ```text
/// config/
/// ├── app.hjson             -> app.<field>
/// └── db/
///     └── replicas/
///         └── eu.json       -> db.replicas.eu.<field>
/// ```
///
/// Files are loaded in sorted path order. With the default
/// [`MergePolicy::Replace`], a later file replaces an earlier one at the same
/// top-level key.
///
/// ## Example
///
/// ```no_run
/// use treeconf::{Config, FnEvaluator, Node};
///
/// let config = Config::builder()
///     .with_root("config")
///     .with_env_dir(".")
///     .with_evaluator(Box::new(FnEvaluator::new("upper", |args: &[String], _| {
///         Node::String(args.concat().to_uppercase())
///     })))
///     .build()?;
///
/// let port = config.get_int("app.server.port", 8080);
/// # let _ = port;
/// # Ok::<(), treeconf::ConfigError>(())
/// ```
#[derive(Default)]
#[must_use = "builders do nothing until .build() is called"]
pub struct ConfigBuilder {
    root: PathBuf,
    env_dir: Option<PathBuf>,
    evaluators: Vec<Box<dyn Evaluator>>,
    test_mode: bool,
    merge_policy: MergePolicy,
}

impl ConfigBuilder {
    /// Sets the directory scanned for documents.
    pub fn with_root(mut self, dir: impl AsRef<Path>) -> Self {
        self.root = dir.as_ref().to_path_buf();
        self
    }

    /// Loads `.env` from `dir`. The file must exist.
    ///
    /// In test mode `.env.test` is loaded as well and overrides it.
    pub fn with_env_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.env_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Registers an evaluator. A name already taken, including `env`, is overwritten.
    pub fn with_evaluator(mut self, evaluator: Box<dyn Evaluator>) -> Self {
        self.evaluators.push(evaluator);
        self
    }

    /// Includes `test` directories and loads the `.env.test` override file.
    pub fn test_mode(mut self, enabled: bool) -> Self {
        self.test_mode = enabled;
        self
    }

    pub fn merge_policy(mut self, policy: MergePolicy) -> Self {
        self.merge_policy = policy;
        self
    }

    /// Scans, parses and folds every document, then loads env files.
    ///
    /// Any failure aborts the whole build.
    pub fn build(self) -> Result<Config, ConfigError> {
        let mut namespace = Mapping::new();
        for (file, format) in source::scan(&self.root, self.test_mode)? {
            let document = source::load(&self.root, &file, format)?;
            source::merge(&mut namespace, document, self.merge_policy);
        }

        let vars = match &self.env_dir {
            Some(dir) => EnvVars::load(dir, self.test_mode)?,
            None => EnvVars::process(),
        };

        let mut evaluators = EvaluatorRegistry::new(EnvEvaluator::new(vars));
        for evaluator in self.evaluators {
            evaluators.register(evaluator);
        }

        tracing::info!(
            root = %self.root.display(),
            keys = namespace.len(),
            evaluators = ?evaluators,
            "config namespace assembled"
        );
        Ok(Config::new(namespace, evaluators))
    }
}

impl Config {
    /// Creates a new configuration builder.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Assembles the documents under `root`.
    ///
    /// An empty `env_dir` disables env-file loading.
    pub fn open(
        root: impl AsRef<Path>,
        env_dir: impl AsRef<Path>,
        evaluators: Vec<Box<dyn Evaluator>>,
    ) -> Result<Config, ConfigError> {
        let mut builder = Config::builder().with_root(root);
        let env_dir = env_dir.as_ref();
        if !env_dir.as_os_str().is_empty() {
            builder = builder.with_env_dir(env_dir);
        }
        for evaluator in evaluators {
            builder = builder.with_evaluator(evaluator);
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_support::write;
    use crate::{FnEvaluator, Node};
    use tempfile::TempDir;

    #[test]
    fn test_open_folds_directories() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "app.hjson", "{\n  name: svc\n}");
        write(
            dir.path(),
            "dir/inner/inside.hjson",
            "{\n  value: Nested conf in directories\n}",
        );

        let config = Config::open(dir.path(), "", vec![]).unwrap();
        assert_eq!(config.get_string("app.name", ""), "svc");
        assert_eq!(
            config.get_string("dir.inner.inside.value", "not found"),
            "Nested conf in directories"
        );
    }

    #[test]
    fn test_later_file_wins_at_colliding_root_key() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "dir.json", r#"{"from": "file"}"#);
        write(dir.path(), "dir/inner.json", r#"{"from": "directory"}"#);

        // `dir/` sorts before `dir.json`, so the file is loaded last.
        let config = Config::open(dir.path(), "", vec![]).unwrap();
        assert_eq!(config.get_string("dir.from", ""), "file");
        assert!(!config.is_set("dir.inner.from"));
    }

    #[test]
    fn test_deep_merge_policy_keeps_sibling_files() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "db/primary.json", r#"{"host": "a"}"#);
        write(dir.path(), "db/replica.json", r#"{"host": "b"}"#);

        let config = Config::builder()
            .with_root(dir.path())
            .merge_policy(MergePolicy::Deep)
            .build()
            .unwrap();
        assert_eq!(config.get_string("db.primary.host", ""), "a");
        assert_eq!(config.get_string("db.replica.host", ""), "b");

        let config = Config::open(dir.path(), "", vec![]).unwrap();
        assert!(!config.is_set("db.primary.host"));
        assert_eq!(config.get_string("db.replica.host", ""), "b");
    }

    #[test]
    fn test_test_dirs_only_in_test_mode() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "test/fixture.json", r#"{"on": true}"#);

        let config = Config::open(dir.path(), "", vec![]).unwrap();
        assert!(!config.is_set("test.fixture.on"));

        let config = Config::builder()
            .with_root(dir.path())
            .test_mode(true)
            .build()
            .unwrap();
        assert!(config.get_bool("test.fixture.on", false));
    }

    #[test]
    fn test_invalid_document_aborts_build() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "good.json", r#"{"a": 1}"#);
        write(dir.path(), "bad.json", r#"{"a": "#);

        let result = Config::open(dir.path(), "", vec![]);
        assert!(matches!(result, Err(ConfigError::JsonParse { .. })));
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let result = Config::open("/nonexistent/treeconf/configs", "", vec![]);
        assert!(matches!(result, Err(ConfigError::Walk(_))));
    }

    #[test]
    fn test_missing_env_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "app.json", "{}");

        let result = Config::open(dir.path(), dir.path(), vec![]);
        assert!(matches!(result, Err(ConfigError::EnvFile { .. })));
    }

    #[test]
    fn test_env_files_feed_env_evaluator() {
        let dir = TempDir::new().unwrap();
        let configs = dir.path().join("configs");
        write(
            &configs,
            "evaluators.hjson",
            r#"{
                host: "env(TREECONF_BUILD_HOST, fallback)"
                instance: "env(TREECONF_BUILD_INSTANCE)"
            }"#,
        );
        write(
            dir.path(),
            ".env",
            "TREECONF_BUILD_HOST=testhost\nTREECONF_BUILD_INSTANCE=DEV\n",
        );
        write(dir.path(), ".env.test", "TREECONF_BUILD_INSTANCE=TEST\n");

        let config = Config::open(&configs, dir.path(), vec![]).unwrap();
        assert_eq!(config.get_string("evaluators.host", ""), "testhost");
        assert_eq!(config.get_string("evaluators.instance", ""), "DEV");

        let config = Config::builder()
            .with_root(&configs)
            .with_env_dir(dir.path())
            .test_mode(true)
            .build()
            .unwrap();
        assert_eq!(config.get_string("evaluators.instance", ""), "TEST");
    }

    #[test]
    fn test_caller_evaluators_are_registered() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "e.json", r#"{"joined": "paramsJoin(1,2,3,4,5)"}"#);

        let join = FnEvaluator::new("paramsJoin", |args: &[String], _| {
            Node::String(args.join(":"))
        });
        let evaluators: Vec<Box<dyn Evaluator>> = vec![Box::new(join)];
        let config = Config::open(dir.path(), "", evaluators).unwrap();
        assert!(config.evaluators().contains("env"));
        assert_eq!(config.get_string("e.joined", ""), "1:2:3:4:5");
    }
}
