//! Environment-file loading and the ambient variable lookup.
//!
//! Variables read from `.env` files are kept in the handle rather than
//! exported into the process environment.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::ConfigError;

const ENV_FILE: &str = ".env";
const ENV_TEST_FILE: &str = ".env.test";

/// Ambient variables visible to the `env` evaluator.
///
/// Lookup order: test overrides, then the process environment, then `.env`.
#[derive(Debug, Clone, Default)]
pub struct EnvVars {
    file: HashMap<String, String>,
    overrides: HashMap<String, String>,
}

impl EnvVars {
    /// Process environment only.
    pub fn process() -> Self {
        Self::default()
    }

    /// Loads `<dir>/.env`, and `<dir>/.env.test` as overrides when `test_mode` is set.
    pub fn load(dir: &Path, test_mode: bool) -> Result<Self, ConfigError> {
        let file = read_env_file(&dir.join(ENV_FILE))?;
        let overrides = if test_mode {
            read_env_file(&dir.join(ENV_TEST_FILE))?
        } else {
            HashMap::new()
        };
        Ok(Self { file, overrides })
    }

    /// Returns the raw value of `name`, if set anywhere.
    pub fn var(&self, name: &str) -> Option<String> {
        if name.is_empty() || name.contains(['=', '\0']) {
            return None;
        }
        if let Some(value) = self.overrides.get(name) {
            return Some(value.clone());
        }
        if let Ok(value) = std::env::var(name) {
            return Some(value);
        }
        self.file.get(name).cloned()
    }

    #[cfg(test)]
    pub(crate) fn from_tables(
        file: HashMap<String, String>,
        overrides: HashMap<String, String>,
    ) -> Self {
        Self { file, overrides }
    }
}

fn read_env_file(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    let env_error = |source| ConfigError::EnvFile {
        path: PathBuf::from(path),
        source,
    };

    let vars = dotenvy::from_path_iter(path)
        .map_err(env_error)?
        .collect::<Result<HashMap<_, _>, _>>()
        .map_err(env_error)?;

    tracing::debug!(path = %path.display(), count = vars.len(), "loaded env file");
    Ok(vars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_env_file() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(".env"),
            "TREECONF_ENV_LOAD_HOST=testhost\nTREECONF_ENV_LOAD_PORT=2020\n",
        )
        .unwrap();

        let vars = EnvVars::load(dir.path(), false).unwrap();
        assert_eq!(vars.var("TREECONF_ENV_LOAD_HOST").as_deref(), Some("testhost"));
        assert_eq!(vars.var("TREECONF_ENV_LOAD_PORT").as_deref(), Some("2020"));
        assert_eq!(vars.var("TREECONF_ENV_LOAD_MISSING"), None);
    }

    #[test]
    fn test_test_mode_overrides_env_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".env"), "TREECONF_ENV_OVERRIDE=plain\n").unwrap();
        fs::write(dir.path().join(".env.test"), "TREECONF_ENV_OVERRIDE=TEST\n").unwrap();

        let vars = EnvVars::load(dir.path(), false).unwrap();
        assert_eq!(vars.var("TREECONF_ENV_OVERRIDE").as_deref(), Some("plain"));

        let vars = EnvVars::load(dir.path(), true).unwrap();
        assert_eq!(vars.var("TREECONF_ENV_OVERRIDE").as_deref(), Some("TEST"));
    }

    #[test]
    fn test_process_env_wins_over_env_file() {
        std::env::set_var("TREECONF_ENV_PRECEDENCE", "from-process");
        let vars = EnvVars::from_tables(
            HashMap::from([("TREECONF_ENV_PRECEDENCE".into(), "from-file".into())]),
            HashMap::new(),
        );
        assert_eq!(
            vars.var("TREECONF_ENV_PRECEDENCE").as_deref(),
            Some("from-process")
        );
        std::env::remove_var("TREECONF_ENV_PRECEDENCE");
    }

    #[test]
    fn test_missing_env_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = EnvVars::load(dir.path(), false);
        assert!(matches!(result, Err(ConfigError::EnvFile { .. })));
    }

    #[test]
    fn test_missing_test_override_file_is_an_error_in_test_mode() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".env"), "A=1\n").unwrap();
        assert!(EnvVars::load(dir.path(), false).is_ok());
        assert!(matches!(
            EnvVars::load(dir.path(), true),
            Err(ConfigError::EnvFile { .. })
        ));
    }
}
