//! Configuration loading and lookup.

mod builder;
mod env;
mod error;
mod eval;
mod file;
mod resolve;
mod source;
mod typed;

pub use builder::ConfigBuilder;
pub use env::EnvVars;
pub use error::{ConfigError, PathError};
pub use eval::{EnvEvaluator, Evaluator, EvaluatorRegistry, FnEvaluator};
pub use file::Format;
pub use resolve::{KeyPath, Segment};
pub use source::MergePolicy;

use crate::node::{Mapping, Node};

/// A read-only configuration namespace.
///
/// Built once by [`Config::builder`] or [`Config::open`] and never mutated
/// afterwards, so a `Config` can be shared across threads freely. Every read
/// walks the key path from the root; string leaves go through the registered
/// evaluators on the way out.
#[derive(Debug)]
pub struct Config {
    namespace: Mapping,
    evaluators: EvaluatorRegistry,
}

impl Config {
    fn new(namespace: Mapping, evaluators: EvaluatorRegistry) -> Self {
        Self {
            namespace,
            evaluators,
        }
    }

    /// The merged root mapping, before any evaluation.
    pub fn namespace(&self) -> &Mapping {
        &self.namespace
    }

    pub fn evaluators(&self) -> &EvaluatorRegistry {
        &self.evaluators
    }

    /// Resolves `key` and evaluates a string result.
    ///
    /// `Ok(None)` means the key is absent. Malformed indexes and shape
    /// mismatches along the path are returned as errors.
    pub fn resolve(&self, key: &str) -> Result<Option<Node>, PathError> {
        self.resolve_with(key, Node::Null)
    }

    fn resolve_with(&self, key: &str, default: Node) -> Result<Option<Node>, PathError> {
        let path: KeyPath = key.parse()?;
        let node = match resolve::resolve(&self.namespace, &path)? {
            Some(Node::String(s)) => self.evaluators.evaluate(s.clone(), default),
            Some(node) => node.clone(),
            None => return Ok(None),
        };
        Ok(Some(node))
    }

    /// Returns the value at `key`, or `default` if it is absent or the path is invalid.
    ///
    /// `default` is also what an evaluator falls back to when it has nothing better.
    pub fn get(&self, key: &str, default: Node) -> Node {
        match self.resolve_with(key, default.clone()) {
            Ok(Some(node)) => node,
            Ok(None) => default,
            Err(err) => {
                tracing::debug!(key, error = %err, "invalid key path, using default");
                default
            }
        }
    }

    /// Returns true if `key` resolves to a non-null value after evaluation.
    pub fn is_set(&self, key: &str) -> bool {
        !self.get(key, Node::Null).is_null()
    }
}
