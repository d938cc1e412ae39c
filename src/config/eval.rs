//! Function-call syntax embedded in string values.
//!
//! A string leaf such as `env(PORT, 8080)` is handed to the evaluator
//! registered under `env` when the leaf is read. The stored tree is never
//! rewritten. There is no escape syntax: a string that does not name a
//! registered evaluator is returned verbatim.

use std::collections::HashMap;
use std::fmt;

use super::env::EnvVars;
use crate::node::Node;

/// Characters stripped from function names and arguments.
const CALL_TRIM: &[char] = &['"', '\'', '\t', ' '];

/// Characters stripped from env values and fallbacks.
const VALUE_TRIM: &[char] = &['"', '\'', ' '];

/// A named function callable from string leaves.
///
/// Implementations must be deterministic and free of side effects, apart from
/// reading ambient state.
pub trait Evaluator: Send + Sync {
    /// Name used to call this evaluator inside config values.
    fn name(&self) -> &str;

    /// Evaluates the call. Return `default` when the arguments cannot produce a value.
    fn eval(&self, args: &[String], default: Node) -> Node;
}

/// Evaluator backed by a closure.
///
/// ```
/// use treeconf::{FnEvaluator, Node};
///
/// let join = FnEvaluator::new("join", |args: &[String], _default: Node| {
///     Node::String(args.join(":"))
/// });
/// # let _ = join;
/// ```
pub struct FnEvaluator<F> {
    name: String,
    func: F,
}

impl<F> FnEvaluator<F>
where
    F: Fn(&[String], Node) -> Node + Send + Sync,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Evaluator for FnEvaluator<F>
where
    F: Fn(&[String], Node) -> Node + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn eval(&self, args: &[String], default: Node) -> Node {
        (self.func)(args, default)
    }
}

/// Built-in `env(NAME[, fallback])`.
///
/// An empty variable counts as unset.
#[derive(Debug, Clone, Default)]
pub struct EnvEvaluator {
    vars: EnvVars,
}

impl EnvEvaluator {
    pub const NAME: &'static str = "env";

    pub fn new(vars: EnvVars) -> Self {
        Self { vars }
    }
}

impl Evaluator for EnvEvaluator {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn eval(&self, args: &[String], default: Node) -> Node {
        let Some(name) = args.first() else {
            return default;
        };

        if let Some(value) = self.vars.var(name).filter(|v| !v.is_empty()) {
            return Node::String(value.trim_matches(VALUE_TRIM).to_string());
        }

        match args.get(1) {
            Some(fallback) => Node::String(fallback.trim_matches(VALUE_TRIM).to_string()),
            None => default,
        }
    }
}

/// Evaluators by name.
pub struct EvaluatorRegistry {
    functions: HashMap<String, Box<dyn Evaluator>>,
}

impl EvaluatorRegistry {
    /// Creates a registry holding only the built-in `env` evaluator.
    pub fn new(env: EnvEvaluator) -> Self {
        let mut registry = Self {
            functions: HashMap::new(),
        };
        registry.register(Box::new(env));
        registry
    }

    /// Adds an evaluator, replacing any existing one with the same name.
    pub fn register(&mut self, evaluator: Box<dyn Evaluator>) {
        let name = evaluator.name().to_string();
        if self.functions.insert(name.clone(), evaluator).is_some() {
            tracing::debug!(function = %name, "evaluator replaced");
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Evaluator> {
        self.functions.get(name).map(Box::as_ref)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Resolves a string leaf: dispatches an embedded call, or returns the string unchanged.
    pub fn evaluate(&self, content: String, default: Node) -> Node {
        let Some((name, args)) = parse_call(&content) else {
            return Node::String(content);
        };

        match self.get(&name) {
            Some(evaluator) => {
                tracing::trace!(function = %name, ?args, "dispatching evaluator");
                evaluator.eval(&args, default)
            }
            None => Node::String(content),
        }
    }

    /// Evaluates every string leaf of `node`, passing Null as the default.
    pub fn evaluate_deep(&self, node: Node) -> Node {
        node.map_strings(&|s| self.evaluate(s, Node::Null))
    }
}

impl fmt::Debug for EvaluatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.functions.keys().collect();
        names.sort();
        f.debug_struct("EvaluatorRegistry")
            .field("functions", &names)
            .finish()
    }
}

/// Splits `name(a, b)` into its trimmed name and arguments.
///
/// Only the first `(` and the first `)` are considered.
fn parse_call(content: &str) -> Option<(String, Vec<String>)> {
    let open = content.find('(')?;
    let close = content.find(')')?;
    if close < open {
        return None;
    }

    let name = content[..open].trim_matches(CALL_TRIM);
    if name.is_empty() {
        return None;
    }

    let args = content[open + 1..close]
        .split(',')
        .map(|arg| arg.trim_matches(CALL_TRIM).to_string())
        .collect();
    Some((name.to_string(), args))
}
