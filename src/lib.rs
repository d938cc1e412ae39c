//! Read-only configuration assembled from a directory tree of documents.
//!
//! Every `.hjson`, `.json` and `.toml` file under a root directory is parsed
//! once and folded into a single namespace addressed by dotted key paths,
//! with `[n]` indexing into sequences:
//!
//! ```no_run
//! use treeconf::Config;
//!
//! // config/nested.hjson, config/dir/inner/inside.hjson, ...
//! let config = Config::open("config", "", vec![])?;
//!
//! let name = config.get_string("nested.objects[1].name", "unknown");
//! let value = config.get_string("dir.inner.inside.value", "");
//! let debug = config.get_bool("app.debug", false);
//! # let _ = (name, value, debug);
//! # Ok::<(), treeconf::ConfigError>(())
//! ```
//!
//! String values may call an [`Evaluator`] by name. The built-in `env`
//! evaluator reads an environment variable with an optional fallback:
//!
//! ```hjson
//! {
//!   server: "env(SERVER_HOST, localhost)"
//! }
//! ```
//!
//! Reads never fail: absent keys, malformed paths and type mismatches all
//! return the caller's default.

pub mod config;
mod node;

pub use config::{
    Config, ConfigBuilder, ConfigError, EnvEvaluator, EnvVars, Evaluator, EvaluatorRegistry,
    FnEvaluator, Format, KeyPath, MergePolicy, PathError, Segment,
};
pub use node::{Mapping, Node};
