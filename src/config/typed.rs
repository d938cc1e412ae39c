//! Typed accessors.
//!
//! Each accessor returns the caller's default when the key is absent, the
//! path is invalid, or the value has the wrong shape. None of them panic.

use serde::de::DeserializeOwned;

use super::Config;
use crate::node::{Mapping, Node};

impl Config {
    /// Resolves `key` and converts it with `convert`, falling back to `default`.
    fn get_with<T>(&self, key: &str, default: T, convert: impl FnOnce(Node) -> Option<T>) -> T {
        let node = self.get(key, Node::Null);
        if node.is_null() {
            return default;
        }

        let kind = node.kind();
        match convert(node) {
            Some(value) => value,
            None => {
                tracing::debug!(key, found = kind, "type mismatch, using default");
                default
            }
        }
    }

    /// Returns the value at `key` if it is a string.
    pub fn get_string(&self, key: &str, default: &str) -> String {
        self.get_with(key, default.to_string(), |node| match node {
            Node::String(s) => Some(s),
            _ => None,
        })
    }

    /// Returns a number truncated toward zero, if it fits in an `i32`.
    ///
    /// Values outside the `i32` range return `default`. Use
    /// [`Config::get_int64`] or [`Config::get_int_array`] for wider values.
    pub fn get_int(&self, key: &str, default: i32) -> i32 {
        self.get_with(key, default, |node| {
            node.as_i64().and_then(|n| i32::try_from(n).ok())
        })
    }

    /// Returns a number truncated toward zero, if it fits in an `i64`.
    pub fn get_int64(&self, key: &str, default: i64) -> i64 {
        self.get_with(key, default, |node| node.as_i64())
    }

    pub fn get_float(&self, key: &str, default: f64) -> f64 {
        self.get_with(key, default, |node| node.as_f64())
    }

    /// Reads a bool, or the numbers `1` and `0`.
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get_with(key, default, |node| node.as_bool())
    }

    /// Returns a sequence of strings. One non-string element fails the whole call.
    pub fn get_string_array(&self, key: &str, default: Vec<String>) -> Vec<String> {
        self.get_with(key, default, |node| {
            coerce_sequence(node, |item| item.as_str().map(str::to_string))
        })
    }

    pub fn get_int_array(&self, key: &str, default: Vec<i64>) -> Vec<i64> {
        self.get_with(key, default, |node| coerce_sequence(node, Node::as_i64))
    }

    pub fn get_float_array(&self, key: &str, default: Vec<f64>) -> Vec<f64> {
        self.get_with(key, default, |node| coerce_sequence(node, Node::as_f64))
    }

    pub fn get_map(&self, key: &str, default: Mapping) -> Mapping {
        self.get_with(key, default, |node| match node {
            Node::Mapping(map) => Some(map),
            _ => None,
        })
    }

    /// Formats any value as a string.
    ///
    /// Strings are returned as-is and numbers in plain decimal form (`10`, `1.2`);
    /// sequences and mappings are rendered as compact JSON.
    pub fn get_as_string(&self, key: &str, default: &str) -> String {
        self.get_with(key, default.to_string(), |node| Some(node.to_string()))
    }

    /// Deserializes the subtree at `key` into `T`.
    ///
    /// Every string leaf in the subtree is evaluated first. Any failure returns `default`.
    pub fn get_typed<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get_with(key, default, |node| {
            // A top-level string has already been through the evaluators.
            let node = match node {
                Node::String(_) => node,
                other => self.evaluators().evaluate_deep(other),
            };
            let value = serde_json::to_value(&node).ok()?;
            match serde_json::from_value(value) {
                Ok(typed) => Some(typed),
                Err(err) => {
                    tracing::debug!(key, error = %err, "failed to deserialize config value");
                    None
                }
            }
        })
    }
}

fn coerce_sequence<T>(node: Node, convert: impl Fn(&Node) -> Option<T>) -> Option<Vec<T>> {
    match node {
        Node::Sequence(items) => items.iter().map(convert).collect(),
        _ => None,
    }
}
