//! Dotted key paths with array indexing.
//!
//! `keyPath := segment ('.' segment)*` and `segment := identifier ('[' integer ']')?`,
//! so `servers[1].host` reads field `host` of the second element of `servers`.

use std::fmt;
use std::str::FromStr;

use super::PathError;
use crate::node::{Mapping, Node};

/// One dot-delimited component of a key path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub name: String,
    pub index: Option<usize>,
}

impl Segment {
    fn parse(component: &str) -> Result<Self, PathError> {
        let Some(open) = component.find('[') else {
            return Ok(Self {
                name: component.to_string(),
                index: None,
            });
        };

        let inner = component[open + 1..]
            .strip_suffix(']')
            .ok_or_else(|| PathError::UnclosedIndex(component.to_string()))?;
        let index = inner
            .parse::<usize>()
            .map_err(|_| PathError::InvalidIndex(component.to_string()))?;

        Ok(Self {
            name: component[..open].to_string(),
            index: Some(index),
        })
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(index) => write!(f, "{}[{}]", self.name, index),
            None => f.write_str(&self.name),
        }
    }
}

/// A parsed key path. Always holds at least one segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPath {
    segments: Vec<Segment>,
}

impl KeyPath {
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

impl FromStr for KeyPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments = s
            .split('.')
            .map(Segment::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { segments })
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

/// Walks `path` through `root` from left to right.
///
/// Returns `Ok(None)` when a segment is absent (or Null) anywhere along the path.
/// Indexing a non-sequence, an out-of-range index, or descending into a
/// non-mapping is a [`PathError`].
pub fn resolve<'a>(root: &'a Mapping, path: &KeyPath) -> Result<Option<&'a Node>, PathError> {
    let Some((last, parents)) = path.segments.split_last() else {
        return Ok(None);
    };

    let mut current = root;
    for segment in parents {
        let Some(node) = step(current, segment)? else {
            return Ok(None);
        };
        current = node.as_mapping().ok_or_else(|| PathError::NotAMapping {
            segment: segment.to_string(),
            found: node.kind(),
        })?;
    }

    step(current, last)
}

fn step<'a>(map: &'a Mapping, segment: &Segment) -> Result<Option<&'a Node>, PathError> {
    let node = match map.get(&segment.name) {
        None | Some(Node::Null) => return Ok(None),
        Some(node) => node,
    };

    let Some(index) = segment.index else {
        return Ok(Some(node));
    };

    let items = node.as_sequence().ok_or_else(|| PathError::NotASequence {
        segment: segment.to_string(),
        found: node.kind(),
    })?;
    match items.get(index) {
        Some(Node::Null) => Ok(None),
        Some(item) => Ok(Some(item)),
        None => Err(PathError::IndexOutOfRange {
            segment: segment.to_string(),
            index,
            len: items.len(),
        }),
    }
}
