//! Addresses of numeric fields inside a graph builder document.
//!
//! A [`GraphPath`] is a sequence of keys walked from the document root.
//! Mapping nodes are entered by field name; sequence nodes are entered
//! either by position or, for named records such as demes, by the value of
//! their `name` field. Two textual forms are accepted:
//!
//! - dotted: `demes.A.epochs.0.start_size`
//! - nested: `{demes: {A: {epochs: {0: start_size}}}}`, where a mapping
//!   with several keys (or a list) fans out into several paths.
use crate::graph::errors::{GraphError, GraphResult};
use serde_yaml_ng::Value;
use std::{fmt, str::FromStr};

/// One step of a [`GraphPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathKey {
    Name(String),
    Index(usize),
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathKey::Name(name) => write!(f, "{name}"),
            PathKey::Index(index) => write!(f, "{index}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GraphPath(Vec<PathKey>);

impl GraphPath {
    pub fn new(keys: Vec<PathKey>) -> GraphResult<Self> {
        if keys.is_empty() {
            return Err(GraphError::InvalidPathKey { text: "path must not be empty".to_string() });
        }
        Ok(Self(keys))
    }

    pub fn keys(&self) -> &[PathKey] {
        &self.0
    }

    /// Expand a nested-mapping path specification into every leaf path it
    /// names.
    pub fn from_nested(value: &Value) -> GraphResult<Vec<GraphPath>> {
        let mut out = Vec::new();
        let mut prefix = Vec::new();
        collect_nested(value, &mut prefix, &mut out)?;
        if out.is_empty() {
            return Err(GraphError::InvalidPathKey {
                text: "nested path specification names no fields".to_string(),
            });
        }
        Ok(out)
    }
}

impl FromStr for GraphPath {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let keys = s
            .split('.')
            .map(|segment| {
                let segment = segment.trim();
                if segment.is_empty() {
                    Err(GraphError::InvalidPathKey { text: format!("empty segment in '{s}'") })
                } else if let Ok(index) = segment.parse::<usize>() {
                    Ok(PathKey::Index(index))
                } else {
                    Ok(PathKey::Name(segment.to_string()))
                }
            })
            .collect::<GraphResult<Vec<_>>>()?;
        GraphPath::new(keys)
    }
}

impl fmt::Display for GraphPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<String> = self.0.iter().map(PathKey::to_string).collect();
        write!(f, "{}", joined.join("."))
    }
}

fn collect_nested(
    value: &Value, prefix: &mut Vec<PathKey>, out: &mut Vec<GraphPath>,
) -> GraphResult<()> {
    match value {
        Value::Mapping(map) => {
            for (key, child) in map {
                prefix.push(key_from_value(key)?);
                collect_nested(child, prefix, out)?;
                prefix.pop();
            }
        }
        Value::Sequence(items) => {
            for item in items {
                collect_nested(item, prefix, out)?;
            }
        }
        leaf => {
            prefix.push(key_from_value(leaf)?);
            out.push(GraphPath(prefix.clone()));
            prefix.pop();
        }
    }
    Ok(())
}

fn key_from_value(value: &Value) -> GraphResult<PathKey> {
    match value {
        Value::String(name) => Ok(PathKey::Name(name.clone())),
        Value::Number(n) => n
            .as_u64()
            .map(|i| PathKey::Index(i as usize))
            .ok_or_else(|| GraphError::InvalidPathKey { text: format!("{n} is not an index") }),
        other => Err(GraphError::InvalidPathKey { text: format!("{other:?}") }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Dotted paths split into names and indices.
    //
    // Given
    // -----
    // - "demes.A.epochs.0.start_size".
    //
    // Expect
    // ------
    // - Five keys with the fourth an index; Display restores the text.
    fn parse_dotted_path_mixes_names_and_indices() {
        // Arrange / Act
        let path: GraphPath = "demes.A.epochs.0.start_size".parse().unwrap();

        // Assert
        assert_eq!(path.keys().len(), 5);
        assert_eq!(path.keys()[3], PathKey::Index(0));
        assert_eq!(path.keys()[1], PathKey::Name("A".to_string()));
        assert_eq!(path.to_string(), "demes.A.epochs.0.start_size");
    }

    #[test]
    // Purpose
    // -------
    // Empty segments are rejected.
    fn parse_dotted_path_rejects_empty_segment() {
        let result = "demes..start_size".parse::<GraphPath>();
        assert!(matches!(result, Err(GraphError::InvalidPathKey { .. })));
    }

    #[test]
    // Purpose
    // -------
    // A nested mapping with two leaves yields two paths sharing a prefix.
    //
    // Given
    // -----
    // - `{demes: {A: {epochs: {0: start_size, 1: end_size}}}}`.
    //
    // Expect
    // ------
    // - `demes.A.epochs.0.start_size` and `demes.A.epochs.1.end_size`.
    fn nested_mapping_fans_out_into_paths() {
        // Arrange
        let value: Value =
            serde_yaml_ng::from_str("demes:\n  A:\n    epochs:\n      0: start_size\n      1: end_size\n")
                .unwrap();

        // Act
        let paths = GraphPath::from_nested(&value).unwrap();

        // Assert
        let rendered: Vec<String> = paths.iter().map(GraphPath::to_string).collect();
        assert_eq!(rendered, vec!["demes.A.epochs.0.start_size", "demes.A.epochs.1.end_size"]);
    }
}
