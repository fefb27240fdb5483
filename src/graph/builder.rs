//! graph::builder — editable YAML document from which graphs are built.
//!
//! Purpose
//! -------
//! Hold a demographic model as an untyped YAML document so that parameter
//! values can be read and written by [`GraphPath`] without knowing the
//! full schema, then turn the document into a validated [`DemeGraph`] on
//! demand.
//!
//! Key behaviors
//! -------------
//! - [`GraphBuilder::get`] / [`GraphBuilder::set`] address mapping fields by
//!   name and sequence elements by index or by their `name` field.
//! - [`GraphBuilder::build`] deserializes from a clone of the document, so
//!   building never mutates the builder.
//! - `set` may create a missing leaf field on an existing mapping (e.g. an
//!   omitted `end_size`) but never creates intermediate nodes.
//!
//! Downstream usage
//! ----------------
//! - Objectives call `set` for every parameter path, then `build`, once per
//!   evaluation.
use crate::graph::{
    demes::{time_from_value, DemeGraph},
    errors::{GraphError, GraphResult},
    path::{GraphPath, PathKey},
};
use serde_yaml_ng::Value;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct GraphBuilder {
    doc: Value,
}

impl GraphBuilder {
    pub fn from_yaml_str(text: &str) -> GraphResult<Self> {
        let doc: Value = serde_yaml_ng::from_str(text)?;
        if !doc.is_mapping() {
            return Err(GraphError::Yaml { text: "graph document must be a mapping".to_string() });
        }
        Ok(Self { doc })
    }

    pub fn load(path: &Path) -> GraphResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| GraphError::io(path, e))?;
        Self::from_yaml_str(&text)
    }

    /// Builder whose document is the serialized form of `graph`.
    pub fn from_graph(graph: &DemeGraph) -> GraphResult<Self> {
        Ok(Self { doc: serde_yaml_ng::to_value(graph)? })
    }

    pub fn document(&self) -> &Value {
        &self.doc
    }

    pub fn to_yaml_string(&self) -> GraphResult<String> {
        Ok(serde_yaml_ng::to_string(&self.doc)?)
    }

    /// Validated graph built from the current document.
    pub fn build(&self) -> GraphResult<DemeGraph> {
        DemeGraph::from_value(self.doc.clone())
    }

    /// Numeric value at `path`.
    ///
    /// Errors
    /// ------
    /// - [`GraphError::PathNotFound`] if any step does not resolve.
    /// - [`GraphError::NonNumericValue`] if the leaf is not a number or a
    ///   recognized time string.
    pub fn get(&self, path: &GraphPath) -> GraphResult<f64> {
        let mut node = &self.doc;
        for key in path.keys() {
            node = child(node, key).ok_or_else(|| not_found(path))?;
        }
        time_from_value(node).ok_or_else(|| GraphError::NonNumericValue { path: path.to_string() })
    }

    /// Write `value` at `path`.
    pub fn set(&mut self, path: &GraphPath, value: f64) -> GraphResult<()> {
        let (last, parents) = match path.keys().split_last() {
            Some(split) => split,
            None => return Err(not_found(path)),
        };
        let mut node = &mut self.doc;
        for key in parents {
            node = child_mut(node, key).ok_or_else(|| not_found(path))?;
        }
        match (node, last) {
            (Value::Mapping(map), PathKey::Name(name)) => {
                map.insert(Value::String(name.clone()), Value::from(value));
                Ok(())
            }
            (node, key) => {
                let slot = child_mut(node, key).ok_or_else(|| not_found(path))?;
                *slot = Value::from(value);
                Ok(())
            }
        }
    }
}

fn not_found(path: &GraphPath) -> GraphError {
    GraphError::PathNotFound { path: path.to_string() }
}

fn is_named(item: &Value, name: &str) -> bool {
    item.get("name").and_then(Value::as_str) == Some(name)
}

fn child<'v>(node: &'v Value, key: &PathKey) -> Option<&'v Value> {
    match (node, key) {
        (Value::Mapping(map), PathKey::Name(name)) => map.get(name.as_str()),
        (Value::Mapping(map), PathKey::Index(i)) => {
            map.iter().find(|(k, _)| k.as_u64() == Some(*i as u64)).map(|(_, v)| v)
        }
        (Value::Sequence(items), PathKey::Index(i)) => items.get(*i),
        (Value::Sequence(items), PathKey::Name(name)) => {
            items.iter().find(|item| is_named(item, name))
        }
        _ => None,
    }
}

fn child_mut<'v>(node: &'v mut Value, key: &PathKey) -> Option<&'v mut Value> {
    match (node, key) {
        (Value::Mapping(map), PathKey::Name(name)) => map.get_mut(name.as_str()),
        (Value::Mapping(map), PathKey::Index(i)) => {
            map.iter_mut().find(|(k, _)| k.as_u64() == Some(*i as u64)).map(|(_, v)| v)
        }
        (Value::Sequence(items), PathKey::Index(i)) => items.get_mut(*i),
        (Value::Sequence(items), PathKey::Name(name)) => {
            items.iter_mut().find(|item| is_named(item, name))
        }
        _ => None,
    }
}
