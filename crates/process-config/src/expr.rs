//! Zoom-conditional configuration trees.
//!
//! Any mapping in a process document may contain keys such as `zoom<3` or
//! `zoom>=5`. Such a key only contributes its value at zoom levels matching
//! the expression. Documents are parsed once into [`ConfigNode`] trees with
//! the predicates already evaluated for syntax; [`resolve_params`] then
//! filters a tree for one zoom level.
//!
//! ```text
//! file1:                       zoom 2            zoom 4
//!   zoom<3: coarse.geojson  ─► file1: coarse  /  file1: fine
//!   zoom>=3: fine.geojson
//! ```

use std::fmt;

use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::error::{ConfigError, Result};

/// Key marking a mapping as an input or output declaration.
pub const FORMAT_KEY: &str = "format";

/// Key whose subtree keeps named children even when they resolve to nothing.
pub const INPUT_KEY: &str = "input";

/// Relation between the processed zoom and a predicate operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparison {
    fn symbol(&self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Lt => "<",
            Comparison::Le => "<=",
            Comparison::Gt => ">",
            Comparison::Ge => ">=",
        }
    }
}

/// A parsed `zoom<op><n>` expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoomPredicate {
    comparison: Comparison,
    operand: u32,
}

impl ZoomPredicate {
    pub fn new(comparison: Comparison, operand: u32) -> Self {
        Self {
            comparison,
            operand,
        }
    }

    /// Parse a mapping key.
    ///
    /// Returns `Ok(None)` for keys that are not zoom expressions. A key is a
    /// zoom expression when it starts with `zoom` followed by nothing, an
    /// operator (`=`, `==`, `<`, `<=`, `>`, `>=`) or a digit; a bare number
    /// means equality. Keys such as `zoom_factor` are ordinary fields.
    pub fn parse(key: &str) -> Result<Option<Self>> {
        let Some(rest) = key.strip_prefix("zoom") else {
            return Ok(None);
        };
        let rest = rest.trim();
        let is_expression = rest.is_empty()
            || rest.starts_with(['<', '>', '='])
            || rest.starts_with(|c: char| c.is_ascii_digit());
        if !is_expression {
            return Ok(None);
        }

        let (comparison, operand) = if let Some(r) = rest.strip_prefix("<=") {
            (Comparison::Le, r)
        } else if let Some(r) = rest.strip_prefix(">=") {
            (Comparison::Ge, r)
        } else if let Some(r) = rest.strip_prefix("==") {
            (Comparison::Eq, r)
        } else if let Some(r) = rest.strip_prefix('=') {
            (Comparison::Eq, r)
        } else if let Some(r) = rest.strip_prefix('<') {
            (Comparison::Lt, r)
        } else if let Some(r) = rest.strip_prefix('>') {
            (Comparison::Gt, r)
        } else {
            (Comparison::Eq, rest)
        };

        let operand = operand.trim().parse::<u32>().map_err(|_| {
            ConfigError::zoom_expression(format!(
                "zoom level could not be determined from '{}'",
                key
            ))
        })?;
        Ok(Some(Self::new(comparison, operand)))
    }

    pub fn matches(&self, zoom: u32) -> bool {
        match self.comparison {
            Comparison::Eq => zoom == self.operand,
            Comparison::Lt => zoom < self.operand,
            Comparison::Le => zoom <= self.operand,
            Comparison::Gt => zoom > self.operand,
            Comparison::Ge => zoom >= self.operand,
        }
    }
}

impl fmt::Display for ZoomPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "zoom{}{}", self.comparison.symbol(), self.operand)
    }
}

/// A mapping key with its optional zoom predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeKey {
    name: String,
    predicate: Option<ZoomPredicate>,
}

impl NodeKey {
    pub fn parse(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let predicate = ZoomPredicate::parse(&name)?;
        Ok(Self { name, predicate })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn predicate(&self) -> Option<&ZoomPredicate> {
        self.predicate.as_ref()
    }

    fn is_input(&self) -> bool {
        self.predicate.is_none() && self.name == INPUT_KEY
    }
}

/// A document value with zoom predicates pre-parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigNode {
    /// Scalars, sequences and null.
    Value(Value),
    /// A mapping carrying a `format` key; never filtered.
    Terminal(Mapping),
    /// Any other mapping, children in document order.
    Branch(Vec<(NodeKey, ConfigNode)>),
}

impl ConfigNode {
    pub fn parse(value: &Value) -> Result<Self> {
        match value {
            Value::Mapping(map) if map.contains_key(FORMAT_KEY) => {
                Ok(ConfigNode::Terminal(map.clone()))
            }
            Value::Mapping(map) => Ok(ConfigNode::Branch(parse_children(map)?)),
            other => Ok(ConfigNode::Value(other.clone())),
        }
    }

    /// Value of this node at `zoom`, `None` if nothing is left.
    ///
    /// Outside the `input` subtree absent children are dropped and a single
    /// remaining child replaces its parent. Inside it (`in_input`) named
    /// children are kept as null when absent and only zoom expression
    /// wrappers are replaced by their value.
    pub fn resolve(&self, zoom: u32, in_input: bool) -> Option<Value> {
        match self {
            ConfigNode::Value(Value::Null) => None,
            ConfigNode::Value(value) => Some(value.clone()),
            ConfigNode::Terminal(map) => Some(Value::Mapping(map.clone())),
            ConfigNode::Branch(children) => {
                let mut entries = resolve_children(children, zoom, in_input);
                match entries.len() {
                    0 => None,
                    1 if !in_input || entries[0].conditional => entries.pop().map(|e| e.value),
                    _ => Some(Value::Mapping(into_mapping(entries))),
                }
            }
        }
    }
}

/// Parse mapping children, stringifying scalar keys.
pub fn parse_children(map: &Mapping) -> Result<Vec<(NodeKey, ConfigNode)>> {
    map.iter()
        .map(|(key, value)| Ok((NodeKey::parse(key_to_string(key)?)?, ConfigNode::parse(value)?)))
        .collect()
}

/// Resolve top-level parameters at `zoom`.
///
/// The root mapping is never collapsed; parameters resolving to nothing
/// are omitted.
pub fn resolve_params(params: &[(NodeKey, ConfigNode)], zoom: u32) -> Mapping {
    into_mapping(resolve_children(params, zoom, false))
}

struct Entry<'a> {
    name: &'a str,
    value: Value,
    /// Selected through a zoom expression key.
    conditional: bool,
}

fn resolve_children(children: &[(NodeKey, ConfigNode)], zoom: u32, in_input: bool) -> Vec<Entry<'_>> {
    let mut entries = Vec::with_capacity(children.len());
    let mut matched: Option<&ZoomPredicate> = None;

    for (key, child) in children {
        match key.predicate() {
            None => {
                let value = child.resolve(zoom, in_input || key.is_input());
                let value = match value {
                    Some(value) => value,
                    None if in_input => Value::Null,
                    None => continue,
                };
                entries.push(Entry {
                    name: key.name(),
                    value,
                    conditional: false,
                });
            }
            Some(predicate) if !predicate.matches(zoom) => {}
            Some(predicate) => {
                if let Some(first) = matched {
                    debug!(
                        zoom,
                        key = %key.name(),
                        first = %first,
                        "Overlapping zoom expression ignored"
                    );
                    continue;
                }
                matched = Some(predicate);
                if let Some(value) = child.resolve(zoom, in_input) {
                    entries.push(Entry {
                        name: key.name(),
                        value,
                        conditional: true,
                    });
                }
            }
        }
    }
    entries
}

fn into_mapping(entries: Vec<Entry<'_>>) -> Mapping {
    entries
        .into_iter()
        .map(|e| (Value::String(e.name.to_string()), e.value))
        .collect()
}

/// String form of a mapping key; only scalar keys are accepted.
pub fn key_to_string(key: &Value) -> Result<String> {
    match key {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(ConfigError::schema(format!(
            "mapping keys must be strings, got {:?}",
            other
        ))),
    }
}
