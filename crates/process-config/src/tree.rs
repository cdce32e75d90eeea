//! Nested trees and their flat slash-joined form.
//!
//! Input declarations are addressed by path (`group1/file1`). Flattening a
//! tree gives one entry per leaf; unflattening rebuilds the nesting.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::error::ConfigError;

/// Separator between path segments.
pub const PATH_SEPARATOR: char = '/';

/// A node of a string-keyed tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Tree<T> {
    Leaf(T),
    Branch(BTreeMap<String, Tree<T>>),
}

/// Top level of a tree.
pub type TreeMap<T> = BTreeMap<String, Tree<T>>;

/// Errors rebuilding a tree from paths.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TreeError {
    #[error("path '{0}' is used both as a value and as a group")]
    Conflict(String),

    #[error("path '{0}' appears more than once")]
    Duplicate(String),
}

impl From<TreeError> for ConfigError {
    fn from(err: TreeError) -> Self {
        ConfigError::Schema(err.to_string())
    }
}

impl<T> Tree<T> {
    pub fn as_leaf(&self) -> Option<&T> {
        match self {
            Tree::Leaf(value) => Some(value),
            Tree::Branch(_) => None,
        }
    }

    pub fn as_branch(&self) -> Option<&TreeMap<T>> {
        match self {
            Tree::Leaf(_) => None,
            Tree::Branch(children) => Some(children),
        }
    }
}

/// Look up a slash-joined path.
pub fn get_path<'a, T>(tree: &'a TreeMap<T>, path: &str) -> Option<&'a Tree<T>> {
    let mut segments = path.split(PATH_SEPARATOR);
    let mut node = tree.get(segments.next()?)?;
    for segment in segments {
        node = node.as_branch()?.get(segment)?;
    }
    Some(node)
}

/// Flatten a tree into `path -> leaf` entries.
///
/// Empty branches have no leaves and do not appear in the result.
pub fn flatten<T: Clone>(tree: &TreeMap<T>) -> BTreeMap<String, T> {
    let mut out = BTreeMap::new();
    flatten_into(tree, None, &mut out);
    out
}

fn flatten_into<T: Clone>(tree: &TreeMap<T>, prefix: Option<&str>, out: &mut BTreeMap<String, T>) {
    for (key, node) in tree {
        let path = match prefix {
            Some(prefix) => format!("{}{}{}", prefix, PATH_SEPARATOR, key),
            None => key.clone(),
        };
        match node {
            Tree::Leaf(value) => {
                out.insert(path, value.clone());
            }
            Tree::Branch(children) => flatten_into(children, Some(&path), out),
        }
    }
}

/// Rebuild a tree from `path -> leaf` entries.
pub fn unflatten<T>(entries: impl IntoIterator<Item = (String, T)>) -> Result<TreeMap<T>, TreeError> {
    let mut root: TreeMap<T> = BTreeMap::new();
    for (path, value) in entries {
        insert_path(&mut root, &path, value)?;
    }
    Ok(root)
}

fn insert_path<T>(root: &mut TreeMap<T>, path: &str, value: T) -> Result<(), TreeError> {
    let segments: Vec<&str> = path.split(PATH_SEPARATOR).collect();
    let (last, parents) = match segments.split_last() {
        Some(split) => split,
        None => return Ok(()),
    };

    let mut level = root;
    for segment in parents {
        let node = level
            .entry(segment.to_string())
            .or_insert_with(|| Tree::Branch(BTreeMap::new()));
        level = match node {
            Tree::Branch(children) => children,
            Tree::Leaf(_) => return Err(TreeError::Conflict(path.to_string())),
        };
    }

    if let Some(existing) = level.get(*last) {
        return Err(match existing {
            Tree::Leaf(_) => TreeError::Duplicate(path.to_string()),
            Tree::Branch(_) => TreeError::Conflict(path.to_string()),
        });
    }
    level.insert(last.to_string(), Tree::Leaf(value));
    Ok(())
}
