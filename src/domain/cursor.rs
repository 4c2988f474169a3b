//! Paths into nested fixture values.
//!
//! A cursor addresses a location inside a value: a record field name or a list
//! index at each level. The same cursor is used to read the current value and
//! to write an updated one. Descending produces a new cursor; an existing
//! cursor is never modified in place.

use crate::domain::error::CursorError;
use crate::domain::value::type_name;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// One step of a cursor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Index(usize),
    Key(String),
}

impl PathSegment {
    pub fn as_key(&self) -> Option<&str> {
        match self {
            PathSegment::Key(key) => Some(key),
            PathSegment::Index(_) => None,
        }
    }

    pub fn as_index(&self) -> Option<usize> {
        match self {
            PathSegment::Index(index) => Some(*index),
            PathSegment::Key(_) => None,
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Index(index) => write!(f, "{index}"),
            PathSegment::Key(key) => f.write_str(key),
        }
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

/// An ordered path of keys and indices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(Vec<PathSegment>);

impl Cursor {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// A new cursor one level below this one.
    pub fn child(&self, segment: impl Into<PathSegment>) -> Cursor {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Cursor(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The innermost record key on this path, if any.
    pub fn last_key(&self) -> Option<&str> {
        self.0.iter().rev().find_map(PathSegment::as_key)
    }

    /// Split off the first segment.
    pub fn split_first(&self) -> Option<(&PathSegment, Cursor)> {
        let (head, rest) = self.0.split_first()?;
        Some((head, Cursor(rest.to_vec())))
    }

    /// Human-readable label such as `items[0].name`, rooted at `name`.
    pub fn label(&self, name: &str) -> String {
        let mut label = name.to_string();
        for segment in &self.0 {
            match segment {
                PathSegment::Index(index) => label.push_str(&format!("[{index}]")),
                PathSegment::Key(key) if label.is_empty() => label.push_str(key),
                PathSegment::Key(key) => {
                    label.push('.');
                    label.push_str(key);
                }
            }
        }
        label
    }

    /// Read the value at this cursor.
    pub fn get<'v>(&self, root: &'v Value) -> Option<&'v Value> {
        self.0.iter().try_fold(root, |current, segment| match segment {
            PathSegment::Key(key) => current.as_object()?.get(key),
            PathSegment::Index(index) => current.as_array()?.get(*index),
        })
    }

    /// Write `value` at this cursor.
    ///
    /// `null` parents become an empty record or list on the way down, and an
    /// index equal to the list length appends.
    pub fn set(&self, root: &mut Value, value: Value) -> Result<(), CursorError> {
        set_at(root, &self.0, value)
    }

    /// Remove the value at this cursor from its parent and return it.
    pub fn remove(&self, root: &mut Value) -> Result<Value, CursorError> {
        let (last, parents) = self.0.split_last().ok_or(CursorError::Root)?;
        let parent_cursor = Cursor(parents.to_vec());
        let parent = parent_cursor
            .get_mut(root)
            .ok_or_else(|| CursorError::Missing(parent_cursor.to_string()))?;

        match (last, parent) {
            (PathSegment::Key(key), Value::Object(map)) => map
                .remove(key)
                .ok_or_else(|| CursorError::Missing(self.to_string())),
            (PathSegment::Index(index), Value::Array(items)) => {
                let len = items.len();
                if *index < len {
                    Ok(items.remove(*index))
                } else {
                    Err(CursorError::OutOfBounds { index: *index, len })
                }
            }
            (segment, other) => Err(CursorError::TypeMismatch {
                segment: segment.to_string(),
                found: type_name(other),
            }),
        }
    }

    fn get_mut<'v>(&self, root: &'v mut Value) -> Option<&'v mut Value> {
        self.0.iter().try_fold(root, |current, segment| match segment {
            PathSegment::Key(key) => current.as_object_mut()?.get_mut(key),
            PathSegment::Index(index) => current.as_array_mut()?.get_mut(*index),
        })
    }
}

fn set_at(target: &mut Value, segments: &[PathSegment], value: Value) -> Result<(), CursorError> {
    let Some((head, rest)) = segments.split_first() else {
        *target = value;
        return Ok(());
    };

    if target.is_null() {
        *target = match head {
            PathSegment::Key(_) => Value::Object(Map::new()),
            PathSegment::Index(_) => Value::Array(Vec::new()),
        };
    }

    match (head, target) {
        (PathSegment::Key(key), Value::Object(map)) => {
            let slot = map.entry(key.clone()).or_insert(Value::Null);
            set_at(slot, rest, value)
        }
        (PathSegment::Index(index), Value::Array(items)) => {
            let len = items.len();
            if *index == len {
                items.push(Value::Null);
            }
            let slot = items
                .get_mut(*index)
                .ok_or(CursorError::OutOfBounds { index: *index, len })?;
            set_at(slot, rest, value)
        }
        (segment, other) => Err(CursorError::TypeMismatch {
            segment: segment.to_string(),
            found: type_name(other),
        }),
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str("<root>");
        }
        f.write_str(&self.label(""))
    }
}

impl From<Vec<PathSegment>> for Cursor {
    fn from(segments: Vec<PathSegment>) -> Self {
        Cursor(segments)
    }
}

impl FromIterator<PathSegment> for Cursor {
    fn from_iter<I: IntoIterator<Item = PathSegment>>(iter: I) -> Self {
        Cursor(iter.into_iter().collect())
    }
}
