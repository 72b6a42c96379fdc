//! Path-addressable JSON documents.
//!
//! A [`Document`] owns a [`serde_json::Value`] tree and layers dotted-path
//! access over it: typed getters that answer `None` instead of panicking, a
//! creating [`set`](Document::set) that builds intermediate objects, and
//! [`remove`](Document::remove).
//!
//! Parsing and serialization stay with `serde_json`; this crate only adds the
//! navigation layer.
//!
//! # Quick Start
//!
//! ```
//! use karma_json::Document;
//!
//! let mut doc = Document::parse(r#"{"server": {"host": "example.org", "port": 9000}}"#).unwrap();
//!
//! assert_eq!(doc.get_str("server.host"), Some("example.org"));
//! assert_eq!(doc.get_i64("server.port"), Some(9000));
//! assert_eq!(doc.get_str("server.port"), None); // wrong type, not a panic
//!
//! doc.set("server.tls.enabled", true).unwrap();
//! assert_eq!(doc.get_bool("server.tls.enabled"), Some(true));
//! ```

#![warn(missing_docs)]

mod path;

pub use path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors from parsing, path syntax, and mutation.
#[derive(Debug, Error)]
pub enum JsonError {
    /// The input was not valid JSON.
    #[error("invalid json: {0}")]
    Parse(#[from] serde_json::Error),
    /// A path contained an empty token (`a..b`, leading or trailing dot).
    #[error("path contains an empty token")]
    EmptyToken,
    /// A path ended with an unfinished backslash escape.
    #[error("path ends with a trailing escape")]
    TrailingEscape,
    /// A `set` or `remove` tried to traverse through a non-container value.
    #[error("`{token}` is not an object or array")]
    NotAContainer {
        /// The token whose value blocked traversal.
        token: String,
    },
    /// An array was indexed past its end.
    #[error("index {index} out of bounds for array of length {len}")]
    IndexOutOfBounds {
        /// The offending index token.
        index: usize,
        /// The array's length.
        len: usize,
    },
    /// `set` on the root path is not supported; replace the document instead.
    #[error("cannot set the root path")]
    RootMutation,
}

/// A JSON tree with dotted-path navigation.
///
/// Serializes transparently as its root value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    root: Value,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Anything that resolves to a [`Path`]: a parsed path or a `&str` to parse.
pub trait IntoPath {
    /// Converts into a parsed path.
    fn into_path(self) -> Result<Path, JsonError>;
}

impl IntoPath for Path {
    fn into_path(self) -> Result<Path, JsonError> {
        Ok(self)
    }
}

impl IntoPath for &Path {
    fn into_path(self) -> Result<Path, JsonError> {
        Ok(self.clone())
    }
}

impl IntoPath for &str {
    fn into_path(self) -> Result<Path, JsonError> {
        self.parse()
    }
}

impl Document {
    /// Creates a document holding an empty object.
    pub fn new() -> Self {
        Self {
            root: Value::Object(Map::new()),
        }
    }

    /// Parses a document from a JSON string.
    pub fn parse(input: &str) -> Result<Self, JsonError> {
        Ok(Self {
            root: serde_json::from_str(input)?,
        })
    }

    /// Returns the root value.
    #[inline]
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Consumes the document, returning the root value.
    pub fn into_value(self) -> Value {
        self.root
    }

    /// Serializes to a compact JSON string.
    pub fn to_json(&self) -> String {
        self.root.to_string()
    }

    /// Serializes to a pretty-printed JSON string.
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(&self.root).unwrap_or_else(|_| self.root.to_string())
    }

    /// Returns the value at `path`, if the path resolves.
    ///
    /// An unparsable path resolves to `None`, matching the other getters.
    pub fn get(&self, path: impl IntoPath) -> Option<&Value> {
        let path = path.into_path().ok()?;
        let mut current = &self.root;
        for token in path.tokens() {
            current = step(current, token)?;
        }
        Some(current)
    }

    /// Returns the string at `path`.
    pub fn get_str(&self, path: impl IntoPath) -> Option<&str> {
        self.get(path)?.as_str()
    }

    /// Returns the integer at `path`.
    pub fn get_i64(&self, path: impl IntoPath) -> Option<i64> {
        self.get(path)?.as_i64()
    }

    /// Returns the number at `path` as an `f64`.
    pub fn get_f64(&self, path: impl IntoPath) -> Option<f64> {
        self.get(path)?.as_f64()
    }

    /// Returns the boolean at `path`.
    pub fn get_bool(&self, path: impl IntoPath) -> Option<bool> {
        self.get(path)?.as_bool()
    }

    /// Returns the array at `path`.
    pub fn get_array(&self, path: impl IntoPath) -> Option<&Vec<Value>> {
        self.get(path)?.as_array()
    }

    /// Returns the object at `path`.
    pub fn get_object(&self, path: impl IntoPath) -> Option<&Map<String, Value>> {
        self.get(path)?.as_object()
    }

    /// Returns `true` if `path` resolves to a value.
    pub fn contains(&self, path: impl IntoPath) -> bool {
        self.get(path).is_some()
    }

    /// Sets the value at `path`, creating intermediate objects as needed.
    ///
    /// Array tokens may address an existing element or the position one past
    /// the end (append). Returns the previous value at the path, if any.
    ///
    /// # Errors
    ///
    /// Fails when the path is unparsable or the root, when traversal meets a
    /// scalar, or when an array index is past the append position.
    pub fn set(
        &mut self,
        path: impl IntoPath,
        value: impl Into<Value>,
    ) -> Result<Option<Value>, JsonError> {
        let path = path.into_path()?;
        let (parents, last) = path.split_last().ok_or(JsonError::RootMutation)?;

        let mut current = &mut self.root;
        for token in parents {
            current = step_or_create(current, token)?;
        }

        let value = value.into();
        match current {
            Value::Object(map) => Ok(map.insert(last.to_string(), value)),
            Value::Array(items) => {
                let index = parse_index(last, items.len())?;
                if index == items.len() {
                    items.push(value);
                    Ok(None)
                } else {
                    Ok(Some(std::mem::replace(&mut items[index], value)))
                }
            }
            _ => Err(JsonError::NotAContainer {
                token: last.to_string(),
            }),
        }
    }

    /// Removes and returns the value at `path`.
    ///
    /// Returns `None` if the path does not resolve. Removing from an array
    /// shifts the elements behind the removed one.
    pub fn remove(&mut self, path: impl IntoPath) -> Option<Value> {
        let path = path.into_path().ok()?;
        let (parents, last) = path.split_last()?;

        let mut current = &mut self.root;
        for token in parents {
            current = step_mut(current, token)?;
        }

        match current {
            Value::Object(map) => map.remove(last),
            Value::Array(items) => {
                let index: usize = last.parse().ok()?;
                if index < items.len() {
                    Some(items.remove(index))
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

impl From<Value> for Document {
    fn from(root: Value) -> Self {
        Self { root }
    }
}

/// Resolves one token against a value: key for objects, index for arrays.
fn step<'a>(value: &'a Value, token: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(token),
        Value::Array(items) => items.get(token.parse::<usize>().ok()?),
        _ => None,
    }
}

fn step_mut<'a>(value: &'a mut Value, token: &str) -> Option<&'a mut Value> {
    match value {
        Value::Object(map) => map.get_mut(token),
        Value::Array(items) => {
            let index = token.parse::<usize>().ok()?;
            items.get_mut(index)
        }
        _ => None,
    }
}

/// Like [`step_mut`], but missing object keys are created as empty objects.
fn step_or_create<'a>(value: &'a mut Value, token: &str) -> Result<&'a mut Value, JsonError> {
    match value {
        Value::Object(map) => Ok(map
            .entry(token.to_string())
            .or_insert_with(|| Value::Object(Map::new()))),
        Value::Array(items) => {
            let len = items.len();
            let index = parse_index(token, len)?;
            if index == len {
                items.push(Value::Object(Map::new()));
            }
            Ok(&mut items[index])
        }
        _ => Err(JsonError::NotAContainer {
            token: token.to_string(),
        }),
    }
}

/// Parses an array token, allowing the append position `len`.
fn parse_index(token: &str, len: usize) -> Result<usize, JsonError> {
    let index: usize = token.parse().map_err(|_| JsonError::NotAContainer {
        token: token.to_string(),
    })?;
    if index > len {
        return Err(JsonError::IndexOutOfBounds { index, len });
    }
    Ok(index)
}
