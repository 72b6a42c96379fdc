//! Placeholder rendering for `{name}`-style templates.
//!
//! A template is scanned once, left to right. `{name}` tokens are resolved
//! against a [`Source`]; `{{` and `}}` escape literal braces. What happens on
//! a missing key is the engine's [`MissingKey`] policy: keep the token render
//! it empty, or fail.
//!
//! # Quick Start
//!
//! ```
//! use karma_text::{Engine, MapSource};
//!
//! let mut vars = MapSource::new();
//! vars.set("player", "Steve");
//! vars.set("world", "lobby");
//!
//! let line = Engine::new()
//!     .render("{player} joined {world}", &vars)
//!     .unwrap();
//! assert_eq!(line, "Steve joined lobby");
//! ```
//!
//! # Missing keys
//!
//! ```
//! use karma_text::{Engine, MapSource, MissingKey, RenderError};
//!
//! let vars = MapSource::new();
//!
//! // Default: the token is kept verbatim.
//! let kept = Engine::new().render("hello {who}", &vars).unwrap();
//! assert_eq!(kept, "hello {who}");
//!
//! // Strict: rendering fails, naming the key.
//! let err = Engine::new()
//!     .missing_key(MissingKey::Error)
//!     .render("hello {who}", &vars)
//!     .unwrap_err();
//! assert!(matches!(err, RenderError::MissingKey(key) if key == "who"));
//! ```

#![warn(missing_docs)]

use std::borrow::Cow;
use std::collections::HashMap;

use thiserror::Error;

/// Errors produced while rendering a template.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    /// A `{` was never closed.
    #[error("unterminated placeholder starting at byte {0}")]
    Unterminated(usize),
    /// A placeholder had an empty name (`{}`).
    #[error("empty placeholder at byte {0}")]
    EmptyName(usize),
    /// A key was not found and the policy is [`MissingKey::Error`].
    #[error("no value for placeholder `{0}`")]
    MissingKey(String),
    /// A stray `}` outside any placeholder.
    #[error("unmatched `}}` at byte {0}")]
    UnmatchedClose(usize),
}

/// What to do when a placeholder's key is not found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingKey {
    /// Keep the `{name}` token verbatim.
    #[default]
    Keep,
    /// Substitute the empty string.
    Empty,
    /// Fail with [`RenderError::MissingKey`].
    Error,
}

/// Resolves placeholder keys to values.
pub trait Source {
    /// Returns the value for `key`, or `None` if unknown.
    fn resolve(&self, key: &str) -> Option<Cow<'_, str>>;
}

/// Adapts a closure into a [`Source`].
///
/// # Example
///
/// ```
/// use karma_text::{render, FnSource};
///
/// let shout = FnSource(|key: &str| Some(key.to_uppercase()));
/// assert_eq!(render("{hello}", &shout).unwrap(), "HELLO");
/// ```
pub struct FnSource<F>(pub F);

impl<F> Source for FnSource<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn resolve(&self, key: &str) -> Option<Cow<'_, str>> {
        (self.0)(key).map(Cow::Owned)
    }
}

/// Map-backed [`Source`].
///
/// # Example
///
/// ```
/// use karma_text::{MapSource, Source};
///
/// let mut vars = MapSource::new();
/// vars.set("count", 3.to_string());
/// assert_eq!(vars.resolve("count").as_deref(), Some("3"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MapSource {
    values: HashMap<String, String>,
}

impl MapSource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the value for `key`, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Removes the value for `key`.
    pub fn unset(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }
}

impl Source for MapSource {
    fn resolve(&self, key: &str) -> Option<Cow<'_, str>> {
        self.values.get(key).map(|v| Cow::Borrowed(v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapSource {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Template renderer with a configurable missing-key policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct Engine {
    missing: MissingKey,
}

impl Engine {
    /// Creates an engine with the default policy ([`MissingKey::Keep`]).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the missing-key policy.
    pub fn missing_key(mut self, policy: MissingKey) -> Self {
        self.missing = policy;
        self
    }

    /// Renders `template`, substituting `{name}` tokens from `source`.
    ///
    /// `{{` and `}}` produce literal braces. Placeholder names may contain
    /// any character except `{` and `}`.
    pub fn render(&self, template: &str, source: &impl Source) -> Result<String, RenderError> {
        let mut out = String::with_capacity(template.len());
        let bytes = template.as_bytes();
        let mut pos = 0;

        while pos < bytes.len() {
            match bytes[pos] {
                b'{' => {
                    if bytes.get(pos + 1) == Some(&b'{') {
                        out.push('{');
                        pos += 2;
                        continue;
                    }
                    let start = pos + 1;
                    let end = template[start..]
                        .find(['{', '}'])
                        .map(|off| start + off)
                        .ok_or(RenderError::Unterminated(pos))?;
                    if bytes[end] == b'{' {
                        return Err(RenderError::Unterminated(pos));
                    }
                    let key = &template[start..end];
                    if key.is_empty() {
                        return Err(RenderError::EmptyName(pos));
                    }
                    match source.resolve(key) {
                        Some(value) => out.push_str(&value),
                        None => match self.missing {
                            MissingKey::Keep => {
                                out.push('{');
                                out.push_str(key);
                                out.push('}');
                            }
                            MissingKey::Empty => {}
                            MissingKey::Error => {
                                return Err(RenderError::MissingKey(key.to_string()))
                            }
                        },
                    }
                    pos = end + 1;
                }
                b'}' => {
                    if bytes.get(pos + 1) == Some(&b'}') {
                        out.push('}');
                        pos += 2;
                        continue;
                    }
                    return Err(RenderError::UnmatchedClose(pos));
                }
                _ => {
                    // Copy the whole run up to the next brace in one go.
                    let end = template[pos..]
                        .find(['{', '}'])
                        .map(|off| pos + off)
                        .unwrap_or(template.len());
                    out.push_str(&template[pos..end]);
                    pos = end;
                }
            }
        }

        Ok(out)
    }
}

/// Renders with the default engine (missing keys kept verbatim).
pub fn render(template: &str, source: &impl Source) -> Result<String, RenderError> {
    Engine::new().render(template, source)
}

/// Truncates `s` to at most `max_chars` characters, on a char boundary.
///
/// Returns the original slice when it already fits.
///
/// # Example
///
/// ```
/// use karma_text::truncate_chars;
///
/// assert_eq!(truncate_chars("héllo wörld", 5), "héllo");
/// assert_eq!(truncate_chars("short", 10), "short");
/// ```
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((byte, _)) => &s[..byte],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> MapSource {
        [("name", "Alex"), ("rank", "admin"), ("empty", "")]
            .into_iter()
            .collect()
    }

    #[test]
    fn substitutes_known_keys() {
        let out = render("[{rank}] {name}: hi", &vars()).unwrap();
        assert_eq!(out, "[admin] Alex: hi");
    }

    #[test]
    fn empty_value_is_fine() {
        let out = render("<{empty}>", &vars()).unwrap();
        assert_eq!(out, "<>");
    }

    #[test]
    fn adjacent_placeholders() {
        let out = render("{name}{rank}", &vars()).unwrap();
        assert_eq!(out, "Alexadmin");
    }

    #[test]
    fn braces_escape() {
        let out = render("{{literal}} {name}", &vars()).unwrap();
        assert_eq!(out, "{literal} Alex");

        let out = render("}}{{", &vars()).unwrap();
        assert_eq!(out, "}{");
    }

    #[test]
    fn missing_key_policies() {
        let vars = vars();

        assert_eq!(render("hi {who}", &vars).unwrap(), "hi {who}");

        let empty = Engine::new()
            .missing_key(MissingKey::Empty)
            .render("hi {who}!", &vars)
            .unwrap();
        assert_eq!(empty, "hi !");

        let err = Engine::new()
            .missing_key(MissingKey::Error)
            .render("hi {who}", &vars)
            .unwrap_err();
        assert_eq!(err, RenderError::MissingKey("who".to_string()));
    }

    #[test]
    fn unterminated_fails() {
        assert_eq!(
            render("hello {name", &vars()),
            Err(RenderError::Unterminated(6))
        );
        assert_eq!(
            render("hello {a{b}", &vars()),
            Err(RenderError::Unterminated(6))
        );
    }

    #[test]
    fn empty_name_fails() {
        assert_eq!(render("x{}y", &vars()), Err(RenderError::EmptyName(1)));
    }

    #[test]
    fn unmatched_close_fails() {
        assert_eq!(render("oops}", &vars()), Err(RenderError::UnmatchedClose(4)));
    }

    #[test]
    fn closure_source() {
        let upper = FnSource(|key: &str| Some(key.to_uppercase()));
        let out = render("{a}-{bc}", &upper).unwrap();
        assert_eq!(out, "A-BC");
    }

    #[test]
    fn multibyte_templates() {
        let mut vars = MapSource::new();
        vars.set("né", "ok");
        let out = render("é{né}é", &vars).unwrap();
        assert_eq!(out, "éoké");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("", 4), "");
        assert_eq!(truncate_chars("ab", 0), "");
        assert_eq!(truncate_chars("日本語テスト", 3), "日本語");
    }
}
