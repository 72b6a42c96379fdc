//! Dotted paths into a JSON tree.

use core::fmt;
use std::str::FromStr;

use crate::JsonError;

/// A parsed dotted path, e.g. `servers.0.host`.
///
/// Tokens are separated by `.`; a backslash escapes the next character, so
/// `a\.b` is the single key `a.b`. Whether a token is a map key or an array
/// index is decided at resolution time by the container it meets: objects
/// look tokens up as keys, arrays parse them as indices.
///
/// The empty path addresses the root.
///
/// # Example
///
/// ```
/// use karma_json::Path;
///
/// let path: Path = "servers.0.host".parse().unwrap();
/// assert_eq!(path.tokens().len(), 3);
///
/// let escaped: Path = r"dotted\.key".parse().unwrap();
/// assert_eq!(escaped.tokens(), ["dotted.key"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path {
    tokens: Vec<String>,
}

impl Path {
    /// The root path (no tokens).
    pub fn root() -> Self {
        Self { tokens: Vec::new() }
    }

    /// Builds a path from pre-split tokens, no escape processing.
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the path's tokens in order.
    #[inline]
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Returns `true` if this is the root path.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Returns a new path with `token` appended.
    pub fn child(&self, token: impl Into<String>) -> Self {
        let mut tokens = self.tokens.clone();
        tokens.push(token.into());
        Self { tokens }
    }

    /// Splits into the leading tokens and the final one.
    ///
    /// Returns `None` for the root path.
    pub(crate) fn split_last(&self) -> Option<(&[String], &str)> {
        let (last, rest) = self.tokens.split_last()?;
        Some((rest, last))
    }
}

impl FromStr for Path {
    type Err = JsonError;

    fn from_str(s: &str) -> Result<Self, JsonError> {
        if s.is_empty() {
            return Ok(Self::root());
        }

        let mut tokens = Vec::new();
        let mut current = String::new();
        let mut chars = s.chars();

        while let Some(ch) = chars.next() {
            match ch {
                '\\' => match chars.next() {
                    Some(escaped) => current.push(escaped),
                    None => return Err(JsonError::TrailingEscape),
                },
                '.' => {
                    if current.is_empty() {
                        return Err(JsonError::EmptyToken);
                    }
                    tokens.push(std::mem::take(&mut current));
                }
                _ => current.push(ch),
            }
        }

        if current.is_empty() {
            return Err(JsonError::EmptyToken);
        }
        tokens.push(current);

        Ok(Self { tokens })
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            for ch in token.chars() {
                if ch == '.' || ch == '\\' {
                    f.write_str("\\")?;
                }
                write!(f, "{ch}")?;
            }
        }
        Ok(())
    }
}
