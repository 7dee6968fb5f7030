//! Length-bounded text for maps keyed by strings.

use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

use crate::error::{Error, Result};

/// Default maximum length of a [`BoundedText`] in bytes.
pub const MAX_TEXT_LEN: usize = 255;

/// What to do with input longer than the limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OversizePolicy {
    /// Keep the longest prefix that fits and ends on a char boundary.
    #[default]
    Truncate,
    /// Fail with [`Error::TextTooLong`].
    Reject,
}

/// Length limit applied when building a [`BoundedText`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextLimit {
    pub max_len: usize,
    pub policy: OversizePolicy,
}

impl TextLimit {
    /// Creates a limit of `max_len` bytes.
    pub const fn new(max_len: usize, policy: OversizePolicy) -> Self {
        Self { max_len, policy }
    }

    /// Applies the limit to `text`.
    pub fn apply<'a>(&self, text: &'a str) -> Result<&'a str> {
        if text.len() <= self.max_len {
            return Ok(text);
        }
        match self.policy {
            OversizePolicy::Reject => Err(Error::TextTooLong {
                len: text.len(),
                max: self.max_len,
            }),
            OversizePolicy::Truncate => {
                let mut end = self.max_len;
                while !text.is_char_boundary(end) {
                    end -= 1;
                }
                Ok(&text[..end])
            }
        }
    }
}

impl Default for TextLimit {
    fn default() -> Self {
        Self::new(MAX_TEXT_LEN, OversizePolicy::Truncate)
    }
}

/// A string guaranteed not to exceed the limit it was built with.
///
/// Ordering, equality and hashing are those of the underlying `str`, so a map
/// keyed by `BoundedText` can be queried with a plain `&str`.
///
/// ```
/// use avl_bimap::{BoundedText, OversizePolicy, TextLimit};
///
/// let limit = TextLimit::new(4, OversizePolicy::Truncate);
/// let text = BoundedText::with_limit("abcdef", &limit).unwrap();
/// assert_eq!(text.as_str(), "abcd");
///
/// let strict = TextLimit::new(4, OversizePolicy::Reject);
/// assert!(BoundedText::with_limit("abcdef", &strict).is_err());
/// ```
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BoundedText(String);

impl BoundedText {
    /// Builds a text under the default limit ([`MAX_TEXT_LEN`] bytes, truncating).
    pub fn new(text: &str) -> Result<Self> {
        Self::with_limit(text, &TextLimit::default())
    }

    /// Builds a text under `limit`.
    pub fn with_limit(text: &str, limit: &TextLimit) -> Result<Self> {
        limit.apply(text).map(|text| Self(text.to_owned()))
    }

    /// Borrows the text as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Unwraps the owned string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl Deref for BoundedText {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for BoundedText {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for BoundedText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for BoundedText {
    type Error = Error;

    fn try_from(text: &str) -> Result<Self> {
        Self::new(text)
    }
}

impl TryFrom<String> for BoundedText {
    type Error = Error;

    fn try_from(mut text: String) -> Result<Self> {
        let len = TextLimit::default().apply(&text)?.len();
        text.truncate(len);
        Ok(Self(text))
    }
}

impl fmt::Debug for BoundedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for BoundedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for BoundedText {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for BoundedText {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        Self::try_from(text).map_err(serde::de::Error::custom)
    }
}
