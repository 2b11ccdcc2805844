//! # Call Arguments
//!
//! A borrowed, typed view of the arguments of one adaptive call.
//!
//! Extractors only ever see an [`Argument<'a>`], which borrows from the
//! caller for the duration of a single extraction. An extractor therefore
//! cannot retain or mutate an argument value.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// The declared type of one method parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ArgumentType {
    /// A string value.
    Text,
    /// A signed integer.
    Integer,
    /// A floating point number.
    Float,
    /// A boolean flag.
    Boolean,
    /// Raw bytes.
    Bytes,
    /// A key-value collection, see [`Properties`].
    Properties,
}

impl ArgumentType {
    /// Stable lower-case name of the type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Bytes => "bytes",
            Self::Properties => "properties",
        }
    }
}

impl fmt::Display for ArgumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A key-value argument from which a selection key can be looked up.
pub trait Properties: Send + Sync {
    /// Returns the value stored under `key`, if any.
    fn property(&self, key: &str) -> Option<&str>;
}

impl<S: std::hash::BuildHasher + Send + Sync> Properties for HashMap<String, String, S> {
    fn property(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }
}

impl Properties for BTreeMap<String, String> {
    fn property(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }
}

impl Properties for [(&str, &str)] {
    fn property(&self, key: &str) -> Option<&str> {
        self.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
    }
}

impl<const N: usize> Properties for [(&str, &str); N] {
    fn property(&self, key: &str) -> Option<&str> {
        self.as_slice().property(key)
    }
}

/// One runtime argument of an adaptive call.
///
/// `Null` stands for an absent value and is acceptable for every
/// [`ArgumentType`].
#[derive(Clone, Copy)]
pub enum Argument<'a> {
    /// An absent value.
    Null,
    /// A string value.
    Text(&'a str),
    /// A signed integer.
    Integer(i64),
    /// A floating point number.
    Float(f64),
    /// A boolean flag.
    Boolean(bool),
    /// Raw bytes.
    Bytes(&'a [u8]),
    /// A key-value collection.
    Properties(&'a dyn Properties),
}

impl<'a> Argument<'a> {
    /// The type of this value, or `None` for [`Argument::Null`].
    pub fn kind(&self) -> Option<ArgumentType> {
        match self {
            Self::Null => None,
            Self::Text(_) => Some(ArgumentType::Text),
            Self::Integer(_) => Some(ArgumentType::Integer),
            Self::Float(_) => Some(ArgumentType::Float),
            Self::Boolean(_) => Some(ArgumentType::Boolean),
            Self::Bytes(_) => Some(ArgumentType::Bytes),
            Self::Properties(_) => Some(ArgumentType::Properties),
        }
    }

    /// Whether this is [`Argument::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The text value, if this is a text argument.
    pub fn as_text(&self) -> Option<&'a str> {
        match *self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// The key-value collection, if this is a properties argument.
    pub fn as_properties(&self) -> Option<&'a dyn Properties> {
        match *self {
            Self::Properties(props) => Some(props),
            _ => None,
        }
    }
}

impl fmt::Debug for Argument<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Text(v) => f.debug_tuple("Text").field(v).finish(),
            Self::Integer(v) => f.debug_tuple("Integer").field(v).finish(),
            Self::Float(v) => f.debug_tuple("Float").field(v).finish(),
            Self::Boolean(v) => f.debug_tuple("Boolean").field(v).finish(),
            Self::Bytes(v) => f.debug_tuple("Bytes").field(&v.len()).finish(),
            Self::Properties(_) => f.write_str("Properties(..)"),
        }
    }
}

impl<'a> From<&'a str> for Argument<'a> {
    fn from(value: &'a str) -> Self {
        Self::Text(value)
    }
}

impl<'a> From<&'a String> for Argument<'a> {
    fn from(value: &'a String) -> Self {
        Self::Text(value.as_str())
    }
}

impl<'a> From<&'a [u8]> for Argument<'a> {
    fn from(value: &'a [u8]) -> Self {
        Self::Bytes(value)
    }
}

impl From<i64> for Argument<'_> {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Argument<'_> {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Argument<'_> {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl<'a, S: std::hash::BuildHasher + Send + Sync> From<&'a HashMap<String, String, S>>
    for Argument<'a>
{
    fn from(value: &'a HashMap<String, String, S>) -> Self {
        Self::Properties(value)
    }
}

impl<'a> From<&'a BTreeMap<String, String>> for Argument<'a> {
    fn from(value: &'a BTreeMap<String, String>) -> Self {
        Self::Properties(value)
    }
}

impl<'a, T> From<Option<T>> for Argument<'a>
where
    T: Into<Argument<'a>>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
