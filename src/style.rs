//! Flattened style records and the layered merge used for the final
//! primitive style.
//!
//! A [`Style`] is an ordered key → value map. Only numeric values are read
//! as layout constraints; everything else passes through untouched.
//!
//! # Example
//!
//! ```
//! use zenscale::{LayoutConstraints, Style};
//!
//! let host = Style::new()
//!     .with("width", 200.0)
//!     .with("height", "auto")
//!     .with("borderRadius", 4.0);
//!
//! let c = LayoutConstraints::from_style(&host);
//! assert_eq!(c.width, Some(200.0));
//! // Non-numeric values are not constraints.
//! assert_eq!(c.height, None);
//! ```

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use crate::scale::{LayoutConstraints, ResolvedStyle};

pub const WIDTH: &str = "width";
pub const HEIGHT: &str = "height";
pub const MIN_WIDTH: &str = "minWidth";
pub const MIN_HEIGHT: &str = "minHeight";
pub const MAX_WIDTH: &str = "maxWidth";
pub const MAX_HEIGHT: &str = "maxHeight";

/// A single style value.
///
/// Only `Number` is ever read as a constraint. Nested values such as
/// `shadowOffset` objects or `transform` lists are carried as-is.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum StyleValue {
    Null,
    Number(f64),
    Bool(bool),
    Text(String),
    List(Vec<StyleValue>),
    Map(BTreeMap<String, StyleValue>),
}

impl StyleValue {
    /// The value as a number, if it is one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<f64> for StyleValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<u32> for StyleValue {
    fn from(v: u32) -> Self {
        Self::Number(v.into())
    }
}

impl From<&str> for StyleValue {
    fn from(v: &str) -> Self {
        Self::Text(v.into())
    }
}

impl From<String> for StyleValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<bool> for StyleValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<Vec<StyleValue>> for StyleValue {
    fn from(v: Vec<StyleValue>) -> Self {
        Self::List(v)
    }
}

impl From<Style> for StyleValue {
    fn from(v: Style) -> Self {
        Self::Map(v.entries)
    }
}

/// Flattened style record.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Style {
    entries: BTreeMap<String, StyleValue>,
}

impl Style {
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Set `key` and return self.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<StyleValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Set `key`, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<StyleValue>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&StyleValue> {
        self.entries.get(key)
    }

    /// Numeric value of `key`. Absent and non-numeric values are both `None`.
    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(StyleValue::as_number)
    }

    pub fn remove(&mut self, key: &str) -> Option<StyleValue> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &StyleValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Overlay `other` onto this style. Keys in `other` win.
    pub fn merge(&mut self, other: &Style) {
        for (k, v) in &other.entries {
            self.entries.insert(k.clone(), v.clone());
        }
    }

    /// Merge layers in order; later layers win on conflicting keys.
    pub fn layered<'a>(layers: impl IntoIterator<Item = &'a Style>) -> Style {
        let mut out = Style::new();
        for layer in layers {
            out.merge(layer);
        }
        out
    }
}

impl From<ResolvedStyle> for Style {
    fn from(r: ResolvedStyle) -> Self {
        Style::new().with(WIDTH, r.width).with(HEIGHT, r.height)
    }
}

impl<K: Into<String>, V: Into<StyleValue>> FromIterator<(K, V)> for Style {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut style = Style::new();
        for (k, v) in iter {
            style.set(k, v);
        }
        style
    }
}

impl LayoutConstraints {
    /// Read the six dimension keys from a flattened style.
    pub fn from_style(style: &Style) -> Self {
        Self {
            width: style.number(WIDTH),
            height: style.number(HEIGHT),
            min_width: style.number(MIN_WIDTH),
            min_height: style.number(MIN_HEIGHT),
            max_width: style.number(MAX_WIDTH),
            max_height: style.number(MAX_HEIGHT),
        }
    }
}

impl From<&Style> for LayoutConstraints {
    fn from(style: &Style) -> Self {
        Self::from_style(style)
    }
}

/// A host style as written: one record, a registered style id, a null, or
/// a nested list of those.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum StyleInput {
    One(Style),
    Registered(f64),
    Many(Vec<Option<StyleInput>>),
}

#[cfg(feature = "serde")]
impl StyleInput {
    fn flatten_into(self, out: &mut Style) {
        match self {
            Self::One(style) => out.merge(&style),
            // Registered ids carry no inline values to read.
            Self::Registered(id) => log::debug!("style: skipping registered style {id}"),
            Self::Many(layers) => {
                for layer in layers.into_iter().flatten() {
                    layer.flatten_into(out);
                }
            }
        }
    }
}

/// Deserialize a style that may be an object, a registered style number,
/// `null`, or an array of those, flattening later entries over earlier
/// ones.
#[cfg(feature = "serde")]
pub fn deserialize_flattened<'de, D>(deserializer: D) -> Result<Style, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let input: Option<StyleInput> = serde::Deserialize::deserialize(deserializer)?;
    let mut out = Style::new();
    if let Some(input) = input {
        input.flatten_into(&mut out);
    }
    Ok(out)
}
