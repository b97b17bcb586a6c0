//! Loosely typed attribute values.
//!
//! Hosts that drive the diagram from untyped input (scene files, scripting
//! bridges) read and write component attributes by name through
//! [`Diagram::attr`](crate::Diagram::attr) and
//! [`Diagram::set_attr`](crate::Diagram::set_attr). Values are coerced to the
//! attribute's type; see [`AttrValue`].

use std::fmt;

use serde::Deserialize;

/// Attribute names of a shape, in reporting order.
pub const SHAPE_ATTRIBUTES: &[&str] = &[
    "content",
    "content_type",
    "x",
    "y",
    "width",
    "height",
    "background_color",
    "border_color",
    "border_width",
    "text_color",
    "draggable",
];

/// Attribute names of a link, in reporting order.
pub const LINK_ATTRIBUTES: &[&str] = &[
    "content",
    "content_type",
    "cx",
    "cy",
    "width",
    "height",
    "background_color",
    "border_color",
    "border_width",
    "text_color",
    "source_x",
    "source_y",
    "target_x",
    "target_y",
    "line_color",
    "line_width",
    "has_arrow",
    "draggable",
];

/// Attribute names of a connector marker. All of them are read-only.
pub const MARKER_ATTRIBUTES: &[&str] = &["x", "y", "r", "connected"];

/// A dynamically typed attribute value.
///
/// Coercion rules:
///
/// - numeric attributes accept numbers and numeric text (`"200"`); anything
///   else falls back to the attribute's default,
/// - text attributes stringify numbers and booleans,
/// - boolean attributes take the truthiness of the value.
///
/// ```
/// # use cmap::attr::AttrValue;
/// assert_eq!(AttrValue::from("200").as_number(), Some(200.0));
/// assert_eq!(AttrValue::from(12.5).to_text(), "12.5");
/// assert!(!AttrValue::from("").is_truthy());
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Number(f64),
    Text(String),
    Bool(bool),
}

impl AttrValue {
    /// The numeric value, if there is one.
    pub fn as_number(&self) -> Option<f64> {
        let number = match self {
            Self::Number(number) => *number,
            Self::Text(text) => text.trim().parse::<f64>().ok()?,
            Self::Bool(flag) => f64::from(u8::from(*flag)),
        };
        number.is_finite().then_some(number)
    }

    pub fn to_text(&self) -> String {
        match self {
            Self::Number(number) => number.to_string(),
            Self::Text(text) => text.clone(),
            Self::Bool(flag) => flag.to_string(),
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Number(number) => *number != 0.0 && !number.is_nan(),
            Self::Text(text) => !text.is_empty(),
            Self::Bool(flag) => *flag,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<f32> for AttrValue {
    fn from(value: f32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Coerces an optional value to a number, using `default` when it is absent
/// or not numeric.
pub(crate) fn number_or(value: Option<&AttrValue>, default: f32) -> f32 {
    value
        .and_then(AttrValue::as_number)
        .map_or(default, |number| number as f32)
}

pub(crate) fn text_or(value: Option<&AttrValue>, default: &str) -> String {
    value.map_or_else(|| default.to_owned(), AttrValue::to_text)
}

pub(crate) fn flag_or(value: Option<&AttrValue>, default: bool) -> bool {
    value.map_or(default, AttrValue::is_truthy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(number_or(Some(&AttrValue::from("200")), 75.0), 200.0);
        assert_eq!(number_or(Some(&AttrValue::from(" 12.5 ")), 75.0), 12.5);
        assert_eq!(number_or(Some(&AttrValue::from("wide")), 75.0), 75.0);
        assert_eq!(number_or(Some(&AttrValue::Number(f64::NAN)), 75.0), 75.0);
        assert_eq!(number_or(None, 30.0), 30.0);
        assert_eq!(number_or(Some(&AttrValue::from(true)), 0.0), 1.0);
    }

    #[test]
    fn test_text_coercion() {
        assert_eq!(text_or(Some(&AttrValue::from(200.0)), ""), "200");
        assert_eq!(text_or(Some(&AttrValue::from(false)), ""), "false");
        assert_eq!(text_or(None, "#333"), "#333");
    }

    #[test]
    fn test_truthiness() {
        assert!(flag_or(Some(&AttrValue::from(1.0)), false));
        assert!(!flag_or(Some(&AttrValue::from(0.0)), true));
        assert!(flag_or(Some(&AttrValue::from("no")), false));
        assert!(flag_or(None, true));
    }
}
