//! Color handling for cmap diagrams
//!
//! This module provides the [`Color`] type which wraps the `DynamicColor` type
//! from the color crate. The engine itself stores colors as the strings it is
//! given; [`Color`] is used where a color must be validated, such as theme
//! values loaded from configuration.

use std::{
    hash::{Hash, Hasher},
    str::FromStr,
};

use color::DynamicColor;

/// Wrapper around the `DynamicColor` type from the color crate
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Color {
    color: DynamicColor,
}

impl Eq for Color {}

impl Hash for Color {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_string().hash(state);
    }
}

impl Color {
    /// Create a new `Color` from a CSS color string such as "#ff0000",
    /// "rgb(255, 0, 0)" or "lightgreen".
    ///
    /// # Examples
    ///
    /// ```
    /// use cmap_core::color::Color;
    ///
    /// let connected = Color::new("lightgreen").unwrap();
    /// let border = Color::new("#333").unwrap();
    /// assert!(Color::new("not-a-color").is_err());
    /// ```
    pub fn new(color_str: &str) -> Result<Self, String> {
        match DynamicColor::from_str(color_str) {
            Ok(color) => Ok(Self { color }),
            Err(err) => Err(format!("invalid color `{color_str}`: {err}")),
        }
    }

    /// Creates a new color with the specified alpha (transparency) value.
    ///
    /// # Examples
    ///
    /// ```
    /// use cmap_core::color::Color;
    ///
    /// let pink = Color::new("pink").unwrap().with_alpha(0.6);
    /// assert!((pink.alpha() - 0.6).abs() < 0.001);
    /// ```
    pub fn with_alpha(self, alpha: f32) -> Self {
        Color {
            color: self.color.with_alpha(alpha),
        }
    }

    /// Returns the alpha component of this color, between 0.0 and 1.0.
    pub fn alpha(&self) -> f32 {
        self.color.components[3]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::new("black").expect("'black' is a valid CSS color")
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_new() {
        assert!(Color::new("#a7cbe6").is_ok());
        assert!(Color::new("lightgreen").is_ok());
        assert!(Color::new("not-a-color").is_err());
    }

    #[test]
    fn test_color_from_str() {
        let parsed: Result<Color, _> = "pink".parse();
        assert!(parsed.is_ok());
    }

    #[test]
    fn test_color_default() {
        assert_eq!(Color::default().to_string(), "black");
    }

    #[test]
    fn test_color_with_alpha() {
        let color = Color::new("pink").unwrap().with_alpha(0.25);
        assert!((color.alpha() - 0.25).abs() < 0.001);
    }

    #[test]
    fn test_color_eq_hash() {
        use std::collections::HashSet;

        let green1 = Color::new("lightgreen").unwrap();
        let green2 = Color::new("lightgreen").unwrap();
        let pink = Color::new("pink").unwrap();

        assert_eq!(green1, green2);
        assert_ne!(green1, pink);

        let mut set = HashSet::new();
        set.insert(green1);
        assert!(set.contains(&green2));
        assert!(!set.contains(&pink));
    }
}
