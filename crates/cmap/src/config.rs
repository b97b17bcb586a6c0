//! Configuration types for the diagram engine.
//!
//! All types implement [`serde::Deserialize`] so hosts can load them from
//! any format; the `cmap` binary reads TOML.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining style and interaction settings.
//! - [`StyleConfig`] - Corner and marker geometry, marker colors and background.
//! - [`InteractionConfig`] - Limits of the settle pass.
//!
//! # Example
//!
//! ```
//! # use cmap::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.style().corner_radius(), 4.0);
//! assert!(config.style().connected_color().is_ok());
//! ```

use serde::Deserialize;

use cmap_core::color::Color;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AppConfig {
    /// Style configuration section.
    #[serde(default)]
    style: StyleConfig,

    /// Interaction configuration section.
    #[serde(default)]
    interaction: InteractionConfig,
}

impl AppConfig {
    pub fn new(style: StyleConfig, interaction: InteractionConfig) -> Self {
        Self { style, interaction }
    }

    pub fn style(&self) -> &StyleConfig {
        &self.style
    }

    pub fn interaction(&self) -> &InteractionConfig {
        &self.interaction
    }

    /// Checks every configured color.
    ///
    /// # Errors
    ///
    /// Returns a description of the first color string that does not parse.
    pub fn validate(&self) -> Result<(), String> {
        self.style.connected_color()?;
        self.style.unconnected_color()?;
        self.style.background_color()?;
        Ok(())
    }
}

/// Visual settings that are fixed per diagram.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    /// Corner radius of every shape created by the diagram.
    corner_radius: f32,
    marker_radius: f32,
    connected_color: String,
    unconnected_color: String,
    marker_opacity: f32,
    background_color: Option<String>,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            corner_radius: 4.0,
            marker_radius: 16.0,
            connected_color: String::from("lightgreen"),
            unconnected_color: String::from("pink"),
            marker_opacity: 0.6,
            background_color: None,
        }
    }
}

impl StyleConfig {
    pub fn corner_radius(&self) -> f32 {
        self.corner_radius
    }

    pub fn marker_radius(&self) -> f32 {
        self.marker_radius
    }

    pub fn marker_opacity(&self) -> f32 {
        self.marker_opacity
    }

    /// Fill of a marker whose link end is anchored.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured string is not a valid [`Color`].
    pub fn connected_color(&self) -> Result<Color, String> {
        Color::new(&self.connected_color)
            .map_err(|err| format!("Invalid connected color in config: {err}"))
    }

    /// Fill of a marker whose link end is free.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured string is not a valid [`Color`].
    pub fn unconnected_color(&self) -> Result<Color, String> {
        Color::new(&self.unconnected_color)
            .map_err(|err| format!("Invalid unconnected color in config: {err}"))
    }

    /// Returns the parsed background [`Color`], or `None` if no color is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured color string cannot be parsed.
    pub fn background_color(&self) -> Result<Option<Color>, String> {
        self.background_color
            .as_ref()
            .map(|color| Color::new(color))
            .transpose()
            .map_err(|err| format!("Invalid background color in config: {err}"))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Component resolutions after which a settle pass gives up.
    max_settle_updates: usize,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            max_settle_updates: 10_000,
        }
    }
}

impl InteractionConfig {
    pub fn new(max_settle_updates: usize) -> Self {
        Self { max_settle_updates }
    }

    pub fn max_settle_updates(&self) -> usize {
        self.max_settle_updates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.style().marker_radius(), 16.0);
        assert_eq!(config.interaction().max_settle_updates(), 10_000);
        assert_eq!(config.style().background_color(), Ok(None));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_color_is_reported() {
        let style = StyleConfig {
            connected_color: String::from("not-a-color"),
            ..StyleConfig::default()
        };
        let config = AppConfig::new(style, InteractionConfig::default());
        let err = config.validate().unwrap_err();
        assert!(err.contains("connected color"));
    }
}
