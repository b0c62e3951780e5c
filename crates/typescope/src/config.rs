//! Configuration types for type graph rendering.
//!
//! All types implement [`serde::Deserialize`] with every field optional, so a
//! partial TOML document only overrides what it names.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining every section.
//! - [`LayoutConfig`] - Separation constants and rank direction of the layered layout.
//! - [`AnimationConfig`] - Whether renders tween, and how long tweens last.
//! - [`ViewportConfig`] - Zoom limits used when refitting the viewport.
//! - [`StyleConfig`] - Colors and node metrics, resolved into a [`Theme`].
//!
//! # Example
//!
//! ```
//! # use typescope::config::AppConfig;
//! let config: AppConfig = toml::from_str(r#"
//!     [layout]
//!     rank_separation = 300
//!
//!     [style]
//!     active_line_color = "orange"
//! "#).unwrap();
//!
//! assert_eq!(config.layout().rank_separation(), 300.0);
//! assert_eq!(config.layout().node_separation(), 200.0);
//! assert!(config.theme().is_ok());
//! ```

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use typescope_core::color::{Color, ColorError};

use crate::layout::{LayoutOptions, RankDirection};

/// A configuration value is unusable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid `{field}`: {source}")]
    InvalidColor {
        field: &'static str,
        #[source]
        source: ColorError,
    },

    #[error("invalid `{field}`: {reason}")]
    InvalidValue {
        field: &'static str,
        reason: &'static str,
    },
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default)]
    layout: LayoutConfig,

    #[serde(default)]
    animation: AnimationConfig,

    #[serde(default)]
    viewport: ViewportConfig,

    #[serde(default)]
    style: StyleConfig,
}

impl AppConfig {
    /// Creates a configuration from its sections.
    pub fn new(
        layout: LayoutConfig,
        animation: AnimationConfig,
        viewport: ViewportConfig,
        style: StyleConfig,
    ) -> Self {
        Self {
            layout,
            animation,
            viewport,
            style,
        }
    }

    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    pub fn animation(&self) -> &AnimationConfig {
        &self.animation
    }

    pub fn viewport(&self) -> &ViewportConfig {
        &self.viewport
    }

    pub fn style(&self) -> &StyleConfig {
        &self.style
    }

    /// Resolves the style section into a [`Theme`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a color does not parse or a metric is not
    /// positive.
    pub fn theme(&self) -> Result<Theme, ConfigError> {
        Theme::from_style(&self.style)
    }

    /// Checks every numeric setting.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError::InvalidValue`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("layout.node_separation", self.layout.node_separation)?;
        positive("layout.rank_separation", self.layout.rank_separation)?;
        positive("viewport.max_zoom", self.viewport.max_zoom)?;
        positive("viewport.fit_padding", self.viewport.fit_padding)?;
        if !(self.viewport.zoom_cap_ratio > 0.0 && self.viewport.zoom_cap_ratio <= 1.0) {
            return Err(ConfigError::InvalidValue {
                field: "viewport.zoom_cap_ratio",
                reason: "must be in (0, 1]",
            });
        }
        if self.animation.frame_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "animation.frame_interval_ms",
                reason: "must be at least 1",
            });
        }
        self.theme().map(|_| ())
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field,
            reason: "must be a positive number",
        })
    }
}

/// Layered layout settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    node_separation: f32,
    rank_separation: f32,
    direction: RankDirection,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_separation: 200.0,
            rank_separation: 500.0,
            direction: RankDirection::LeftToRight,
        }
    }
}

impl LayoutConfig {
    pub fn new(node_separation: f32, rank_separation: f32, direction: RankDirection) -> Self {
        Self {
            node_separation,
            rank_separation,
            direction,
        }
    }

    /// Gap between neighbouring nodes of one rank.
    pub fn node_separation(&self) -> f32 {
        self.node_separation
    }

    /// Gap between consecutive ranks.
    pub fn rank_separation(&self) -> f32 {
        self.rank_separation
    }

    pub fn direction(&self) -> RankDirection {
        self.direction
    }

    /// Options passed to the layout engine.
    pub fn options(&self) -> LayoutOptions {
        LayoutOptions::new(self.node_separation, self.rank_separation, self.direction)
    }
}

/// Tween settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnimationConfig {
    enabled: bool,
    transition_duration_ms: u64,
    frame_interval_ms: u64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            transition_duration_ms: 500,
            frame_interval_ms: 16,
        }
    }
}

impl AnimationConfig {
    /// Whether renders tween by default.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Duration shared by position tweens, color fades and viewport tweens.
    pub fn transition_duration(&self) -> Duration {
        Duration::from_millis(self.transition_duration_ms)
    }

    /// Step of the default frame clock.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

/// Viewport refit settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewportConfig {
    max_zoom: f32,
    fit_padding: f32,
    zoom_cap_ratio: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            max_zoom: 20.0,
            fit_padding: 1.2,
            zoom_cap_ratio: 0.6,
        }
    }
}

impl ViewportConfig {
    pub fn max_zoom(&self) -> f32 {
        self.max_zoom
    }

    /// Multiplier applied to the content/viewport ratio when refitting.
    pub fn fit_padding(&self) -> f32 {
        self.fit_padding
    }

    /// Fraction of `max_zoom` a refit may never exceed.
    pub fn zoom_cap_ratio(&self) -> f32 {
        self.zoom_cap_ratio
    }

    /// The highest zoom a refit may choose.
    pub fn zoom_cap(&self) -> f32 {
        self.max_zoom * self.zoom_cap_ratio
    }
}

/// Visual styling, as written in configuration files.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StyleConfig {
    background_color: String,
    active_line_color: String,
    inactive_line_color: String,
    node_color: String,
    text_color: String,
    row_height: f32,
    header_height: f32,
    node_width: f32,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            background_color: "#f4f6f8".to_string(),
            active_line_color: "#2f80ed".to_string(),
            inactive_line_color: "#c8ced6".to_string(),
            node_color: "white".to_string(),
            text_color: "#25313c".to_string(),
            row_height: 40.0,
            header_height: 50.0,
            node_width: 300.0,
        }
    }
}

/// Resolved visual styling.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    background: Color,
    active_line: Color,
    inactive_line: Color,
    node: Color,
    text: Color,
    row_height: f32,
    header_height: f32,
    node_width: f32,
}

impl Theme {
    /// Parses the colors of a [`StyleConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] naming the first invalid setting.
    pub fn from_style(style: &StyleConfig) -> Result<Self, ConfigError> {
        let color = |field: &'static str, value: &str| {
            Color::new(value).map_err(|source| ConfigError::InvalidColor { field, source })
        };
        positive("style.row_height", style.row_height)?;
        positive("style.header_height", style.header_height)?;
        positive("style.node_width", style.node_width)?;

        Ok(Self {
            background: color("style.background_color", &style.background_color)?,
            active_line: color("style.active_line_color", &style.active_line_color)?,
            inactive_line: color("style.inactive_line_color", &style.inactive_line_color)?,
            node: color("style.node_color", &style.node_color)?,
            text: color("style.text_color", &style.text_color)?,
            row_height: style.row_height,
            header_height: style.header_height,
            node_width: style.node_width,
        })
    }

    pub fn background(&self) -> Color {
        self.background
    }

    /// Stroke of highlighted edges.
    pub fn active_line(&self) -> Color {
        self.active_line
    }

    /// Stroke of every other edge while something is highlighted.
    pub fn inactive_line(&self) -> Color {
        self.inactive_line
    }

    pub fn node(&self) -> Color {
        self.node
    }

    pub fn text(&self) -> Color {
        self.text
    }

    /// Height of one field row.
    pub fn row_height(&self) -> f32 {
        self.row_height
    }

    /// Height of the title band above the field rows.
    pub fn header_height(&self) -> f32 {
        self.header_height
    }

    pub fn node_width(&self) -> f32 {
        self.node_width
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::from_style(&StyleConfig::default()).expect("default style is valid")
    }
}
