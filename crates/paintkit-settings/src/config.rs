//! Configuration and settings management for PaintKit
//!
//! Provides configuration file handling, settings management, and validation.
//! Supports JSON and TOML file formats.
//!
//! Configuration is organized into logical sections:
//! - Canvas geometry (drawable area and margin)
//! - Fill settings (algorithm, angle, spacing, hatching)
//! - Stroke settings (sample precision, overshoot)
//! - Travel ordering (greedy or TSP refinement)
//! - Job execution (per-tick work budget, media mode)
//! - Palette (the media set paints are snapped to)

use paintkit_core::{ConfigError, Error, Palette, Point, Rect, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Fill algorithm selection.
///
/// Stored as a string in [`FillSettings::fill_type`] and resolved when a
/// job starts, so an unknown value only disables fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FillType {
    /// Parallel lines, each drawn separately
    LineStraight,
    /// Parallel lines joined end to end
    LineZigzag,
    /// Joined lines with corners rounded and simplified
    LineSmooth,
    /// Custom overlay pattern clipped to each shape
    Overlay,
    /// Archimedean spiral clipped to each shape
    Spiral,
    /// Offset pocketing, like a CNC pocket operation
    Cam,
}

impl FillType {
    pub const ALL: [FillType; 6] = [
        FillType::LineStraight,
        FillType::LineZigzag,
        FillType::LineSmooth,
        FillType::Overlay,
        FillType::Spiral,
        FillType::Cam,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LineStraight => "line-straight",
            Self::LineZigzag => "line-zigzag",
            Self::LineSmooth => "line-smooth",
            Self::Overlay => "overlay",
            Self::Spiral => "spiral",
            Self::Cam => "cam",
        }
    }
}

impl fmt::Display for FillType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FillType {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        FillType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| ConfigError::UnknownFillType(s.to_string()))
    }
}

/// Travel ordering strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TravelAlgorithm {
    /// Nearest endpoint stitching
    #[default]
    Greedy,
    /// Random tour refined with 2-opt
    TspOpt,
    /// Ant colony tour construction
    TspAco,
}

impl fmt::Display for TravelAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Greedy => write!(f, "greedy"),
            Self::TspOpt => write!(f, "tsp-opt"),
            Self::TspAco => write!(f, "tsp-aco"),
        }
    }
}

impl FromStr for TravelAlgorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "greedy" => Ok(Self::Greedy),
            "tsp-opt" | "tsp" => Ok(Self::TspOpt),
            "tsp-aco" | "aco" => Ok(Self::TspAco),
            _ => Err(ConfigError::UnknownTravelAlgorithm(s.to_string())),
        }
    }
}

/// What is loaded in the implement holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaMode {
    /// Brush with paint wells and water dishes
    #[default]
    Watercolor,
    /// Pen or marker; water actions are ignored
    Pen,
}

impl MediaMode {
    pub fn allows_water(&self) -> bool {
        matches!(self, Self::Watercolor)
    }
}

/// Where an overlay pattern is centred for each shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayAlign {
    /// Centroid of the shape being filled
    #[default]
    Path,
    /// Centre of the canvas, shared by every shape
    View,
}

/// Drawable area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasSettings {
    pub width: f64,
    pub height: f64,
    /// No-draw border on every side
    #[serde(default)]
    pub margin: f64,
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            width: 1152.0,
            height: 768.0,
            margin: 0.0,
        }
    }
}

impl CanvasSettings {
    /// The area inside the margin.
    pub fn drawable_rect(&self) -> Rect {
        Rect::new(
            self.margin,
            self.margin,
            (self.width - 2.0 * self.margin).max(0.0),
            (self.height - 2.0 * self.margin).max(0.0),
        )
    }
}

/// Fill settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FillSettings {
    /// Algorithm name, see [`FillType`]
    pub fill_type: String,
    /// Line angle in degrees
    pub fill_angle: f64,
    /// Distance between fill lines
    pub fill_spacing: f64,
    /// Flattening resolution and overlay sample step
    pub fill_precision: f64,
    /// Width of the implement's mark
    pub line_width: f64,
    /// Second pass at 90 degrees
    pub hatch: bool,
    /// Pick a random angle for every shape
    pub randomize_angle: bool,
    /// Shrink shapes before filling
    pub inset_amount: f64,
    /// Subtract shapes drawn above before filling
    pub check_fill_occlusion: bool,
    /// Max gap for chaining neighbouring scan segments; 0 uses twice the spacing
    pub grouping_threshold: f64,
    pub overlay_align: OverlayAlign,
    /// Custom overlay curve, used by the `overlay` fill type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlay_pattern: Option<Vec<Point>>,
}

impl Default for FillSettings {
    fn default() -> Self {
        Self {
            fill_type: FillType::LineZigzag.as_str().to_string(),
            fill_angle: 28.0,
            fill_spacing: 10.0,
            fill_precision: 5.0,
            line_width: 10.0,
            hatch: false,
            randomize_angle: false,
            inset_amount: 0.0,
            check_fill_occlusion: true,
            grouping_threshold: 0.0,
            overlay_align: OverlayAlign::Path,
            overlay_pattern: None,
        }
    }
}

impl FillSettings {
    /// Resolves the configured fill algorithm.
    pub fn resolve_fill_type(&self) -> std::result::Result<FillType, ConfigError> {
        self.fill_type.parse()
    }

    /// Effective chaining distance for scan segments.
    pub fn effective_grouping_threshold(&self) -> f64 {
        if self.grouping_threshold > 0.0 {
            self.grouping_threshold
        } else {
            self.fill_spacing * 2.0
        }
    }
}

/// Stroke settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StrokeSettings {
    /// Arc length between samples along a stroke
    pub stroke_precision: f64,
    /// Extra distance traced past the start of closed outlines
    pub stroke_overshoot: f64,
    /// Trace the outline of filled shapes that have no stroke
    pub trace_fill_outlines: bool,
}

impl Default for StrokeSettings {
    fn default() -> Self {
        Self {
            stroke_precision: 2.0,
            stroke_overshoot: 5.0,
            trace_fill_outlines: false,
        }
    }
}

/// Travel ordering settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TravelSettings {
    pub travel_algorithm: TravelAlgorithm,
    /// Improvement iterations for the TSP solvers
    pub tsp_iterations: usize,
    /// Seed for reproducible tours; random when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for TravelSettings {
    fn default() -> Self {
        Self {
            travel_algorithm: TravelAlgorithm::Greedy,
            tsp_iterations: 50,
            seed: None,
        }
    }
}

/// Job execution settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobSettings {
    /// `step` calls per scheduler tick
    pub iteration_multiplier: usize,
    pub media_mode: MediaMode,
    /// Wash the brush whenever the paint changes
    pub wash_between_colors: bool,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            iteration_multiplier: 10,
            media_mode: MediaMode::Watercolor,
            wash_between_colors: true,
        }
    }
}

/// Complete application configuration
///
/// Aggregates all settings sections and provides file I/O operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub canvas: CanvasSettings,
    pub fill: FillSettings,
    pub stroke: StrokeSettings,
    pub travel: TravelSettings,
    pub job: JobSettings,
    pub palette: Palette,
}

fn out_of_range(name: &str, value: f64, requirement: &str) -> Error {
    ConfigError::OutOfRange {
        name: name.to_string(),
        value,
        requirement: requirement.to_string(),
    }
    .into()
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        let config: Self = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::from_str(&content)
                .map_err(|e| Error::other(format!("Invalid TOML config: {}", e)))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.display().to_string()).into());
        };

        config.validate()?;
        Ok(config)
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        self.validate()?;

        let content = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::to_string_pretty(self)?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::to_string_pretty(self)
                .map_err(|e| Error::other(format!("Failed to serialize config: {}", e)))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.display().to_string()).into());
        };

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    ///
    /// Only rejects values that would make the engine loop forever or
    /// divide by zero. An unknown fill type is not an error here.
    pub fn validate(&self) -> Result<()> {
        if self.canvas.width <= 0.0 {
            return Err(out_of_range("width", self.canvas.width, "> 0"));
        }
        if self.canvas.height <= 0.0 {
            return Err(out_of_range("height", self.canvas.height, "> 0"));
        }
        if self.canvas.margin < 0.0 {
            return Err(out_of_range("margin", self.canvas.margin, ">= 0"));
        }

        if self.fill.fill_spacing <= 0.0 {
            return Err(out_of_range("fillSpacing", self.fill.fill_spacing, "> 0"));
        }
        if self.fill.fill_precision <= 0.0 {
            return Err(out_of_range(
                "fillPrecision",
                self.fill.fill_precision,
                "> 0",
            ));
        }
        if self.fill.line_width < 0.0 {
            return Err(out_of_range("lineWidth", self.fill.line_width, ">= 0"));
        }
        if self.fill.inset_amount < 0.0 {
            return Err(out_of_range("insetAmount", self.fill.inset_amount, ">= 0"));
        }
        if !self.fill.fill_angle.is_finite() {
            return Err(out_of_range("fillAngle", self.fill.fill_angle, "finite"));
        }

        if self.stroke.stroke_precision <= 0.0 {
            return Err(out_of_range(
                "strokePrecision",
                self.stroke.stroke_precision,
                "> 0",
            ));
        }
        if self.stroke.stroke_overshoot < 0.0 {
            return Err(out_of_range(
                "strokeOvershoot",
                self.stroke.stroke_overshoot,
                ">= 0",
            ));
        }

        if self.job.iteration_multiplier == 0 {
            return Err(out_of_range("iterationMultiplier", 0.0, ">= 1"));
        }

        self.palette.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_type_parse() {
        assert_eq!("line-zigzag".parse::<FillType>().unwrap(), FillType::LineZigzag);
        assert_eq!(" CAM ".parse::<FillType>().unwrap(), FillType::Cam);
        assert!(matches!(
            "crosshatch".parse::<FillType>(),
            Err(ConfigError::UnknownFillType(_))
        ));
    }

    #[test]
    fn test_fill_type_round_trip() {
        for t in FillType::ALL {
            assert_eq!(t.as_str().parse::<FillType>().unwrap(), t);
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_spacing() {
        let mut config = Config::default();
        config.fill.fill_spacing = 0.0;
        let err = config.validate().unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_unknown_fill_type_is_valid_config() {
        let mut config = Config::default();
        config.fill.fill_type = "mystery".to_string();
        assert!(config.validate().is_ok());
        assert!(config.fill.resolve_fill_type().is_err());
    }

    #[test]
    fn test_grouping_threshold_default() {
        let fill = FillSettings::default();
        assert_eq!(fill.effective_grouping_threshold(), 20.0);
    }

    #[test]
    fn test_drawable_rect_respects_margin() {
        let canvas = CanvasSettings {
            width: 100.0,
            height: 50.0,
            margin: 5.0,
        };
        let rect = canvas.drawable_rect();
        assert_eq!(rect.min, Point::new(5.0, 5.0));
        assert_eq!(rect.max, Point::new(95.0, 45.0));
    }

    #[test]
    fn test_camel_case_keys() {
        let json = r#"{"fill": {"fillType": "spiral", "fillSpacing": 4.0, "hatch": true}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.fill.resolve_fill_type().unwrap(), FillType::Spiral);
        assert_eq!(config.fill.fill_spacing, 4.0);
        assert!(config.fill.hatch);
        assert_eq!(config.stroke, StrokeSettings::default());
    }
}
