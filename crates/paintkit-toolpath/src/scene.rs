//! JSON scene documents.
//!
//! A scene is an optional canvas plus a bottom-first list of items, each
//! carrying SVG path data and paint:
//!
//! ```json
//! {
//!   "canvas": { "width": 1152, "height": 768 },
//!   "items": [
//!     { "name": "sky", "d": "M0 0 H1152 V300 H0 Z", "fill": "#0066ff" },
//!     { "d": "M100 500 L400 500", "stroke": "#1b1b1b", "strokeWidth": 2 }
//!   ]
//! }
//! ```

use crate::path::ArtPath;
use crate::svg_path::parse_path_data;
use paintkit_core::{ColorId, Palette, Result, Rgb};
use paintkit_settings::CanvasSettings;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One drawable item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// SVG path data
    pub d: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(default = "default_one")]
    pub stroke_width: f64,
    /// Below 1 the item is painted with water only.
    #[serde(default = "default_one")]
    pub opacity: f64,
}

fn default_one() -> f64 {
    1.0
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canvas: Option<CanvasSettings>,
    #[serde(default)]
    pub items: Vec<SceneItem>,
}

impl SceneDocument {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let doc = Self::from_json(&content)?;
        tracing::debug!("Loaded {} scene items from {}", doc.items.len(), path.display());
        Ok(doc)
    }

    /// Converts items to art paths, snapping paint to `palette`.
    ///
    /// Items whose path data cannot be parsed are skipped with a warning.
    pub fn to_art_paths(&self, palette: &Palette) -> Vec<ArtPath> {
        self.items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| {
                let name = item
                    .name
                    .clone()
                    .unwrap_or_else(|| format!("item{}", index + 1));
                let path = match parse_path_data(&item.d) {
                    Ok(path) => path,
                    Err(e) => {
                        tracing::warn!("Skipping scene item '{}': {}", name, e);
                        return None;
                    }
                };
                let fill = snap_paint(palette, item.fill.as_deref(), item.opacity, &name);
                let stroke = snap_paint(palette, item.stroke.as_deref(), item.opacity, &name);
                Some(
                    ArtPath::from_path(name, path)
                        .with_fill(fill)
                        .with_stroke(stroke, item.stroke_width),
                )
            })
            .collect()
    }
}

fn snap_paint(palette: &Palette, paint: Option<&str>, opacity: f64, name: &str) -> ColorId {
    let Some(paint) = paint.map(str::trim) else {
        return ColorId::Blank;
    };
    if paint.is_empty() || paint.eq_ignore_ascii_case("none") {
        return ColorId::Blank;
    }
    let color = match paint.parse::<Rgb>() {
        Ok(color) => Some(color),
        Err(e) => {
            tracing::warn!("'{}': {}, treating as white", name, e);
            None
        }
    };
    palette.snap_color_id(color, opacity)
}
