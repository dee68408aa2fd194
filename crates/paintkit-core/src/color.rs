//! Colors, media sets, and color snapping.
//!
//! Artwork colors are arbitrary; the plotter only has a handful of
//! paints. Every color is snapped to the nearest palette entry using
//! Euclidean distance in YUV space, which tracks perceived difference
//! better than raw RGB.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Converts to YUV (full range YCbCr, chroma centred on 128).
    pub fn to_yuv(&self) -> Yuv {
        let r = self.r as f64;
        let g = self.g as f64;
        let b = self.b as f64;
        Yuv {
            y: 0.299 * r + 0.587 * g + 0.114 * b,
            u: -0.168736 * r - 0.331264 * g + 0.5 * b + 128.0,
            v: 0.5 * r - 0.418688 * g - 0.081312 * b + 128.0,
        }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Rgb {
    type Err = ConfigError;

    /// Parses `#rgb` and `#rrggbb` (leading `#` optional).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        let invalid = || ConfigError::InvalidColor(s.to_string());
        let channel = |range: &str| u8::from_str_radix(range, 16).map_err(|_| invalid());

        match hex.len() {
            6 => Ok(Rgb::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            3 => {
                let expand = |c: &str| channel(&c.repeat(2));
                Ok(Rgb::new(
                    expand(&hex[0..1])?,
                    expand(&hex[1..2])?,
                    expand(&hex[2..3])?,
                ))
            }
            _ => Err(invalid()),
        }
    }
}

impl Serialize for Rgb {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// YUV triple used for perceptual distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Yuv {
    pub y: f64,
    pub u: f64,
    pub v: f64,
}

impl Yuv {
    pub fn distance(&self, other: &Yuv) -> f64 {
        ((self.y - other.y).powi(2) + (self.u - other.u).powi(2) + (self.v - other.v).powi(2))
            .sqrt()
    }
}

/// Resolved color of a path: a paint, water, or nothing at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorId {
    /// Index into the active palette.
    Palette(usize),
    /// Translucent artwork, painted with water only.
    Water,
    /// Matches the substrate; never rendered.
    Blank,
}

impl ColorId {
    pub fn is_blank(&self) -> bool {
        matches!(self, ColorId::Blank)
    }
}

impl fmt::Display for ColorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Palette(i) => write!(f, "color{}", i),
            Self::Water => write!(f, "water"),
            Self::Blank => write!(f, "blank"),
        }
    }
}

/// One paint in a media set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaColor {
    pub name: String,
    pub color: Rgb,
}

impl MediaColor {
    pub fn new(name: impl Into<String>, color: Rgb) -> Self {
        Self {
            name: name.into(),
            color,
        }
    }
}

/// An ordered set of paints plus the substrate color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Palette {
    pub name: String,
    pub colors: Vec<MediaColor>,
    /// Substrate color; artwork snapping here is not painted.
    #[serde(default = "default_blank")]
    pub blank: Rgb,
}

fn default_blank() -> Rgb {
    Rgb::WHITE
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            name: "Crayola".to_string(),
            colors: vec![
                MediaColor::new("Black", Rgb::new(0x1b, 0x1b, 0x1b)),
                MediaColor::new("Red", Rgb::new(0xed, 0x0a, 0x3f)),
                MediaColor::new("Orange", Rgb::new(0xff, 0x88, 0x33)),
                MediaColor::new("Yellow", Rgb::new(0xfb, 0xe8, 0x70)),
                MediaColor::new("Green", Rgb::new(0x01, 0xa6, 0x38)),
                MediaColor::new("Blue", Rgb::new(0x00, 0x66, 0xff)),
                MediaColor::new("Violet", Rgb::new(0x83, 0x59, 0xa3)),
                MediaColor::new("Brown", Rgb::new(0xaf, 0x59, 0x3e)),
            ],
            blank: Rgb::WHITE,
        }
    }
}

impl Palette {
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Checks the palette can snap colors.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.colors.is_empty() {
            return Err(ConfigError::MalformedPalette(format!(
                "palette '{}' has no colors",
                self.name
            )));
        }
        if let Some(c) = self.colors.iter().find(|c| c.name.trim().is_empty()) {
            return Err(ConfigError::MalformedPalette(format!(
                "palette '{}' has an unnamed color {}",
                self.name, c.color
            )));
        }
        Ok(())
    }

    /// Snaps an artwork color to a paint.
    ///
    /// Translucent input resolves to [`ColorId::Water`]. Missing colors
    /// are treated as white. The substrate color takes part in the
    /// search, so white artwork resolves to [`ColorId::Blank`].
    pub fn snap_color_id(&self, color: Option<Rgb>, opacity: f64) -> ColorId {
        if opacity < 1.0 {
            return ColorId::Water;
        }
        let color = color.unwrap_or(Rgb::WHITE);
        let target = color.to_yuv();

        let mut best = ColorId::Blank;
        let mut best_dist = self.blank.to_yuv().distance(&target);
        for (i, media) in self.colors.iter().enumerate() {
            let dist = media.color.to_yuv().distance(&target);
            if dist < best_dist {
                best = ColorId::Palette(i);
                best_dist = dist;
            }
        }
        best
    }

    /// Index of the paint closest to `color`, ignoring the substrate.
    pub fn closest_color(&self, color: Rgb) -> Option<usize> {
        let swatches: Vec<Rgb> = self.colors.iter().map(|c| c.color).collect();
        closest_color(color, &swatches)
    }

    /// Paint order: ascending luminosity, then water, then blank.
    pub fn luminosity_order(&self) -> Vec<ColorId> {
        let mut indices: Vec<usize> = (0..self.colors.len()).collect();
        indices.sort_by(|a, b| {
            let ya = self.colors[*a].color.to_yuv().y;
            let yb = self.colors[*b].color.to_yuv().y;
            ya.total_cmp(&yb).then(a.cmp(b))
        });
        let mut order: Vec<ColorId> = indices.into_iter().map(ColorId::Palette).collect();
        order.push(ColorId::Water);
        order.push(ColorId::Blank);
        order
    }

    /// Position of `id` in [`Palette::luminosity_order`].
    pub fn paint_rank(&self, id: ColorId) -> usize {
        self.luminosity_order()
            .iter()
            .position(|c| *c == id)
            .unwrap_or(usize::MAX)
    }

    pub fn color_name(&self, id: ColorId) -> String {
        match id {
            ColorId::Palette(i) => self
                .colors
                .get(i)
                .map(|c| c.name.clone())
                .unwrap_or_else(|| id.to_string()),
            ColorId::Water => "Water".to_string(),
            ColorId::Blank => "Blank".to_string(),
        }
    }
}

/// Index of the swatch with the smallest YUV distance to `color`.
///
/// Ties resolve to the lowest index. Returns `None` for an empty slice.
pub fn closest_color(color: Rgb, swatches: &[Rgb]) -> Option<usize> {
    let target = color.to_yuv();
    swatches
        .iter()
        .enumerate()
        .map(|(i, c)| (i, c.to_yuv().distance(&target)))
        .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
        .map(|(i, _)| i)
}
