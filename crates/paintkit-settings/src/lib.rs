//! PaintKit Settings Crate
//!
//! Handles engine configuration and settings persistence.

pub mod config;
pub mod persistence;

pub use config::{
    CanvasSettings, Config, FillSettings, FillType, JobSettings, MediaMode, OverlayAlign,
    StrokeSettings, TravelAlgorithm, TravelSettings,
};
pub use persistence::{default_config_path, SettingsPersistence};
