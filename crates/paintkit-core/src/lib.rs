//! # PaintKit Core
//!
//! Core types and utilities for PaintKit.
//! Provides the fundamental value types shared by the settings and
//! toolpath crates: plane geometry, colors and palettes, motion
//! primitives, and the unified error type.

pub mod color;
pub mod error;
pub mod geometry;
pub mod motion;

pub use color::{closest_color, ColorId, MediaColor, Palette, Rgb, Yuv};
pub use error::{ConfigError, Error, GeometryError, JobError, Result};
pub use geometry::{centroid, polyline_length, signed_area, Point, Rect};
pub use motion::{MotionPrimitive, ToolId};
