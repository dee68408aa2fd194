//! Motion primitives emitted by the job runner.
//!
//! The stream is consumed strictly in order by an external transport.
//! Tool changes and washes are barriers the transport may not reorder
//! across.

use crate::color::ColorId;
use crate::geometry::Point;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Physical tool slot on the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolId {
    /// Paint well for a palette index.
    Color(usize),
    /// Water dish (the machine has several; `0` is the first).
    Water(u8),
}

impl ToolId {
    /// Tool used to paint with a resolved color. Blank has no tool.
    pub fn for_color(color: ColorId) -> Option<ToolId> {
        match color {
            ColorId::Palette(i) => Some(ToolId::Color(i)),
            ColorId::Water => Some(ToolId::Water(0)),
            ColorId::Blank => None,
        }
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Color(i) => write!(f, "color{}", i),
            Self::Water(i) => write!(f, "water{}", i),
        }
    }
}

/// One command in the plot stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "lowercase")]
pub enum MotionPrimitive {
    Move { x: f64, y: f64 },
    Up,
    Down,
    Tool { tool: ToolId },
    /// Full brush wash. `dip` selects a specific water dish.
    Wash { dip: Option<u8> },
    Park,
    Status { message: String },
    Progress { value: usize, max: usize },
    Callback { name: String },
}

impl MotionPrimitive {
    pub fn move_to(p: Point) -> Self {
        MotionPrimitive::Move { x: p.x, y: p.y }
    }

    pub fn status(message: impl Into<String>) -> Self {
        MotionPrimitive::Status {
            message: message.into(),
        }
    }

    pub fn callback(name: impl Into<String>) -> Self {
        MotionPrimitive::Callback { name: name.into() }
    }
}

impl fmt::Display for MotionPrimitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Move { x, y } => write!(f, "move {:.3} {:.3}", x, y),
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
            Self::Tool { tool } => write!(f, "tool {}", tool),
            Self::Wash { dip: Some(d) } => write!(f, "wash {}", d),
            Self::Wash { dip: None } => write!(f, "wash"),
            Self::Park => write!(f, "park"),
            Self::Status { message } => write!(f, "status {}", message),
            Self::Progress { value, max } => write!(f, "progress {} {}", value, max),
            Self::Callback { name } => write!(f, "callback {}", name),
        }
    }
}
