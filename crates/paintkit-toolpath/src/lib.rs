//! # PaintKit Toolpath
//!
//! Turns layered, colored vector artwork into an ordered stream of motion
//! primitives for a painting plotter.
//!
//! ## Pipeline
//!
//! ```text
//! Scene items (bottom first)
//!   └── Occlusion Resolver (visible remainder of each filled shape)
//!         ├── Fill Algorithm (line / zigzag / smooth, overlay / spiral, cam)
//!         └── Stroke Tracer (unobstructed outline fragments)
//!               └── Travel Optimizer (color groups, greedy or TSP)
//!                     └── Job Runner (tool changes, washes, pen up/down)
//!                           └── Command Buffer -> transport
//! ```
//!
//! All geometry work is incremental: every stage advances one bounded
//! step at a time so a [`Scheduler`] can interleave it with other work.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use paintkit_toolpath::{JobRunner, Scheduler, SceneDocument};
//!
//! let scene = SceneDocument::load(path)?;
//! let mut runner = JobRunner::new(config);
//! runner.start(scene.to_art_paths(&runner.config().palette))?;
//!
//! let mut stream = Vec::new();
//! Scheduler::default().run_to_completion(&mut runner, &mut stream, None)?;
//! ```

pub mod adapter;
pub mod fill;
pub mod layer;
pub mod occlusion;
pub mod path;
pub mod queue;
pub mod runner;
pub mod scene;
pub mod scheduler;
pub mod simplify;
pub mod stroke;
pub mod svg_path;
pub mod travel;

pub use adapter::{closest_intersection, GeometryAdapter, HitOptions, Intersection, VectorGeometry};
pub use fill::{offset_region, FillAlgorithm, FillJobContext};
pub use layer::{PathId, WorkLayer};
pub use occlusion::{resolve_occlusion, OcclusionResolver};
pub use path::{ArtPath, Contour, PathRole, PlotPath};
pub use queue::{CommandBuffer, CommandSink};
pub use runner::{JobProgress, JobRunner, JobState, JOB_COMPLETE_CALLBACK};
pub use scene::{SceneDocument, SceneItem};
pub use scheduler::{Dispatch, Incremental, Scheduler, StepResult};
pub use stroke::StrokeTracer;
pub use svg_path::parse_path_data;
pub use travel::{travel_distance, TravelOptimizer};
