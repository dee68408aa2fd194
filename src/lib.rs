//! # PaintKit
//!
//! Toolpath engine for watercolor painting plotters. Layered, colored
//! vector artwork goes in; an ordered stream of motion primitives (pen
//! moves, tool changes, brush washes) comes out.
//!
//! ## Architecture
//!
//! PaintKit is organized as a workspace with multiple crates:
//!
//! 1. **paintkit-core** - Geometry, colors and palettes, motion primitives, errors
//! 2. **paintkit-settings** - Typed configuration, JSON/TOML persistence
//! 3. **paintkit-toolpath** - Occlusion, fills, strokes, travel ordering, job runner
//! 4. **paintkit** - Headless driver that runs a scene file to completion

use anyhow::Context;
use paintkit_core::MotionPrimitive;
use paintkit_settings::{Config, SettingsPersistence};
use paintkit_toolpath::{ArtPath, CommandSink, JobRunner, SceneDocument, Scheduler};
use std::io::Write;
use std::path::Path;

pub use paintkit_core::{ColorId, Error, Palette, Point, Rect, Result, ToolId};
pub use paintkit_settings as settings;
pub use paintkit_toolpath as toolpath;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize logging with the default configuration
///
/// Logs go to stderr so the primitive stream on stdout stays clean.
/// `RUST_LOG` refines the default `info` level.
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to install the tracing subscriber")?;
    Ok(())
}

/// How primitives are written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// One `Display` line per primitive, e.g. `move 10.000 20.000`
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Writes every primitive it receives as one line.
pub struct LineSink<W: Write> {
    writer: W,
    format: OutputFormat,
    written: usize,
}

impl<W: Write> LineSink<W> {
    pub fn new(writer: W, format: OutputFormat) -> Self {
        Self {
            writer,
            format,
            written: 0,
        }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> CommandSink for LineSink<W> {
    fn send(&mut self, command: &MotionPrimitive) -> Result<()> {
        match self.format {
            OutputFormat::Text => writeln!(self.writer, "{}", command)?,
            OutputFormat::Json => {
                serde_json::to_writer(&mut self.writer, command)?;
                writeln!(self.writer)?;
            }
        }
        self.written += 1;
        Ok(())
    }
}

/// Loads the configuration and the scene's art paths.
///
/// A missing or unreadable config falls back to the defaults. A canvas
/// given in the scene replaces the configured one.
pub fn load_job(scene: &Path, config: Option<&Path>) -> anyhow::Result<(Config, Vec<ArtPath>)> {
    let mut config = SettingsPersistence::load_or_default(config).into_config();
    let document = SceneDocument::load(scene)
        .with_context(|| format!("Failed to load scene {}", scene.display()))?;
    if let Some(canvas) = document.canvas.clone() {
        config.canvas = canvas;
    }
    config.validate().context("Invalid configuration")?;
    let paths = document.to_art_paths(&config.palette);
    Ok((config, paths))
}

/// Runs one job to completion, streaming primitives into `sink`.
///
/// Returns the number of scheduler ticks used.
pub fn run_job(
    config: Config,
    paths: Vec<ArtPath>,
    sink: &mut dyn CommandSink,
) -> anyhow::Result<usize> {
    let scheduler = Scheduler::new(config.job.iteration_multiplier);
    let mut runner = JobRunner::new(config);
    let id = runner.start(paths).context("Failed to start job")?;
    tracing::debug!("Running job {}", id);
    let ticks = scheduler
        .run_to_completion(&mut runner, sink, None)
        .context("Job failed")?;
    Ok(ticks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const SCENE: &str = r##"{
        "canvas": { "width": 300, "height": 200 },
        "items": [
            {
                "name": "leaf",
                "d": "M20 20 L120 20 L120 90 L20 90 Z",
                "fill": "#01a638",
                "stroke": "#1b1b1b"
            }
        ]
    }"##;

    #[test]
    fn test_text_stream() {
        let dir = tempfile::tempdir().unwrap();
        let scene = dir.path().join("scene.json");
        fs::write(&scene, SCENE).unwrap();

        let (config, paths) = load_job(&scene, None).unwrap();
        assert_eq!(config.canvas.width, 300.0);
        assert_eq!(paths.len(), 1);

        let mut sink = LineSink::new(Vec::new(), OutputFormat::Text);
        run_job(config, paths, &mut sink).unwrap();
        let written = sink.written();
        let text = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), written);
        assert!(lines.contains(&"tool color4"));
        assert!(lines.contains(&"tool color0"));
        assert_eq!(lines[lines.len() - 2], "park");
        assert_eq!(lines[lines.len() - 1], "callback job_complete");
    }

    #[test]
    fn test_json_stream_with_toml_config() {
        let dir = tempfile::tempdir().unwrap();
        let scene = dir.path().join("scene.json");
        fs::write(&scene, SCENE).unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(
            &config_path,
            "[fill]\nfillType = \"cam\"\n\n[job]\nmediaMode = \"pen\"\n",
        )
        .unwrap();

        let (config, paths) = load_job(&scene, Some(&config_path)).unwrap();
        assert_eq!(config.fill.fill_type, "cam");

        let mut sink = LineSink::new(Vec::new(), OutputFormat::Json);
        run_job(config, paths, &mut sink).unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();

        let commands: Vec<serde_json::Value> = text
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert!(commands.iter().all(|c| c["cmd"] != "wash"));
        assert_eq!(commands.last().unwrap()["cmd"], "callback");
    }

    #[test]
    fn test_missing_scene_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_job(&dir.path().join("nope.json"), None).unwrap_err();
        assert!(err.to_string().contains("Failed to load scene"));
    }
}
