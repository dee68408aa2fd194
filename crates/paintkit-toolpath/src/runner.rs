//! Job runner.
//!
//! Drives one job through `Idle -> Priming -> Tracing -> Ordering ->
//! Emitting -> Idle`, one bounded quantum of work per [`JobRunner::step`],
//! and queues the resulting motion primitives in a [`CommandBuffer`].
//!
//! Priming resolves occlusion between filled shapes, applies the inset
//! and sets up the fill algorithm. Tracing fills every shape bottom
//! first and then traces outlines. Ordering runs the travel optimizer.
//! Emitting writes one plot path per step. A job can be cancelled
//! between any two steps.

use crate::adapter::{GeometryAdapter, VectorGeometry};
use crate::fill::{offset_region, FillAlgorithm, FillJobContext};
use crate::layer::{PathId, WorkLayer};
use crate::occlusion::OcclusionResolver;
use crate::path::{ArtPath, PlotPath};
use crate::queue::{CommandBuffer, CommandSink};
use crate::scheduler::{Dispatch, Incremental, StepResult};
use crate::stroke::StrokeTracer;
use crate::travel::TravelOptimizer;
use paintkit_core::{ColorId, JobError, MotionPrimitive, Result, ToolId};
use paintkit_settings::Config;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;
use tracing::Span;
use uuid::Uuid;

/// Callback name signalled after the closing park.
pub const JOB_COMPLETE_CALLBACK: &str = "job_complete";

/// Lifecycle of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    /// No job loaded
    Idle,
    /// Occlusion, inset and algorithm setup
    Priming,
    /// Fill and stroke generation
    Tracing,
    /// Travel optimization
    Ordering,
    /// Writing the command stream
    Emitting,
}

impl JobState {
    /// Check if a transition from this state to `target` is valid.
    ///
    /// States advance strictly in order; any state may drop back to
    /// `Idle` (completion or cancellation).
    pub fn can_transition_to(&self, target: JobState) -> bool {
        use JobState::*;
        if *self == target {
            return true;
        }
        matches!(
            (self, target),
            (_, Idle)
                | (Idle, Priming)
                | (Priming, Tracing)
                | (Tracing, Ordering)
                | (Ordering, Emitting)
        )
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, JobState::Idle)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Priming => write!(f, "Priming"),
            Self::Tracing => write!(f, "Tracing"),
            Self::Ordering => write!(f, "Ordering"),
            Self::Emitting => write!(f, "Emitting"),
        }
    }
}

/// Snapshot of job progress.
///
/// While tracing, counts are source shapes; while emitting, plot paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JobProgress {
    pub state: JobState,
    pub paths_done: usize,
    pub paths_total: usize,
}

#[derive(Debug)]
enum Priming {
    Occlusion(OcclusionResolver),
    Inset { ids: Vec<PathId>, next: usize },
    Setup,
}

struct ActiveJob {
    id: Uuid,
    span: Span,
    sources: Vec<ArtPath>,
    priming: Priming,
    fill_ctx: FillJobContext,
    fill: Option<FillAlgorithm>,
    stroke: StrokeTracer,
    fills_done: usize,
    strokes_total: usize,
    plan: VecDeque<PlotPath>,
    paths_done: usize,
    paths_total: usize,
    last_color: Option<ColorId>,
}

/// Runs plotting jobs, one at a time.
pub struct JobRunner {
    config: Config,
    adapter: Rc<dyn GeometryAdapter>,
    state: JobState,
    buffer: CommandBuffer,
    job: Option<ActiveJob>,
}

impl JobRunner {
    /// Runner over the default vector geometry.
    pub fn new(config: Config) -> Self {
        Self::with_adapter(config, Rc::new(VectorGeometry::new()))
    }

    pub fn with_adapter(config: Config, adapter: Rc<dyn GeometryAdapter>) -> Self {
        Self {
            config,
            adapter,
            state: JobState::Idle,
            buffer: CommandBuffer::new(),
            job: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn job_id(&self) -> Option<Uuid> {
        self.job.as_ref().map(|job| job.id)
    }

    pub fn buffer(&self) -> &CommandBuffer {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut CommandBuffer {
        &mut self.buffer
    }

    pub fn progress(&self) -> JobProgress {
        let (paths_done, paths_total) = self
            .job
            .as_ref()
            .map_or((0, 0), |job| (job.paths_done, job.paths_total));
        JobProgress {
            state: self.state,
            paths_done,
            paths_total,
        }
    }

    /// Loads `paths` (bottom first) as a new job.
    pub fn start(&mut self, paths: Vec<ArtPath>) -> Result<Uuid> {
        if self.state.is_active() {
            return Err(JobError::AlreadyRunning {
                state: self.state.to_string(),
            }
            .into());
        }
        let sources: Vec<ArtPath> = paths
            .into_iter()
            .filter(|p| !p.is_empty() && (p.has_fill() || p.has_stroke()))
            .collect();
        if sources.is_empty() {
            return Err(JobError::Empty.into());
        }

        let id = Uuid::new_v4();
        let span = tracing::info_span!("job", id = %id);
        let _enter = span.enter();
        if let Err(e) = self.config.palette.validate() {
            tracing::warn!("{}", e);
        }

        let mut fill_ctx = FillJobContext::new(
            self.config.fill.clone(),
            self.config.canvas.drawable_rect(),
            Rc::clone(&self.adapter),
            self.config.travel.seed,
        );
        for path in sources.iter().filter(|p| p.has_fill()) {
            let closed = path.closed();
            if closed.rings().next().is_some() {
                fill_ctx.layer.insert(closed);
            }
        }
        let priming = if self.config.fill.check_fill_occlusion {
            Priming::Occlusion(OcclusionResolver::new(&fill_ctx.layer))
        } else {
            Priming::Inset {
                ids: fill_ctx.layer.ids().to_vec(),
                next: 0,
            }
        };

        tracing::info!(
            "Starting job with {} paths ({} filled)",
            sources.len(),
            fill_ctx.layer.len()
        );
        drop(_enter);

        self.job = Some(ActiveJob {
            id,
            span,
            sources,
            priming,
            fill_ctx,
            fill: None,
            stroke: StrokeTracer::new(self.config.stroke.clone(), Rc::clone(&self.adapter)),
            fills_done: 0,
            strokes_total: 0,
            plan: VecDeque::new(),
            paths_done: 0,
            paths_total: 0,
            last_color: None,
        });
        self.transition(JobState::Priming)?;
        Ok(id)
    }

    /// Runs one quantum of the active job.
    pub fn step(&mut self) -> Result<StepResult> {
        let Some(job) = self.job.as_mut() else {
            return Ok(StepResult::Done);
        };
        let span = job.span.clone();
        let _enter = span.enter();

        let next = match self.state {
            JobState::Idle => return Ok(StepResult::Done),
            JobState::Priming => prime(job, &self.config, self.adapter.as_ref()),
            JobState::Tracing => trace(job),
            JobState::Ordering => order(job, &self.config),
            JobState::Emitting => emit(job, &self.config, &mut self.buffer),
        };

        if let Some(next) = next {
            self.transition(next)?;
            if next == JobState::Idle {
                self.job = None;
                return Ok(StepResult::Done);
            }
        }
        Ok(StepResult::Continue)
    }

    /// Abandons the active job.
    ///
    /// Commands not yet dispatched are discarded and replaced by a pen
    /// lift and a park. Returns `false` when no job was running.
    pub fn cancel(&mut self) -> bool {
        if !self.state.is_active() {
            return false;
        }
        let previous = self.state;
        if let Some(mut job) = self.job.take() {
            let _enter = job.span.enter();
            if let Some(fill) = job.fill.as_mut() {
                fill.reset();
            }
            job.fill_ctx.reset();
            job.stroke.reset();
            job.plan.clear();
        }
        let cleared = self.buffer.local_clear();
        self.buffer.queue_command(MotionPrimitive::Up);
        self.buffer.queue_command(MotionPrimitive::Park);
        tracing::info!(
            "Job cancelled while {}, {} queued commands discarded",
            previous,
            cleared
        );
        self.state = JobState::Idle;
        true
    }

    fn transition(&mut self, next: JobState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(JobError::InvalidStateTransition {
                current: self.state.to_string(),
                requested: next.to_string(),
            }
            .into());
        }
        tracing::info!("Job state {} -> {}", self.state, next);
        self.state = next;
        Ok(())
    }
}

impl Incremental for JobRunner {
    fn step(&mut self) -> Result<StepResult> {
        JobRunner::step(self)
    }

    fn shutdown(&mut self) {
        self.cancel();
    }
}

impl Dispatch for JobRunner {
    fn dispatch(&mut self, sink: &mut dyn CommandSink) -> Result<usize> {
        self.buffer.dispatch(sink, None)
    }
}

fn prime(job: &mut ActiveJob, config: &Config, adapter: &dyn GeometryAdapter) -> Option<JobState> {
    match &mut job.priming {
        Priming::Occlusion(resolver) => {
            if resolver.step(adapter, &mut job.fill_ctx.layer).is_done() {
                tracing::debug!(
                    "Occlusion resolved, {} shapes fully hidden",
                    resolver.dropped()
                );
                job.priming = Priming::Inset {
                    ids: job.fill_ctx.layer.ids().to_vec(),
                    next: 0,
                };
            }
            None
        }
        Priming::Inset { ids, next } => {
            let inset = config.fill.inset_amount;
            match ids.get(*next).copied() {
                Some(id) if inset > 0.0 => {
                    *next += 1;
                    inset_path(&mut job.fill_ctx.layer, adapter, id, inset);
                }
                _ => job.priming = Priming::Setup,
            }
            None
        }
        Priming::Setup => {
            job.fill = match FillAlgorithm::setup(&job.fill_ctx) {
                Ok(fill) => {
                    tracing::debug!("Fill algorithm: {}", fill.fill_type());
                    Some(fill)
                }
                Err(e) => {
                    tracing::warn!("Skipping fills: {}", e);
                    job.fill_ctx.layer.clear();
                    None
                }
            };
            job.stroke.setup(&job.sources);
            job.strokes_total = job.stroke.remaining();
            job.paths_total = job.fill_ctx.layer.len() + job.strokes_total;
            job.paths_done = 0;
            Some(JobState::Tracing)
        }
    }
}

fn inset_path(layer: &mut WorkLayer, adapter: &dyn GeometryAdapter, id: PathId, inset: f64) {
    let Some(path) = layer.get(id) else {
        return;
    };
    match offset_region(adapter, path, inset) {
        Ok(contours) if contours.is_empty() => {
            tracing::debug!("'{}' vanished after inset", path.name);
            layer.remove(id);
        }
        Ok(contours) => {
            let shrunk = path.with_geometry(contours);
            layer.replace(id, shrunk);
        }
        Err(e) => tracing::warn!("Inset of '{}' failed, filling it unchanged: {}", path.name, e),
    }
}

fn trace(job: &mut ActiveJob) -> Option<JobState> {
    if let Some(id) = job.fill_ctx.layer.bottom() {
        let Some(fill) = job.fill.as_mut() else {
            job.fill_ctx.layer.clear();
            return None;
        };
        let name = job
            .fill_ctx
            .layer
            .get(id)
            .map(|p| p.name.clone())
            .unwrap_or_default();
        let finished = match fill.step(&mut job.fill_ctx, id) {
            Ok(StepResult::Continue) => false,
            Ok(StepResult::Done) => {
                tracing::debug!("Filled '{}'", name);
                true
            }
            Err(e) => {
                tracing::warn!("Fill of '{}' failed, skipping it: {}", name, e);
                fill.reset();
                true
            }
        };
        if finished {
            job.fill_ctx.layer.remove(id);
            job.fills_done += 1;
            job.paths_done = job.fills_done;
        }
        return None;
    }

    let result = job.stroke.step();
    job.paths_done = job.fills_done + job.strokes_total.saturating_sub(job.stroke.remaining());
    result.is_done().then_some(JobState::Ordering)
}

fn order(job: &mut ActiveJob, config: &Config) -> Option<JobState> {
    let mut paths = job.fill_ctx.take_output();
    let fills = paths.len();
    paths.extend(job.stroke.take_output());
    tracing::info!(
        "Traced {} fill and {} stroke paths",
        fills,
        paths.len() - fills
    );

    let mut optimizer = TravelOptimizer::new(&config.travel);
    job.plan = optimizer.optimize(paths, &config.palette).into();
    job.paths_total = job.plan.len();
    job.paths_done = 0;
    Some(JobState::Emitting)
}

fn emit(job: &mut ActiveJob, config: &Config, buffer: &mut CommandBuffer) -> Option<JobState> {
    let Some(path) = job.plan.pop_front() else {
        if config.job.media_mode.allows_water() {
            buffer.queue_command(MotionPrimitive::Wash { dip: None });
        }
        buffer.queue_command(MotionPrimitive::Park);
        buffer.queue_command(MotionPrimitive::callback(JOB_COMPLETE_CALLBACK));
        tracing::info!("Job complete, {} paths emitted", job.paths_done);
        return Some(JobState::Idle);
    };
    job.paths_done += 1;
    emit_path(job, config, buffer, &path);
    None
}

fn emit_path(job: &mut ActiveJob, config: &Config, buffer: &mut CommandBuffer, path: &PlotPath) {
    let Some((first, rest)) = path.points.split_first() else {
        return;
    };
    let media = config.job.media_mode;
    if path.color == ColorId::Water && !media.allows_water() {
        tracing::debug!("Skipping water path '{}' in {:?} mode", path.name, media);
        return;
    }
    let Some(tool) = ToolId::for_color(path.color) else {
        tracing::trace!("Skipping blank path '{}'", path.name);
        return;
    };

    if job.last_color != Some(path.color) {
        if media.allows_water() && config.job.wash_between_colors {
            buffer.queue_command(MotionPrimitive::Wash { dip: None });
        }
        buffer.queue_command(MotionPrimitive::Tool { tool });
        job.last_color = Some(path.color);
    }

    buffer.queue_command(MotionPrimitive::status(format!(
        "Painting {} in {} ({}/{})",
        path.name,
        config.palette.color_name(path.color),
        job.paths_done,
        job.paths_total
    )));
    buffer.queue_command(MotionPrimitive::Up);
    buffer.queue_command(MotionPrimitive::move_to(*first));
    buffer.queue_command(MotionPrimitive::Down);
    buffer.queue_all(rest.iter().map(|p| MotionPrimitive::move_to(*p)));
    buffer.queue_command(MotionPrimitive::Up);
    buffer.queue_command(MotionPrimitive::Progress {
        value: job.paths_done,
        max: job.paths_total,
    });
}
