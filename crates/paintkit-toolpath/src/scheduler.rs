//! Cooperative, tick driven scheduling.
//!
//! Geometry work is split into small resumable steps. An external
//! clock calls [`Scheduler::tick`] once per frame; each tick runs a
//! bounded number of steps so no single frame stalls.

use crate::queue::CommandSink;
use paintkit_core::Result;

/// Outcome of one quantum of incremental work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    /// More work remains; call `step` again.
    Continue,
    /// Finished.
    Done,
}

impl StepResult {
    pub fn is_done(&self) -> bool {
        matches!(self, StepResult::Done)
    }
}

/// A resumable state machine driven by the scheduler.
pub trait Incremental {
    /// Runs one bounded quantum of work.
    fn step(&mut self) -> Result<StepResult>;

    /// Abandons the work in progress, leaving the machine idle.
    fn shutdown(&mut self);
}

/// Runs `iteration_multiplier` steps per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scheduler {
    iteration_multiplier: usize,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(10)
    }
}

impl Scheduler {
    pub fn new(iteration_multiplier: usize) -> Self {
        Self {
            iteration_multiplier: iteration_multiplier.max(1),
        }
    }

    pub fn iteration_multiplier(&self) -> usize {
        self.iteration_multiplier
    }

    /// One frame worth of work.
    pub fn tick(&self, task: &mut dyn Incremental) -> Result<StepResult> {
        for _ in 0..self.iteration_multiplier {
            if task.step()?.is_done() {
                return Ok(StepResult::Done);
            }
        }
        Ok(StepResult::Continue)
    }

    /// Ticks until done, flushing commands to `sink` after every tick.
    ///
    /// Returns the number of ticks used. With `max_ticks` set, the task
    /// is shut down and an error returned once the budget runs out.
    pub fn run_to_completion<T>(
        &self,
        task: &mut T,
        sink: &mut dyn CommandSink,
        max_ticks: Option<usize>,
    ) -> Result<usize>
    where
        T: Incremental + Dispatch,
    {
        let mut ticks = 0usize;
        loop {
            if let Some(limit) = max_ticks {
                if ticks >= limit {
                    task.shutdown();
                    task.dispatch(sink)?;
                    return Err(paintkit_core::Error::other(format!(
                        "Job did not finish within {} ticks",
                        limit
                    )));
                }
            }
            ticks += 1;
            let result = self.tick(task)?;
            task.dispatch(sink)?;
            if result.is_done() {
                tracing::debug!("Task finished after {} ticks", ticks);
                return Ok(ticks);
            }
        }
    }
}

/// Something holding queued commands for a transport.
pub trait Dispatch {
    /// Hands every queued command to `sink`, returning how many went out.
    fn dispatch(&mut self, sink: &mut dyn CommandSink) -> Result<usize>;
}
