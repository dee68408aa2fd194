//! Command buffer between the job runner and the motion transport.
//!
//! The runner queues primitives as it emits them; the transport pulls
//! them out with [`CommandBuffer::dispatch`]. Commands still in the
//! buffer can be thrown away with [`CommandBuffer::local_clear`], which
//! is how a cancelled job discards work the machine never saw.

use paintkit_core::{MotionPrimitive, Result};
use std::collections::VecDeque;

/// Receiving end of the primitive stream (a device transport, a file,
/// or a plain vector in tests).
pub trait CommandSink {
    fn send(&mut self, command: &MotionPrimitive) -> Result<()>;
}

impl CommandSink for Vec<MotionPrimitive> {
    fn send(&mut self, command: &MotionPrimitive) -> Result<()> {
        self.push(command.clone());
        Ok(())
    }
}

/// FIFO of primitives not yet handed to the transport.
#[derive(Debug, Clone, Default)]
pub struct CommandBuffer {
    queue: VecDeque<MotionPrimitive>,
    dispatched: usize,
    paused: bool,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_command(&mut self, command: MotionPrimitive) {
        self.queue.push_back(command);
    }

    pub fn queue_all(&mut self, commands: impl IntoIterator<Item = MotionPrimitive>) {
        self.queue.extend(commands);
    }

    pub fn queued_count(&self) -> usize {
        self.queue.len()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Commands handed to a sink over the buffer's lifetime.
    pub fn dispatched_count(&self) -> usize {
        self.dispatched
    }

    /// Next command the transport will receive.
    pub fn peek(&self) -> Option<&MotionPrimitive> {
        self.queue.front()
    }

    /// Sends up to `max` commands (all when `None`) to `sink`.
    ///
    /// A command the sink rejects goes back to the front of the queue
    /// and the error is returned; nothing after it is sent. A paused
    /// buffer sends nothing.
    pub fn dispatch(&mut self, sink: &mut dyn CommandSink, max: Option<usize>) -> Result<usize> {
        if self.paused {
            return Ok(0);
        }
        let limit = max.unwrap_or(usize::MAX);
        let mut sent = 0;
        while sent < limit {
            let Some(command) = self.queue.pop_front() else {
                break;
            };
            if let Err(e) = sink.send(&command) {
                tracing::warn!("Transport rejected '{}': {}", command, e);
                self.queue.push_front(command);
                return Err(e);
            }
            sent += 1;
            self.dispatched += 1;
        }
        Ok(sent)
    }

    /// Takes every queued command without a sink.
    pub fn drain(&mut self) -> Vec<MotionPrimitive> {
        let drained: Vec<MotionPrimitive> = self.queue.drain(..).collect();
        self.dispatched += drained.len();
        drained
    }

    /// Discards every command not yet dispatched, returning how many.
    pub fn local_clear(&mut self) -> usize {
        let cleared = self.queue.len();
        self.queue.clear();
        if cleared > 0 {
            tracing::debug!("Cleared {} undispatched commands", cleared);
        }
        cleared
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paintkit_core::{Error, Point};

    struct FailAfter {
        accepted: Vec<MotionPrimitive>,
        limit: usize,
    }

    impl CommandSink for FailAfter {
        fn send(&mut self, command: &MotionPrimitive) -> Result<()> {
            if self.accepted.len() >= self.limit {
                return Err(Error::other("transport full"));
            }
            self.accepted.push(command.clone());
            Ok(())
        }
    }

    #[test]
    fn test_dispatch_in_order() {
        let mut buffer = CommandBuffer::new();
        buffer.queue_all([
            MotionPrimitive::Up,
            MotionPrimitive::move_to(Point::new(1.0, 1.0)),
            MotionPrimitive::Down,
        ]);
        let mut sink = Vec::new();
        assert_eq!(buffer.dispatch(&mut sink, Some(2)).unwrap(), 2);
        assert_eq!(sink[0], MotionPrimitive::Up);
        assert_eq!(buffer.queued_count(), 1);
        assert_eq!(buffer.peek(), Some(&MotionPrimitive::Down));
        assert_eq!(buffer.dispatch(&mut sink, None).unwrap(), 1);
        assert_eq!(buffer.dispatched_count(), 3);
    }

    #[test]
    fn test_rejected_command_stays_queued() {
        let mut buffer = CommandBuffer::new();
        buffer.queue_all([MotionPrimitive::Up, MotionPrimitive::Park]);
        let mut sink = FailAfter {
            accepted: Vec::new(),
            limit: 1,
        };
        assert!(buffer.dispatch(&mut sink, None).is_err());
        assert_eq!(buffer.peek(), Some(&MotionPrimitive::Park));
        assert_eq!(sink.accepted, vec![MotionPrimitive::Up]);
        assert_eq!(buffer.dispatched_count(), 1);
    }

    #[test]
    fn test_local_clear_and_pause() {
        let mut buffer = CommandBuffer::new();
        buffer.queue_all([MotionPrimitive::Down, MotionPrimitive::Up]);
        buffer.pause();
        let mut sink = Vec::new();
        assert_eq!(buffer.dispatch(&mut sink, None).unwrap(), 0);
        assert_eq!(buffer.local_clear(), 2);
        assert!(buffer.is_empty());
        buffer.resume();
        assert!(!buffer.is_paused());
    }
}
