//! # Input Events
//!
//! Parameter updates from the input collaborator (pan, zoom, iteration cap,
//! explicit restart) into the render loop.
//!
//! ```text
//! ┌─────────────┐  SetView / Restart  ┌─────────────┐  drained at tick start  ┌────────────┐
//! │ Input (any  │ ──────────────────> │   bounded   │ ──────────────────────> │ RenderLoop │
//! │  thread)    │                     │   channel   │                         │            │
//! └─────────────┘                     └─────────────┘                         └────────────┘
//! ```

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use scanbrot_core::ViewParams;

/// Events from the input collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    /// New viewport. Starts a new generation unless identical to the last one.
    SetView(ViewParams),
    /// Restart the current view from row 0 under a new generation.
    Restart,
}

/// Bounded input queue.
///
/// Pre-allocated so a burst of input cannot grow memory in the tick loop.
pub struct InputQueue {
    /// Sender end - held by input producers.
    sender: Sender<InputEvent>,
    /// Receiver end - held by the render loop.
    receiver: Receiver<InputEvent>,
}

impl InputQueue {
    /// Creates a queue holding at most `capacity` undelivered events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self { sender, receiver }
    }

    /// Creates a sender handle (clone for multiple producers).
    #[must_use]
    pub fn sender(&self) -> InputSender {
        InputSender {
            sender: self.sender.clone(),
        }
    }

    /// Creates the receiver handle.
    #[must_use]
    pub fn receiver(&self) -> InputReceiver {
        InputReceiver {
            receiver: self.receiver.clone(),
        }
    }
}

/// Handle for sending input events.
#[derive(Clone)]
pub struct InputSender {
    sender: Sender<InputEvent>,
}

impl InputSender {
    /// Sends an event (non-blocking).
    ///
    /// Returns `false` if the queue is full or the loop is gone; the event
    /// is dropped.
    #[inline]
    pub fn send(&self, event: InputEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_) | TrySendError::Disconnected(_)) => false,
        }
    }

    /// Sends a new viewport.
    #[inline]
    pub fn set_view(&self, view: ViewParams) -> bool {
        self.send(InputEvent::SetView(view))
    }

    /// Requests a restart of the current view.
    #[inline]
    pub fn restart(&self) -> bool {
        self.send(InputEvent::Restart)
    }
}

/// Handle for receiving input events.
#[derive(Clone)]
pub struct InputReceiver {
    receiver: Receiver<InputEvent>,
}

impl InputReceiver {
    /// Receives one event (non-blocking).
    #[inline]
    pub fn try_recv(&self) -> Option<InputEvent> {
        self.receiver.try_recv().ok()
    }

    /// Number of pending events.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanbrot_core::Coord;

    #[test]
    fn test_events_arrive_in_order() {
        let queue = InputQueue::new(4);
        let sender = queue.sender();
        let receiver = queue.receiver();
        let view = ViewParams::new(Coord::ZERO, Coord::ZERO, Coord::ONE, 32);

        assert!(sender.set_view(view));
        assert!(sender.restart());
        assert_eq!(receiver.pending_count(), 2);
        assert_eq!(receiver.try_recv(), Some(InputEvent::SetView(view)));
        assert_eq!(receiver.try_recv(), Some(InputEvent::Restart));
        assert_eq!(receiver.try_recv(), None);
    }

    #[test]
    fn test_full_queue_drops() {
        let queue = InputQueue::new(1);
        let sender = queue.sender();
        assert!(sender.restart());
        assert!(!sender.restart());
    }
}
