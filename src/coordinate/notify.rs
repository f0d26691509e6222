//! Invalid-transform notifications
//!
//! Transform failures are always returned to the caller. Observers registered
//! here additionally hear about every failure, e.g. to drive a status display.

use std::fmt;
use std::sync::mpsc::{self, Receiver};

use crate::crs::errors::TransformFailure;

type InvalidTransformCallback = Box<dyn Fn(&TransformFailure) + Send + Sync>;

/// Handle returned when an observer is registered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Registry of observers interested in invalid transform input
#[derive(Default)]
pub struct InvalidTransformNotifier {
    observers: Vec<(ObserverId, InvalidTransformCallback)>,
    next_id: u64,
}

impl InvalidTransformNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback invoked with every transform failure
    pub fn subscribe<F>(&mut self, callback: F) -> ObserverId
    where
        F: Fn(&TransformFailure) + Send + Sync + 'static,
    {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, Box::new(callback)));
        id
    }

    /// Register a channel receiving a copy of every transform failure
    ///
    /// The observer stays registered after the receiver is dropped; sends to a
    /// closed channel are ignored.
    pub fn subscribe_channel(&mut self) -> (ObserverId, Receiver<TransformFailure>) {
        let (sender, receiver) = mpsc::channel();
        let id = self.subscribe(move |failure| {
            let _ = sender.send(failure.clone());
        });
        (id, receiver)
    }

    /// Remove an observer, returning whether it was registered
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(observer_id, _)| *observer_id != id);
        self.observers.len() != before
    }

    /// Deliver a failure to every observer, in registration order
    pub fn notify(&self, failure: &TransformFailure) {
        for (_, callback) in &self.observers {
            callback(failure);
        }
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl fmt::Debug for InvalidTransformNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvalidTransformNotifier")
            .field("observers", &self.observers.len())
            .finish()
    }
}
