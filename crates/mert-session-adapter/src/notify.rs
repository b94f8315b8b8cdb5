/*
[INPUT]:  Events published by the client and the session controller
[OUTPUT]: Fan-out to every subscriber holding a receiver
[POS]:    Shared publish/subscribe channel, constructed and passed explicitly
[UPDATE]: When changing channel capacity or delivery semantics
*/

use tokio::sync::broadcast;
use tracing::trace;

const DEFAULT_CAPACITY: usize = 64;

/// Explicitly constructed publish/subscribe channel.
///
/// Cloning a `Notifier` yields another handle to the same channel. Events
/// published while nobody is subscribed are dropped; slow subscribers see
/// `RecvError::Lagged` instead of blocking publishers.
#[derive(Debug, Clone)]
pub struct Notifier<T: Clone> {
    tx: broadcast::Sender<T>,
}

impl<T: Clone> Notifier<T> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish an event, returning how many subscribers will see it.
    pub fn publish(&self, event: T) -> usize {
        match self.tx.send(event) {
            Ok(receivers) => receivers,
            Err(_) => {
                trace!("notification dropped, no subscribers");
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<T> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl<T: Clone> Default for Notifier<T> {
    fn default() -> Self {
        Self::new()
    }
}
