//! Observable cells.
//!
//! The engine exposes its result collection, loading flag, and user-action
//! flag through explicit observable cells: a value behind a lock plus a
//! subscriber list that is notified on every write. Consumers poll with
//! [`Cell::get`] or react through the receiver returned by
//! [`Cell::subscribe`].

use parking_lot::RwLock;
use std::sync::mpsc::{self, Receiver, Sender};

/// A mutable observable value with subscriber notification.
///
/// Writes replace the value wholesale and fan the new value out to every
/// live subscriber. Disconnected subscribers are pruned on the next write.
pub struct Cell<T> {
    value: RwLock<T>,
    subscribers: RwLock<Vec<Sender<T>>>,
}

impl<T: Clone> Cell<T> {
    /// Creates a cell holding `initial`.
    pub fn new(initial: T) -> Self {
        Self {
            value: RwLock::new(initial),
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Returns a clone of the current value.
    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Replaces the value and notifies all subscribers with a clone of it.
    pub fn set(&self, value: T) {
        *self.value.write() = value.clone();

        let mut subscribers = self.subscribers.write();
        subscribers.retain(|tx| tx.send(value.clone()).is_ok());
    }

    /// Subscribes to the cell.
    ///
    /// Returns a receiver that observes every subsequent write in order.
    /// The receiver should be drained regularly to avoid unbounded growth.
    pub fn subscribe(&self) -> Receiver<T> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.write().push(tx);
        rx
    }

    /// Returns the number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

impl<T: Clone + std::fmt::Debug> std::fmt::Debug for Cell<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cell")
            .field("value", &*self.value.read())
            .field("subscribers", &self.subscribers.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn get_and_set() {
        let cell = Cell::new(0u32);
        assert_eq!(cell.get(), 0);
        cell.set(7);
        assert_eq!(cell.get(), 7);
    }

    #[test]
    fn subscribers_observe_writes_in_order() {
        let cell = Cell::new(0u32);
        let rx = cell.subscribe();

        cell.set(1);
        cell.set(2);

        assert_eq!(rx.recv().unwrap(), 1);
        assert_eq!(rx.recv().unwrap(), 2);
    }

    #[test]
    fn multiple_subscribers() {
        let cell = Cell::new("initial".to_string());
        let rx1 = cell.subscribe();
        let rx2 = cell.subscribe();

        cell.set("next".to_string());

        assert_eq!(rx1.recv().unwrap(), "next");
        assert_eq!(rx2.recv().unwrap(), "next");
    }

    #[test]
    fn disconnected_subscribers_are_pruned() {
        let cell = Cell::new(0u32);
        let rx = cell.subscribe();
        assert_eq!(cell.subscriber_count(), 1);

        drop(rx);
        cell.set(1);
        assert_eq!(cell.subscriber_count(), 0);
    }

    #[test]
    fn threaded_subscribe() {
        let cell = Arc::new(Cell::new(0u32));
        let rx = cell.subscribe();

        let writer = Arc::clone(&cell);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            writer.set(42);
        });

        assert_eq!(rx.recv_timeout(Duration::from_millis(500)).unwrap(), 42);
        handle.join().unwrap();
    }
}
