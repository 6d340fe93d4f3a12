//! Explicit resize subscriptions.
//!
//! Hosts publish container sizes on a [`ResizeBus`]; each subscriber holds a
//! [`ResizeSubscription`] guard that keeps only the latest size. Dropping the
//! guard detaches it, so nothing outlives the component that subscribed.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::Size;

type Slot = Cell<Option<Size>>;

/// Single-threaded broadcaster of container sizes.
#[derive(Debug, Default)]
pub struct ResizeBus {
    subscribers: RefCell<Vec<Weak<Slot>>>,
}

impl ResizeBus {
    /// Create a bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber.
    #[must_use]
    pub fn subscribe(&self) -> ResizeSubscription {
        let slot = Rc::new(Cell::new(None));
        self.subscribers.borrow_mut().push(Rc::downgrade(&slot));
        ResizeSubscription { slot }
    }

    /// Deliver a new container size to every live subscriber.
    ///
    /// Detached subscribers are pruned. Returns how many were notified.
    pub fn publish(&self, size: Size) -> usize {
        let mut subscribers = self.subscribers.borrow_mut();
        subscribers.retain(|weak| match weak.upgrade() {
            Some(slot) => {
                slot.set(Some(size));
                true
            }
            None => false,
        });
        tracing::trace!(
            "Resize {}x{} delivered to {} subscriber(s)",
            size.width,
            size.height,
            subscribers.len()
        );
        subscribers.len()
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .borrow()
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }
}

/// Guard for one resize subscription. Dropping it unsubscribes.
#[derive(Debug)]
pub struct ResizeSubscription {
    slot: Rc<Slot>,
}

impl ResizeSubscription {
    /// Latest size published since the last call, if any.
    pub fn take_latest(&self) -> Option<Size> {
        self.slot.take()
    }

    /// Detach explicitly.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscriber_sees_latest_size_once() {
        let bus = ResizeBus::new();
        let sub = bus.subscribe();
        bus.publish(Size::new(100.0, 100.0));
        bus.publish(Size::new(200.0, 150.0));
        assert_eq!(sub.take_latest(), Some(Size::new(200.0, 150.0)));
        assert_eq!(sub.take_latest(), None);
    }

    #[test]
    fn dropped_subscription_is_pruned() {
        let bus = ResizeBus::new();
        let keep = bus.subscribe();
        let gone = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        gone.unsubscribe();
        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(bus.publish(Size::new(1.0, 1.0)), 1);
        assert!(keep.take_latest().is_some());
    }
}
