//! Disposable subscription handles
//!
//! Every event source in this crate (the host updater, the config store, the
//! broadcasters) hands back a [`Subscription`] when something registers with
//! it. Disposing the handle unregisters the callback. Owners that hold several
//! handles keep them in a [`CompositeSubscription`] and release them together.

use std::fmt;

type Unsubscribe = Box<dyn FnOnce() + Send>;

/// Handle to a registered callback. Dropping it unregisters the callback.
#[must_use = "dropping a Subscription immediately unregisters its callback"]
pub struct Subscription {
    unsubscribe: Option<Unsubscribe>,
}

impl Subscription {
    /// Create a handle that runs `unsubscribe` exactly once on disposal
    pub fn new(unsubscribe: impl FnOnce() + Send + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    /// A handle with nothing to release
    pub fn empty() -> Self {
        Self { unsubscribe: None }
    }

    /// Unregister the callback. Safe to call more than once.
    pub fn dispose(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.unsubscribe.is_none()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// An ordered bundle of subscriptions released in a single call.
#[derive(Debug, Default)]
pub struct CompositeSubscription {
    subscriptions: Vec<Subscription>,
    disposed: bool,
}

impl CompositeSubscription {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a subscription.
    ///
    /// Once the bundle has been disposed, added subscriptions are released
    /// immediately.
    pub fn add(&mut self, mut subscription: Subscription) {
        if self.disposed {
            subscription.dispose();
            return;
        }
        self.subscriptions.push(subscription);
    }

    /// Release every held subscription in registration order. Idempotent.
    pub fn dispose(&mut self) {
        self.disposed = true;
        for mut subscription in self.subscriptions.drain(..) {
            subscription.dispose();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn counting_subscription() -> (Subscription, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let sub = Subscription::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (sub, count)
    }

    #[test]
    fn test_dispose_runs_unsubscribe_once() {
        let (mut sub, count) = counting_subscription();
        assert!(!sub.is_disposed());

        sub.dispose();
        sub.dispose();

        assert!(sub.is_disposed());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_disposes() {
        let (sub, count) = counting_subscription();
        drop(sub);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_after_dispose_does_not_repeat() {
        let (mut sub, count) = counting_subscription();
        sub.dispose();
        drop(sub);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_empty_subscription_is_disposed() {
        let mut sub = Subscription::empty();
        assert!(sub.is_disposed());
        sub.dispose();
    }

    #[test]
    fn test_composite_disposes_in_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut composite = CompositeSubscription::new();
        for i in 0..3 {
            let order = order.clone();
            composite.add(Subscription::new(move || order.lock().unwrap().push(i)));
        }
        assert_eq!(composite.len(), 3);

        composite.dispose();

        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
        assert!(composite.is_empty());
        assert!(composite.is_disposed());
    }

    #[test]
    fn test_composite_dispose_is_idempotent() {
        let (sub, count) = counting_subscription();
        let mut composite = CompositeSubscription::new();
        composite.add(sub);

        composite.dispose();
        composite.dispose();

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_add_after_dispose_releases_immediately() {
        let mut composite = CompositeSubscription::new();
        composite.dispose();

        let (sub, count) = counting_subscription();
        composite.add(sub);

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(composite.is_empty());
    }
}
