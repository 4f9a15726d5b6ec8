//! Scoped observer registrations
//!
//! Every native `observe_*` / `add_*_observer` call hands back a
//! [`Subscription`]. Dropping or disposing it performs the matching removal
//! exactly once, so an observer can never outlive the session that owns it.

use tracing::trace;

/// Handle for one live observer registration
#[must_use = "dropping a Subscription removes the observer immediately"]
pub struct Subscription {
    label: &'static str,
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Wrap the removal half of an observer registration
    pub fn new(label: &'static str, cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            label,
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Remove the observer now
    pub fn dispose(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            trace!(observer = self.label, "Removing observer");
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("label", &self.label)
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Subscriptions owned by one playback session, removed newest first
#[derive(Debug, Default)]
pub struct SubscriptionSet {
    entries: Vec<Subscription>,
}

impl SubscriptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, subscription: Subscription) {
        self.entries.push(subscription);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dispose_all(&mut self) {
        while let Some(subscription) = self.entries.pop() {
            subscription.dispose();
        }
    }
}

impl Drop for SubscriptionSet {
    fn drop(&mut self) {
        self.dispose_all();
    }
}
