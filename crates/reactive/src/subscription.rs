//! Push subscriptions on result tables.
//!
//! Callbacks run synchronously, in subscription order, while the table
//! that owns the manager is mutably borrowed. A callback must not reach
//! back into that table.

use alloc::boxed::Box;
use alloc::vec::Vec;

/// Unique identifier for a subscription.
pub type SubscriptionId = u64;

/// Callback invoked for each change.
pub type ChangeCallback<C> = Box<dyn FnMut(&C)>;

/// A registered callback.
pub struct Subscription<C> {
    id: SubscriptionId,
    callback: ChangeCallback<C>,
}

impl<C> Subscription<C> {
    pub fn new<F>(id: SubscriptionId, callback: F) -> Self
    where
        F: FnMut(&C) + 'static,
    {
        Self {
            id,
            callback: Box::new(callback),
        }
    }

    #[inline]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Delivers one change.
    pub fn notify(&mut self, change: &C) {
        (self.callback)(change);
    }
}

/// Ordered set of subscriptions.
pub struct SubscriptionManager<C> {
    subscriptions: Vec<Subscription<C>>,
    next_id: SubscriptionId,
}

impl<C> Default for SubscriptionManager<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> SubscriptionManager<C> {
    pub fn new() -> Self {
        Self {
            subscriptions: Vec::new(),
            next_id: 1,
        }
    }

    /// Subscribes with the given callback.
    ///
    /// Returns the id to unsubscribe with.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&C) + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;
        self.subscriptions.push(Subscription::new(id, callback));
        id
    }

    /// Unsubscribes by id.
    ///
    /// Returns true if the subscription was found and removed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|sub| sub.id() != id);
        self.subscriptions.len() != before
    }

    /// Delivers a change to every subscriber.
    pub fn notify_all(&mut self, change: &C) {
        for sub in &mut self.subscriptions {
            sub.notify(change);
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Returns all subscription ids in subscription order.
    pub fn subscription_ids(&self) -> Vec<SubscriptionId> {
        self.subscriptions.iter().map(Subscription::id).collect()
    }

    pub fn clear(&mut self) {
        self.subscriptions.clear();
    }
}
