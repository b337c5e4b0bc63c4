//! Publish/subscribe registry.
//!
//! Handlers are registered per `EventTag` and receive events in
//! subscription order. Events published while a batch is being delivered
//! land in the queue for the *next* flush, never re-entrantly, so one
//! publish costs at most one extra flush cycle.

use crate::event::{EventTag, SimEvent};
use std::collections::{BTreeMap, VecDeque};

/// Opaque handle returned by `subscribe`; hand it back to `unsubscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionToken(u64);

#[derive(Debug, Clone)]
struct Subscription {
    token:      SubscriptionToken,
    subscriber: usize,
}

#[derive(Debug, Default)]
pub struct EventBus {
    next_token: u64,
    registry:   BTreeMap<EventTag, Vec<Subscription>>,
    pending:    VecDeque<SimEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `subscriber` (an index into the engine's subsystem list)
    /// for every event carrying `tag`.
    pub fn subscribe(&mut self, tag: EventTag, subscriber: usize) -> SubscriptionToken {
        self.next_token += 1;
        let token = SubscriptionToken(self.next_token);
        self.registry
            .entry(tag)
            .or_default()
            .push(Subscription { token, subscriber });
        token
    }

    /// Returns false if the token was already released.
    pub fn unsubscribe(&mut self, token: SubscriptionToken) -> bool {
        for subs in self.registry.values_mut() {
            if let Some(pos) = subs.iter().position(|s| s.token == token) {
                subs.remove(pos);
                return true;
            }
        }
        false
    }

    /// Subscribers of `tag`, in subscription order.
    pub fn subscribers_of(&self, tag: EventTag) -> Vec<usize> {
        self.registry
            .get(&tag)
            .map(|subs| subs.iter().map(|s| s.subscriber).collect())
            .unwrap_or_default()
    }

    pub fn subscription_count(&self) -> usize {
        self.registry.values().map(Vec::len).sum()
    }

    pub fn publish(&mut self, event: SimEvent) {
        self.pending.push_back(event);
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Take everything queued so far as one flush cycle.
    pub fn take_batch(&mut self) -> Vec<SimEvent> {
        self.pending.drain(..).collect()
    }
}

/// All tokens held by one subscriber, released together on shutdown.
#[derive(Debug, Default)]
pub struct SubscriptionSet {
    tokens: Vec<SubscriptionToken>,
}

impl SubscriptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, token: SubscriptionToken) {
        self.tokens.push(token);
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Unsubscribe every held token. Returns how many were still live.
    pub fn release(&mut self, bus: &mut EventBus) -> usize {
        self.tokens
            .drain(..)
            .filter(|token| bus.unsubscribe(*token))
            .count()
    }
}
