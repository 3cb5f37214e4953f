//! Identity-keyed table of outbound channels.
//!
//! Every registry-visible transition happens under one `tokio::sync::Mutex`,
//! and a sender's upsert plus its whole fan-out run inside a single critical
//! section. That gives all sessions one global order, so two broadcasts never
//! interleave at a shared recipient.
//!
//! The lock is held across each recipient's `send().await`. A recipient whose
//! transport stalls therefore stalls every session waiting on the registry.
//! Per-recipient bounded queues would lift that; they are deliberately absent
//! here.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::{Mutex, MutexGuard};

use crate::{channel::MessageSink, message::ChatMessage};

pub struct Registry<S> {
    entries: Mutex<HashMap<String, Arc<S>>>,
}

impl<S: MessageSink> Default for Registry<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: MessageSink> Registry<S> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Takes the registry lock. Everything done through the guard is one
    /// atomic step from the point of view of other sessions.
    pub async fn lock(&self) -> RegistryGuard<'_, S> {
        RegistryGuard {
            entries: self.entries.lock().await,
        }
    }

    /// Registers `channel` under `identity` and fans `message` out to every
    /// other identity, all under one lock. Returns the number of delivery
    /// attempts.
    pub async fn relay(&self, identity: &str, channel: Arc<S>, message: &ChatMessage) -> usize {
        let mut guard = self.lock().await;
        guard.upsert(identity, channel);
        guard.broadcast_except(identity, message).await
    }

    pub async fn upsert(&self, identity: &str, channel: Arc<S>) {
        self.lock().await.upsert(identity, channel);
    }

    pub async fn remove(&self, identity: &str) -> bool {
        self.lock().await.remove(identity)
    }

    pub async fn broadcast_except(&self, sender_identity: &str, message: &ChatMessage) -> usize {
        self.lock()
            .await
            .broadcast_except(sender_identity, message)
            .await
    }

    /// Registered identities, sorted.
    pub async fn identities(&self) -> Vec<String> {
        let mut identities: Vec<String> = self.entries.lock().await.keys().cloned().collect();
        identities.sort();
        identities
    }

    pub async fn channel_for(&self, identity: &str) -> Option<Arc<S>> {
        self.entries.lock().await.get(identity).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

pub struct RegistryGuard<'a, S> {
    entries: MutexGuard<'a, HashMap<String, Arc<S>>>,
}

impl<S: MessageSink> RegistryGuard<'_, S> {
    /// Inserts or replaces the entry for `identity`. Other identities that
    /// point at the same channel are left alone.
    pub fn upsert(&mut self, identity: &str, channel: Arc<S>) {
        self.entries.insert(identity.to_owned(), channel);
    }

    pub fn remove(&mut self, identity: &str) -> bool {
        self.entries.remove(identity).is_some()
    }

    /// Sends `message` to every entry not keyed by `sender_identity`, one
    /// recipient at a time. Returns the number of delivery attempts.
    pub async fn broadcast_except(&self, sender_identity: &str, message: &ChatMessage) -> usize {
        let mut attempts = 0;
        for (identity, channel) in self.entries.iter() {
            if identity == sender_identity {
                continue;
            }
            attempts += 1;
            // A dead recipient loses the message; nobody is told.
            let _discarded: std::io::Result<()> = channel.send(message).await;
        }
        attempts
    }
}
