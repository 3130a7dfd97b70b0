//! Pending-response table.
//!
//! Maps request ids to the one-shot slot the serving task is waiting on.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use uuid::Uuid;

/// Unique identifier for one inbound request.
///
/// A random 128-bit value, rendered as hyphenated lowercase text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Mint a new random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for RequestId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// What a waiting request is woken with.
#[derive(Debug)]
pub(crate) enum SlotResolution {
    /// The external handler answered.
    Delivered(String),
    /// The listener is stopping.
    Cancelled,
}

/// A single outstanding request.
struct PendingSlot {
    sender: oneshot::Sender<SlotResolution>,
    created_at: Instant,
}

/// Thread-safe map of outstanding requests.
///
/// `DashMap` shards its locks, so unrelated ids rarely contend and no lock is
/// ever held while a request waits.
#[derive(Default)]
pub struct PendingTable {
    slots: DashMap<RequestId, PendingSlot>,
}

impl PendingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fresh slot under `id`.
    ///
    /// Returns `None` without touching the existing entry if `id` is taken.
    pub(crate) fn register(&self, id: RequestId) -> Option<oneshot::Receiver<SlotResolution>> {
        match self.slots.entry(id) {
            Entry::Occupied(_) => None,
            Entry::Vacant(vacant) => {
                let (sender, receiver) = oneshot::channel();
                vacant.insert(PendingSlot {
                    sender,
                    created_at: Instant::now(),
                });
                Some(receiver)
            }
        }
    }

    /// Remove the slot and hand `body` to its waiter.
    ///
    /// Returns how long the request had been pending, or `None` if nothing
    /// was waiting under `id`.
    pub(crate) fn resolve(&self, id: &RequestId, body: String) -> Option<Duration> {
        let (_, slot) = self.slots.remove(id)?;
        let waited = slot.created_at.elapsed();
        slot.sender
            .send(SlotResolution::Delivered(body))
            .ok()
            .map(|()| waited)
    }

    /// Drop the slot for `id`. Returns false if it was not present.
    pub fn remove(&self, id: &RequestId) -> bool {
        self.slots.remove(id).is_some()
    }

    /// Wake every waiter with a cancellation and empty the table.
    ///
    /// Returns the number of slots that were pending.
    pub fn cancel_all(&self) -> usize {
        let ids: Vec<RequestId> = self.slots.iter().map(|entry| *entry.key()).collect();
        let mut cancelled = 0;
        for id in ids {
            if let Some((_, slot)) = self.slots.remove(&id) {
                let _ = slot.sender.send(SlotResolution::Cancelled);
                cancelled += 1;
            }
        }
        cancelled
    }

    pub fn contains(&self, id: &RequestId) -> bool {
        self.slots.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl std::fmt::Debug for PendingTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingTable").field("len", &self.len()).finish()
    }
}
