/// Arena-backed recency list used as the tracker's ordered index
pub(crate) mod order;

use std::{
    collections::HashMap,
    num::NonZeroUsize,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use log::{debug, trace};
use thiserror::Error;

use crate::{message::Message, tracker::order::RecencyList};

pub type SharedMessageTracker = Arc<RecencyTracker>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackerError {
    #[error("Message not found: {0}")]
    NotFound(String),
}

/// What `add` did with a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// New id, stored without evicting anything
    Inserted,
    /// Id was already tracked. Only its recency changed, the stored message is kept
    Refreshed,
    /// New id, stored after evicting the least recently touched message
    Evicted(Arc<Message>),
}

impl AddOutcome {
    /// True if the message had already been seen
    pub fn is_duplicate(&self) -> bool {
        matches!(self, AddOutcome::Refreshed)
    }
}

/// Tracks a fixed amount of recently seen messages.
/// Messages come out first-in-first-out; a duplicate is never stored twice
pub trait MessageTracker: Send + Sync {
    /// Add a message, evicting the least recently touched one if full.
    /// Adding a known id moves it to the front without replacing the stored message
    fn add(&self, message: Message) -> AddOutcome;

    /// Delete a message from the tracker
    fn delete(&self, id: &str) -> Result<(), TrackerError>;

    /// Get a message by id. Does not change its recency
    #[doc(alias = "message")]
    fn get(&self, id: &str) -> Result<Arc<Message>, TrackerError>;

    /// All messages, least recently touched first
    #[doc(alias = "messages")]
    fn list(&self) -> Vec<Arc<Message>>;

    /// True if a message with this id is tracked. Does not change its recency
    fn contains(&self, id: &str) -> bool {
        self.get(id).is_ok()
    }
}

/// Order and index must always change together, so they sit behind one lock
struct TrackerState {
    order: RecencyList<Arc<Message>>,
    index: HashMap<String, usize>,
}

impl TrackerState {
    fn check_consistency(&self) {
        debug_assert_eq!(
            self.order.len(),
            self.index.len(),
            "Recency order and id index are out of sync"
        );
    }
}

/// `MessageTracker` with O(1) add, delete and lookup
pub struct RecencyTracker {
    capacity: NonZeroUsize,
    state: RwLock<TrackerState>,
}

impl RecencyTracker {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            capacity,
            state: RwLock::new(TrackerState {
                order: RecencyList::with_capacity(capacity.get()),
                index: HashMap::with_capacity(capacity.get()),
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    pub fn len(&self) -> usize {
        self.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().order.is_empty()
    }

    // Critical sections never run foreign code, so a poisoned lock still guards a consistent state
    fn read(&self) -> RwLockReadGuard<'_, TrackerState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, TrackerState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MessageTracker for RecencyTracker {
    fn add(&self, message: Message) -> AddOutcome {
        let mut guard = self.write();
        let state = &mut *guard;

        if let Some(&slot) = state.index.get(&message.id) {
            state.order.move_to_front(slot);
            trace!("Refreshed message {}", message.id);
            return AddOutcome::Refreshed;
        }

        let mut outcome = AddOutcome::Inserted;
        if state.order.len() >= self.capacity.get() {
            if let Some(oldest) = state.order.pop_back() {
                state.index.remove(&oldest.id);
                debug!("Evicted message {} from {}", oldest.id, oldest.origin);
                outcome = AddOutcome::Evicted(oldest);
            }
        }

        let id = message.id.clone();
        let slot = state.order.push_front(Arc::new(message));
        state.index.insert(id, slot);
        state.check_consistency();

        outcome
    }

    fn delete(&self, id: &str) -> Result<(), TrackerError> {
        let mut guard = self.write();
        let state = &mut *guard;

        let slot = state
            .index
            .remove(id)
            .ok_or_else(|| TrackerError::NotFound(id.to_string()))?;
        state.order.remove(slot);
        state.check_consistency();

        trace!("Deleted message {}", id);
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Arc<Message>, TrackerError> {
        let state = self.read();
        state
            .index
            .get(id)
            .and_then(|&slot| state.order.get(slot))
            .cloned()
            .ok_or_else(|| TrackerError::NotFound(id.to_string()))
    }

    fn list(&self) -> Vec<Arc<Message>> {
        self.read().order.iter_oldest_first().cloned().collect()
    }

    fn contains(&self, id: &str) -> bool {
        self.read().index.contains_key(id)
    }
}
