//! Per-process memoization of relationship status.
//!
//! Sits between UI queries and the friend graph to avoid re-issuing the
//! three point reads on every screen build. The cache is advisory: entries
//! are dropped whenever the local process mutates a relationship, and the
//! three reads behind a miss may reflect different underlying read
//! timestamps. Only the UI-facing process mutates it, so a plain mutex is
//! enough.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use intellidoc_shared::UserId;

use crate::error::Result;
use crate::friends::FriendGraph;
use crate::models::RelationshipStatus;

type Key = (UserId, UserId);

pub struct StatusCache {
    entries: Mutex<HashMap<Key, RelationshipStatus>>,
    capacity: usize,
}

impl StatusCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Key, RelationshipStatus>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached triple for the pair, computing it from three concurrent
    /// friend-graph point reads on a miss.
    pub async fn get(
        &self,
        graph: &FriendGraph,
        principal: &UserId,
        counterpart: &UserId,
    ) -> Result<RelationshipStatus> {
        let key = (principal.clone(), counterpart.clone());
        if let Some(status) = self.lock().get(&key) {
            return Ok(*status);
        }

        let (is_friend, has_outgoing, has_incoming) = tokio::join!(
            graph.are_friends(principal, counterpart),
            graph.has_outgoing_pending(principal, counterpart),
            graph.has_incoming_pending(principal, counterpart),
        );
        let status = RelationshipStatus {
            is_friend: is_friend?,
            has_outgoing_pending: has_outgoing?,
            has_incoming_pending: has_incoming?,
        };

        let mut entries = self.lock();
        if entries.len() >= self.capacity {
            // Advisory cache; wholesale eviction is fine at this size.
            entries.clear();
        }
        entries.insert(key, status);
        Ok(status)
    }

    /// Drop the entry for one counterpart. Must be called after any local
    /// mutation affecting the relationship, or the next read serves stale
    /// "no relationship" state.
    pub fn invalidate(&self, principal: &UserId, counterpart: &UserId) {
        if self
            .lock()
            .remove(&(principal.clone(), counterpart.clone()))
            .is_some()
        {
            debug!(counterpart = %counterpart.short(), "status cache entry invalidated");
        }
    }

    /// Drop every entry.
    pub fn invalidate_all(&self) {
        self.lock().clear();
    }
}
