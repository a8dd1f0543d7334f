//! Profile records and presence flags.
//!
//! One profile document exists per authenticated principal, created
//! idempotently on first sync and mutated only by presence toggles. The
//! client never deletes profiles.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, info, warn};

use intellidoc_shared::{constants, UserId};
use intellidoc_store::{DocumentStore, Fields, Query, StoreError};

use crate::error::Result;
use crate::models::{decode, to_fields, Profile};
use crate::subscription::Live;

/// Manages the profile collection and presence updates.
pub struct ProfileDirectory {
    store: Arc<dyn DocumentStore>,
}

impl ProfileDirectory {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Create the principal's profile if it does not exist yet. Safe to call
    /// on every session start; an existing profile is never overwritten.
    pub async fn ensure_profile(
        &self,
        principal: &UserId,
        email: &str,
        display_name: &str,
        photo_url: Option<&str>,
    ) -> Result<()> {
        if self
            .store
            .get(constants::PROFILES, principal.as_str())
            .await?
            .is_some()
        {
            debug!(user = %principal.short(), "profile already present");
            return Ok(());
        }

        let now = Utc::now();
        let profile = Profile {
            id: principal.clone(),
            email: email.to_string(),
            display_name: display_name.to_string(),
            photo_url: photo_url.map(str::to_string),
            created_at: now,
            last_seen: now,
            is_online: true,
        };
        self.store
            .set(constants::PROFILES, principal.as_str(), to_fields(&profile)?)
            .await?;
        info!(user = %principal.short(), "profile created");
        Ok(())
    }

    /// Read one profile.
    pub async fn profile(&self, id: &UserId) -> Result<Option<Profile>> {
        match self.store.get(constants::PROFILES, id.as_str()).await? {
            Some(doc) => Ok(Some(decode(&doc)?)),
            None => Ok(None),
        }
    }

    /// Flip the online flag and refresh the last-seen timestamp.
    ///
    /// Presence updates run on teardown paths where the profile may already
    /// be gone; a missing document is logged and ignored rather than
    /// surfaced. Transient store failures still propagate — the caller
    /// decides whether to swallow them.
    pub async fn set_presence(&self, principal: &UserId, online: bool) -> Result<()> {
        let mut fields = Fields::new();
        fields.insert("isOnline".into(), json!(online));
        fields.insert("lastSeen".into(), json!(Utc::now().timestamp_millis()));

        match self
            .store
            .update(constants::PROFILES, principal.as_str(), fields)
            .await
        {
            Ok(()) => Ok(()),
            Err(StoreError::NotFound { .. }) => {
                debug!(user = %principal.short(), "presence update for missing profile ignored");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Live sequence of every profile except the principal's own, re-sorted
    /// by display name on each emission.
    pub async fn observe_profiles(&self, principal: &UserId) -> Result<Live<Vec<Profile>>> {
        let raw = self.store.watch(Query::collection(constants::PROFILES)).await?;
        let me = principal.clone();
        Ok(Live::spawn(raw, move |snapshot| {
            let me = me.clone();
            async move {
                let mut profiles: Vec<Profile> = snapshot
                    .iter()
                    .filter_map(|doc| match decode::<Profile>(doc) {
                        Ok(profile) => Some(profile),
                        Err(e) => {
                            warn!(doc = %doc.id, error = %e, "skipping undecodable profile");
                            None
                        }
                    })
                    .filter(|profile| profile.id != me)
                    .collect();
                profiles.sort_by_key(|p| p.display_name.to_lowercase());
                Some(profiles)
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use intellidoc_store::MemoryStore;

    fn uid(s: &str) -> UserId {
        UserId::parse(s).unwrap()
    }

    fn directory() -> (ProfileDirectory, MemoryStore) {
        let store = MemoryStore::new();
        (ProfileDirectory::new(Arc::new(store.clone())), store)
    }

    #[tokio::test]
    async fn test_ensure_profile_is_idempotent() {
        let (dir, _) = directory();
        let alice = uid("alice");

        dir.ensure_profile(&alice, "alice@example.com", "Alice", None)
            .await
            .unwrap();
        let first = dir.profile(&alice).await.unwrap().unwrap();

        dir.ensure_profile(&alice, "other@example.com", "Other", None)
            .await
            .unwrap();
        let second = dir.profile(&alice).await.unwrap().unwrap();

        assert_eq!(second.created_at, first.created_at);
        assert_eq!(second.display_name, "Alice");
        assert_eq!(second.email, "alice@example.com");
    }

    #[tokio::test]
    async fn test_set_presence_updates_flag_and_last_seen() {
        let (dir, _) = directory();
        let alice = uid("alice");
        dir.ensure_profile(&alice, "alice@example.com", "Alice", None)
            .await
            .unwrap();
        let before = dir.profile(&alice).await.unwrap().unwrap();

        dir.set_presence(&alice, false).await.unwrap();
        let after = dir.profile(&alice).await.unwrap().unwrap();

        assert!(before.is_online);
        assert!(!after.is_online);
        assert!(after.last_seen >= before.last_seen);
    }

    #[tokio::test]
    async fn test_set_presence_without_profile_is_a_no_op() {
        let (dir, _) = directory();
        dir.set_presence(&uid("ghost"), false).await.unwrap();
    }

    #[tokio::test]
    async fn test_observe_profiles_excludes_self_and_sorts() {
        let (dir, _) = directory();
        for (id, name) in [("alice", "Alice"), ("bob", "bob"), ("carol", "Carol")] {
            dir.ensure_profile(&uid(id), &format!("{id}@example.com"), name, None)
                .await
                .unwrap();
        }

        let mut live = dir.observe_profiles(&uid("bob")).await.unwrap();
        let profiles = live.recv().await.unwrap();

        let names: Vec<&str> = profiles.iter().map(|p| p.display_name.as_str()).collect();
        assert_eq!(names, vec!["Alice", "Carol"]);
    }
}
