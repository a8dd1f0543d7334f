//! Client-facing facade over the collaboration managers.
//!
//! Every operation takes the acting principal explicitly — there is no
//! ambient "current user". Because unauthenticated states are routine during
//! app startup, callers pass `None` for the principal and get empty results
//! and no-op writes instead of errors. The facade also owns the
//! relationship-status cache and invalidates it after each successful
//! mutation so the UI never reads stale "no relationship" state.

use std::sync::Arc;

use tracing::{debug, warn};

use intellidoc_shared::{ChatId, UserId};
use intellidoc_store::DocumentStore;

use crate::chats::ChatDirectory;
use crate::config::CollabConfig;
use crate::error::Result;
use crate::friends::FriendGraph;
use crate::messages::MessageStream;
use crate::models::{
    ChatMessage, ChatSession, FileAttachment, FriendRequest, MessageKind, Profile,
    RelationshipStatus,
};
use crate::presence::ProfileDirectory;
use crate::status::StatusCache;
use crate::subscription::Live;

/// The collaboration synchronization core, one instance per client process.
pub struct CollabService {
    profiles: ProfileDirectory,
    friends: FriendGraph,
    chats: ChatDirectory,
    messages: MessageStream,
    cache: StatusCache,
}

impl CollabService {
    pub fn new(store: Arc<dyn DocumentStore>, config: CollabConfig) -> Self {
        Self {
            profiles: ProfileDirectory::new(Arc::clone(&store)),
            friends: FriendGraph::new(Arc::clone(&store)),
            chats: ChatDirectory::new(Arc::clone(&store)),
            messages: MessageStream::new(store, config.message_page_size),
            cache: StatusCache::new(config.status_cache_capacity),
        }
    }

    pub fn with_defaults(store: Arc<dyn DocumentStore>) -> Self {
        Self::new(store, CollabConfig::default())
    }

    // -- session lifecycle --------------------------------------------------

    /// Sync the principal's profile and mark them online. Called on every
    /// sign-in; the profile create is idempotent.
    pub async fn go_online(
        &self,
        principal: Option<&UserId>,
        email: &str,
        display_name: &str,
        photo_url: Option<&str>,
    ) -> Result<()> {
        let Some(principal) = principal else {
            debug!("go_online without principal skipped");
            return Ok(());
        };
        self.profiles
            .ensure_profile(principal, email, display_name, photo_url)
            .await?;
        self.profiles.set_presence(principal, true).await
    }

    /// Mark the principal offline. Runs on teardown paths, so failure is
    /// logged and swallowed — it must never block or fail the teardown.
    pub async fn go_offline(&self, principal: Option<&UserId>) {
        let Some(principal) = principal else {
            return;
        };
        if let Err(e) = self.profiles.set_presence(principal, false).await {
            warn!(user = %principal.short(), error = %e, "offline presence update failed");
        }
    }

    // -- friend graph -------------------------------------------------------

    pub async fn send_friend_request(
        &self,
        principal: Option<&UserId>,
        target: &UserId,
        sender_name: &str,
        sender_email: &str,
    ) -> Result<Option<FriendRequest>> {
        let Some(principal) = principal else {
            return Ok(None);
        };
        let request = self
            .friends
            .send_request(principal, target, sender_name, sender_email)
            .await?;
        self.cache.invalidate(principal, target);
        Ok(Some(request))
    }

    pub async fn respond_to_request(
        &self,
        principal: Option<&UserId>,
        request_id: &str,
        accept: bool,
    ) -> Result<Option<FriendRequest>> {
        let Some(principal) = principal else {
            return Ok(None);
        };
        let request = self.friends.respond(request_id, accept).await?;
        let counterpart = if &request.sender_id == principal {
            &request.receiver_id
        } else {
            &request.sender_id
        };
        self.cache.invalidate(principal, counterpart);
        Ok(Some(request))
    }

    /// Cache-fronted relationship triple; unauthenticated callers see no
    /// relationship at all.
    pub async fn relationship_status(
        &self,
        principal: Option<&UserId>,
        counterpart: &UserId,
    ) -> Result<RelationshipStatus> {
        let Some(principal) = principal else {
            return Ok(RelationshipStatus::default());
        };
        self.cache.get(&self.friends, principal, counterpart).await
    }

    pub async fn observe_incoming_requests(
        &self,
        principal: Option<&UserId>,
    ) -> Result<Live<Vec<FriendRequest>>> {
        match principal {
            Some(principal) => self.friends.observe_incoming_requests(principal).await,
            None => Ok(Live::empty()),
        }
    }

    pub async fn observe_pending_request_count(
        &self,
        principal: Option<&UserId>,
    ) -> Result<Live<usize>> {
        match principal {
            Some(principal) => self.friends.observe_pending_count(principal).await,
            None => Ok(Live::empty()),
        }
    }

    pub async fn observe_friends(
        &self,
        principal: Option<&UserId>,
    ) -> Result<Live<Vec<Profile>>> {
        match principal {
            Some(principal) => self.friends.observe_friends(principal).await,
            None => Ok(Live::empty()),
        }
    }

    // -- profiles -----------------------------------------------------------

    pub async fn observe_profiles(
        &self,
        principal: Option<&UserId>,
    ) -> Result<Live<Vec<Profile>>> {
        match principal {
            Some(principal) => self.profiles.observe_profiles(principal).await,
            None => Ok(Live::empty()),
        }
    }

    // -- chats --------------------------------------------------------------

    pub async fn open_chat(
        &self,
        principal: Option<&UserId>,
        counterpart: &UserId,
        counterpart_name: &str,
    ) -> Result<Option<ChatSession>> {
        let Some(principal) = principal else {
            return Ok(None);
        };
        let session = self
            .chats
            .open_session(principal, counterpart, counterpart_name)
            .await?;
        Ok(Some(session))
    }

    pub async fn mark_chat_read(
        &self,
        principal: Option<&UserId>,
        session: &ChatId,
    ) -> Result<()> {
        let Some(principal) = principal else {
            return Ok(());
        };
        self.chats.mark_read(session, principal).await
    }

    pub async fn observe_chats(
        &self,
        principal: Option<&UserId>,
    ) -> Result<Live<Vec<ChatSession>>> {
        match principal {
            Some(principal) => self.chats.observe_sessions(principal).await,
            None => Ok(Live::empty()),
        }
    }

    // -- messages -----------------------------------------------------------

    pub async fn send_message(
        &self,
        principal: Option<&UserId>,
        session: &ChatId,
        sender_name: &str,
        content: &str,
        kind: MessageKind,
        file: Option<FileAttachment>,
    ) -> Result<Option<ChatMessage>> {
        let Some(principal) = principal else {
            return Ok(None);
        };
        let message = self
            .messages
            .append(session, principal, sender_name, content, kind, file)
            .await?;
        Ok(Some(message))
    }

    pub async fn observe_messages(&self, session: &ChatId) -> Result<Live<Vec<ChatMessage>>> {
        self.messages.observe_messages(session).await
    }

    // -- component access ---------------------------------------------------

    pub fn friends(&self) -> &FriendGraph {
        &self.friends
    }

    pub fn profiles(&self) -> &ProfileDirectory {
        &self.profiles
    }

    pub fn chats(&self) -> &ChatDirectory {
        &self.chats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use intellidoc_store::MemoryStore;

    fn uid(s: &str) -> UserId {
        UserId::parse(s).unwrap()
    }

    fn service() -> CollabService {
        CollabService::with_defaults(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_accept_flow_end_to_end() -> anyhow::Result<()> {
        let service = service();
        let (alice, bob) = (uid("alice"), uid("bob"));
        service
            .go_online(Some(&alice), "alice@example.com", "Alice", None)
            .await?;
        service
            .go_online(Some(&bob), "bob@example.com", "Bob", None)
            .await?;

        let request = service
            .send_friend_request(Some(&alice), &bob, "Alice", "alice@example.com")
            .await?
            .expect("authenticated send returns a request");
        service
            .respond_to_request(Some(&bob), &request.id, true)
            .await?;

        assert!(service.friends().are_friends(&alice, &bob).await?);
        assert!(service.friends().are_friends(&bob, &alice).await?);

        let status = service.relationship_status(Some(&alice), &bob).await?;
        assert!(status.is_friend);
        assert!(!status.has_outgoing_pending);
        Ok(())
    }

    #[tokio::test]
    async fn test_status_cache_sees_sent_request_after_mutation() -> anyhow::Result<()> {
        let service = service();
        let (alice, bob) = (uid("alice"), uid("bob"));

        // Prime the cache with "no relationship".
        let before = service.relationship_status(Some(&alice), &bob).await?;
        assert!(!before.has_outgoing_pending);

        service
            .send_friend_request(Some(&alice), &bob, "Alice", "alice@example.com")
            .await?;

        // The facade invalidated the entry, so the next read is fresh.
        let after = service.relationship_status(Some(&alice), &bob).await?;
        assert!(after.has_outgoing_pending);
        Ok(())
    }

    #[tokio::test]
    async fn test_chat_and_message_flow() -> anyhow::Result<()> {
        let service = service();
        let (alice, bob) = (uid("alice"), uid("bob"));
        service
            .go_online(Some(&alice), "alice@example.com", "Alice", None)
            .await?;

        let from_alice = service
            .open_chat(Some(&alice), &bob, "Bob")
            .await?
            .expect("session");
        let from_bob = service
            .open_chat(Some(&bob), &alice, "Alice")
            .await?
            .expect("session");
        assert_eq!(from_alice.id, from_bob.id);

        service
            .send_message(
                Some(&alice),
                &from_alice.id,
                "Alice",
                "hello",
                MessageKind::Text,
                None,
            )
            .await?;

        let mut live = service.observe_messages(&from_alice.id).await?;
        let snapshot = live.recv().await.expect("snapshot");
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].content, "hello");
        Ok(())
    }

    #[tokio::test]
    async fn test_unauthenticated_calls_are_noops() -> anyhow::Result<()> {
        let service = service();
        let bob = uid("bob");

        service.go_online(None, "x@example.com", "X", None).await?;
        service.go_offline(None).await;

        assert!(service
            .send_friend_request(None, &bob, "X", "x@example.com")
            .await?
            .is_none());
        assert!(service.open_chat(None, &bob, "Bob").await?.is_none());
        assert_eq!(
            service.relationship_status(None, &bob).await?,
            RelationshipStatus::default()
        );

        let mut live = service.observe_friends(None).await?;
        assert!(live.recv().await.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_go_offline_swallows_backend_outage() {
        let store = MemoryStore::new();
        let service = CollabService::with_defaults(Arc::new(store.clone()));
        let alice = uid("alice");
        service
            .go_online(Some(&alice), "alice@example.com", "Alice", None)
            .await
            .unwrap();

        store.set_available(false);
        // Must not error or panic even though the store is down.
        service.go_offline(Some(&alice)).await;
    }

    #[tokio::test]
    async fn test_validation_errors_are_not_retryable() {
        let service = service();
        let alice = uid("alice");

        let err = service
            .send_friend_request(Some(&alice), &alice, "Alice", "alice@example.com")
            .await
            .unwrap_err();
        assert!(!err.is_retryable());
        assert_eq!(
            err.to_string(),
            "You cannot send a friend request to yourself"
        );
    }

    #[tokio::test]
    async fn test_backend_outage_is_retryable() {
        let store = MemoryStore::new();
        let service = CollabService::with_defaults(Arc::new(store.clone()));
        let (alice, bob) = (uid("alice"), uid("bob"));

        store.set_available(false);
        let err = service
            .send_friend_request(Some(&alice), &bob, "Alice", "alice@example.com")
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }
}
