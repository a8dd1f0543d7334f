//! Friend-request lifecycle and the symmetric friendship graph.
//!
//! A request moves `pending -> accepted` or `pending -> rejected`; both end
//! states are terminal. Accepting creates the two adjacency records of the
//! friendship edge in the same atomic batch as the status transition, so the
//! edge is symmetric or absent, never half-present.
//!
//! The existence checks in [`FriendGraph::send_request`] and the subsequent
//! create are separate substrate operations; two racing senders can both
//! pass the checks and insert opposing pending records. Readers collapse any
//! matching pending record into one logical pending state, so the duplicate
//! resolves idempotently on read.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use intellidoc_shared::{constants, UserId};
use intellidoc_store::{Direction, DocumentStore, Query, WriteBatch};

use crate::error::{CollabError, Result};
use crate::models::{decode, to_fields, FriendEdge, FriendRequest, Profile, RequestStatus};
use crate::subscription::Live;

/// Path of a principal's adjacency sub-collection.
fn adjacency(owner: &UserId) -> String {
    format!(
        "{}/{}/{}",
        constants::PROFILES,
        owner,
        constants::FRIENDS_SUBCOLLECTION
    )
}

/// Query for a pending request in one direction.
fn pending_between(sender: &UserId, receiver: &UserId) -> Query {
    Query::collection(constants::FRIEND_REQUESTS)
        .filter_eq("senderId", sender.as_str())
        .filter_eq("receiverId", receiver.as_str())
        .filter_eq("status", RequestStatus::Pending.as_str())
}

/// Manages friend requests and the adjacency records they produce.
pub struct FriendGraph {
    store: Arc<dyn DocumentStore>,
}

impl FriendGraph {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Send a friend request from `principal` to `target`.
    ///
    /// Fails when the target is the principal themselves, when the two are
    /// already friends, or when a pending request already exists in either
    /// direction.
    pub async fn send_request(
        &self,
        principal: &UserId,
        target: &UserId,
        sender_name: &str,
        sender_email: &str,
    ) -> Result<FriendRequest> {
        if principal == target {
            return Err(CollabError::InvalidTarget);
        }
        if self.are_friends(principal, target).await? {
            return Err(CollabError::AlreadyFriends);
        }
        if !self
            .store
            .run_query(&pending_between(principal, target))
            .await?
            .is_empty()
        {
            return Err(CollabError::DuplicateRequest);
        }
        if !self
            .store
            .run_query(&pending_between(target, principal))
            .await?
            .is_empty()
        {
            return Err(CollabError::ReverseRequestExists);
        }

        let request = FriendRequest {
            id: Uuid::new_v4().to_string(),
            sender_id: principal.clone(),
            receiver_id: target.clone(),
            sender_name: sender_name.to_string(),
            sender_email: sender_email.to_string(),
            status: RequestStatus::Pending,
            created_at: Utc::now(),
            responded_at: None,
        };
        self.store
            .set(
                constants::FRIEND_REQUESTS,
                &request.id,
                to_fields(&request)?,
            )
            .await?;
        info!(
            from = %principal.short(),
            to = %target.short(),
            request = %request.id,
            "friend request sent"
        );
        Ok(request)
    }

    /// Answer a pending request.
    ///
    /// Accepting commits the status transition and both adjacency records as
    /// one batch. A request already in a terminal state is reported as
    /// [`CollabError::AlreadyResolved`] without re-applying side effects.
    pub async fn respond(&self, request_id: &str, accept: bool) -> Result<FriendRequest> {
        let doc = self
            .store
            .get(constants::FRIEND_REQUESTS, request_id)
            .await?
            .ok_or(CollabError::RequestNotFound)?;
        let mut request: FriendRequest = decode(&doc)?;

        if request.status != RequestStatus::Pending {
            return Err(CollabError::AlreadyResolved);
        }

        let now = Utc::now();
        request.status = if accept {
            RequestStatus::Accepted
        } else {
            RequestStatus::Rejected
        };
        request.responded_at = Some(now);

        let mut batch = WriteBatch::new();
        batch.update(
            constants::FRIEND_REQUESTS,
            request_id,
            to_fields(&request)?,
        );
        if accept {
            // Adjacency records are keyed by the counterpart, so a racing
            // second accept overwrites identical documents instead of
            // duplicating the edge.
            let forward = FriendEdge {
                friend_id: request.receiver_id.clone(),
                created_at: now,
            };
            let backward = FriendEdge {
                friend_id: request.sender_id.clone(),
                created_at: now,
            };
            batch.set(
                adjacency(&request.sender_id),
                request.receiver_id.as_str(),
                to_fields(&forward)?,
            );
            batch.set(
                adjacency(&request.receiver_id),
                request.sender_id.as_str(),
                to_fields(&backward)?,
            );
        }
        self.store.commit(batch).await?;
        info!(
            request = %request_id,
            accepted = accept,
            "friend request answered"
        );
        Ok(request)
    }

    /// Whether a friendship edge exists from `a` to `b`.
    pub async fn are_friends(&self, a: &UserId, b: &UserId) -> Result<bool> {
        Ok(self.store.get(&adjacency(a), b.as_str()).await?.is_some())
    }

    /// Whether `principal` has a pending request addressed to `other`.
    pub async fn has_outgoing_pending(&self, principal: &UserId, other: &UserId) -> Result<bool> {
        Ok(!self
            .store
            .run_query(&pending_between(principal, other))
            .await?
            .is_empty())
    }

    /// Whether `other` has a pending request addressed to `principal`.
    pub async fn has_incoming_pending(&self, principal: &UserId, other: &UserId) -> Result<bool> {
        self.has_outgoing_pending(other, principal).await
    }

    /// Live sequence of pending requests addressed to the principal, newest
    /// first.
    pub async fn observe_incoming_requests(
        &self,
        principal: &UserId,
    ) -> Result<Live<Vec<FriendRequest>>> {
        let raw = self.store.watch(Self::incoming_pending(principal)).await?;
        Ok(Live::spawn(raw, |snapshot| async move {
            Some(
                snapshot
                    .iter()
                    .filter_map(|doc| match decode::<FriendRequest>(doc) {
                        Ok(request) => Some(request),
                        Err(e) => {
                            warn!(doc = %doc.id, error = %e, "skipping undecodable friend request");
                            None
                        }
                    })
                    .collect(),
            )
        }))
    }

    /// Live count of pending incoming requests, for badge display.
    pub async fn observe_pending_count(&self, principal: &UserId) -> Result<Live<usize>> {
        let raw = self.store.watch(Self::incoming_pending(principal)).await?;
        Ok(Live::spawn(raw, |snapshot| async move {
            Some(snapshot.len())
        }))
    }

    /// Live sequence of the principal's friends, each adjacency record
    /// resolved to its full profile. Records that fail to resolve are
    /// skipped, not fatal. Ordered online-first, then by display name.
    pub async fn observe_friends(&self, principal: &UserId) -> Result<Live<Vec<Profile>>> {
        let raw = self
            .store
            .watch(Query::collection(adjacency(principal)))
            .await?;
        let store = Arc::clone(&self.store);
        Ok(Live::spawn(raw, move |snapshot| {
            let store = Arc::clone(&store);
            async move {
                let mut friends = Vec::with_capacity(snapshot.len());
                for doc in &snapshot {
                    let edge: FriendEdge = match decode(doc) {
                        Ok(edge) => edge,
                        Err(e) => {
                            warn!(doc = %doc.id, error = %e, "skipping undecodable adjacency record");
                            continue;
                        }
                    };
                    let profile = match store
                        .get(constants::PROFILES, edge.friend_id.as_str())
                        .await
                    {
                        Ok(Some(doc)) => decode::<Profile>(&doc),
                        Ok(None) => {
                            warn!(friend = %edge.friend_id.short(), "friend profile missing");
                            continue;
                        }
                        Err(e) => {
                            warn!(friend = %edge.friend_id.short(), error = %e, "friend profile unreadable");
                            continue;
                        }
                    };
                    match profile {
                        Ok(profile) => friends.push(profile),
                        Err(e) => {
                            warn!(friend = %edge.friend_id.short(), error = %e, "skipping undecodable profile");
                        }
                    }
                }
                friends.sort_by_key(|p| (!p.is_online, p.display_name.to_lowercase()));
                Some(friends)
            }
        }))
    }

    fn incoming_pending(principal: &UserId) -> Query {
        Query::collection(constants::FRIEND_REQUESTS)
            .filter_eq("receiverId", principal.as_str())
            .filter_eq("status", RequestStatus::Pending.as_str())
            .order_by("createdAt", Direction::Descending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use intellidoc_store::MemoryStore;

    fn uid(s: &str) -> UserId {
        UserId::parse(s).unwrap()
    }

    fn graph() -> FriendGraph {
        FriendGraph::new(Arc::new(MemoryStore::new()))
    }

    async fn accepted_pair(graph: &FriendGraph, a: &UserId, b: &UserId) {
        let request = graph.send_request(a, b, "A", "a@example.com").await.unwrap();
        graph.respond(&request.id, true).await.unwrap();
    }

    #[tokio::test]
    async fn test_send_request_to_self_is_invalid() {
        let graph = graph();
        let alice = uid("alice");
        let err = graph
            .send_request(&alice, &alice, "Alice", "alice@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, CollabError::InvalidTarget));
    }

    #[tokio::test]
    async fn test_accept_creates_symmetric_edge() {
        let graph = graph();
        let (alice, bob) = (uid("alice"), uid("bob"));

        let request = graph
            .send_request(&alice, &bob, "Alice", "alice@example.com")
            .await
            .unwrap();
        let answered = graph.respond(&request.id, true).await.unwrap();

        assert_eq!(answered.status, RequestStatus::Accepted);
        assert!(answered.responded_at.is_some());
        assert!(graph.are_friends(&alice, &bob).await.unwrap());
        assert!(graph.are_friends(&bob, &alice).await.unwrap());
    }

    #[tokio::test]
    async fn test_second_response_is_already_resolved() {
        let graph = graph();
        let (alice, bob) = (uid("alice"), uid("bob"));

        let request = graph
            .send_request(&alice, &bob, "Alice", "alice@example.com")
            .await
            .unwrap();
        graph.respond(&request.id, true).await.unwrap();

        let err = graph.respond(&request.id, false).await.unwrap_err();
        assert!(matches!(err, CollabError::AlreadyResolved));
        // The edge created by the first response must survive untouched.
        assert!(graph.are_friends(&alice, &bob).await.unwrap());
    }

    #[tokio::test]
    async fn test_reject_leaves_no_edge() {
        let graph = graph();
        let (alice, bob) = (uid("alice"), uid("bob"));

        let request = graph
            .send_request(&alice, &bob, "Alice", "alice@example.com")
            .await
            .unwrap();
        let answered = graph.respond(&request.id, false).await.unwrap();

        assert_eq!(answered.status, RequestStatus::Rejected);
        assert!(!graph.are_friends(&alice, &bob).await.unwrap());
        assert!(!graph.are_friends(&bob, &alice).await.unwrap());
    }

    #[tokio::test]
    async fn test_respond_to_unknown_request() {
        let graph = graph();
        let err = graph.respond("nope", true).await.unwrap_err();
        assert!(matches!(err, CollabError::RequestNotFound));
    }

    #[tokio::test]
    async fn test_duplicate_request_is_rejected() {
        let graph = graph();
        let (alice, bob) = (uid("alice"), uid("bob"));

        graph
            .send_request(&alice, &bob, "Alice", "alice@example.com")
            .await
            .unwrap();
        let err = graph
            .send_request(&alice, &bob, "Alice", "alice@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, CollabError::DuplicateRequest));
    }

    #[tokio::test]
    async fn test_reverse_request_is_rejected() {
        let graph = graph();
        let (alice, bob) = (uid("alice"), uid("bob"));

        graph
            .send_request(&alice, &bob, "Alice", "alice@example.com")
            .await
            .unwrap();
        let err = graph
            .send_request(&bob, &alice, "Bob", "bob@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, CollabError::ReverseRequestExists));
    }

    #[tokio::test]
    async fn test_request_between_friends_is_rejected_in_both_directions() {
        let graph = graph();
        let (alice, bob) = (uid("alice"), uid("bob"));
        accepted_pair(&graph, &alice, &bob).await;

        let err = graph
            .send_request(&alice, &bob, "Alice", "alice@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, CollabError::AlreadyFriends));
        let err = graph
            .send_request(&bob, &alice, "Bob", "bob@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, CollabError::AlreadyFriends));
    }

    #[tokio::test]
    async fn test_pending_flags() {
        let graph = graph();
        let (alice, bob) = (uid("alice"), uid("bob"));

        graph
            .send_request(&alice, &bob, "Alice", "alice@example.com")
            .await
            .unwrap();

        assert!(graph.has_outgoing_pending(&alice, &bob).await.unwrap());
        assert!(graph.has_incoming_pending(&bob, &alice).await.unwrap());
        assert!(!graph.has_outgoing_pending(&bob, &alice).await.unwrap());
        assert!(!graph.has_incoming_pending(&alice, &bob).await.unwrap());
    }

    #[tokio::test]
    async fn test_incoming_requests_observer_sees_newest_first() {
        let graph = graph();
        let (alice, bob, carol) = (uid("alice"), uid("bob"), uid("carol"));

        let mut live = graph.observe_incoming_requests(&carol).await.unwrap();
        assert!(live.recv().await.unwrap().is_empty());

        graph
            .send_request(&alice, &carol, "Alice", "alice@example.com")
            .await
            .unwrap();
        live.recv().await.unwrap();
        graph
            .send_request(&bob, &carol, "Bob", "bob@example.com")
            .await
            .unwrap();

        let requests = live.recv().await.unwrap();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].created_at >= requests[1].created_at);
    }

    #[tokio::test]
    async fn test_pending_count_tracks_responses() {
        let graph = graph();
        let (alice, bob) = (uid("alice"), uid("bob"));

        let mut count = graph.observe_pending_count(&bob).await.unwrap();
        assert_eq!(count.recv().await, Some(0));

        let request = graph
            .send_request(&alice, &bob, "Alice", "alice@example.com")
            .await
            .unwrap();
        assert_eq!(count.recv().await, Some(1));

        graph.respond(&request.id, true).await.unwrap();
        assert_eq!(count.recv().await, Some(0));
    }

    #[tokio::test]
    async fn test_observe_friends_resolves_profiles_and_orders() {
        let store = MemoryStore::new();
        let shared: Arc<dyn DocumentStore> = Arc::new(store.clone());
        let graph = FriendGraph::new(Arc::clone(&shared));
        let profiles = crate::presence::ProfileDirectory::new(shared);

        let me = uid("me");
        for (id, name) in [("me", "Me"), ("zoe", "Zoe"), ("adam", "Adam")] {
            profiles
                .ensure_profile(&uid(id), &format!("{id}@example.com"), name, None)
                .await
                .unwrap();
        }
        // Zoe stays online (profiles are created online); Adam goes offline.
        profiles.set_presence(&uid("adam"), false).await.unwrap();

        accepted_pair(&graph, &me, &uid("zoe")).await;
        accepted_pair(&graph, &me, &uid("adam")).await;

        let mut live = graph.observe_friends(&me).await.unwrap();
        // Skip snapshots until both edges are visible.
        let friends = loop {
            let friends = live.recv().await.unwrap();
            if friends.len() == 2 {
                break friends;
            }
        };

        let names: Vec<&str> = friends.iter().map(|p| p.display_name.as_str()).collect();
        assert_eq!(names, vec!["Zoe", "Adam"]);
    }

    #[tokio::test]
    async fn test_observe_friends_skips_unresolvable_edges() {
        let store = MemoryStore::new();
        let shared: Arc<dyn DocumentStore> = Arc::new(store.clone());
        let graph = FriendGraph::new(Arc::clone(&shared));
        let profiles = crate::presence::ProfileDirectory::new(shared);

        let me = uid("me");
        profiles
            .ensure_profile(&uid("zoe"), "zoe@example.com", "Zoe", None)
            .await
            .unwrap();
        // "ghost" never gets a profile; their edge must be skipped.
        accepted_pair(&graph, &me, &uid("zoe")).await;
        accepted_pair(&graph, &me, &uid("ghost")).await;

        let mut live = graph.observe_friends(&me).await.unwrap();
        let friends = loop {
            let friends = live.recv().await.unwrap();
            if !friends.is_empty() {
                break friends;
            }
        };
        assert_eq!(friends.len(), 1);
        assert_eq!(friends[0].display_name, "Zoe");
    }
}
