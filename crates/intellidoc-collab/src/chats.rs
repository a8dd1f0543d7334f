//! Chat-session identity and lifecycle.
//!
//! Session ids are derived from the sorted participant pair, so both sides
//! of a first contact compute the same id. Concurrent creation attempts
//! write structurally identical documents to the same id and collapse into a
//! harmless overwrite instead of a duplicate.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, info, warn};

use intellidoc_shared::{constants, ChatId, UserId};
use intellidoc_store::{Direction, DocumentStore, Fields, Query};

use crate::error::Result;
use crate::models::{decode, to_fields, ChatSession, Profile};
use crate::subscription::Live;

/// Manages chat-session documents.
pub struct ChatDirectory {
    store: Arc<dyn DocumentStore>,
}

impl ChatDirectory {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Return the session for the pair, creating it on first contact.
    ///
    /// Idempotent: re-invocation with the same pair (from either side)
    /// returns the existing session. The principal's display name is read
    /// from their own profile; an unresolvable profile leaves it empty.
    pub async fn open_session(
        &self,
        principal: &UserId,
        counterpart: &UserId,
        counterpart_name: &str,
    ) -> Result<ChatSession> {
        let id = ChatId::for_pair(principal, counterpart);

        if let Some(doc) = self.store.get(constants::CHAT_SESSIONS, id.as_str()).await? {
            debug!(chat = %id, "session already exists");
            return decode(&doc);
        }

        let own_name = match self.store.get(constants::PROFILES, principal.as_str()).await {
            Ok(Some(doc)) => decode::<Profile>(&doc)
                .map(|p| p.display_name)
                .unwrap_or_default(),
            _ => String::new(),
        };

        let mut participant_names = BTreeMap::new();
        participant_names.insert(principal.as_str().to_string(), own_name);
        participant_names.insert(counterpart.as_str().to_string(), counterpart_name.to_string());

        let mut unread_count = BTreeMap::new();
        unread_count.insert(principal.as_str().to_string(), 0u32);
        unread_count.insert(counterpart.as_str().to_string(), 0u32);

        let session = ChatSession {
            id: id.clone(),
            participants: vec![principal.clone(), counterpart.clone()],
            participant_names,
            unread_count,
            created_at: Utc::now(),
            last_message: None,
            last_message_time: None,
            last_message_sender: None,
        };
        self.store
            .set(constants::CHAT_SESSIONS, id.as_str(), to_fields(&session)?)
            .await?;
        info!(chat = %id, "session created");
        Ok(session)
    }

    /// Read one session.
    pub async fn session(&self, id: &ChatId) -> Result<Option<ChatSession>> {
        match self.store.get(constants::CHAT_SESSIONS, id.as_str()).await? {
            Some(doc) => Ok(Some(decode(&doc)?)),
            None => Ok(None),
        }
    }

    /// Reset the principal's unread counter after they opened the chat.
    /// A session that no longer resolves is ignored.
    pub async fn mark_read(&self, id: &ChatId, principal: &UserId) -> Result<()> {
        let Some(doc) = self.store.get(constants::CHAT_SESSIONS, id.as_str()).await? else {
            debug!(chat = %id, "mark_read on unknown session ignored");
            return Ok(());
        };
        let mut session: ChatSession = decode(&doc)?;
        session
            .unread_count
            .insert(principal.as_str().to_string(), 0);

        let mut fields = Fields::new();
        fields.insert("unreadCount".into(), json!(session.unread_count));
        self.store
            .update(constants::CHAT_SESSIONS, id.as_str(), fields)
            .await?;
        Ok(())
    }

    /// Live sequence of the principal's sessions, most recently active
    /// first. Sessions without messages sort last.
    pub async fn observe_sessions(&self, principal: &UserId) -> Result<Live<Vec<ChatSession>>> {
        let query = Query::collection(constants::CHAT_SESSIONS)
            .array_contains("participants", principal.as_str())
            .order_by("lastMessageTime", Direction::Descending);
        let raw = self.store.watch(query).await?;
        Ok(Live::spawn(raw, |snapshot| async move {
            Some(
                snapshot
                    .iter()
                    .filter_map(|doc| match decode::<ChatSession>(doc) {
                        Ok(session) => Some(session),
                        Err(e) => {
                            warn!(doc = %doc.id, error = %e, "skipping undecodable session");
                            None
                        }
                    })
                    .collect(),
            )
        }))
    }
}
