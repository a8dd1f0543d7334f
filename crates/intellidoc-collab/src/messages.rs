//! Ordered message streams.
//!
//! Messages are append-only. Appending also mirrors the new message into the
//! parent session's summary fields and bumps the other participants' unread
//! counters — a second, separate write: a crash in between leaves a message
//! visible in the stream without a refreshed summary, which is acceptable
//! because the summary is a denormalized cache of the stream's tail.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use intellidoc_shared::{constants, ChatId, UserId};
use intellidoc_store::{Direction, DocumentStore, Fields, Query};

use crate::error::Result;
use crate::models::{decode, to_fields, ChatMessage, ChatSession, FileAttachment, MessageKind};
use crate::subscription::Live;

/// Appends to and observes the message streams of chat sessions.
pub struct MessageStream {
    store: Arc<dyn DocumentStore>,
    page_size: usize,
}

impl MessageStream {
    pub fn new(store: Arc<dyn DocumentStore>, page_size: usize) -> Self {
        Self { store, page_size }
    }

    /// Append a message and refresh the parent session summary.
    pub async fn append(
        &self,
        session_id: &ChatId,
        sender: &UserId,
        sender_name: &str,
        content: &str,
        kind: MessageKind,
        file: Option<FileAttachment>,
    ) -> Result<ChatMessage> {
        let message = ChatMessage {
            id: Uuid::new_v4().to_string(),
            chat_id: session_id.clone(),
            sender_id: sender.clone(),
            sender_name: sender_name.to_string(),
            content: content.to_string(),
            kind,
            timestamp: Utc::now(),
            file_url: file.as_ref().map(|f| f.url.clone()),
            file_name: file.as_ref().map(|f| f.name.clone()),
            file_type: file.as_ref().map(|f| f.mime_type.clone()),
        };
        self.store
            .set(constants::CHAT_MESSAGES, &message.id, to_fields(&message)?)
            .await?;

        self.refresh_summary(&message).await?;

        info!(chat = %session_id, message = %message.id, "message appended");
        Ok(message)
    }

    /// Second write of the append path: last-message fields plus unread
    /// bumps for everyone except the sender. The substrate has no numeric
    /// increment, so this is a read-modify-write of the session document.
    async fn refresh_summary(&self, message: &ChatMessage) -> Result<()> {
        let Some(doc) = self
            .store
            .get(constants::CHAT_SESSIONS, message.chat_id.as_str())
            .await?
        else {
            warn!(chat = %message.chat_id, "message appended to session without a document");
            return Ok(());
        };
        let mut session: ChatSession = decode(&doc)?;
        for participant in &session.participants {
            if participant != &message.sender_id {
                let count = session
                    .unread_count
                    .entry(participant.as_str().to_string())
                    .or_insert(0);
                *count += 1;
            }
        }

        let mut fields = Fields::new();
        fields.insert("lastMessage".into(), json!(message.content));
        fields.insert(
            "lastMessageTime".into(),
            json!(message.timestamp.timestamp_millis()),
        );
        fields.insert(
            "lastMessageSender".into(),
            json!(message.sender_id.as_str()),
        );
        fields.insert("unreadCount".into(), json!(session.unread_count));
        self.store
            .update(constants::CHAT_SESSIONS, message.chat_id.as_str(), fields)
            .await?;
        Ok(())
    }

    /// Live sequence of the session's messages, newest first, bounded to the
    /// configured page size.
    pub async fn observe_messages(&self, session_id: &ChatId) -> Result<Live<Vec<ChatMessage>>> {
        let query = Query::collection(constants::CHAT_MESSAGES)
            .filter_eq("chatId", session_id.as_str())
            .order_by("timestamp", Direction::Descending)
            .limit(self.page_size);
        let raw = self.store.watch(query).await?;
        Ok(Live::spawn(raw, |snapshot| async move {
            Some(
                snapshot
                    .iter()
                    .filter_map(|doc| match decode::<ChatMessage>(doc) {
                        Ok(message) => Some(message),
                        Err(e) => {
                            warn!(doc = %doc.id, error = %e, "skipping undecodable message");
                            None
                        }
                    })
                    .collect(),
            )
        }))
    }
}
