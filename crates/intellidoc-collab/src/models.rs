//! Domain records synchronized through the remote document store.
//!
//! Field names serialize in camelCase to match the remote collection
//! schemas; timestamps serialize as integer milliseconds so the store can
//! order them numerically. The store owns every record — these structs are
//! transient projections scoped to the operation or subscription that
//! produced them.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use intellidoc_shared::{ChatId, UserId};
use intellidoc_store::{Document, Fields};

use crate::error::Result;

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// One profile document per authenticated principal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: UserId,
    pub email: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_seen: DateTime<Utc>,
    pub is_online: bool,
}

// ---------------------------------------------------------------------------
// Friend request
// ---------------------------------------------------------------------------

/// Lifecycle state of a friend request. Accepted and rejected are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

impl RequestStatus {
    /// Wire form, usable as a query filter value.
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Rejected => "rejected",
        }
    }
}

/// A directed friend request. The sender's name and contact address are
/// denormalized at creation time so inboxes render without a profile read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequest {
    pub id: String,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub sender_name: String,
    pub sender_email: String,
    pub status: RequestStatus,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub responded_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Friendship adjacency
// ---------------------------------------------------------------------------

/// One half of a symmetric friendship edge, stored under the owning
/// principal's `friends` sub-collection and keyed by the counterpart's id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FriendEdge {
    pub friend_id: UserId,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Chat session
// ---------------------------------------------------------------------------

/// A two-party chat session. The id is derived from the sorted participant
/// pair, so there is exactly one session per unordered pair. The
/// last-message fields are a denormalized cache of the message stream's
/// tail, not a source of truth.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub id: ChatId,
    pub participants: Vec<UserId>,
    pub participant_names: BTreeMap<String, String>,
    pub unread_count: BTreeMap<String, u32>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message: Option<String>,
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_message_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message_sender: Option<UserId>,
}

impl ChatSession {
    /// The participant other than `principal`, if any.
    pub fn counterpart(&self, principal: &UserId) -> Option<&UserId> {
        self.participants.iter().find(|p| *p != principal)
    }

    /// Unread messages for one participant.
    pub fn unread_for(&self, participant: &UserId) -> u32 {
        self.unread_count
            .get(participant.as_str())
            .copied()
            .unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Chat message
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    File,
}

/// Metadata of a file shared in a chat. The blob itself lives elsewhere;
/// the message only carries the reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttachment {
    pub url: String,
    pub name: String,
    pub mime_type: String,
}

/// An append-only chat message; never mutated or deleted by the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub chat_id: ChatId,
    pub sender_id: UserId,
    pub sender_name: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
}

// ---------------------------------------------------------------------------
// Relationship status (derived, never persisted)
// ---------------------------------------------------------------------------

/// Cached relationship triple for a (principal, counterpart) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelationshipStatus {
    pub is_friend: bool,
    pub has_outgoing_pending: bool,
    pub has_incoming_pending: bool,
}

// ---------------------------------------------------------------------------
// Document conversions
// ---------------------------------------------------------------------------

/// Serialize a record into a document field map.
pub(crate) fn to_fields<T: Serialize>(record: &T) -> Result<Fields> {
    match serde_json::to_value(record)? {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(serde_json::Error::io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("record did not serialize to an object: {other}"),
        ))
        .into()),
    }
}

/// Deserialize a document back into a record.
pub(crate) fn decode<T: DeserializeOwned>(doc: &Document) -> Result<T> {
    Ok(serde_json::from_value(serde_json::Value::Object(
        doc.fields.clone(),
    ))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use intellidoc_store::Document;

    fn uid(s: &str) -> UserId {
        UserId::parse(s).unwrap()
    }

    #[test]
    fn test_profile_round_trip_uses_camel_case_and_millis() {
        let profile = Profile {
            id: uid("alice"),
            email: "alice@example.com".into(),
            display_name: "Alice".into(),
            photo_url: None,
            created_at: DateTime::from_timestamp_millis(1_700_000_000_000).unwrap(),
            last_seen: DateTime::from_timestamp_millis(1_700_000_000_500).unwrap(),
            is_online: true,
        };

        let fields = to_fields(&profile).unwrap();
        assert_eq!(fields.get("displayName").unwrap(), "Alice");
        assert_eq!(
            fields.get("createdAt").unwrap().as_i64(),
            Some(1_700_000_000_000)
        );
        assert!(fields.get("photoUrl").is_none());

        let back: Profile = decode(&Document::new("alice", fields)).unwrap();
        assert_eq!(back, profile);
    }

    #[test]
    fn test_friend_request_without_response_timestamp() {
        let request = FriendRequest {
            id: "r1".into(),
            sender_id: uid("alice"),
            receiver_id: uid("bob"),
            sender_name: "Alice".into(),
            sender_email: "alice@example.com".into(),
            status: RequestStatus::Pending,
            created_at: DateTime::from_timestamp_millis(1_700_000_000_000).unwrap(),
            responded_at: None,
        };

        let fields = to_fields(&request).unwrap();
        assert_eq!(fields.get("status").unwrap(), "pending");
        assert!(fields.get("respondedAt").is_none());

        let back: FriendRequest = decode(&Document::new("r1", fields)).unwrap();
        assert_eq!(back.responded_at, None);
    }

    #[test]
    fn test_message_kind_serializes_as_type_field() {
        let message = ChatMessage {
            id: "m1".into(),
            chat_id: ChatId::for_pair(&uid("alice"), &uid("bob")),
            sender_id: uid("alice"),
            sender_name: "Alice".into(),
            content: "hello".into(),
            kind: MessageKind::Text,
            timestamp: DateTime::from_timestamp_millis(1_700_000_000_000).unwrap(),
            file_url: None,
            file_name: None,
            file_type: None,
        };

        let fields = to_fields(&message).unwrap();
        assert_eq!(fields.get("type").unwrap(), "text");
        assert_eq!(fields.get("chatId").unwrap(), "alice_bob");
    }

    #[test]
    fn test_session_counterpart_and_unread() {
        let a = uid("alice");
        let b = uid("bob");
        let mut unread = BTreeMap::new();
        unread.insert("alice".to_string(), 2u32);
        let session = ChatSession {
            id: ChatId::for_pair(&a, &b),
            participants: vec![a.clone(), b.clone()],
            participant_names: BTreeMap::new(),
            unread_count: unread,
            created_at: DateTime::from_timestamp_millis(0).unwrap(),
            last_message: None,
            last_message_time: None,
            last_message_sender: None,
        };

        assert_eq!(session.counterpart(&a), Some(&b));
        assert_eq!(session.unread_for(&a), 2);
        assert_eq!(session.unread_for(&b), 0);
    }
}
