//! Collaboration synchronization core of the IntelliDoc client.
//!
//! Friend-request workflow, the symmetric friendship graph, deterministic
//! chat-session identity, ordered message streams, and presence/status
//! caching, all built on the remote document store behind
//! [`intellidoc_store::DocumentStore`]. The UI layer consumes these
//! components through [`CollabService`], passing the acting principal
//! explicitly on every call and cancelling every live sequence it stops
//! watching.

pub mod chats;
pub mod config;
pub mod error;
pub mod friends;
pub mod messages;
pub mod models;
pub mod presence;
pub mod service;
pub mod status;
pub mod subscription;

pub use chats::ChatDirectory;
pub use config::CollabConfig;
pub use error::{CollabError, Result};
pub use friends::FriendGraph;
pub use messages::MessageStream;
pub use models::{
    ChatMessage, ChatSession, FileAttachment, FriendEdge, FriendRequest, MessageKind, Profile,
    RelationshipStatus, RequestStatus,
};
pub use presence::ProfileDirectory;
pub use service::CollabService;
pub use status::StatusCache;
pub use subscription::Live;

use tracing_subscriber::{fmt, EnvFilter};

/// Initialise the process-wide tracing subscriber. Call once at startup.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("intellidoc_collab=debug,intellidoc_store=info,warn")
    });

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
