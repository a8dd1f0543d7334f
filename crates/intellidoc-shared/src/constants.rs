/// Application name
pub const APP_NAME: &str = "IntelliDoc";

/// Remote collection holding one profile document per principal
pub const PROFILES: &str = "profiles";

/// Remote collection holding friend-request documents
pub const FRIEND_REQUESTS: &str = "friendRequests";

/// Per-profile sub-collection holding one adjacency record per friend
pub const FRIENDS_SUBCOLLECTION: &str = "friends";

/// Remote collection holding chat-session documents
pub const CHAT_SESSIONS: &str = "chatSessions";

/// Remote collection holding chat-message documents
pub const CHAT_MESSAGES: &str = "chatMessages";

/// Separator between the sorted participant ids of a chat-session id
pub const CHAT_ID_SEPARATOR: char = '_';
