use thiserror::Error;

use intellidoc_store::StoreError;

/// Errors surfaced by the collaboration core.
///
/// Validation failures carry the user-facing message in their `Display`
/// output; the UI shows it verbatim and takes no further action. Store
/// failures are transient and may be retried manually by the caller.
#[derive(Error, Debug)]
pub enum CollabError {
    #[error("You cannot send a friend request to yourself")]
    InvalidTarget,

    #[error("You are already friends with this user")]
    AlreadyFriends,

    #[error("A friend request to this user is already pending")]
    DuplicateRequest,

    #[error("This user has already sent you a friend request")]
    ReverseRequestExists,

    #[error("Friend request not found")]
    RequestNotFound,

    #[error("This friend request has already been answered")]
    AlreadyResolved,

    #[error("Not signed in")]
    NotAuthenticated,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Malformed sync record: {0}")]
    Data(#[from] serde_json::Error),
}

impl CollabError {
    /// Whether the failure is a transient substrate outage worth a manual
    /// retry, as opposed to a validation outcome.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CollabError::Store(StoreError::Unavailable(_)))
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CollabError>;
