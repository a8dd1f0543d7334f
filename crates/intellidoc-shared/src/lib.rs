//! Types shared across the IntelliDoc client crates.
//!
//! This crate holds the identity newtypes and constants that both the
//! substrate boundary (`intellidoc-store`) and the collaboration core
//! (`intellidoc-collab`) agree on.

pub mod constants;
pub mod error;
pub mod types;

pub use error::SharedError;
pub use types::{ChatId, UserId};
