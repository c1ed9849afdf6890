//! Caller identity and authorization
//!
//! Handles:
//! - Extracting the caller id asserted by the `x-user-id` header
//! - The authorization guard for mailbox and message operations
//! - Password hashing

mod caller;
pub mod guard;
pub mod password;

pub use caller::{CALLER_ID_HEADER, CallerId};
