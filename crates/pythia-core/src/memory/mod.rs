//! Session memory
//!
//! Conversation context carried across queries from the same caller, with a
//! bounded turn window and TTL-based expiry.

mod session;
mod store;

pub use session::SessionContext;
pub use store::{MemorySessionStore, SessionStore};
