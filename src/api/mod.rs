//! API layer
//!
//! Wire types for the HTTP layer that embeds this crate:
//! - Bluesky link requests and confirmations
//! - Following sync requests and listings
//! - Session handoff for sync jobs

mod dto;

pub use dto::*;
