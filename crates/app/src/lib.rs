//! # agora-app
//!
//! Application layer: use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `ForumRepository`: forums, topics, posts, polls and the moderation log
//!   - `UserRepository`: user lookup
//!   - `MatchRepository`: matches and their event stream
//!   - `ReadMarkerRepository`: per-user read positions
//!   - `EventPublisher`: forum activity notifications
//!   - `PermissionChecker`: the authorization seam
//! - Define **driving/inbound ports** as use-case structs:
//!   - `TopicService`: show, store, reply, rename, vote
//!   - `ModerationService`: delete, restore, lock, pin, move, tag, poll edit
//!   - `MatchService`: event history and first views
//! - Provide the windowed pagination assembler and the default policy
//!
//! ## Dependency rule
//! Depends on `agora-domain` only (plus `tokio::sync` for channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod event_bus;
pub mod pagination;
pub mod policy;
pub mod ports;
pub mod services;

#[cfg(test)]
mod testing;
