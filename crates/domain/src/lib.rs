//! # agora-domain
//!
//! Pure domain model for the agora forum and match viewer.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Cursor pagination primitives: sort registry, cursor codec, windows,
//!   anchors and the stitching of two windows around an anchor
//! - Define **Forums**, **Topics**, **Posts**, **Polls** and **Feature votes**
//! - Define **Matches** and their **Events** (games, scores)
//! - Define the **moderation log** vocabulary and the **permission** vocabulary
//! - Contain all invariant enforcement and domain logic
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod event;
pub mod feature_vote;
pub mod forum;
pub mod matches;
pub mod moderation;
pub mod pagination;
pub mod permission;
pub mod poll;
pub mod post;
pub mod topic;
pub mod user;
