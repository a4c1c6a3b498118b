//! # agora-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve the **JSON API** under `/api/v2` (topic posts, topic creation,
//!   replies, title edits, match history)
//! - Serve the **web mode** under `/community`: server-rendered topic and
//!   match pages, post fragments for infinite scrolling, and moderation
//!   endpoints answering with client-side reload/redirect directives
//! - Parse loosely-typed query and form parameters into typed service input
//! - Map [`AgoraError`](agora_domain::error::AgoraError) to status codes
//!
//! ## Identity
//! Authentication happens upstream; the authenticated user id arrives in the
//! `x-user-id` header and is resolved into an
//! [`Actor`](agora_domain::user::Actor) per request.
//!
//! ## Dependency rule
//! Depends on `agora-app` (for port traits and services) and `agora-domain`
//! (for domain types used in request/response mapping). Never leaks axum types
//! into the domain.

pub mod api;
pub mod auth;
pub mod error;
pub mod params;
pub mod router;
pub mod state;
pub mod ujs;
pub mod web;
