//! # vehiclehub-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve the **JSON API** over the session and settings tables
//!   (`/session`, `/settings`, `/serial`, `/stats`)
//! - Answer **WebSocket** snapshot requests on `/session/ws`
//! - Stream **change events** over SSE on `/session/stream`
//! - Map application errors into `{"OK": false, "output": ...}` responses
//!
//! ## Dependency rule
//! Depends on `vehiclehub-app` (for stores, queue and port traits) and
//! `vehiclehub-domain` (for request/response mapping). Never leaks axum types
//! into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;
