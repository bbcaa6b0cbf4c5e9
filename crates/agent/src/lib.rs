//! Surge planning service
//!
//! Exposes the HTTP router and configuration so integration tests can
//! drive the same handlers the binary serves.

pub mod api;
pub mod config;
