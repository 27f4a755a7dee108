//! Terminal client for a debate-style conversation service.
//!
//! [`sync::SyncController`] keeps a [`session::ConversationSession`] in step
//! with the server through any [`api::ChatBackend`]; [`api::client::ApiClient`]
//! is the HTTP implementation.

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod session;
pub mod storage;
pub mod sync;
pub mod ui;
pub mod utils;
