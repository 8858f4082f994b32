#![warn(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

//! Multi-turn conversation with a persisted history.
//!
//! # Key Features
//! - Ordered message log hydrated once at startup and saved on every append
//! - Privacy-gated system prompt rebuilt on each turn
//! - At most one request in flight; extra submissions are dropped
//! - Server-assigned conversation id captured once and reused

mod history;
mod manager;
mod store;

pub use history::build_llm_messages;
pub use manager::{
    ConversationConfig, ConversationManager, FAILURE_REPLY, IgnoreReason, SendOutcome, TurnState,
    UNEXPECTED_FORMAT_REPLY,
};
pub use store::MessageStore;
