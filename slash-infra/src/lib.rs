//! slash-infra - Slack slash commands for looking up infrastructure.
//!
//! ## Request flow
//!
//! ```text
//! Slack ─► signature check ─► /slack/infra-search ─► immediate reply
//!                                      └─► background lookup ─► response URL
//! ```
//!
//! - `slack`: signed webhooks, payloads and delayed responses
//! - `search`: resolvers that find resources from free text
//! - `format`: turning results into Slack attachments
//! - `web`: the axum router and its handlers

pub mod config;
pub mod error;
pub mod format;
pub mod search;
pub mod slack;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use error::{AuthError, SearchError, SlackError};
pub use search::{Resolver, ResultSet, SearchResult};
pub use slack::{DelayedSlashResponse, FinalResponse, SignatureVerifier, SlashCommandRequest};
pub use web::{router, AppState};
