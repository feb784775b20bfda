//! Slack slash command plumbing.
//!
//! - `signature` / `middleware`: reject forged or replayed webhooks
//! - `request` / `response`: the slash command wire formats
//! - `delayed` / `responder`: acknowledge immediately, answer later via the
//!   command's response URL

pub mod delayed;
pub mod middleware;
pub mod request;
pub mod responder;
pub mod response;
pub mod signature;

#[cfg(test)]
pub(crate) mod testing;

pub use delayed::{DelayedSlashResponse, FinalResponse, HandlerContext, Visibility};
pub use middleware::verify_slack_request;
pub use request::SlashCommandRequest;
pub use responder::MessageResponder;
pub use response::{Attachment, Field, Response, ResponseType};
pub use signature::{Clock, FixedClock, SignatureVerifier, SystemClock};
