//! Two-phase replies to slash commands.
//!
//! Slack expects an answer within 3 seconds, so the real handler runs in the
//! background:
//!
//! ```text
//! webhook ──► immediate reply (pending text, or "keep command visible")
//!         └─► spawn handler ──┬─ done first ──────────────────────► final reply
//!                             └─ grace elapsed ─► pending notice ─► final reply
//! ```
//!
//! Every reply after the first goes to the command's response URL.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

use axum::response::{IntoResponse, Response as HttpResponse};
use futures::FutureExt;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{error, info, warn};

use super::request::SlashCommandRequest;
use super::responder::MessageResponder;
use super::response::Response;

/// How long the handler may run before the user is told we're working on it.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_millis(700);

/// Who sees the final reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Ephemeral,
    Public,
}

/// The message a handler produces once its work is done.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalResponse {
    pub visibility: Visibility,
    pub message: Response,
}

impl FinalResponse {
    pub fn public(message: Response) -> Self {
        Self {
            visibility: Visibility::Public,
            message,
        }
    }

    pub fn ephemeral(message: Response) -> Self {
        Self {
            visibility: Visibility::Ephemeral,
            message,
        }
    }
}

/// Per-invocation context handed to the handler.
///
/// No deadline is enforced today; handlers that want to stop early can
/// check `remaining()`.
#[derive(Debug, Clone, Copy)]
pub struct HandlerContext {
    pub started_at: Instant,
    pub deadline: Option<Instant>,
}

impl HandlerContext {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            deadline: None,
        }
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }
}

impl Default for HandlerContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs a slash command handler in the background while Slack gets its
/// acknowledgement straight away.
pub struct DelayedSlashResponse<F> {
    /// Shown to the user while the handler is running
    pub pending_response: Response,

    /// Keep the invoking command visible to everyone in the channel
    pub show_slash_command_in_channel: bool,

    pub grace_period: Duration,

    handler: F,
}

impl<F, Fut> DelayedSlashResponse<F>
where
    F: FnOnce(HandlerContext, SlashCommandRequest) -> Fut + Send + 'static,
    Fut: Future<Output = FinalResponse> + Send + 'static,
{
    pub fn new(pending_response: Response, handler: F) -> Self {
        Self {
            pending_response,
            show_slash_command_in_channel: false,
            grace_period: DEFAULT_GRACE_PERIOD,
            handler,
        }
    }

    pub fn show_slash_command_in_channel(mut self, show: bool) -> Self {
        self.show_slash_command_in_channel = show;
        self
    }

    pub fn grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// Start the handler and return the immediate reply to the webhook.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn run(self, responder: MessageResponder, command: SlashCommandRequest) -> HttpResponse {
        let immediate = if self.show_slash_command_in_channel {
            Response::show_command_in_channel()
        } else {
            self.pending_response.clone()
        };

        // Detached: the orchestration outlives this request.
        let _ = self.spawn(responder, command);

        immediate.into_response()
    }

    /// Spawn the orchestration task.
    ///
    /// The task never panics; panics inside it are logged and swallowed.
    pub fn spawn(self, responder: MessageResponder, command: SlashCommandRequest) -> JoinHandle<()> {
        let command_name = command.command.clone();
        spawn_contained(command_name, self.orchestrate(responder, command))
    }

    async fn orchestrate(self, responder: MessageResponder, command: SlashCommandRequest) {
        let Self {
            pending_response,
            grace_period,
            handler,
            ..
        } = self;

        let command_name = command.command.clone();
        let ctx = HandlerContext::new();

        let mut handler = tokio::spawn(handler(ctx, command));

        let finished_early = tokio::select! {
            biased;
            joined = &mut handler => Some(joined),
            _ = sleep(grace_period) => None,
        };

        let joined = match finished_early {
            Some(joined) => joined,
            None => {
                info!(
                    command = %command_name,
                    grace_ms = grace_period.as_millis() as u64,
                    "delayed_response_grace_elapsed"
                );

                match responder.ephemeral_response(pending_response).await {
                    Ok(()) => info!(command = %command_name, "delayed_response_interim_sent"),
                    Err(e) => {
                        warn!(command = %command_name, error = %e, "delayed_response_interim_failed")
                    }
                }

                handler.await
            }
        };

        let final_response = match joined {
            Ok(final_response) => final_response,
            Err(e) => {
                error!(
                    command = %command_name,
                    is_panic = e.is_panic(),
                    error = %e,
                    "delayed_response_handler_failed"
                );
                return;
            }
        };

        let elapsed_ms = ctx.started_at.elapsed().as_millis() as u64;
        let delivered = match final_response.visibility {
            Visibility::Public => responder.public_response(final_response.message).await,
            Visibility::Ephemeral => responder.ephemeral_response(final_response.message).await,
        };

        match delivered {
            Ok(()) => info!(
                command = %command_name,
                visibility = ?final_response.visibility,
                elapsed_ms = elapsed_ms,
                "delayed_response_final_sent"
            ),
            Err(e) => error!(
                command = %command_name,
                response_url = %responder.response_url(),
                error = %e,
                "delayed_response_final_failed"
            ),
        }
    }
}

/// Spawn `task`, logging instead of propagating any panic raised while it runs.
fn spawn_contained<T>(command_name: String, task: T) -> JoinHandle<()>
where
    T: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(panic) = AssertUnwindSafe(task).catch_unwind().await {
            error!(
                command = %command_name,
                panic = %panic_message(panic.as_ref()),
                "delayed_response_panicked"
            );
        }
    })
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
