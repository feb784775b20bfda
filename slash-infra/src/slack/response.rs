//! Message payloads returned to Slack, synchronously or via the response URL.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response as HttpResponse},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Who can see a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    /// Visible to everyone in the channel
    InChannel,
    /// Only visible to the user who typed the command
    Ephemeral,
}

/// A response to a slash command.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Response {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_type: Option<ResponseType>,
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl Response {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_attachments(attachments: Vec<Attachment>) -> Self {
        Self {
            attachments,
            ..Default::default()
        }
    }

    /// The minimal reply that keeps the invoking command visible in the channel.
    ///
    /// Slack hides slash commands from history unless the immediate reply
    /// is marked `in_channel`.
    pub fn show_command_in_channel() -> Self {
        Self {
            response_type: Some(ResponseType::InChannel),
            ..Default::default()
        }
    }
}

impl IntoResponse for Response {
    fn into_response(self) -> HttpResponse {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// A Slack message attachment.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Attachment {
    pub fallback: String,
    pub text: String,
    #[serde(rename = "mrkdwn_in", skip_serializing_if = "Vec::is_empty")]
    pub markdown_in: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub color: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub author_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub author_subname: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub author_link: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub author_icon: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title_link: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub pretext: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub image_url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub thumb_url: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Field>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub footer: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub footer_icon: String,
    #[serde(rename = "ts", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

/// A field inside an attachment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Field {
    pub title: String,
    pub value: String,
    pub short: bool,
}

/// Unix seconds suitable for `Attachment::timestamp`.
pub fn timestamp(t: DateTime<Utc>) -> i64 {
    t.timestamp()
}
