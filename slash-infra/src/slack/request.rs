//! Slash command payloads sent by Slack.

use serde::Deserialize;

/// The payload Slack sends when a user invokes a slash command.
///
/// Slack posts it URL-encoded. Missing fields are left empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SlashCommandRequest {
    /// The command that was typed, e.g. `/infra`
    pub command: String,

    pub team_id: String,
    pub team_domain: String,
    pub enterprise_id: String,
    pub enterprise_name: String,
    pub channel_id: String,
    pub channel_name: String,

    /// The user that invoked the command
    pub user_id: String,
    pub user_name: String,

    /// Everything typed after the command itself
    pub text: String,

    /// One-time URL for posting delayed responses
    pub response_url: String,

    /// Needed to open a dialog within 3 seconds of the request
    pub trigger_id: String,
}

impl SlashCommandRequest {
    /// Parse a URL-encoded slash command body.
    pub fn from_form(body: &[u8]) -> Result<Self, serde_urlencoded::de::Error> {
        serde_urlencoded::from_bytes(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slack::signature::tests::TUTORIAL_BODY;

    #[test]
    fn test_from_form_tutorial_body() {
        let command = SlashCommandRequest::from_form(TUTORIAL_BODY.as_bytes()).unwrap();

        assert_eq!(command.command, "/webhook-collect");
        assert_eq!(command.team_id, "T1DC2JH3J");
        assert_eq!(command.team_domain, "testteamnow");
        assert_eq!(command.channel_id, "G8PSS9T3V");
        assert_eq!(command.channel_name, "foobar");
        assert_eq!(command.user_id, "U2CERLKJA");
        assert_eq!(command.user_name, "roadrunner");
        assert_eq!(command.text, "");
        assert_eq!(
            command.response_url,
            "https://hooks.slack.com/commands/T1DC2JH3J/397700885554/96rGlfmibIGlgcZRskXaIFfN"
        );
        assert_eq!(command.enterprise_id, "");
    }

    #[test]
    fn test_from_form_decodes_text() {
        let command =
            SlashCommandRequest::from_form(b"command=%2Finfra&text=i-0123456789abcdef0+please")
                .unwrap();
        assert_eq!(command.command, "/infra");
        assert_eq!(command.text, "i-0123456789abcdef0 please");
    }

    #[test]
    fn test_from_form_empty_body() {
        let command = SlashCommandRequest::from_form(b"").unwrap();
        assert_eq!(command, SlashCommandRequest::default());
    }
}
