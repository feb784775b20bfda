//! Configuration module for environment variable parsing.
//!
//! Everything is read once at startup; the values are read-only afterwards.

use std::env;
use std::time::Duration;

use tracing::warn;

/// Prefix of the variables naming the IAM role to assume per AWS account.
pub const AWS_ROLE_ENV_PREFIX: &str = "AWS_ROLE_";

/// Prefix of the variables overriding the region per AWS account.
pub const AWS_REGION_ENV_PREFIX: &str = "AWS_REGION_";

/// Region used when an account has no `AWS_REGION_<alias>` override.
pub const DEFAULT_AWS_REGION: &str = "us-east-1";

/// An AWS account the EC2 resolver should search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwsAccount {
    /// Alias taken from the `AWS_ROLE_<alias>` variable name
    pub alias: String,
    /// ARN of the role to assume in that account
    pub role_arn: String,
    /// Region the account's resources live in
    pub region: String,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Slack signing secret shared with the Slack app
    pub slack_signing_secret: String,

    /// Maximum age in seconds of a signed request timestamp
    pub slack_signature_max_age: u64,

    /// How long the handler may run before the pending notice is sent
    pub pending_grace_ms: u64,

    /// Timeout for callback deliveries to Slack
    pub http_timeout_ms: u64,

    /// AWS accounts to search for resources
    pub aws_accounts: Vec<AwsAccount>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let slack_signing_secret = env::var("SLACK_SIGNING_SECRET").unwrap_or_default();
        if slack_signing_secret.trim().is_empty() {
            warn!("slack_signing_secret_missing");
        }

        Config {
            port: parse_or("PORT", 8090),
            slack_signing_secret,
            slack_signature_max_age: parse_or("SLACK_SIGNATURE_MAX_AGE", 600), // 10 minutes
            pending_grace_ms: parse_or("SLACK_PENDING_GRACE_MS", 700),
            http_timeout_ms: parse_or("HTTP_TIMEOUT_MS", 10_000),
            aws_accounts: aws_accounts_from(env::vars()),
        }
    }

    pub fn signature_max_age(&self) -> Duration {
        Duration::from_secs(self.slack_signature_max_age)
    }

    pub fn pending_grace(&self) -> Duration {
        Duration::from_millis(self.pending_grace_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }
}

/// Parse a variable, falling back to `default` when unset or invalid.
fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => match raw.trim().parse() {
            Ok(v) => v,
            Err(_) => {
                warn!(env_var = name, value = %raw, "Invalid value, using default");
                default
            }
        },
        Err(_) => default,
    }
}

/// Collect `AWS_ROLE_<alias>` accounts from a set of variables.
///
/// If an account uses several regions, list its role several times under
/// different aliases (`AWS_ROLE_DEV_US=...`, `AWS_ROLE_DEV_EU=...`) and set
/// `AWS_REGION_<alias>` for each.
fn aws_accounts_from<I>(vars: I) -> Vec<AwsAccount>
where
    I: IntoIterator<Item = (String, String)>,
{
    let vars: Vec<(String, String)> = vars.into_iter().collect();

    let mut accounts: Vec<AwsAccount> = vars
        .iter()
        .filter_map(|(key, value)| {
            let alias = key.strip_prefix(AWS_ROLE_ENV_PREFIX)?;
            if alias.is_empty() || value.trim().is_empty() {
                return None;
            }

            let region_key = format!("{}{}", AWS_REGION_ENV_PREFIX, alias);
            let region = vars
                .iter()
                .find(|(k, v)| *k == region_key && !v.trim().is_empty())
                .map(|(_, v)| v.trim().to_string())
                .unwrap_or_else(|| DEFAULT_AWS_REGION.to_string());

            Some(AwsAccount {
                alias: alias.to_string(),
                role_arn: value.trim().to_string(),
                region,
            })
        })
        .collect();

    accounts.sort_by(|a, b| a.alias.cmp(&b.alias));
    accounts
}
