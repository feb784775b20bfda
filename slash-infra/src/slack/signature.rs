//! Slack request signature verification.
//!
//! Slack signs every webhook with HMAC-SHA256 over `v0:<timestamp>:<body>`.
//! Reference: https://api.slack.com/authentication/verifying-requests-from-slack

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::warn;

use crate::error::AuthError;

type HmacSha256 = Hmac<Sha256>;

/// Version tag prefixed to both the base string and the signature.
pub const SIGNATURE_VERSION: &str = "v0";

/// Header carrying the `v0=<hex>` signature.
pub const SIGNATURE_HEADER: &str = "X-Slack-Signature";

/// Header carrying the Unix timestamp the request was signed at.
pub const TIMESTAMP_HEADER: &str = "X-Slack-Request-Timestamp";

/// How old a signed request may be before it is treated as a replay.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(10 * 60);

/// Source of the current time, in Unix seconds.
pub trait Clock: Send + Sync {
    fn now_unix(&self) -> i64;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default()
    }
}

/// A clock pinned to a given instant. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct FixedClock {
    now: Arc<AtomicI64>,
}

impl FixedClock {
    pub fn new(now_unix: i64) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(now_unix)),
        }
    }

    pub fn set(&self, now_unix: i64) {
        self.now.store(now_unix, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(by.as_secs() as i64, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now_unix(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Verifies that webhook requests were signed by Slack recently.
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: Arc<str>,
    max_age: Duration,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("max_age", &self.max_age)
            .finish_non_exhaustive()
    }
}

impl SignatureVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: Arc::from(secret.into()),
            max_age: DEFAULT_MAX_AGE,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Check the request's freshness, then its signature.
    ///
    /// # Arguments
    ///
    /// * `timestamp` - The `X-Slack-Request-Timestamp` header value
    /// * `signature` - The `X-Slack-Signature` header value
    /// * `body` - The raw request body, exactly as received
    pub fn verify(&self, timestamp: &str, signature: &str, body: &[u8]) -> Result<(), AuthError> {
        // Anyone can sign with an empty key, so an unconfigured secret accepts nothing.
        if self.secret.trim().is_empty() {
            warn!("slack_signature_missing_secret");
            return Err(AuthError::InvalidSignature);
        }

        if !self.is_timestamp_recent(timestamp) {
            return Err(AuthError::StaleTimestamp);
        }

        let expected = compute_signature(&self.secret, timestamp, body);
        if !constant_time_eq(expected.as_bytes(), signature.as_bytes()) {
            warn!(
                expected_length = expected.len(),
                actual_length = signature.len(),
                "slack_signature_mismatch"
            );
            return Err(AuthError::InvalidSignature);
        }

        Ok(())
    }

    /// A timestamp is recent when it is strictly newer than `now - max_age`.
    ///
    /// Timestamps from the future are accepted; an unparseable one never is.
    fn is_timestamp_recent(&self, timestamp: &str) -> bool {
        let request_time: i64 = match timestamp.trim().parse() {
            Ok(t) => t,
            Err(_) => {
                warn!(timestamp = %timestamp, "slack_signature_invalid_timestamp");
                return false;
            }
        };

        let now = self.clock.now_unix();
        let max_age = i64::try_from(self.max_age.as_secs()).unwrap_or(i64::MAX);
        let oldest_allowed = now.saturating_sub(max_age);

        if request_time <= oldest_allowed {
            warn!(
                request_time = request_time,
                current_time = now,
                age_seconds = now.saturating_sub(request_time),
                max_age_seconds = self.max_age.as_secs(),
                "slack_signature_stale"
            );
            return false;
        }

        true
    }
}

/// Compute the `v0=<hex>` signature Slack would send for this request.
pub fn compute_signature(secret: &str, timestamp: &str, body: &[u8]) -> String {
    // HMAC accepts keys of any length, including empty.
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC accepts keys of any length"));

    mac.update(SIGNATURE_VERSION.as_bytes());
    mac.update(b":");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(body);

    format!(
        "{}={}",
        SIGNATURE_VERSION,
        hex::encode(mac.finalize().into_bytes())
    )
}

/// Constant-time byte comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
