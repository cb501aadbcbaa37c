//! Relay runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into the relay services. The intent is to avoid reading process-wide environment
//! variables during request handling, which can lead to inconsistent behaviour in
//! multi-threaded runtimes and test harnesses.
//!
//! The upstream endpoint, credentials, tweak key and deadlines are all injected here rather
//! than hardcoded: the historical deployments drifted between dev and prod endpoints and
//! between 280/300/320 second timeouts, so a single validated structure is the contract.

use std::time::Duration;

use crate::{RelayError, RelayResult};

/// Default client-side deadline for the outbound workflow call (seconds).
pub const DEFAULT_CLIENT_DEADLINE_SECS: u64 = 280;

/// Default deadline the outer caller is assumed to hold (seconds).
///
/// The client deadline must stay strictly below this so the relay can still
/// produce a well-formed 504 before the caller gives up.
pub const DEFAULT_CALLER_DEADLINE_SECS: u64 = 320;

/// Relay configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct RelayConfig {
    upstream_url: String,
    api_key: Option<String>,
    tweak_key: Option<String>,
    client_deadline: Duration,
    caller_deadline: Duration,
}

impl RelayConfig {
    /// Create a new `RelayConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Internal`] if `upstream_url` is blank or if
    /// `client_deadline` is not strictly shorter than `caller_deadline`.
    pub fn new(
        upstream_url: String,
        api_key: Option<String>,
        tweak_key: Option<String>,
        client_deadline: Duration,
        caller_deadline: Duration,
    ) -> RelayResult<Self> {
        if upstream_url.trim().is_empty() {
            return Err(RelayError::Internal(
                "upstream_url cannot be empty".into(),
            ));
        }
        if client_deadline >= caller_deadline {
            return Err(RelayError::Internal(format!(
                "client deadline ({}s) must be strictly shorter than the caller deadline ({}s)",
                client_deadline.as_secs(),
                caller_deadline.as_secs()
            )));
        }

        Ok(Self {
            upstream_url,
            api_key,
            tweak_key,
            client_deadline,
            caller_deadline,
        })
    }

    /// URL of the upstream workflow runner's run endpoint.
    pub fn upstream_url(&self) -> &str {
        &self.upstream_url
    }

    /// Optional API key sent as `x-api-key` on outbound calls.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Optional input-tweak key. When set, the patient payload is addressed
    /// through the upstream's `tweaks` map instead of top-level `input_value`.
    pub fn tweak_key(&self) -> Option<&str> {
        self.tweak_key.as_deref()
    }

    /// Deadline applied to the outbound workflow call.
    pub fn client_deadline(&self) -> Duration {
        self.client_deadline
    }

    /// Deadline the outer caller is assumed to hold.
    pub fn caller_deadline(&self) -> Duration {
        self.caller_deadline
    }
}

/// Parse a deadline in whole seconds from an optional environment value.
///
/// If `value` is `None` or empty/whitespace, returns `default_secs`.
///
/// # Errors
///
/// Returns [`RelayError::Internal`] if the value is present but not a
/// positive integer.
pub fn deadline_from_env_value(value: Option<String>, default_secs: u64) -> RelayResult<Duration> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    let secs = match value {
        Some(v) => v
            .parse::<u64>()
            .map_err(|e| RelayError::Internal(format!("invalid deadline value {v:?}: {e}")))?,
        None => default_secs,
    };

    if secs == 0 {
        return Err(RelayError::Internal("deadline must be non-zero".into()));
    }

    Ok(Duration::from_secs(secs))
}

/// Normalise an optional environment value: trims, and treats empty as unset.
pub fn optional_env_value(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
