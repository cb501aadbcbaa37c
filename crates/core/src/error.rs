/// Errors produced by the relay and its upstream workflow client.
///
/// The taxonomy mirrors what callers can sensibly do about each failure:
/// `Timeout` and `Unavailable` are safe to retry, `BadUpstreamFormat` and
/// `Upstream` indicate an upstream contract violation where a retry is
/// unlikely to help, and `BadRequest` is always the caller's fault.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The inbound request was malformed (missing or invalid patient payload).
    #[error("invalid request: {0}")]
    BadRequest(String),

    /// The upstream workflow runner did not answer before the client deadline.
    #[error("upstream workflow timed out after {0} seconds")]
    Timeout(u64),

    /// The upstream workflow runner could not be reached or closed the connection.
    #[error("upstream workflow unreachable: {0}")]
    Unavailable(String),

    /// The upstream workflow runner answered with a non-success status.
    #[error("upstream workflow returned status {status}")]
    Upstream {
        /// HTTP status code returned by the workflow runner.
        status: u16,
        /// Raw response body, kept for the `details` field of error responses.
        body: String,
    },

    /// The upstream body was HTML or otherwise not the expected JSON shape.
    #[error("upstream workflow returned a malformed body: {0}")]
    BadUpstreamFormat(String),

    /// Anything unexpected. Mapped to a 500 at the REST boundary.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Type alias for Results that can fail with a [`RelayError`].
pub type RelayResult<T> = Result<T, RelayError>;
