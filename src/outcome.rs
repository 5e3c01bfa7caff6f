use std::time::Duration;

use crate::error::RequestError;

/// Result of one request attempt, produced by a worker and consumed once by
/// the aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOutcome {
    /// From just before the request is built until the response body is
    /// drained or the attempt fails.
    pub duration: Duration,
    pub success: bool,
    /// `None` when no response was received.
    pub status: Option<u16>,
    /// `None` on success.
    pub error: Option<String>,
}

impl RequestOutcome {
    pub fn success(duration: Duration, status: u16) -> Self {
        Self { duration, success: true, status: Some(status), error: None }
    }

    pub fn failure(duration: Duration, status: Option<u16>, error: &RequestError) -> Self {
        Self {
            duration,
            success: false,
            status,
            error: Some(error.to_string()),
        }
    }
}
