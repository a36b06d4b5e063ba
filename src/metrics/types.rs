use std::fmt;
use std::time::Duration;

use serde::Serialize;

/// Coarse classification of a failed request attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    Timeout,
    Connect,
    Redirect,
    Body,
    Request,
}

impl FailureKind {
    #[must_use]
    pub fn classify(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connect
        } else if err.is_redirect() {
            Self::Redirect
        } else if err.is_body() || err.is_decode() {
            Self::Body
        } else {
            Self::Request
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Connect => "connect",
            Self::Redirect => "redirect",
            Self::Body => "body",
            Self::Request => "request",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transport or protocol error captured for one request. The originating
/// `reqwest::Error` is flattened to text so results stay `Clone + Send`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl RequestFailure {
    #[must_use]
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        Self {
            kind: FailureKind::classify(err),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for RequestFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Observable phases of a request made through a pooled client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Phases {
    /// From dispatch until the response head arrived. Includes any DNS,
    /// connect and write time the pool needed.
    pub wait: Duration,
    /// Time spent draining the response body.
    pub read: Duration,
}

/// Outcome of exactly one request attempt.
#[derive(Debug, Clone)]
pub struct RequestResult {
    pub error: Option<RequestFailure>,
    /// `None` when no response head was received.
    pub status_code: Option<u16>,
    pub duration: Duration,
    /// Declared `Content-Length`; `None` when the server did not send one.
    pub content_length: Option<u64>,
    /// Bytes actually drained from the body.
    pub body_bytes: u64,
    /// Dispatch time relative to the start of the run.
    pub offset: Duration,
    pub phases: Option<Phases>,
}

impl RequestResult {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.error.is_none() && self.status_code.is_some()
    }
}
