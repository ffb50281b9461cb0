use prompt_refiner_model::ErrorKind;
use serde::{Deserialize, Serialize};

/// The events in a preset response.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetEvent {
    #[serde(rename = "message_delta")]
    MessageDelta(String),
}

/// How a preset response fails before it succeeds.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PresetFailure {
    /// The backend answers with a throttling error.
    #[default]
    RateLimited,
    /// The backend refuses the content.
    Moderated,
    /// Any other backend failure.
    Other,
}

impl PresetFailure {
    pub(crate) fn kind(self) -> ErrorKind {
        match self {
            PresetFailure::RateLimited => ErrorKind::RateLimitExceeded,
            PresetFailure::Moderated => ErrorKind::Moderated,
            PresetFailure::Other => ErrorKind::Other,
        }
    }

    pub(crate) fn message(self) -> &'static str {
        match self {
            PresetFailure::RateLimited => "429 Too Many Requests",
            PresetFailure::Moderated => "400 content filtered",
            PresetFailure::Other => "500 Internal Server Error",
        }
    }
}

/// The preset response for one request.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetResponse {
    /// Events in this response.
    pub events: Vec<PresetEvent>,
    /// If set, the request will fail in the first `failures` attempts.
    /// `Some(0)` means the request will fail infinitely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failures: Option<u64>,
    /// The failure produced by the failing attempts.
    #[serde(default)]
    pub failure: PresetFailure,
}

impl PresetResponse {
    /// Creates a `PresetResponse` with the specified events.
    #[inline]
    pub fn with_events(events: impl Into<Vec<PresetEvent>>) -> Self {
        Self {
            events: events.into(),
            failures: None,
            failure: PresetFailure::default(),
        }
    }

    /// Creates a `PresetResponse` that streams `text` in one delta.
    #[inline]
    pub fn with_text<S: Into<String>>(text: S) -> Self {
        Self::with_events([PresetEvent::MessageDelta(text.into())])
    }

    /// Creates a `PresetResponse` that always fails with `failure`.
    #[inline]
    pub fn always_failing(failure: PresetFailure) -> Self {
        Self::with_events(Vec::<PresetEvent>::new())
            .with_failures(0)
            .with_failure(failure)
    }

    /// Sets failure times before a successful response. `0` means the
    /// response will always be a failure.
    #[inline]
    pub fn with_failures(mut self, failures: u64) -> Self {
        self.failures = Some(failures);
        self
    }

    /// Sets the kind of failure the failing attempts produce.
    #[inline]
    pub fn with_failure(mut self, failure: PresetFailure) -> Self {
        self.failure = failure;
        self
    }
}
