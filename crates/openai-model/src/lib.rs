//! A model provider for OpenAI-compatible and Azure OpenAI chat APIs.

#[macro_use]
extern crate tracing;

mod config;
mod io;
mod proto;
mod response;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use mime::Mime;
use prompt_refiner_model::{
    ErrorKind, ModelProvider, ModelProviderError, ModelRequest,
};
use reqwest::{Client, StatusCode, header};

pub use config::{OpenAIConfig, OpenAIConfigBuilder};
use io::{Chunks, Sse};
use proto::ErrorDetail;
use response::OpenAIResponse;

/// The status code the backend uses for throttling.
const RATE_LIMIT_CODE: &str = "429";

/// Error type for [`OpenAIProvider`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// Classifies a non-success HTTP response.
    fn from_status(status: StatusCode, body: &str) -> Self {
        match proto::parse_error_body(body) {
            Some(detail) => Self::from_detail(Some(status), &detail),
            None => {
                let kind = if status == StatusCode::TOO_MANY_REQUESTS {
                    ErrorKind::RateLimitExceeded
                } else {
                    ErrorKind::Other
                };
                Self::new(format!("{status}: {}", body.trim()), kind)
            }
        }
    }

    fn from_detail(status: Option<StatusCode>, detail: &ErrorDetail) -> Self {
        let code = detail.code();
        let kind = if status == Some(StatusCode::TOO_MANY_REQUESTS)
            || code.as_deref() == Some(RATE_LIMIT_CODE)
        {
            ErrorKind::RateLimitExceeded
        } else if code.as_deref() == Some("content_filter") {
            ErrorKind::Moderated
        } else {
            ErrorKind::Other
        };

        let mut message = String::new();
        if let Some(status) = status {
            message.push_str(&format!("{status}: "));
        } else if let Some(code) = &code {
            message.push_str(&format!("Error code: {code} - "));
        }
        message.push_str(detail.message.as_deref().unwrap_or("unknown error"));
        Self::new(message, kind)
    }

    fn from_transport(err: reqwest::Error) -> Self {
        let kind = if err.status() == Some(StatusCode::TOO_MANY_REQUESTS) {
            ErrorKind::RateLimitExceeded
        } else {
            ErrorKind::Other
        };
        Self::new(format!("{err}"), kind)
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// OpenAI-compatible model provider.
#[derive(Clone, Debug)]
pub struct OpenAIProvider {
    client: Client,
    config: Arc<OpenAIConfig>,
}

impl OpenAIProvider {
    /// Creates a new `OpenAIProvider` with the given configuration.
    #[inline]
    pub fn new(config: OpenAIConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }
}

impl ModelProvider for OpenAIProvider {
    type Error = Error;
    type Response = OpenAIResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let openai_req = proto::create_request(req, &self.config);
        let mut builder = self.client.post(self.config.completions_url());
        builder = if self.config.is_azure() {
            builder.header("api-key", &self.config.api_key)
        } else {
            builder.header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.config.api_key),
            )
        };
        let resp_fut = builder
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "text/event-stream")
            .json(&openai_req)
            .send();

        async move {
            let resp = resp_fut.await.map_err(Error::from_transport)?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                let err = Error::from_status(status, &body);
                debug!("request failed ({:?}): {err}", err.kind());
                return Err(err);
            }

            let content_type = resp
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok());
            let is_valid_content_type = content_type
                .and_then(|v| v.parse().ok())
                .map(|m: Mime| m.essence_str() == "text/event-stream")
                .unwrap_or(false);
            if !is_valid_content_type {
                return Err(Error::new(
                    format!("Unexpected content type: {content_type:?}"),
                    ErrorKind::Other,
                ));
            }

            // Here we got a successful response.
            let chunks = Chunks::from_response(resp);
            let sse = Sse::new(chunks);
            Ok(OpenAIResponse::from_sse(sse))
        }
    }
}
