use prompt_refiner_model::{ErrorKind, ModelProviderError};

/// Errors surfaced by rounds and by the refinement loop.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The model backend failed. Its [`ErrorKind`] tells whether the
    /// failure is worth retrying.
    #[error("{0}")]
    Backend(Box<dyn ModelProviderError>),
    /// A round finished without any reply from the collaborator.
    #[error("no response from {collaborator}")]
    NoResponse {
        /// Name of the collaborator that stayed silent.
        collaborator: String,
    },
    /// The user query is empty.
    #[error("the query is empty")]
    EmptyQuery,
}

impl Error {
    /// Returns the backend error kind, if this is a backend error.
    #[inline]
    pub fn backend_kind(&self) -> Option<ErrorKind> {
        match self {
            Error::Backend(err) => Some(err.kind()),
            _ => None,
        }
    }

    /// Returns `true` if the backend throttled the request.
    #[inline]
    pub fn is_rate_limited(&self) -> bool {
        self.backend_kind().is_some_and(ErrorKind::is_transient)
    }

    /// Returns `true` if a round produced no assistant content.
    #[inline]
    pub fn is_no_response(&self) -> bool {
        matches!(self, Error::NoResponse { .. })
    }
}

impl From<Box<dyn ModelProviderError>> for Error {
    #[inline]
    fn from(err: Box<dyn ModelProviderError>) -> Self {
        Error::Backend(err)
    }
}
