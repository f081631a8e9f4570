use bytes::Bytes;
use http::Response;
use std::error::Error as StdError;

/// Errors that occurred while building, sending or decoding an Amplitude API request.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A base address or request path could not be parsed into a URI.
    ///
    /// For the built-in endpoints this is an error in this crate. If you spot this, please open
    /// an issue.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(http::uri::InvalidUri),

    /// Request payload failed to serialize to JSON. The request was not sent.
    #[error("serializing request failed with {0}")]
    SerializeRequest(serde_json::Error),

    /// The HTTP request could not be assembled from its parts. The request was not sent.
    #[error("building request failed with {0}")]
    BuildRequest(http::Error),

    /// Could not complete the HTTP exchange with Amplitude.
    #[error("sending request failed with {0}")]
    Connection(Box<dyn StdError + Send + Sync + 'static>),

    /// The request context was cancelled before the exchange completed.
    #[error("request cancelled")]
    Cancelled,

    /// The request context deadline passed before the exchange completed.
    #[error("request deadline exceeded")]
    DeadlineExceeded,

    /// Response body was not empty and failed to deserialize from JSON.
    ///
    /// The request may have been accepted. Check the status code of `response` to be sure.
    #[error(
        "deserializing response with status {} failed with {}",
        .response.status(),
        .source
    )]
    DeserializeResponse {
        /// The response whose body could not be decoded.
        response: Box<Response<Bytes>>,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// Copying the response body into the caller's writer failed.
    #[error(
        "writing response body with status {} failed with {}",
        .response.status(),
        .source
    )]
    WriteResponse {
        /// The response whose body could not be written.
        response: Box<Response<Bytes>>,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

impl Error {
    /// Returns `true` if the request was abandoned because its [`Context`](crate::Context) was
    /// cancelled or its deadline passed, as opposed to failing in the transport.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Error::Cancelled | Error::DeadlineExceeded)
    }

    /// The HTTP response, if the exchange completed before the error occurred.
    pub fn response(&self) -> Option<&Response<Bytes>> {
        match self {
            Error::DeserializeResponse { response, .. }
            | Error::WriteResponse { response, .. } => Some(&**response),
            _ => None,
        }
    }
}
