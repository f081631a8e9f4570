use async_trait::async_trait;
use bytes::Bytes;
use http::{Request, Response};
use std::{fmt::Debug, sync::Arc};

/// Error returned by an [`HttpClient`] when the exchange could not be completed.
pub type HttpError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Transport used by [`Client`](crate::Client) to talk to Amplitude.
///
/// Implementations send the request as-is and hand back the full response, whatever its status.
/// A non-2xx status is not a transport error.
#[async_trait]
pub trait HttpClient: Debug + Send + Sync {
    /// Send the request and buffer the complete response body.
    async fn send_bytes(&self, request: Request<Bytes>) -> Result<Response<Bytes>, HttpError>;
}

#[async_trait]
impl<C: HttpClient + ?Sized> HttpClient for Arc<C> {
    async fn send_bytes(&self, request: Request<Bytes>) -> Result<Response<Bytes>, HttpError> {
        self.as_ref().send_bytes(request).await
    }
}

#[cfg(any(feature = "reqwest-client", feature = "reqwest-client-rustls"))]
mod reqwest {
    use super::{async_trait, Bytes, HttpClient, HttpError, Request, Response};

    #[async_trait]
    impl HttpClient for reqwest::Client {
        async fn send_bytes(
            &self,
            request: Request<Bytes>,
        ) -> Result<Response<Bytes>, HttpError> {
            let request: reqwest::Request = request.try_into()?;
            let mut response = self.execute(request).await?;
            let headers = std::mem::take(response.headers_mut());
            let mut http_response = Response::builder()
                .status(response.status())
                .body(response.bytes().await?)?;
            *http_response.headers_mut() = headers;
            Ok(http_response)
        }
    }
}
