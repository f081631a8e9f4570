//! A client for the [Amplitude HTTP API].
//!
//! [Amplitude HTTP API]: https://amplitude.com/docs/apis/analytics/http-v2
//!
//! **Disclaimer**: This is not an official Amplitude product.
//!
//! # Usage
//!
//! Create a [`Client`] with your API key and an HTTP client, then log events:
//!
//! ```no_run
//! # #[cfg(feature = "reqwest-client")]
//! # async fn run() -> Result<(), amplitude_http::Error> {
//! use amplitude_http::{Client, Context, Event, LogEventRequest};
//!
//! let client = Client::new("...", reqwest::Client::new())?;
//! let (body, response) = client
//!     .log_event(
//!         &Context::background(),
//!         LogEventRequest::new(vec![Event {
//!             user_id: Some("john_doe@gmail.com".into()),
//!             ..Event::new("watch_tutorial")
//!         }]),
//!     )
//!     .await?;
//! if !response.status().is_success() {
//!     eprintln!("upload rejected: {:?}", body.error);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Endpoints
//!
//! Amplitude serves two ingestion APIs:
//!
//! | Operation              | Endpoint                          | Body                                 |
//! | ---------------------- | --------------------------------- | ------------------------------------ |
//! | [`Client::log_event`]  | `POST https://api2.amplitude.com/2/httpapi` | JSON `{api_key, events}`   |
//! | [`Client::identify`]   | `POST https://api.amplitude.com/identify`   | form `api_key`, `identification` |
//!
//! The API key is added by the client. Request types never need to be given one.
//!
//! # Errors
//!
//! The client only fails when a request can't be built or sent, or when a non-empty response
//! body can't be decoded. A response with a non-2xx status is returned as `Ok`, so check
//! [`http::Response::status`] before trusting the upload went through.
//!
//! # Cancellation
//!
//! Every call takes a [`Context`]. Cancelling its token or passing its deadline abandons the
//! call with [`Error::Cancelled`] or [`Error::DeadlineExceeded`].
//!
//! # Logging
//!
//! The crate emits `debug` and `warn` events through [`tracing`](https://docs.rs/tracing).
//! Install a subscriber to see them.
#![doc(html_root_url = "https://docs.rs/amplitude-http/0.1.0")]
#![deny(missing_docs, unreachable_pub, missing_debug_implementations)]
#![cfg_attr(test, deny(warnings))]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[cfg(doctest)]
doc_comment::doctest!("../README.md");

mod client;
mod context;
mod endpoint;
mod error;
mod event;
mod http_client;
mod identify;

pub use client::{new_client_from_env, ApiRequest, Client, ResponseTarget};
pub use context::Context;
pub use endpoint::{API_ENDPOINT_V1, API_ENDPOINT_V2};
pub use error::Error;
pub use event::{Event, LogEventRequest, LogEventResponse};
pub use http_client::{HttpClient, HttpError};
pub use identify::{Identification, IdentifyRequest};
pub use tokio_util::sync::CancellationToken;

/// Custom properties attached to events and identifications.
pub type Properties = std::collections::BTreeMap<String, serde_json::Value>;
