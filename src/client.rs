use crate::{
    endpoint::{append_path, parse_endpoint, API_ENDPOINT_V1, API_ENDPOINT_V2},
    Context, Error, HttpClient,
};
use bytes::Bytes;
use http::{header, Request, Response};
use serde::{de::DeserializeOwned, Serialize};
use std::{fmt::Debug, io::Write, sync::Arc};
use tracing::{debug, warn};

const API_KEY_FIELD: &str = "api_key";
const APPLICATION_JSON: &str = "application/json";
const APPLICATION_FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Payload that can carry the client's API key.
///
/// [`Client::new_v2_request`] calls [`set_api_key`](ApiRequest::set_api_key) right before the
/// payload is serialized, so callers never handle the key themselves. Payloads that don't carry
/// a key can rely on the default, which does nothing.
pub trait ApiRequest: Serialize {
    /// Store the API key in the payload.
    fn set_api_key(&mut self, _api_key: &str) {}
}

/// What [`Client::execute`] does with the response body.
pub enum ResponseTarget<'a, T> {
    /// Leave the body alone.
    Discard,
    /// Copy the raw body into a writer.
    Writer(&'a mut (dyn Write + Send)),
    /// Decode the body as JSON into the value. An empty body leaves the value untouched.
    Json(&'a mut T),
}

impl<T: Debug> Debug for ResponseTarget<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponseTarget::Discard => f.write_str("Discard"),
            ResponseTarget::Writer(_) => f.write_str("Writer"),
            ResponseTarget::Json(value) => f.debug_tuple("Json").field(value).finish(),
        }
    }
}

/// Amplitude API client.
///
/// Holds the API key, both base addresses and the transport. The client never changes after
/// construction, so a single instance can be cloned and shared between tasks.
#[derive(Clone)]
pub struct Client<C> {
    pub(crate) http_client: Arc<C>,
    pub(crate) endpoint_v1: Arc<http::Uri>,
    pub(crate) endpoint_v2: Arc<http::Uri>,
    pub(crate) api_key: String,
}

impl<C: Debug> Debug for Client<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("http_client", &self.http_client)
            .field("endpoint_v1", &self.endpoint_v1)
            .field("endpoint_v2", &self.endpoint_v2)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Create a new client.
///
/// Reads the API key from the `AMPLITUDE_API_KEY` environment variable.
pub fn new_client_from_env<C: HttpClient + 'static>(
    http_client: C,
) -> Result<Client<C>, Box<dyn std::error::Error + Send + Sync + 'static>> {
    let api_key = std::env::var("AMPLITUDE_API_KEY")?;
    Ok(Client::new(api_key, http_client)?)
}

impl<C> Client<C> {
    /// Create a new client talking to the public Amplitude endpoints.
    pub fn new(api_key: impl Into<String>, http_client: C) -> Result<Self, Error> {
        let endpoint_v1 = parse_endpoint(API_ENDPOINT_V1).map_err(Error::InvalidEndpoint)?;
        let endpoint_v2 = parse_endpoint(API_ENDPOINT_V2).map_err(Error::InvalidEndpoint)?;
        Ok(Self {
            http_client: Arc::new(http_client),
            endpoint_v1: Arc::new(endpoint_v1),
            endpoint_v2: Arc::new(endpoint_v2),
            api_key: api_key.into(),
        })
    }

    /// Send requests to different base addresses, e.g. a proxy or a regional deployment.
    ///
    /// ```
    /// # #[derive(Debug)] struct Transport;
    /// let client = amplitude_http::Client::new("...", Transport)?
    ///     .with_endpoints("https://api.eu.amplitude.com", "https://api.eu.amplitude.com")?;
    /// # Ok::<(), amplitude_http::Error>(())
    /// ```
    pub fn with_endpoints(mut self, v1: &str, v2: &str) -> Result<Self, Error> {
        self.endpoint_v1 = Arc::new(parse_endpoint(v1).map_err(Error::InvalidEndpoint)?);
        self.endpoint_v2 = Arc::new(parse_endpoint(v2).map_err(Error::InvalidEndpoint)?);
        Ok(self)
    }

    /// Base address for form-encoded requests.
    pub fn endpoint_v1(&self) -> &http::Uri {
        &self.endpoint_v1
    }

    /// Base address for JSON requests.
    pub fn endpoint_v2(&self) -> &http::Uri {
        &self.endpoint_v2
    }

    /// Build a form-encoded `POST` against the v1 endpoint.
    ///
    /// `api_key` is added to the form, replacing any value the caller supplied.
    pub fn new_v1_request<K, V>(
        &self,
        path: &str,
        form: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Request<Bytes>, Error>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let uri = append_path(&self.endpoint_v1, path).map_err(Error::InvalidEndpoint)?;
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in form {
            if key.as_ref() != API_KEY_FIELD {
                serializer.append_pair(key.as_ref(), value.as_ref());
            }
        }
        serializer.append_pair(API_KEY_FIELD, &self.api_key);
        let body = serializer.finish();

        Request::post(uri)
            .header(header::CONTENT_TYPE, APPLICATION_FORM_URLENCODED)
            .body(Bytes::from(body))
            .map_err(Error::BuildRequest)
    }

    /// Build a JSON `POST` against the v2 endpoint.
    ///
    /// The client's API key is handed to the payload before it is serialized.
    pub fn new_v2_request<P: ApiRequest>(
        &self,
        path: &str,
        payload: &mut P,
    ) -> Result<Request<Bytes>, Error> {
        let uri = append_path(&self.endpoint_v2, path).map_err(Error::InvalidEndpoint)?;
        payload.set_api_key(&self.api_key);
        let body = serde_json::to_vec(payload).map_err(Error::SerializeRequest)?;

        Request::post(uri)
            .header(header::CONTENT_TYPE, APPLICATION_JSON)
            .header(header::ACCEPT, APPLICATION_JSON)
            .body(Bytes::from(body))
            .map_err(Error::BuildRequest)
    }
}

impl<C: HttpClient> Client<C> {
    /// Send a prepared request and handle the response body as `target` says.
    ///
    /// The response is returned whatever its status. If the exchange fails or is interrupted
    /// while `ctx` is cancelled or past its deadline, the context error is returned rather than
    /// the transport error.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        ctx: &Context,
        request: Request<Bytes>,
        target: ResponseTarget<'_, T>,
    ) -> Result<Response<Bytes>, Error> {
        if let Some(err) = ctx.err() {
            warn!(uri = %request.uri(), "request context already done: {}", err);
            return Err(err);
        }

        debug!(method = %request.method(), uri = %request.uri(), "sending request");
        let result = tokio::select! {
            biased;
            err = ctx.done() => {
                warn!("request abandoned: {}", err);
                return Err(err);
            }
            result = self.http_client.send_bytes(request) => result,
        };
        let response = match result {
            Ok(response) => response,
            Err(err) => {
                if let Some(ctx_err) = ctx.err() {
                    debug!("transport failed after context was done: {}", err);
                    return Err(ctx_err);
                }
                return Err(Error::Connection(err));
            }
        };
        debug!(status = %response.status(), len = response.body().len(), "received response");

        match target {
            ResponseTarget::Discard => {}
            ResponseTarget::Writer(writer) => {
                if let Err(source) = writer.write_all(response.body()) {
                    warn!("writing response body failed: {}", source);
                    return Err(Error::WriteResponse {
                        response: Box::new(response),
                        source,
                    });
                }
            }
            ResponseTarget::Json(value) => {
                let decoded = decode_body(response.body());
                match decoded {
                    Ok(Some(decoded)) => *value = decoded,
                    Ok(None) => debug!(status = %response.status(), "empty response body"),
                    Err(source) => {
                        warn!(
                            status = %response.status(),
                            "decoding response body failed: {}",
                            source
                        );
                        return Err(Error::DeserializeResponse {
                            response: Box::new(response),
                            source,
                        });
                    }
                }
            }
        }
        Ok(response)
    }
}

/// Decode a JSON response body. Bodies made of nothing but whitespace count as empty.
fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<Option<T>, serde_json::Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use test_case::test_case;

    #[derive(Debug)]
    struct NoTransport;

    #[derive(Serialize)]
    struct Keyed {
        api_key: String,
        value: u32,
    }

    impl ApiRequest for Keyed {
        fn set_api_key(&mut self, api_key: &str) {
            self.api_key = api_key.to_string();
        }
    }

    #[derive(Serialize)]
    struct Unkeyed {
        value: u32,
    }

    impl ApiRequest for Unkeyed {}

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Decoded {
        code: u16,
    }

    fn client() -> Client<NoTransport> {
        Client::new("secret", NoTransport).unwrap()
    }

    #[test]
    fn new_uses_public_endpoints() {
        let client = client();
        assert_eq!("https://api.amplitude.com/", client.endpoint_v1().to_string());
        assert_eq!("https://api2.amplitude.com/", client.endpoint_v2().to_string());
    }

    #[test]
    fn with_endpoints_rejects_invalid_uri() {
        let err = client()
            .with_endpoints("https://exa mple.com", API_ENDPOINT_V2)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidEndpoint(_)));
    }

    #[test]
    fn debug_redacts_api_key() {
        let debug = format!("{:?}", client());
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn v1_request_is_form_encoded_with_api_key() {
        let request = client()
            .new_v1_request("/identify", vec![("name", "a b&c")])
            .unwrap();
        assert_eq!(http::Method::POST, request.method());
        assert_eq!("https://api.amplitude.com/identify", request.uri().to_string());
        assert_eq!(
            APPLICATION_FORM_URLENCODED,
            request.headers()[header::CONTENT_TYPE]
        );
        assert_eq!(&b"name=a+b%26c&api_key=secret"[..], request.body().as_ref());
    }

    #[test]
    fn v1_request_overrides_caller_api_key() {
        let request = client()
            .new_v1_request("/identify", vec![("api_key", "forged")])
            .unwrap();
        assert_eq!(&b"api_key=secret"[..], request.body().as_ref());
    }

    #[test]
    fn v2_request_injects_api_key() {
        let mut payload = Keyed {
            api_key: String::new(),
            value: 7,
        };
        let request = client().new_v2_request("/2/httpapi", &mut payload).unwrap();
        assert_eq!("https://api2.amplitude.com/2/httpapi", request.uri().to_string());
        assert_eq!(APPLICATION_JSON, request.headers()[header::CONTENT_TYPE]);
        assert_eq!(APPLICATION_JSON, request.headers()[header::ACCEPT]);
        assert_eq!(
            &br#"{"api_key":"secret","value":7}"#[..],
            request.body().as_ref()
        );
    }

    #[test]
    fn v2_request_without_key_capability() {
        let request = client()
            .new_v2_request("/2/httpapi", &mut Unkeyed { value: 1 })
            .unwrap();
        assert_eq!(&br#"{"value":1}"#[..], request.body().as_ref());
    }

    #[test_case(b"" ; "empty")]
    #[test_case(b"\n" ; "newline")]
    fn decode_empty_body(body: &'static [u8]) {
        let decoded: Option<Decoded> = decode_body(body).unwrap();
        assert_eq!(None, decoded);
    }

    #[test]
    fn decode_json_body() {
        let decoded: Option<Decoded> = decode_body(br#"{"code":200}"#).unwrap();
        assert_eq!(Some(Decoded { code: 200 }), decoded);
    }

    #[test]
    fn decode_malformed_body() {
        let err = decode_body::<Decoded>(b"<html>").unwrap_err();
        assert!(err.is_syntax());
    }
}
