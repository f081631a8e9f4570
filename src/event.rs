use crate::{
    client::{ApiRequest, ResponseTarget},
    Client, Context, Error, HttpClient, Properties,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use http::Response;
use serde::{Deserialize, Serialize};

const LOG_EVENT_PATH: &str = "/2/httpapi";

/// A single behavioral occurrence to record.
///
/// Only `event_type` is always sent. Every other field is left out of the request when unset.
///
/// ```
/// use amplitude_http::Event;
/// use std::time::SystemTime;
///
/// let event = Event {
///     user_id: Some("john_doe@gmail.com".into()),
///     country: Some("United States".into()),
///     ..Event::new("watch_tutorial").with_time(SystemTime::now())
/// };
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Identifier of the user. Required unless `device_id` is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Identifier of the device. Required unless `user_id` is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    /// Name of the event.
    pub event_type: String,
    /// Milliseconds since the Unix epoch. Amplitude uses the upload time when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,
    /// Properties of the event itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_properties: Option<Properties>,
    /// Properties to set on the user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_properties: Option<Properties>,
    /// Groups the user belongs to, keyed by group type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<Properties>,
    /// Properties to set on the groups named in `groups`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_properties: Option<Properties>,
    /// Version of the app.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,
    /// Platform of the device, like `iOS` or `Web`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    /// Name of the operating system or browser.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_name: Option<String>,
    /// Version of the operating system or browser.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_version: Option<String>,
    /// Brand of the device.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_brand: Option<String>,
    /// Manufacturer of the device.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_manufacturer: Option<String>,
    /// Model of the device.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_model: Option<String>,
    /// Mobile carrier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carrier: Option<String>,
    /// Country of the user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Region of the user, like a state or province.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// City of the user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// Designated market area.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dma: Option<String>,
    /// Language of the user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Price of a single item. Required with `revenue_type` for revenue events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    /// Number of items purchased.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i32>,
    /// Total revenue. Use `price` and `quantity` instead for per-item revenue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue: Option<f64>,
    /// Identifier of the purchased product.
    #[serde(rename = "productId", skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    /// Kind of revenue, like `purchase` or `refund`.
    #[serde(rename = "revenueType", skip_serializing_if = "Option::is_none")]
    pub revenue_type: Option<String>,
    /// Latitude of the device.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_lat: Option<f64>,
    /// Longitude of the device.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_lng: Option<f64>,
    /// IP address of the device. Amplitude uses it to derive the location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    /// iOS identifier for advertiser.
    #[serde(rename = "idfa", skip_serializing_if = "Option::is_none")]
    pub ios_advertiser_id: Option<String>,
    /// iOS identifier for vendor.
    #[serde(rename = "idfv", skip_serializing_if = "Option::is_none")]
    pub ios_vendor_id: Option<String>,
    /// Google Play services advertising ID.
    #[serde(rename = "adid", skip_serializing_if = "Option::is_none")]
    pub android_advertiser_id: Option<String>,
    /// Android ID of the device.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub android_id: Option<String>,
    /// Counter the caller increments for each event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<i64>,
    /// Start of the session in milliseconds since the Unix epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<i64>,
    /// Deduplication key. Amplitude drops events whose `insert_id` it has seen recently.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insert_id: Option<String>,
}

impl Event {
    /// Create an event of the given type with every other field unset.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            ..Default::default()
        }
    }

    /// Set the time the event occurred.
    pub fn with_time(mut self, time: impl Into<DateTime<Utc>>) -> Self {
        self.time = Some(time.into().timestamp_millis());
        self
    }
}

/// Body of a `POST /2/httpapi` request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LogEventRequest {
    api_key: String,
    /// Events to upload.
    pub events: Vec<Event>,
}

impl LogEventRequest {
    /// Wrap the events in a request. The API key is filled in by the [`Client`].
    pub fn new(events: Vec<Event>) -> Self {
        Self {
            api_key: String::new(),
            events,
        }
    }
}

impl From<Vec<Event>> for LogEventRequest {
    fn from(events: Vec<Event>) -> Self {
        Self::new(events)
    }
}

impl ApiRequest for LogEventRequest {
    fn set_api_key(&mut self, api_key: &str) {
        self.api_key = api_key.to_string();
    }
}

/// Decoded body of a `POST /2/httpapi` response.
///
/// A failed upload still decodes into this type. Check the HTTP status and
/// [`error`](LogEventResponse::error) to find out whether the events were accepted.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LogEventResponse {
    /// Status code reported in the body. Not limited to HTTP status values.
    pub code: i64,
    /// Error description for rejected uploads.
    pub error: Option<String>,
    /// Number of events that were accepted.
    pub events_ingested: Option<u64>,
    /// Size of the accepted payload.
    pub payload_size_bytes: Option<u64>,
    /// Time the server received the upload, in milliseconds since the Unix epoch.
    pub server_upload_time: Option<i64>,
}

impl LogEventResponse {
    /// Time the server received the upload.
    pub fn server_upload_time(&self) -> Option<DateTime<Utc>> {
        self.server_upload_time
            .and_then(DateTime::<Utc>::from_timestamp_millis)
    }
}

impl<C: HttpClient> Client<C> {
    /// Upload events to the JSON API.
    ///
    /// Returns the decoded body together with the raw response. A rejected upload is not an
    /// error: inspect the status code of the response.
    pub async fn log_event(
        &self,
        ctx: &Context,
        mut request: LogEventRequest,
    ) -> Result<(LogEventResponse, Response<Bytes>), Error> {
        let http_request = self.new_v2_request(LOG_EVENT_PATH, &mut request)?;
        let mut response = LogEventResponse::default();
        let http_response = self
            .execute(ctx, http_request, ResponseTarget::Json(&mut response))
            .await?;
        Ok((response, http_response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};

    #[test]
    fn minimal_event_only_sends_event_type() {
        let serialized = serde_json::to_string(&Event::new("open_app")).unwrap();
        assert_eq!(r#"{"event_type":"open_app"}"#, serialized);
    }

    #[test]
    fn serialization_format() {
        let event = Event {
            user_id: Some("john_doe@gmail.com".into()),
            user_properties: Some(Properties::from([("Cohort".into(), "Test A".into())])),
            product_id: Some("sku-1".into()),
            revenue_type: Some("purchase".into()),
            ios_advertiser_id: Some("AEBE52E7".into()),
            android_advertiser_id: Some("AEBE52E8".into()),
            quantity: Some(2),
            ..Event::new("watch_tutorial")
        };
        let serialized = serde_json::to_string(&event).unwrap();
        let expected = "{\"user_id\":\"john_doe@gmail.com\",\"event_type\":\"watch_tutorial\",\"user_properties\":{\"Cohort\":\"Test A\"},\"quantity\":2,\"productId\":\"sku-1\",\"revenueType\":\"purchase\",\"idfa\":\"AEBE52E7\",\"adid\":\"AEBE52E8\"}";
        assert_eq!(expected, serialized);
    }

    #[test]
    fn with_time_uses_milliseconds() {
        let time = SystemTime::UNIX_EPOCH + Duration::from_millis(1_596_665_700_123);
        let event = Event::new("x").with_time(time);
        assert_eq!(Some(1_596_665_700_123), event.time);
    }

    #[test]
    fn request_carries_api_key() {
        let mut request = LogEventRequest::from(vec![Event::new("x")]);
        request.set_api_key("key");
        let serialized = serde_json::to_string(&request).unwrap();
        assert_eq!(
            r#"{"api_key":"key","events":[{"event_type":"x"}]}"#,
            serialized
        );
    }

    #[test]
    fn response_decodes_success() {
        let response: LogEventResponse = serde_json::from_str(
            r#"{"code":200,"events_ingested":1,"payload_size_bytes":50,"server_upload_time":1596665700123}"#,
        )
        .unwrap();
        assert_eq!(200, response.code);
        assert_eq!(None, response.error);
        assert_eq!(Some(1), response.events_ingested);
        assert_eq!(Some(50), response.payload_size_bytes);
        assert_eq!(
            "2020-08-05T22:15:00.123Z",
            response
                .server_upload_time()
                .unwrap()
                .to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
        );
    }

    #[test]
    fn response_ignores_unknown_fields() {
        let response: LogEventResponse = serde_json::from_str(
            r#"{"code":400,"error":"Request missing required field","missing_field":"api_key"}"#,
        )
        .unwrap();
        assert_eq!(400, response.code);
        assert_eq!(Some("Request missing required field"), response.error.as_deref());
        assert_eq!(None, response.server_upload_time());
    }

    #[test]
    fn response_keeps_out_of_range_code() {
        let response: LogEventResponse =
            serde_json::from_str(r#"{"code":70000,"error":"throttled"}"#).unwrap();
        assert_eq!(70000, response.code);
        assert_eq!(Some("throttled"), response.error.as_deref());
    }
}
