use crate::{client::ResponseTarget, Client, Context, Error, HttpClient, Properties};
use bytes::Bytes;
use http::Response;
use serde::{Deserialize, Serialize};

const IDENTIFY_PATH: &str = "/identify";
const IDENTIFICATION_FIELD: &str = "identification";

/// User or device properties to upsert without sending an event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Identification {
    /// Identifier of the user. Required unless `device_id` is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Identifier of the device. Required unless `user_id` is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    /// Properties to set on the user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_properties: Option<Properties>,
    /// Groups the user belongs to, keyed by group type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<Properties>,
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
    /// Whether the user is paying, sent as a string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paying: Option<String>,
    /// Version of the app the user first used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_version: Option<String>,
}

/// Identifications to send with a `POST /identify` request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdentifyRequest {
    /// Records to upsert.
    pub identifications: Vec<Identification>,
}

impl IdentifyRequest {
    /// Wrap the identifications in a request.
    pub fn new(identifications: Vec<Identification>) -> Self {
        Self { identifications }
    }

    /// The form fields of the request, without the API key.
    ///
    /// All identifications go into a single `identification` field as a JSON array.
    pub fn to_form_values(&self) -> Result<Vec<(&'static str, String)>, Error> {
        let identification =
            serde_json::to_string(&self.identifications).map_err(Error::SerializeRequest)?;
        Ok(vec![(IDENTIFICATION_FIELD, identification)])
    }
}

impl From<Vec<Identification>> for IdentifyRequest {
    fn from(identifications: Vec<Identification>) -> Self {
        Self::new(identifications)
    }
}

impl<C: HttpClient> Client<C> {
    /// Upsert user properties through the form-encoded API.
    ///
    /// The response body is not decoded. A rejected request is not an error: inspect the status
    /// code of the response.
    pub async fn identify(
        &self,
        ctx: &Context,
        request: &IdentifyRequest,
    ) -> Result<Response<Bytes>, Error> {
        let form = request.to_form_values()?;
        let http_request = self.new_v1_request(IDENTIFY_PATH, form)?;
        self.execute::<()>(ctx, http_request, ResponseTarget::Discard)
            .await
    }
}
