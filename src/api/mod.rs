pub mod endpoint;
pub mod error;
pub mod response;

use crate::model;
pub use error::Error;
use http::header::{ACCEPT, CONNECTION};
use reqwest::RequestBuilder;
use response::WorldTime;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

pub const API_URL: &str = "https://api.givenergy.cloud/v1";
pub const TIME_API_URL: &str = "https://worldtimeapi.org/api/timezone";

/* The API ignores this on GET, but every request the inverter app sends carries it */
const SETTING_ID: u32 = 17;

#[derive(Debug, Serialize)]
struct RequestBody<'a> {
    inverter_serials: [&'a str; 1],
    setting_id: u32,
}

/// Source of one fresh pair of snapshots per cycle.
#[allow(async_fn_in_trait)]
pub trait Fetch {
    async fn fetch(&self) -> Result<model::Snapshots, Error>;
}

pub fn api(
    api_url: String,
    credentials: &model::Credentials,
    timeout: Duration,
) -> Result<model::Api, Error> {
    let client = reqwest::ClientBuilder::new()
        .build()
        .map_err(|e| Error::Config(format!("Unable to build HTTP client: {}", e)))?;

    Ok(model::Api {
        api_url,
        api_key: credentials.api_key.to_owned(),
        inverter_serial: credentials.inverter_serial.to_owned(),
        timeout,
        client,
    })
}

/// Map reqwest failures to Error. Anything carrying an HTTP status is a protocol
/// failure, the rest never got a response.
fn map_api_err(error: reqwest::Error) -> Error {
    match error.status() {
        Some(http::StatusCode::TOO_MANY_REQUESTS) => {
            Error::Protocol(format!("Rate limit exceeded: {}", error))
        }
        Some(http::StatusCode::UNAUTHORIZED) => {
            Error::Protocol(format!("API key rejected: {}", error))
        }
        Some(_) => Error::Protocol(error.to_string()),
        None => Error::Transport(error.to_string()),
    }
}

/// Send `request` and decode the body as JSON. The response is consumed by
/// `text()` on success and dropped on every error path, so its connection is
/// always released before this returns.
async fn get_json(request: RequestBuilder) -> Result<Value, Error> {
    let response_text = request
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(map_api_err)?
        .text()
        .await
        .map_err(|e| Error::Transport(format!("Error reading API response: {}", e)))?;

    log::trace!("response_text: {}", response_text);

    serde_json::from_str::<Value>(&response_text)
        .map_err(|e| Error::Protocol(format!("{} in response: {}", e, response_text)))
}

async fn get(api: &model::Api, endpoint: &endpoint::Endpoint) -> Result<Value, Error> {
    let url = endpoint::inverter_url(&api.api_url, &api.inverter_serial, endpoint);
    let request_body = RequestBody {
        inverter_serials: [&api.inverter_serial],
        setting_id: SETTING_ID,
    };

    log::info!("API URL: {}", url);

    let request = api
        .client
        .get(url)
        .bearer_auth(&api.api_key)
        .header(ACCEPT, "application/json")
        .header(CONNECTION, "close")
        .json(&request_body)
        .timeout(api.timeout);

    get_json(request).await
}

impl Fetch for model::Api {
    /// Sequential: meter data is requested only after the system data response
    /// has been read in full.
    async fn fetch(&self) -> Result<model::Snapshots, Error> {
        log::info!("Making connection request for System Data...");
        let system = get(self, endpoint::SYSTEM_DATA)
            .await
            .map(model::SystemSnapshot)?;

        log::info!("Making connection request for Meter Data...");
        let meter = get(self, endpoint::METER_DATA)
            .await
            .map(model::MeterSnapshot)?;

        Ok(model::Snapshots { system, meter })
    }
}

/// Read the current wall-clock time of `timezone` from the world-time API.
pub async fn world_time(
    client: &reqwest::Client,
    time_api_url: &str,
    timezone: &str,
    timeout: Duration,
) -> Result<WorldTime, Error> {
    let url = endpoint::world_time_url(time_api_url, timezone);
    log::debug!("Getting time from: {}", url);

    let value = get_json(client.get(url).timeout(timeout)).await?;
    serde_json::from_value::<WorldTime>(value).map_err(|e| Error::Schema(e.to_string()))
}
