pub type Endpoint = str;

pub const SYSTEM_DATA: &Endpoint = "/system-data/latest";
pub const METER_DATA: &Endpoint = "/meter-data/latest";

/// `{api_url}/inverter/{serial}{endpoint}`
pub fn inverter_url(api_url: &str, inverter_serial: &str, endpoint: &Endpoint) -> String {
    format!(
        "{}/inverter/{}{}",
        api_url.trim_end_matches('/'),
        inverter_serial,
        endpoint
    )
}

/// `{time_api_url}/{timezone}`
pub fn world_time_url(time_api_url: &str, timezone: &str) -> String {
    format!("{}/{}", time_api_url.trim_end_matches('/'), timezone)
}
