use serde_json::Value;
use std::time::Duration;

pub type KWh = f64;

/// Everything needed to reach the network and the API. Immutable for the
/// process lifetime.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub ssid: String,
    /// Empty for an open network.
    pub password: String,
    pub api_key: String,
    pub inverter_serial: String,
}

#[derive(Debug, Clone)]
pub struct Api {
    pub api_url: String,
    pub api_key: String,
    pub inverter_serial: String,
    pub timeout: Duration,
    pub client: reqwest::Client,
}

/// Decoded body of `system-data/latest`.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemSnapshot(pub Value);

/// Decoded body of `meter-data/latest`.
#[derive(Debug, Clone, PartialEq)]
pub struct MeterSnapshot(pub Value);

/// One fresh pair per cycle, never cached.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshots {
    pub system: SystemSnapshot,
    pub meter: MeterSnapshot,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DerivedMetrics {
    /// Passed through unchecked, may fall outside 0..=100.
    pub state_of_charge: i64,
    pub battery_remaining: KWh,
    pub generation_today: KWh,
    pub consumption_today: KWh,
    pub charge_today: KWh,
    pub discharge_today: KWh,
    pub throughput_today: KWh,
    pub export_today: KWh,
    pub import_today: KWh,
    pub solar_production_today: KWh,
    pub solar_consumption_today: KWh,
}
