//! Wall-clock time for the "Updated:" label.

use crate::api::{self, Error};
use chrono::{DateTime, Local, NaiveDateTime};
use std::time::Duration;

pub const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M";

#[allow(async_fn_in_trait)]
pub trait Clock {
    async fn now(&self) -> Result<NaiveDateTime, Error>;
}

/// Host local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    async fn now(&self) -> Result<NaiveDateTime, Error> {
        Ok(Local::now().naive_local())
    }
}

/// Local time of a named zone, read from the world-time API. Useful on devices
/// without a battery-backed clock.
#[derive(Debug, Clone)]
pub struct WorldTimeClock {
    client: reqwest::Client,
    time_api_url: String,
    timezone: String,
    timeout: Duration,
}

impl WorldTimeClock {
    pub fn new(
        time_api_url: impl Into<String>,
        timezone: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            time_api_url: time_api_url.into(),
            timezone: timezone.into(),
            timeout,
        }
    }
}

impl Clock for WorldTimeClock {
    async fn now(&self) -> Result<NaiveDateTime, Error> {
        let time =
            api::world_time(&self.client, &self.time_api_url, &self.timezone, self.timeout)
                .await?;

        DateTime::from_timestamp(time.local_timestamp(), 0)
            .map(|dt| dt.naive_utc())
            .ok_or_else(|| Error::Schema(format!("unixtime out of range: {}", time.unixtime)))
    }
}

/// The clock chosen by configuration.
#[derive(Debug, Clone)]
pub enum TimeSource {
    System(SystemClock),
    WorldTime(WorldTimeClock),
}

impl Clock for TimeSource {
    async fn now(&self) -> Result<NaiveDateTime, Error> {
        match self {
            TimeSource::System(clock) => clock.now().await,
            TimeSource::WorldTime(clock) => clock.now().await,
        }
    }
}

pub fn format_timestamp(time: &NaiveDateTime) -> String {
    time.format(TIMESTAMP_FORMAT).to_string()
}
