use crate::api::{self, Error};
use crate::model::Credentials;
use crate::render::Layout;
use crate::scheduler::{CycleSettings, Mode};
use config::{Config, Environment, File, FileFormat};
use std::path::PathBuf;
use std::time::Duration;

/// Base name of the optional settings file; any extension `config` knows works.
pub const SETTINGS_FILE: &str = "givenergy-display";
pub const ENV_PREFIX: &str = "GE";

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Settings {
    pub api_url: String,
    pub api_key: String,
    pub inverter_serial: String,
    pub ssid: String,
    pub password: String,
    pub interval: u64,
    pub timeout: u64,
    pub connect_retry: u64,
    pub fetch_retry: u64,
    pub battery_capacity: f64,
    pub mode: String,
    pub layout: String,
    pub output: String,
    #[serde(default)]
    pub wake_file: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    pub time_api_url: String,
}

fn defaults() -> Result<Config, Error> {
    let mut settings = Config::default();
    settings
        .set_default("api_url", api::API_URL)?
        .set_default("password", "")?
        .set_default("interval", 300i64)?
        .set_default("timeout", 5i64)?
        .set_default("connect_retry", 10i64)?
        .set_default("fetch_retry", 60i64)?
        .set_default("battery_capacity", 7.7f64)?
        .set_default("mode", "loop")?
        .set_default("layout", "detailed")?
        .set_default("output", "givenergy-display.pgm")?
        .set_default("time_api_url", api::TIME_API_URL)?;
    Ok(settings)
}

/// Defaults, then `givenergy-display.{toml,yaml,json}` if present, then `GE_*`
/// environment variables.
pub fn read_settings() -> Result<Settings, Error> {
    let mut settings = defaults()?;
    settings
        .merge(File::with_name(SETTINGS_FILE).required(false))?
        .merge(Environment::with_prefix(ENV_PREFIX))?;

    Settings::from_config(settings)
}

impl Settings {
    /// Settings from TOML text over the defaults, without file or environment
    /// lookup.
    pub fn from_toml(toml: &str) -> Result<Settings, Error> {
        let mut settings = defaults()?;
        settings.merge(File::from_str(toml, FileFormat::Toml))?;

        Settings::from_config(settings)
    }

    fn from_config(config: Config) -> Result<Settings, Error> {
        let settings: Settings = config.try_into()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), Error> {
        if self.api_key.is_empty() {
            return Err(Error::Config("api_key must not be empty".to_string()));
        }
        if self.inverter_serial.is_empty() {
            return Err(Error::Config("inverter_serial must not be empty".to_string()));
        }
        for (key, seconds) in [
            ("interval", self.interval),
            ("timeout", self.timeout),
            ("connect_retry", self.connect_retry),
            ("fetch_retry", self.fetch_retry),
        ] {
            if seconds == 0 {
                return Err(Error::Config(format!("{} must be positive", key)));
            }
        }
        if !(self.battery_capacity > 0.0) {
            return Err(Error::Config(format!(
                "battery_capacity must be positive, got {}",
                self.battery_capacity
            )));
        }
        self.mode()?;
        self.layout()?;
        Ok(())
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            ssid: self.ssid.clone(),
            password: self.password.clone(),
            api_key: self.api_key.clone(),
            inverter_serial: self.inverter_serial.clone(),
        }
    }

    pub fn mode(&self) -> Result<Mode, Error> {
        self.mode.parse()
    }

    pub fn layout(&self) -> Result<Layout, Error> {
        self.layout.parse()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn wake_file(&self) -> Option<PathBuf> {
        self.wake_file.as_ref().map(PathBuf::from)
    }

    pub fn cycle(&self) -> Result<CycleSettings, Error> {
        Ok(CycleSettings {
            interval: Duration::from_secs(self.interval),
            connect_retry: Duration::from_secs(self.connect_retry),
            fetch_retry: Duration::from_secs(self.fetch_retry),
            battery_capacity: self.battery_capacity,
            layout: self.layout()?,
        })
    }
}
