//! Fetch, extract, render and wait, either in a loop or once per process with
//! a wake alarm armed for the next start.

use crate::api::{Error, Fetch};
use crate::clock::{format_timestamp, Clock};
use crate::metrics;
use crate::model::{Credentials, DerivedMetrics, KWh, Snapshots};
use crate::render::panel::Panel;
use crate::render::{self, Layout};
use chrono::Local;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Keep the process alive, sleeping between cycles.
    Loop,
    /// Run one cycle, arm the wake alarm and let the process end.
    DeepSleep,
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "loop" => Ok(Mode::Loop),
            "deep-sleep" | "deep_sleep" | "deepsleep" => Ok(Mode::DeepSleep),
            _ => Err(Error::Config(format!("Unknown mode: {}", s))),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Loop => write!(f, "loop"),
            Mode::DeepSleep => write!(f, "deep-sleep"),
        }
    }
}

/// Brings the network link up. Called at the start of every cycle.
#[allow(async_fn_in_trait)]
pub trait Network {
    async fn connect(&mut self) -> Result<(), Error>;
}

/// Schedules the next process start. Arming again replaces the previous alarm.
pub trait WakeAlarm {
    fn arm(&mut self, after: Duration) -> Result<(), Error>;
}

/// On a host the OS owns the link; this only checks that the API host resolves.
/// The network password is never used to join anything here.
pub struct HostNetwork {
    ssid: String,
    secured: bool,
    host: String,
    port: u16,
}

impl HostNetwork {
    pub fn new(credentials: &Credentials, api_url: &str) -> Result<Self, Error> {
        let url = reqwest::Url::parse(api_url)
            .map_err(|e| Error::Config(format!("Invalid api_url {}: {}", api_url, e)))?;
        let host = url
            .host_str()
            .ok_or_else(|| Error::Config(format!("api_url has no host: {}", api_url)))?
            .to_string();

        Ok(Self {
            ssid: credentials.ssid.clone(),
            secured: !credentials.password.is_empty(),
            host,
            port: url.port_or_known_default().unwrap_or(443),
        })
    }
}

impl Network for HostNetwork {
    async fn connect(&mut self) -> Result<(), Error> {
        log::info!(
            "Connecting to {} ({})...",
            self.ssid,
            if self.secured { "secured" } else { "open" }
        );
        tokio::net::lookup_host((self.host.as_str(), self.port))
            .await
            .map_err(|e| Error::Transport(format!("Unable to resolve {}: {}", self.host, e)))?
            .next()
            .ok_or_else(|| Error::Transport(format!("No address for {}", self.host)))?;
        log::info!("Connected to {}", self.ssid);
        Ok(())
    }
}

/// Logs the wake time and, when configured, records it in `wake_file` for an
/// external supervisor (systemd timer, cron) to act on.
#[derive(Debug, Default)]
pub struct HostAlarm {
    wake_file: Option<PathBuf>,
}

impl HostAlarm {
    pub fn new(wake_file: Option<PathBuf>) -> Self {
        Self { wake_file }
    }
}

impl WakeAlarm for HostAlarm {
    fn arm(&mut self, after: Duration) -> Result<(), Error> {
        let delta = chrono::Duration::from_std(after)
            .map_err(|e| Error::Alarm(format!("Wake interval out of range: {}", e)))?;
        let wake_at = Local::now() + delta;

        log::info!("Wake alarm armed for {}", wake_at.to_rfc3339());
        if let Some(path) = &self.wake_file {
            fs::write(path, wake_at.to_rfc3339()).map_err(|e| {
                Error::Alarm(format!("Unable to write {}: {}", path.display(), e))
            })?;
        }
        Ok(())
    }
}

/// Human-readable interval for log lines only.
pub fn describe_interval(seconds: u64) -> String {
    let (value, unit) = if seconds < 60 {
        (seconds, "seconds")
    } else if seconds < 3600 {
        (seconds / 60, "minutes")
    } else if seconds < 86400 {
        (seconds / 3600, "hours")
    } else {
        (seconds / 86400, "days")
    };

    if value == 1 {
        format!("{} {}", value, unit.trim_end_matches('s'))
    } else {
        format!("{} {}", value, unit)
    }
}

#[derive(Debug, Clone)]
pub struct CycleSettings {
    pub interval: Duration,
    pub connect_retry: Duration,
    pub fetch_retry: Duration,
    pub battery_capacity: KWh,
    pub layout: Layout,
}

pub struct Scheduler<N, F, P, C> {
    network: N,
    fetcher: F,
    panel: P,
    clock: C,
    settings: CycleSettings,
}

impl<N, F, P, C> Scheduler<N, F, P, C>
where
    N: Network,
    F: Fetch,
    P: Panel,
    C: Clock,
{
    pub fn new(network: N, fetcher: F, panel: P, clock: C, settings: CycleSettings) -> Self {
        Self {
            network,
            fetcher,
            panel,
            clock,
            settings,
        }
    }

    async fn connect_with_retry(&mut self) {
        while let Err(e) = self.network.connect().await {
            log::warn!(
                "Connection error: {}; retrying in {}",
                e,
                describe_interval(self.settings.connect_retry.as_secs())
            );
            sleep(self.settings.connect_retry).await;
        }
    }

    /// A clock failure only costs accuracy of the label.
    async fn timestamp(&self) -> String {
        match self.clock.now().await {
            Ok(time) => format_timestamp(&time),
            Err(e) => {
                log::warn!("Unable to read clock, using system time: {}", e);
                format_timestamp(&Local::now().naive_local())
            }
        }
    }

    async fn render(&mut self, snapshots: Snapshots) -> Result<DerivedMetrics, Error> {
        let metrics = metrics::extract(
            &snapshots.system,
            &snapshots.meter,
            self.settings.battery_capacity,
        )?;
        metrics::log_metrics(&metrics);

        let timestamp = self.timestamp().await;
        let frame = render::compose(&metrics, self.settings.layout, &timestamp);
        self.panel.show(&frame)?;

        Ok(metrics)
    }

    /// One loop-mode cycle. Connection and fetch failures are retried after
    /// their backoff until a frame is drawn; schema and display failures end
    /// the cycle with an error.
    pub async fn run_cycle(&mut self) -> Result<DerivedMetrics, Error> {
        loop {
            self.connect_with_retry().await;

            match self.fetcher.fetch().await {
                Ok(snapshots) => return self.render(snapshots).await,
                Err(e) if e.is_retryable() => {
                    log::warn!(
                        "Failed to get data: {}; retrying in {}",
                        e,
                        describe_interval(self.settings.fetch_retry.as_secs())
                    );
                    sleep(self.settings.fetch_retry).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Loop mode. Never returns.
    pub async fn run_forever(&mut self) {
        let next_update = describe_interval(self.settings.interval.as_secs());
        loop {
            match self.run_cycle().await {
                Ok(_) => log::info!("Next update in {}", next_update),
                Err(e) => log::error!("Cycle abandoned: {}; next attempt in {}", e, next_update),
            }
            sleep(self.settings.interval).await;
        }
    }

    /// Deep-sleep mode: a single attempt with no in-process retry.
    ///
    /// A short fallback alarm is armed before anything can fail, so a failed
    /// cycle still wakes the device after `fetch_retry` instead of stranding it.
    /// On success the alarm is re-armed for the full interval.
    pub async fn run_once<A: WakeAlarm>(mut self, alarm: &mut A) -> Result<DerivedMetrics, Error> {
        alarm.arm(self.settings.fetch_retry)?;

        self.network.connect().await?;
        let snapshots = self.fetcher.fetch().await?;
        let metrics = self.render(snapshots).await?;

        alarm.arm(self.settings.interval)?;
        log::info!(
            "Next update in {}",
            describe_interval(self.settings.interval.as_secs())
        );
        Ok(metrics)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::{MeterSnapshot, SystemSnapshot};
    use crate::render::Frame;
    use chrono::{NaiveDate, NaiveDateTime};
    use serde_json::json;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use tokio::time::Instant;

    #[derive(Default)]
    struct FakeNetwork {
        failures: usize,
        attempts: usize,
    }

    impl Network for FakeNetwork {
        async fn connect(&mut self) -> Result<(), Error> {
            self.attempts += 1;
            if self.attempts <= self.failures {
                Err(Error::Transport("no address".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[derive(Default)]
    struct FakeFetcher {
        results: RefCell<VecDeque<Result<Snapshots, Error>>>,
        calls: Cell<usize>,
    }

    impl FakeFetcher {
        fn with(results: Vec<Result<Snapshots, Error>>) -> Self {
            Self {
                results: RefCell::new(results.into()),
                calls: Cell::new(0),
            }
        }
    }

    impl Fetch for FakeFetcher {
        async fn fetch(&self) -> Result<Snapshots, Error> {
            self.calls.set(self.calls.get() + 1);
            self.results
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Ok(snapshots(76)))
        }
    }

    #[derive(Default)]
    struct FakePanel {
        frames: Vec<Frame>,
    }

    impl Panel for FakePanel {
        fn show(&mut self, frame: &Frame) -> Result<(), Error> {
            self.frames.push(frame.clone());
            Ok(())
        }
    }

    struct FixedClock;

    impl Clock for FixedClock {
        async fn now(&self) -> Result<NaiveDateTime, Error> {
            Ok(NaiveDate::from_ymd_opt(2023, 5, 29)
                .unwrap()
                .and_hms_opt(19, 10, 0)
                .unwrap())
        }
    }

    struct BrokenClock;

    impl Clock for BrokenClock {
        async fn now(&self) -> Result<NaiveDateTime, Error> {
            Err(Error::Transport("time server unreachable".to_string()))
        }
    }

    #[derive(Default)]
    struct FakeAlarm {
        armed: Vec<Duration>,
    }

    impl WakeAlarm for FakeAlarm {
        fn arm(&mut self, after: Duration) -> Result<(), Error> {
            self.armed.push(after);
            Ok(())
        }
    }

    fn snapshots(percent: i64) -> Snapshots {
        Snapshots {
            system: SystemSnapshot(json!({
                "data": {"battery": {"percent": percent}, "solar": {"power": 3200}, "consumption": 420}
            })),
            meter: MeterSnapshot(json!({
                "data": {"today": {
                    "battery": {"charge": 4.2, "discharge": 2.1},
                    "grid": {"import": 0.3, "export": 1.8},
                    "solar": 9.0,
                    "consumption": 7.4
                }}
            })),
        }
    }

    fn without_percent() -> Snapshots {
        let mut snapshots = snapshots(76);
        snapshots.system = SystemSnapshot(json!({
            "data": {"battery": {"temperature": 20}, "solar": {"power": 3200}, "consumption": 420}
        }));
        snapshots
    }

    /* the paused clock advances to timer deadlines at millisecond granularity */
    fn assert_elapsed(start: Instant, seconds: u64) {
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(seconds), "{:?}", elapsed);
        assert!(elapsed < Duration::from_secs(seconds + 1), "{:?}", elapsed);
    }

    fn settings() -> CycleSettings {
        CycleSettings {
            interval: Duration::from_secs(300),
            connect_retry: Duration::from_secs(10),
            fetch_retry: Duration::from_secs(60),
            battery_capacity: 7.7,
            layout: Layout::Detailed,
        }
    }

    fn scheduler(
        network: FakeNetwork,
        fetcher: FakeFetcher,
    ) -> Scheduler<FakeNetwork, FakeFetcher, FakePanel, FixedClock> {
        Scheduler::new(network, fetcher, FakePanel::default(), FixedClock, settings())
    }

    #[test]
    fn interval_units() {
        assert_eq!("30 seconds", describe_interval(30));
        assert_eq!("1 minute", describe_interval(60));
        assert_eq!("5 minutes", describe_interval(300));
        assert_eq!("10 minutes", describe_interval(600));
        assert_eq!("1 hour", describe_interval(3600));
        assert_eq!("23 hours", describe_interval(86399));
        assert_eq!("2 days", describe_interval(2 * 86400));
    }

    #[test]
    fn mode_from_str() {
        assert_eq!(Mode::Loop, "loop".parse().unwrap());
        assert_eq!(Mode::DeepSleep, "deep-sleep".parse().unwrap());
        assert_eq!(Mode::DeepSleep, "deep_sleep".parse().unwrap());
        assert!("hibernate".parse::<Mode>().is_err());
    }

    fn credentials(password: &str) -> Credentials {
        Credentials {
            ssid: "home".to_string(),
            password: password.to_string(),
            api_key: "secret-token".to_string(),
            inverter_serial: "CE2029G093".to_string(),
        }
    }

    #[test]
    fn host_network_from_api_url() {
        let network =
            HostNetwork::new(&credentials("hunter2"), "https://api.givenergy.cloud/v1").unwrap();
        assert_eq!("home", network.ssid);
        assert!(network.secured);
        assert_eq!("api.givenergy.cloud", network.host);
        assert_eq!(443, network.port);

        let open = HostNetwork::new(&credentials(""), "http://localhost:8080/v1").unwrap();
        assert!(!open.secured);
        assert_eq!(8080, open.port);

        assert!(HostNetwork::new(&credentials(""), "not a url").is_err());
    }

    #[test]
    fn host_alarm_write_failure_is_alarm_error() {
        let mut alarm = HostAlarm::new(Some(PathBuf::from("/nonexistent-directory/wake")));
        assert!(matches!(
            alarm.arm(Duration::from_secs(300)),
            Err(Error::Alarm(_))
        ));
    }

    #[test]
    fn host_alarm_writes_wake_file() {
        let path = std::env::temp_dir().join(format!("givenergy-display-{}.wake", std::process::id()));
        let mut alarm = HostAlarm::new(Some(path.clone()));
        alarm.arm(Duration::from_secs(300)).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        fs::remove_file(&path).ok();
        assert!(chrono::DateTime::parse_from_rfc3339(&written).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn cycle_renders_one_frame() {
        let mut scheduler = scheduler(FakeNetwork::default(), FakeFetcher::default());

        let metrics = scheduler.run_cycle().await.unwrap();
        assert_eq!(76, metrics.state_of_charge);
        assert_eq!(5.9, metrics.battery_remaining);
        assert_eq!(1, scheduler.panel.frames.len());
        assert!(scheduler.panel.frames[0]
            .labels()
            .any(|l| l.text == "Updated: 29/05/2023 19:10"));
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_timeout_retries_after_backoff() {
        let fetcher = FakeFetcher::with(vec![
            Err(Error::Transport("operation timed out".to_string())),
            Ok(snapshots(76)),
        ]);
        let mut scheduler = scheduler(FakeNetwork::default(), fetcher);

        let start = Instant::now();
        scheduler.run_cycle().await.unwrap();

        assert_eq!(2, scheduler.fetcher.calls.get());
        /* the failed fetch sends the cycle back through connect */
        assert_eq!(2, scheduler.network.attempts);
        assert_elapsed(start, 60);
        assert_eq!(1, scheduler.panel.frames.len());
    }

    #[tokio::test(start_paused = true)]
    async fn protocol_error_is_retried() {
        let fetcher = FakeFetcher::with(vec![
            Err(Error::Protocol("expected value at line 1 column 1".to_string())),
            Err(Error::Protocol("HTTP status server error (502 Bad Gateway)".to_string())),
        ]);
        let mut scheduler = scheduler(FakeNetwork::default(), fetcher);

        let start = Instant::now();
        scheduler.run_cycle().await.unwrap();
        assert_eq!(3, scheduler.fetcher.calls.get());
        assert_elapsed(start, 120);
    }

    #[tokio::test(start_paused = true)]
    async fn connection_retries_after_backoff() {
        let network = FakeNetwork {
            failures: 2,
            ..Default::default()
        };
        let mut scheduler = scheduler(network, FakeFetcher::default());

        let start = Instant::now();
        scheduler.run_cycle().await.unwrap();

        assert_eq!(3, scheduler.network.attempts);
        assert_eq!(1, scheduler.fetcher.calls.get());
        assert_elapsed(start, 20);
    }

    #[tokio::test(start_paused = true)]
    async fn schema_error_never_reaches_the_panel() {
        let fetcher = FakeFetcher::with(vec![Ok(without_percent())]);
        let mut scheduler = scheduler(FakeNetwork::default(), fetcher);

        match scheduler.run_cycle().await {
            Err(Error::Schema(_)) => {}
            other => panic!("expected schema error, got {:?}", other),
        }
        assert_eq!(1, scheduler.fetcher.calls.get());
        assert!(scheduler.panel.frames.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn clock_failure_falls_back_to_system_time() {
        let mut scheduler = Scheduler::new(
            FakeNetwork::default(),
            FakeFetcher::default(),
            FakePanel::default(),
            BrokenClock,
            settings(),
        );

        scheduler.run_cycle().await.unwrap();
        assert!(scheduler.panel.frames[0]
            .labels()
            .any(|l| l.text.starts_with("Updated: ")));
    }

    #[tokio::test(start_paused = true)]
    async fn loop_keeps_going_after_a_bad_cycle() {
        let fetcher = FakeFetcher::with(vec![
            Ok(snapshots(76)),
            Ok(without_percent()),
            Ok(snapshots(80)),
        ]);
        let mut scheduler = scheduler(FakeNetwork::default(), fetcher);

        /* cycles start at 0s, 300s and 600s */
        let result =
            tokio::time::timeout(Duration::from_secs(650), scheduler.run_forever()).await;
        assert!(result.is_err());
        assert_eq!(3, scheduler.fetcher.calls.get());
        assert_eq!(2, scheduler.panel.frames.len());
        assert!(scheduler.panel.frames[1].labels().any(|l| l.text == "SoC:80%"));
    }

    #[tokio::test(start_paused = true)]
    async fn deep_sleep_arms_fallback_then_interval() {
        let scheduler = scheduler(FakeNetwork::default(), FakeFetcher::default());
        let mut alarm = FakeAlarm::default();

        let metrics = scheduler.run_once(&mut alarm).await.unwrap();
        assert_eq!(76, metrics.state_of_charge);
        assert_eq!(
            vec![Duration::from_secs(60), Duration::from_secs(300)],
            alarm.armed
        );
    }

    #[tokio::test(start_paused = true)]
    async fn deep_sleep_failure_propagates_with_fallback_armed() {
        let fetcher = FakeFetcher::with(vec![Err(Error::Transport(
            "operation timed out".to_string(),
        ))]);
        let scheduler = scheduler(FakeNetwork::default(), fetcher);
        let mut alarm = FakeAlarm::default();

        let start = Instant::now();
        let result = scheduler.run_once(&mut alarm).await;
        assert!(matches!(result, Err(Error::Transport(_))));
        assert_eq!(vec![Duration::from_secs(60)], alarm.armed);
        /* no in-process retry */
        assert_eq!(Duration::ZERO, start.elapsed());
    }

    #[tokio::test(start_paused = true)]
    async fn deep_sleep_connect_failure_is_not_retried() {
        let network = FakeNetwork {
            failures: 1,
            ..Default::default()
        };
        let scheduler = scheduler(network, FakeFetcher::default());
        let mut alarm = FakeAlarm::default();

        assert!(scheduler.run_once(&mut alarm).await.is_err());
        assert_eq!(vec![Duration::from_secs(60)], alarm.armed);
    }
}
