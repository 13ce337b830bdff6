use givenergy_display::clock::{SystemClock, TimeSource, WorldTimeClock};
use givenergy_display::render::panel::PgmPanel;
use givenergy_display::scheduler::{HostAlarm, HostNetwork, Mode, Scheduler};
use givenergy_display::{api, settings, Error};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = settings::read_settings()?;
    let credentials = settings.credentials();
    let mode = settings.mode()?;

    let network = HostNetwork::new(&credentials, &settings.api_url)?;
    let api = api::api(settings.api_url.clone(), &credentials, settings.timeout())?;
    let panel = PgmPanel::new(&settings.output);
    let clock = match &settings.timezone {
        Some(timezone) => TimeSource::WorldTime(WorldTimeClock::new(
            settings.time_api_url.clone(),
            timezone.clone(),
            settings.timeout(),
        )),
        None => TimeSource::System(SystemClock),
    };

    log::info!(
        "Starting in {} mode with the {} layout for inverter {}",
        mode,
        settings.layout,
        credentials.inverter_serial
    );
    let mut scheduler = Scheduler::new(network, api, panel, clock, settings.cycle()?);

    match mode {
        Mode::Loop => {
            scheduler.run_forever().await;
            Ok(())
        }
        Mode::DeepSleep => {
            let mut alarm = HostAlarm::new(settings.wake_file());
            scheduler.run_once(&mut alarm).await.map(|_| ())
        }
    }
}
