use crate::api::response::{MeterData, SystemData};
use crate::api::Error;
use crate::model::{DerivedMetrics, KWh, MeterSnapshot, SystemSnapshot};
use serde::Deserialize;

/// Round half away from zero to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Derive the displayed metrics from one snapshot pair.
///
/// `capacity` is the nominal battery size in kWh. A missing or mistyped field is
/// reported as `Error::Schema` instead of being defaulted, so a broken upstream
/// contract never reaches the panel as a plausible-looking number.
pub fn extract(
    system: &SystemSnapshot,
    meter: &MeterSnapshot,
    capacity: KWh,
) -> Result<DerivedMetrics, Error> {
    let system = SystemData::deserialize(&system.0)
        .map_err(|e| Error::Schema(format!("system-data: {}", e)))?
        .data;
    let meter = MeterData::deserialize(&meter.0)
        .map_err(|e| Error::Schema(format!("meter-data: {}", e)))?
        .data;

    let state_of_charge = system.battery.percent;
    let today = meter.today;

    Ok(DerivedMetrics {
        state_of_charge,
        battery_remaining: round1(state_of_charge as f64 / 100.0 * capacity),
        /* W to kW */
        generation_today: round1(system.solar.power / 1000.0),
        consumption_today: round1(system.consumption / 1000.0),
        charge_today: today.battery.charge,
        discharge_today: today.battery.discharge,
        throughput_today: today.battery.charge + today.battery.discharge,
        export_today: today.grid.export,
        import_today: today.grid.import,
        solar_production_today: today.solar,
        solar_consumption_today: today.consumption,
    })
}

pub fn log_metrics(metrics: &DerivedMetrics) {
    log::info!("State of Charge         = {} %", metrics.state_of_charge);
    log::info!("Battery Remaining       = {:.1} kWh", metrics.battery_remaining);
    log::info!("Generation Today        = {:.1} kWh", metrics.generation_today);
    log::info!("Consumption Today       = {:.1} kWh", metrics.consumption_today);
    log::info!("Battery Charge Today    = {:.1} kWh", metrics.charge_today);
    log::info!("Battery Discharge Today = {:.1} kWh", metrics.discharge_today);
    log::info!("Battery Throughput      = {:.1} kWh", metrics.throughput_today);
    log::info!("Grid Export Today       = {:.1} kWh", metrics.export_today);
    log::info!("Grid Import Today       = {:.1} kWh", metrics.import_today);
    log::info!("Solar Production Today  = {:.1} kWh", metrics.solar_production_today);
    log::info!("Solar Consumption Today = {:.1} kWh", metrics.solar_consumption_today);
}
