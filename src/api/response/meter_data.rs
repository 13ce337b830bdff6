use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct BatteryEnergy {
    pub charge: f64,
    pub discharge: f64,
}

#[derive(Debug, Deserialize)]
pub struct GridEnergy {
    pub import: f64,
    pub export: f64,
}

/* All values in kWh */
#[derive(Debug, Deserialize)]
pub struct Period {
    pub battery: BatteryEnergy,
    pub grid: GridEnergy,
    pub solar: f64,
    pub consumption: f64,
}

#[derive(Debug, Deserialize)]
pub struct Data {
    #[serde(default)]
    pub time: Option<String>,
    pub today: Period,
    /* lifetime totals, decoded but never rendered */
    #[serde(default)]
    pub total: Option<Period>,
}

/* GET /inverter/{serial}/meter-data/latest */
#[derive(Debug, Deserialize)]
pub struct MeterData {
    pub data: Data,
}
