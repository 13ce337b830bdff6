use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Battery {
    pub percent: i64,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub power: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct Array {
    pub array: u32,
    pub current: f64,
    pub power: f64,
    pub voltage: f64,
}

#[derive(Debug, Deserialize)]
pub struct Solar {
    pub power: f64,
    #[serde(default)]
    pub arrays: Vec<Array>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Grid {
    pub current: Option<f64>,
    pub frequency: Option<f64>,
    pub power: Option<f64>,
    pub voltage: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Inverter {
    pub output_voltage: Option<f64>,
    pub output_frequency: Option<f64>,
    pub power: Option<f64>,
    pub eps_power: Option<f64>,
    pub temperature: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct Data {
    #[serde(default)]
    pub time: Option<String>,
    pub battery: Battery,
    pub solar: Solar,
    #[serde(default)]
    pub grid: Grid,
    #[serde(default)]
    pub inverter: Inverter,
    /* watts */
    pub consumption: f64,
}

/* GET /inverter/{serial}/system-data/latest */
#[derive(Debug, Deserialize)]
pub struct SystemData {
    pub data: Data,
}
