use serde::Deserialize;

/* GET {time_api_url}/{timezone} */
#[derive(Debug, Deserialize)]
pub struct WorldTime {
    #[serde(default)]
    pub timezone: Option<String>,
    pub unixtime: i64,
    #[serde(default)]
    pub raw_offset: i64,
    #[serde(default)]
    pub dst_offset: i64,
}

impl WorldTime {
    /// Seconds since the epoch shifted into the zone's wall-clock time.
    pub fn local_timestamp(&self) -> i64 {
        self.unixtime + self.raw_offset + self.dst_offset
    }
}
