pub mod meter_data;
pub mod system_data;
pub mod world_time;

pub use meter_data::MeterData;
pub use system_data::SystemData;
pub use world_time::WorldTime;
