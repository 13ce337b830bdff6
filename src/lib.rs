//! Polls a GivEnergy inverter through the cloud API and renders battery, grid
//! and solar figures onto a 296x128 e-paper panel.

pub mod api;
pub mod clock;
pub mod metrics;
pub mod model;
pub mod render;
pub mod scheduler;
pub mod settings;

pub use api::Error;
