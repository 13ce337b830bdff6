//! Fixed layouts for the 296x128 panel. All coordinates are pixels from the
//! top-left corner; nothing wraps or reflows.

use super::{Block, Frame, Label, BLACK, DARK_GREY, WHITE};
use crate::api::Error;
use crate::model::{DerivedMetrics, KWh};
use std::fmt;
use std::str::FromStr;

/* Battery icon: outline, terminal cap and the fill area inside both the 2px
 * outline stroke and a further 2px margin. */
const BATTERY_X: i32 = 220;
const BATTERY_Y: i32 = 40;
const BATTERY_WIDTH: u32 = 44;
const BATTERY_HEIGHT: u32 = 84;
const BATTERY_STROKE: u32 = 2;
const CAP_X: i32 = 232;
const CAP_Y: i32 = 35;
const CAP_WIDTH: u32 = 15;
const CAP_HEIGHT: u32 = 5;
const GAUGE_X: i32 = BATTERY_X + 2 * BATTERY_STROKE as i32;
const GAUGE_Y: i32 = BATTERY_Y + 2 * BATTERY_STROKE as i32;
pub const GAUGE_WIDTH: u32 = BATTERY_WIDTH - 4 * BATTERY_STROKE;
pub const GAUGE_HEIGHT: u32 = BATTERY_HEIGHT - 4 * BATTERY_STROKE;

const CHAR_WIDTH: i32 = 6;

/// Which set of metrics is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// State of charge and battery throughput in large type.
    Summary,
    /// Headline figures, today's battery and export energy, battery icon.
    Battery,
    /// Every derived metric plus the battery icon.
    Detailed,
}

impl FromStr for Layout {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "summary" => Ok(Layout::Summary),
            "battery" => Ok(Layout::Battery),
            "detailed" => Ok(Layout::Detailed),
            _ => Err(Error::Config(format!("Unknown layout: {}", s))),
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layout::Summary => write!(f, "summary"),
            Layout::Battery => write!(f, "battery"),
            Layout::Detailed => write!(f, "detailed"),
        }
    }
}

/// Height of the gauge fill for `percent` charge.
///
/// Never less than one pixel, so an empty battery still shows a sliver rather
/// than reading as a missing gauge. Never taller than the interior.
pub fn fill_height(interior_height: u32, percent: i64) -> u32 {
    let height = (interior_height as i64).saturating_mul(percent) / 100;
    height.clamp(1, interior_height.max(1) as i64) as u32
}

/// Battery outline, cap and a solid fill rising from the bottom.
pub fn battery_gauge(percent: i64) -> [Block; 3] {
    let charge = fill_height(GAUGE_HEIGHT, percent);

    [
        Block::new(BATTERY_X, BATTERY_Y, BATTERY_WIDTH, BATTERY_HEIGHT)
            .fill(WHITE)
            .stroke(BLACK, BATTERY_STROKE),
        Block::new(CAP_X, CAP_Y, CAP_WIDTH, CAP_HEIGHT)
            .fill(BLACK)
            .stroke(BLACK, BATTERY_STROKE),
        Block::new(
            GAUGE_X,
            GAUGE_Y + (GAUGE_HEIGHT - charge) as i32,
            GAUGE_WIDTH,
            charge,
        )
        .fill(BLACK),
    ]
}

fn kwh(value: KWh) -> String {
    format!("{:.1}kWh", value)
}

/// `name = value` at scale 1, right-aligning names up to `name_width` characters
/// so the `=` signs line up.
fn row(x: i32, y: i32, name_width: usize, name: &str, value: KWh) -> Label {
    let indent = name_width.saturating_sub(name.len()) as i32 * CHAR_WIDTH;
    Label::new(x + indent, y, format!("{} = {}", name, kwh(value)), 1, BLACK)
}

fn updated(x: i32, y: i32, timestamp: &str) -> Label {
    Label::new(x, y, format!("Updated: {}", timestamp), 1, BLACK)
}

/// Status region on the right, split into two panels.
fn status_panels(frame: &mut Frame) {
    frame.push(Block::new(193, 2, 101, 61).fill(WHITE));
    frame.push(Block::new(193, 65, 101, 61).fill(WHITE));
}

fn summary(frame: &mut Frame, metrics: &DerivedMetrics, timestamp: &str) {
    frame.push(Block::new(2, 2, 189, 124).fill(WHITE).stroke(BLACK, 1));
    frame.push(Block::new(193, 2, 101, 61).fill(WHITE).stroke(BLACK, 1));
    frame.push(Block::new(193, 65, 101, 61).fill(WHITE).stroke(BLACK, 1));

    frame.push(Label::new(10, 30, "State of Charge", 2, BLACK));
    frame.push(Label::new(10, 90, "Bat. Throughput", 2, BLACK));
    frame.push(Label::new(
        199,
        30,
        format!("{}%", metrics.state_of_charge),
        2,
        BLACK,
    ));
    frame.push(Label::new(199, 90, kwh(metrics.throughput_today), 2, BLACK));
    frame.push(updated(10, 118, timestamp));
}

fn battery(frame: &mut Frame, metrics: &DerivedMetrics, timestamp: &str) {
    status_panels(frame);

    frame.push(Label::new(
        16,
        10,
        format!("SoC:{}%", metrics.state_of_charge),
        2,
        BLACK,
    ));
    frame.push(Label::new(
        135,
        10,
        format!("TPut:{}", kwh(metrics.throughput_today)),
        2,
        BLACK,
    ));

    frame.push(row(5, 60, 15, "Charge Today", metrics.charge_today));
    frame.push(row(5, 72, 15, "Discharge Today", metrics.discharge_today));
    frame.push(row(5, 84, 15, "Export Today", metrics.export_today));

    for block in battery_gauge(metrics.state_of_charge) {
        frame.push(block);
    }
    frame.push(updated(20, 120, timestamp));
}

fn detailed(frame: &mut Frame, metrics: &DerivedMetrics, timestamp: &str) {
    status_panels(frame);

    frame.push(Label::new(
        4,
        10,
        format!("SoC:{}%", metrics.state_of_charge),
        2,
        BLACK,
    ));
    frame.push(Label::new(
        96,
        10,
        format!("TPut:{}", kwh(metrics.throughput_today)),
        2,
        BLACK,
    ));
    frame.push(Label::new(
        4,
        28,
        format!("{} Remaining", kwh(metrics.battery_remaining)),
        1,
        DARK_GREY,
    ));

    let rows = [
        ("Solar Production", metrics.solar_production_today),
        ("Solar Consumption", metrics.solar_consumption_today),
        ("Charge Today", metrics.charge_today),
        ("Discharge Today", metrics.discharge_today),
        ("Export Today", metrics.export_today),
        ("Import Today", metrics.import_today),
        ("Generation Today", metrics.generation_today),
        ("Consumption Today", metrics.consumption_today),
    ];
    for (i, (name, value)) in rows.iter().enumerate() {
        frame.push(row(4, 40 + 10 * i as i32, 17, name, *value));
    }

    for block in battery_gauge(metrics.state_of_charge) {
        frame.push(block);
    }
    frame.push(updated(4, 122, timestamp));
}

/// Lay out `metrics` as a fresh frame. `timestamp` is printed verbatim after
/// "Updated:".
pub fn compose(metrics: &DerivedMetrics, layout: Layout, timestamp: &str) -> Frame {
    let mut frame = Frame::new(WHITE);
    match layout {
        Layout::Summary => summary(&mut frame, metrics, timestamp),
        Layout::Battery => battery(&mut frame, metrics, timestamp),
        Layout::Detailed => detailed(&mut frame, metrics, timestamp),
    }
    frame
}
