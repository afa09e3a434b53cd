//! Static configuration and per-save scenario settings

use crate::Result;
use cfg_node::{CfgError, CfgNode};
use comm_model::{Color, Constellation, Frequency};
use ground_stations::{StationRecord, DEFAULT_REFERENCE_STATION};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;
use tracing::{error, info};

/// Frequency every participant starts on.
pub const PUBLIC_FREQUENCY: Frequency = Frequency(0);

/// Defaults used whenever a save carries no (or malformed) constellation or
/// ground-station data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub constellations: Vec<Constellation>,
    pub ground_stations: Vec<StationRecord>,
    /// Built-in station cloned for stations that only exist in the save
    pub reference_station: String,
    pub legacy_orbit_line_color: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            constellations: vec![
                Constellation::on_frequency(0, "Public", Color::WHITE, PUBLIC_FREQUENCY),
                Constellation::on_frequency(1, "Constellation 1", Color::rgb(0xFF, 0x66, 0x00), Frequency(1)),
                Constellation::on_frequency(2, "Constellation 2", Color::rgb(0x00, 0x99, 0xFF), Frequency(2)),
            ],
            ground_stations: Vec::new(),
            reference_station: DEFAULT_REFERENCE_STATION.to_string(),
            legacy_orbit_line_color: false,
        }
    }
}

impl Settings {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading settings from {:?}", path);

        let file = File::open(path)?;
        let settings: Settings = serde_json::from_reader(BufReader::new(file))?;

        info!(
            "Loaded {} default constellations and {} default ground stations",
            settings.constellations.len(),
            settings.ground_stations.len()
        );
        Ok(settings)
    }
}

/// Map-view display mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayMode {
    None,
    FirstHop,
    #[default]
    Path,
    VesselLinks,
    Network,
    MultiPath,
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl FromStr for DisplayMode {
    type Err = CfgError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "None" | "Disabled" => Ok(DisplayMode::None),
            "FirstHop" => Ok(DisplayMode::FirstHop),
            "Path" => Ok(DisplayMode::Path),
            "VesselLinks" => Ok(DisplayMode::VesselLinks),
            "Network" => Ok(DisplayMode::Network),
            "MultiPath" => Ok(DisplayMode::MultiPath),
            other => Err(CfgError::InvalidValue {
                key: "DisplayMode".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

pub const DISPLAY_MODE_TRACKING: &str = "DisplayModeTracking";
pub const DISPLAY_MODE_FLIGHT: &str = "DisplayModeFlight";
pub const HIDE_GROUND_STATIONS: &str = "HideGroundStations";
pub const LEGACY_ORBIT_LINE_COLOR: &str = "LegacyOrbitLineColor";

/// Scalar settings stored at the top of the scenario section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScenarioSettings {
    pub display_mode_tracking: DisplayMode,
    pub display_mode_flight: DisplayMode,
    pub hide_ground_stations: bool,
    pub legacy_orbit_line_color: bool,
}

impl ScenarioSettings {
    /// Read the scalars present in `node`. Fields without a value keep
    /// their current setting, as do malformed ones (logged).
    pub fn read_from(&mut self, node: &CfgNode) {
        apply(&mut self.display_mode_tracking, DISPLAY_MODE_TRACKING, node.get_parsed(DISPLAY_MODE_TRACKING));
        apply(&mut self.display_mode_flight, DISPLAY_MODE_FLIGHT, node.get_parsed(DISPLAY_MODE_FLIGHT));
        apply(&mut self.hide_ground_stations, HIDE_GROUND_STATIONS, node.get_bool(HIDE_GROUND_STATIONS));
        apply(&mut self.legacy_orbit_line_color, LEGACY_ORBIT_LINE_COLOR, node.get_bool(LEGACY_ORBIT_LINE_COLOR));
    }

    pub fn write_to(&self, node: &mut CfgNode) {
        node.set_value(DISPLAY_MODE_TRACKING, self.display_mode_tracking);
        node.set_value(DISPLAY_MODE_FLIGHT, self.display_mode_flight);
        node.set_bool(HIDE_GROUND_STATIONS, self.hide_ground_stations);
        node.set_bool(LEGACY_ORBIT_LINE_COLOR, self.legacy_orbit_line_color);
    }
}

fn apply<T>(slot: &mut T, key: &str, parsed: std::result::Result<Option<T>, CfgError>) {
    match parsed {
        Ok(Some(value)) => *slot = value,
        Ok(None) => {}
        Err(e) => error!("Scenario setting '{}' ignored, keeping the default: {}", key, e),
    }
}
