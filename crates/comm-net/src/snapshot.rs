//! Scene snapshots
//!
//! JSON description of a host scene: its built-in station templates and its
//! live vessels. Implements both host seams so the session can run outside
//! the simulation (CLI, fixtures).

use crate::vessel::{LiveVessel, VesselSource, VesselType};
use crate::Result;
use comm_model::{CommModule, Frequency, FrequencyList, NodeHandle, VesselId};
use ground_stations::{GeoLocation, GroundStation, TemplateSource};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Participation module with fixed values.
#[derive(Debug, Clone)]
pub struct StaticModule {
    frequencies: FrequencyList,
    power: f64,
    overrides: BTreeMap<Frequency, f64>,
    commandable: bool,
}

impl StaticModule {
    pub fn new(frequencies: impl IntoIterator<Item = Frequency>, power: f64, commandable: bool) -> Self {
        let mut list = FrequencyList::new();
        for f in frequencies {
            list.insert(f);
        }
        Self {
            frequencies: list,
            power,
            overrides: BTreeMap::new(),
            commandable,
        }
    }

    pub fn with_power(mut self, frequency: Frequency, power: f64) -> Self {
        self.overrides.insert(frequency, power);
        self
    }
}

impl CommModule for StaticModule {
    fn frequencies(&self) -> FrequencyList {
        self.frequencies.clone()
    }

    fn max_power(&self, frequency: Frequency) -> f64 {
        if !self.frequencies.contains(frequency) {
            return 0.0;
        }
        self.overrides.get(&frequency).copied().unwrap_or(self.power)
    }

    fn is_commandable(&self) -> bool {
        self.commandable
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StationSpec {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub frequencies: FrequencyList,
    pub relay_power: f64,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    #[serde(default)]
    pub altitude_m: f64,
}

fn default_connected() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct VesselSpec {
    #[serde(default)]
    pub id: VesselId,
    pub name: String,
    pub vessel_type: VesselType,
    #[serde(default = "default_connected")]
    pub connected: bool,
    #[serde(default = "default_connected")]
    pub commandable: bool,
    /// Connected vessel without a participation module, as left behind by a
    /// conflicting network overlay
    #[serde(default)]
    pub module_missing: bool,
    #[serde(default)]
    pub frequencies: FrequencyList,
    #[serde(default)]
    pub max_power: f64,
    #[serde(default)]
    pub power_by_frequency: BTreeMap<Frequency, f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SceneSpec {
    #[serde(default)]
    pub stations: Vec<StationSpec>,
    #[serde(default)]
    pub vessels: Vec<VesselSpec>,
}

#[derive(Debug, Clone, Default)]
pub struct SceneSnapshot {
    templates: Vec<GroundStation>,
    vessels: Vec<LiveVessel>,
}

impl SceneSnapshot {
    pub fn from_spec(spec: SceneSpec) -> Self {
        let templates = spec.stations.into_iter().map(station_from_spec).collect();
        let vessels = spec.vessels.into_iter().map(vessel_from_spec).collect();
        Self { templates, vessels }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let spec: SceneSpec = serde_json::from_str(json)?;
        Ok(Self::from_spec(spec))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading scene snapshot from {:?}", path);

        let file = File::open(path)?;
        let spec: SceneSpec = serde_json::from_reader(BufReader::new(file))?;
        let scene = Self::from_spec(spec);

        info!(
            "Loaded {} station templates and {} vessels",
            scene.templates.len(),
            scene.vessels.len()
        );
        Ok(scene)
    }

    pub fn vessels(&self) -> &[LiveVessel] {
        &self.vessels
    }

    pub fn add_vessel(&mut self, vessel: LiveVessel) {
        self.vessels.push(vessel);
    }

    pub fn remove_vessel(&mut self, id: VesselId) -> Option<LiveVessel> {
        let pos = self.vessels.iter().position(|v| v.id == id)?;
        Some(self.vessels.remove(pos))
    }
}

fn station_from_spec(spec: StationSpec) -> GroundStation {
    let mut station = GroundStation::new(
        spec.id,
        spec.frequencies,
        spec.relay_power,
        GeoLocation {
            latitude: spec.latitude,
            longitude: spec.longitude,
            altitude_m: spec.altitude_m,
        },
    );
    if let Some(name) = spec.name {
        station.name = name;
    }
    station.is_primary = spec.primary;
    station
}

fn vessel_from_spec(spec: VesselSpec) -> LiveVessel {
    let mut module = StaticModule::new(spec.frequencies.iter(), spec.max_power, spec.commandable);
    for (f, p) in spec.power_by_frequency {
        module = module.with_power(f, p);
    }

    let connection = spec.connected.then(|| {
        let mut node = NodeHandle::craft(spec.id, spec.name.clone(), Arc::new(module));
        if spec.module_missing {
            node.module = None;
        }
        node
    });

    LiveVessel {
        id: spec.id,
        name: spec.name,
        vessel_type: spec.vessel_type,
        connection,
    }
}

impl TemplateSource for SceneSnapshot {
    fn templates(&self) -> Vec<GroundStation> {
        self.templates.clone()
    }
}

impl VesselSource for SceneSnapshot {
    fn live_vessels(&self) -> Result<Vec<LiveVessel>> {
        Ok(self.vessels.clone())
    }
}
