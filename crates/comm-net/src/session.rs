//! Session context
//!
//! One [`CommNetSession`] exists per loaded scene and is passed explicitly to
//! whatever needs registry access. Lifecycle:
//!
//! 1. [`CommNetSession::load`] reads the saved scenario section (constellations
//!    replaced at once, station records held until start)
//! 2. [`CommNetSession::start`] reconciles the held records with the host's
//!    station templates
//! 3. queries and vessel lifecycle events
//! 4. [`CommNetSession::save`] writes the scenario section back
//! 5. [`CommNetSession::teardown`] drops every entity at scene end
//!
//! None of the lifecycle methods return errors: malformed data is logged and
//! replaced by the static defaults, so the host's own load/save dispatch is
//! never interrupted.

use crate::cache::{CacheStats, CommunicableCraft};
use crate::matcher::IdentityMatcher;
use crate::registry::EntityRegistry;
use crate::resolver::FrequencyResolver;
use crate::settings::{ScenarioSettings, Settings};
use crate::vessel::{VesselSource, VesselType};
use cfg_node::CfgNode;
use comm_model::{
    Constellation, Frequency, FrequencyList, NodeComparer, NodeHandle, VesselId, CONSTELLATION_NODE,
};
use ground_stations::{
    GroundStation, ReconcileReport, Reconciler, StationRecord, StationRegistry, TemplateSource,
    GROUND_STATION_NODE,
};
use tracing::{debug, error, info};

pub const CONSTELLATIONS_NODE: &str = "Constellations";
pub const GROUND_STATIONS_NODE: &str = "GroundStations";

#[derive(Debug)]
pub struct CommNetSession {
    settings: Settings,
    scenario: ScenarioSettings,
    registry: EntityRegistry,
    matcher: IdentityMatcher,
    /// Persisted station records between load and start
    pending_stations: Vec<StationRecord>,
    started: bool,
}

impl CommNetSession {
    pub fn new(settings: Settings) -> Self {
        let mut registry = EntityRegistry::new();
        registry.replace_constellations(settings.constellations.clone());

        Self {
            scenario: ScenarioSettings {
                legacy_orbit_line_color: settings.legacy_orbit_line_color,
                ..ScenarioSettings::default()
            },
            pending_stations: settings.ground_stations.clone(),
            registry,
            matcher: IdentityMatcher::default(),
            settings,
            started: false,
        }
    }

    /// Use a host-specific notion of node identity.
    pub fn with_comparer(mut self, comparer: Box<dyn NodeComparer>) -> Self {
        self.matcher = IdentityMatcher::new(comparer);
        self
    }

    pub fn load(&mut self, root: &CfgNode) {
        debug!("Scenario content to be read:\n{}", root.to_document());

        self.scenario.read_from(root);

        let constellations = self.load_constellations(root);
        self.registry.replace_constellations(constellations);
        self.pending_stations = self.load_station_records(root);

        info!(
            "Scenario loaded: {} constellations, {} ground-station records",
            self.registry.constellations().len(),
            self.pending_stations.len()
        );
    }

    fn load_constellations(&self, root: &CfgNode) -> Vec<Constellation> {
        let Some(section) = root.get_node(CONSTELLATIONS_NODE) else {
            debug!("The '{}' section is not found. The default constellation list is loaded.", CONSTELLATIONS_NODE);
            return self.settings.constellations.clone();
        };

        let nodes: Vec<&CfgNode> = section.get_nodes(CONSTELLATION_NODE).collect();
        if nodes.is_empty() {
            error!("The '{}' section is malformed! Reverted to the default constellation list.", CONSTELLATIONS_NODE);
            return self.settings.constellations.clone();
        }

        match nodes
            .into_iter()
            .map(Constellation::from_cfg)
            .collect::<Result<Vec<_>, _>>()
        {
            Ok(list) => list,
            Err(e) => {
                error!(
                    "The '{}' section is malformed ({}). Reverted to the default constellation list.",
                    CONSTELLATIONS_NODE, e
                );
                self.settings.constellations.clone()
            }
        }
    }

    fn load_station_records(&self, root: &CfgNode) -> Vec<StationRecord> {
        let Some(section) = root.get_node(GROUND_STATIONS_NODE) else {
            debug!("The '{}' section is not found. The default list of ground stations is loaded.", GROUND_STATIONS_NODE);
            return self.settings.ground_stations.clone();
        };

        let nodes: Vec<&CfgNode> = section.get_nodes(GROUND_STATION_NODE).collect();
        if nodes.is_empty() {
            error!("The '{}' section is malformed! Reverted to the default list of ground stations.", GROUND_STATIONS_NODE);
            return self.settings.ground_stations.clone();
        }

        match nodes
            .into_iter()
            .map(StationRecord::from_cfg)
            .collect::<Result<Vec<_>, _>>()
        {
            Ok(records) => records,
            Err(e) => {
                error!(
                    "The '{}' section is malformed ({}). Reverted to the default list of ground stations.",
                    GROUND_STATIONS_NODE, e
                );
                self.settings.ground_stations.clone()
            }
        }
    }

    /// Merge the loaded station records with the host's templates. The
    /// records are consumed; the craft cache is invalidated.
    pub fn start(&mut self, templates: &dyn TemplateSource) -> ReconcileReport {
        let records = std::mem::take(&mut self.pending_stations);
        let reconciler = Reconciler::new(self.settings.reference_station.clone());
        let (stations, report) = reconciler.reconcile(templates, records);

        self.registry.replace_stations(stations);
        self.registry.cache_mut().invalidate();
        self.started = true;

        report
    }

    /// Write the scenario section into `root`, replacing any earlier
    /// `Constellations` / `GroundStations` sections.
    pub fn save(&self, root: &mut CfgNode) {
        self.scenario.write_to(root);

        root.remove_node(CONSTELLATIONS_NODE);
        let constellations = self.registry.constellations();
        if constellations.is_empty() {
            error!("No constellations to save!");
        } else {
            let mut section = CfgNode::new(CONSTELLATIONS_NODE);
            for c in constellations {
                section.add_node(c.to_cfg());
            }
            root.add_node(section);
        }

        root.remove_node(GROUND_STATIONS_NODE);
        let stations: Vec<CfgNode> = if self.started {
            self.registry.stations().iter().map(GroundStation::to_cfg).collect()
        } else {
            self.pending_stations.iter().map(StationRecord::to_cfg).collect()
        };
        if stations.is_empty() {
            error!("No ground stations to save!");
        } else {
            let mut section = CfgNode::new(GROUND_STATIONS_NODE);
            for node in stations {
                section.add_node(node);
            }
            root.add_node(section);
        }

        debug!("Scenario content to be saved:\n{}", root.to_document());
    }

    pub fn teardown(&mut self) {
        self.registry.clear();
        self.pending_stations.clear();
        self.started = false;
        info!("CommNet session torn down");
    }

    pub fn on_vessel_created(&mut self, vessel_type: VesselType) {
        self.registry.cache_mut().on_vessel_created(vessel_type);
    }

    pub fn on_vessel_destroyed(&mut self, vessel_type: VesselType) {
        self.registry.cache_mut().on_vessel_destroyed(vessel_type);
    }

    pub fn get_craft(
        &mut self,
        source: &dyn VesselSource,
        frequency: Option<Frequency>,
    ) -> Vec<&CommunicableCraft> {
        self.registry.cache_mut().get_craft(source, frequency)
    }

    pub fn resolve_ground_station(&self, handle: &NodeHandle) -> Option<&GroundStation> {
        self.matcher
            .resolve_ground_station(self.registry.stations(), handle)
    }

    pub fn resolve_craft(
        &mut self,
        source: &dyn VesselSource,
        handle: &NodeHandle,
    ) -> Option<&CommunicableCraft> {
        self.registry.cache_mut().refresh(source);
        self.matcher.resolve_craft(self.registry.cache(), handle)
    }

    pub fn find_corresponding_vessel(
        &mut self,
        source: &dyn VesselSource,
        handle: &NodeHandle,
    ) -> Option<VesselId> {
        self.resolve_craft(source, handle).map(|c| c.vessel_id)
    }

    pub fn resolver(&self) -> FrequencyResolver<'_> {
        FrequencyResolver::new(&self.matcher, self.registry.stations())
    }

    pub fn get_frequencies(&self, handle: &NodeHandle) -> FrequencyList {
        self.resolver().frequencies(handle)
    }

    pub fn get_comm_power(&self, handle: &NodeHandle, frequency: Frequency) -> f64 {
        self.resolver().comm_power(handle, frequency)
    }

    pub fn constellation_for(&self, frequency: Frequency) -> Option<&Constellation> {
        self.registry.constellation_for(frequency)
    }

    pub fn constellations(&self) -> &[Constellation] {
        self.registry.constellations()
    }

    pub fn ground_stations(&self) -> &StationRegistry {
        self.registry.stations()
    }

    pub fn pending_station_records(&self) -> &[StationRecord] {
        &self.pending_stations
    }

    pub fn scenario(&self) -> &ScenarioSettings {
        &self.scenario
    }

    pub fn scenario_mut(&mut self) -> &mut ScenarioSettings {
        &mut self.scenario
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.registry.cache().stats()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }
}
