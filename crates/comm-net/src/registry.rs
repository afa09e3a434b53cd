//! Session entity registry
//!
//! Constellations and ground stations are replaced wholesale at load time;
//! craft come from the connectivity cache.

use crate::cache::ConnectivityCache;
use comm_model::{Constellation, ConstellationId, Frequency};
use ground_stations::StationRegistry;
use std::collections::HashSet;
use tracing::error;

#[derive(Debug, Default)]
pub struct EntityRegistry {
    constellations: Vec<Constellation>,
    stations: StationRegistry,
    cache: ConnectivityCache,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constellations(&self) -> &[Constellation] {
        &self.constellations
    }

    pub fn stations(&self) -> &StationRegistry {
        &self.stations
    }

    pub fn cache(&self) -> &ConnectivityCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut ConnectivityCache {
        &mut self.cache
    }

    /// Replace the constellation set, sorted by id. Constellations without
    /// frequencies and repeated ids are dropped.
    pub fn replace_constellations(&mut self, mut constellations: Vec<Constellation>) {
        constellations.sort();

        let mut seen: HashSet<ConstellationId> = HashSet::new();
        constellations.retain(|c| {
            if c.frequencies.is_empty() {
                error!("Constellation {} '{}' has no frequencies, dropped", c.id, c.name);
                return false;
            }
            if !seen.insert(c.id) {
                error!("Duplicate constellation id {} ('{}'), dropped", c.id, c.name);
                return false;
            }
            true
        });

        self.constellations = constellations;
    }

    pub fn replace_stations(&mut self, mut stations: StationRegistry) {
        stations.sort();
        self.stations = stations;
    }

    /// First constellation (by id) carrying `frequency`.
    pub fn constellation_for(&self, frequency: Frequency) -> Option<&Constellation> {
        self.constellations.iter().find(|c| c.carries(frequency))
    }

    pub fn clear(&mut self) {
        self.constellations.clear();
        self.stations.clear();
        self.cache.clear();
    }
}
