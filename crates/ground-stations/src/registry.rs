//! Key-indexed ground station registry

use crate::{GroundStation, Result, StationError};
use std::collections::HashMap;

/// Stations sorted by key, with an O(1) key index.
#[derive(Debug, Clone, Default)]
pub struct StationRegistry {
    stations: Vec<GroundStation>,
    index: HashMap<String, usize>,
}

impl StationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a station. Keys are unique; a second station with the same key
    /// is rejected and the registry is left unchanged.
    pub fn insert(&mut self, station: GroundStation) -> Result<()> {
        if self.index.contains_key(&station.key) {
            return Err(StationError::DuplicateKey(station.key));
        }
        self.index.insert(station.key.clone(), self.stations.len());
        self.stations.push(station);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<&GroundStation> {
        self.find(key)
            .ok_or_else(|| StationError::NotFound(key.to_string()))
    }

    pub fn get_mut(&mut self, key: &str) -> Result<&mut GroundStation> {
        match self.index.get(key) {
            Some(&i) => Ok(&mut self.stations[i]),
            None => Err(StationError::NotFound(key.to_string())),
        }
    }

    pub fn find(&self, key: &str) -> Option<&GroundStation> {
        self.index.get(key).map(|&i| &self.stations[i])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GroundStation> {
        self.stations.iter()
    }

    pub fn as_slice(&self) -> &[GroundStation] {
        &self.stations
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.stations.iter().map(|s| s.key.as_str())
    }

    /// Sort by key and rebuild the index.
    pub fn sort(&mut self) {
        self.stations.sort_by(|a, b| a.key.cmp(&b.key));
        self.reindex();
    }

    pub fn clear(&mut self) {
        self.stations.clear();
        self.index.clear();
    }

    fn reindex(&mut self) {
        self.index = self
            .stations
            .iter()
            .enumerate()
            .map(|(i, s)| (s.key.clone(), i))
            .collect();
    }
}

impl PartialEq for StationRegistry {
    fn eq(&self, other: &Self) -> bool {
        self.stations == other.stations
    }
}
