//! Frequency and power queries per node
//!
//! Called once per edge evaluation by the network solver, so nothing here
//! caches or mutates.

use crate::matcher::IdentityMatcher;
use comm_model::{Frequency, FrequencyList, NodeHandle};
use ground_stations::{GroundStation, StationRegistry};
use tracing::debug;

pub struct FrequencyResolver<'a> {
    matcher: &'a IdentityMatcher,
    stations: &'a StationRegistry,
}

impl<'a> FrequencyResolver<'a> {
    pub fn new(matcher: &'a IdentityMatcher, stations: &'a StationRegistry) -> Self {
        Self { matcher, stations }
    }

    fn home_station(&self, handle: &NodeHandle) -> Option<&'a GroundStation> {
        if !handle.is_home {
            return None;
        }
        self.matcher.resolve_ground_station(self.stations, handle)
    }

    /// Station frequencies for home nodes, otherwise the frequencies of the
    /// node's participation module. Unknown nodes have none.
    pub fn frequencies(&self, handle: &NodeHandle) -> FrequencyList {
        if let Some(station) = self.home_station(handle) {
            return station.frequencies.clone();
        }
        match &handle.module {
            Some(module) => module.frequencies(),
            None => {
                debug!("No frequencies for unresolved node {}", handle.owner);
                FrequencyList::new()
            }
        }
    }

    /// Ground stations transmit at the node's intrinsic relay power; craft at
    /// their module's maximum for `frequency`.
    pub fn comm_power(&self, handle: &NodeHandle, frequency: Frequency) -> f64 {
        if self.home_station(handle).is_some() {
            return handle.relay_power;
        }
        match &handle.module {
            Some(module) => module.max_power(frequency),
            None => {
                debug!("No power for unresolved node {}", handle.owner);
                0.0
            }
        }
    }
}
