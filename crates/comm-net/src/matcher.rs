//! Node handle → owning entity resolution
//!
//! The handle a caller holds may come from a different object graph than the
//! one the registry indexed, so every match goes through a [`NodeComparer`]
//! rather than handle identity. The key index is only a fast path; on a miss
//! the matcher falls back to a comparer scan.

use crate::cache::{CommunicableCraft, ConnectivityCache};
use comm_model::{NodeComparer, NodeHandle, OwnerComparer};
use ground_stations::{GroundStation, StationRegistry};
use tracing::trace;

#[derive(Debug)]
pub struct IdentityMatcher {
    comparer: Box<dyn NodeComparer>,
}

impl Default for IdentityMatcher {
    fn default() -> Self {
        Self::new(Box::new(OwnerComparer))
    }
}

impl IdentityMatcher {
    pub fn new(comparer: Box<dyn NodeComparer>) -> Self {
        Self { comparer }
    }

    pub fn same_participant(&self, a: &NodeHandle, b: &NodeHandle) -> bool {
        self.comparer.same_participant(a, b)
    }

    pub fn resolve_ground_station<'a>(
        &self,
        stations: &'a StationRegistry,
        handle: &NodeHandle,
    ) -> Option<&'a GroundStation> {
        if let Some(station) = handle.station_key().and_then(|key| stations.find(key)) {
            if self.same_participant(&station.handle, handle) {
                return Some(station);
            }
        }

        let found = stations
            .iter()
            .find(|s| self.same_participant(&s.handle, handle));
        if found.is_none() {
            trace!("No ground station for {}", handle.owner);
        }
        found
    }

    /// Look the handle up in the cache as currently built. Callers wanting a
    /// fresh view refresh the cache first.
    pub fn resolve_craft<'a>(
        &self,
        cache: &'a ConnectivityCache,
        handle: &NodeHandle,
    ) -> Option<&'a CommunicableCraft> {
        if let Some(craft) = handle.vessel_id().and_then(|id| cache.find(id)) {
            if self.same_participant(&craft.node, handle) {
                return Some(craft);
            }
        }

        let found = cache
            .cached()
            .iter()
            .find(|c| self.same_participant(&c.node, handle));
        if found.is_none() {
            trace!("No craft for {}", handle.owner);
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::StaticModule;
    use crate::vessel::{LiveVessel, VesselType};
    use comm_model::{Frequency, FrequencyList, VesselId};
    use ground_stations::GeoLocation;
    use std::sync::Arc;

    fn stations() -> StationRegistry {
        let here = GeoLocation {
            latitude: 0.0,
            longitude: 0.0,
            altitude_m: 0.0,
        };
        let mut registry = StationRegistry::new();
        for key in ["Kerbin: KSC", "Kerbin: Baikerbanur", "Mun: Farside"] {
            registry
                .insert(GroundStation::new(key, FrequencyList::from(Frequency(0)), 1.0e9, here))
                .unwrap();
        }
        registry.sort();
        registry
    }

    /// Overlay that identifies nodes by display name only.
    #[derive(Debug)]
    struct NameComparer;

    impl NodeComparer for NameComparer {
        fn same_participant(&self, a: &NodeHandle, b: &NodeHandle) -> bool {
            a.name == b.name
        }
    }

    #[test]
    fn test_structurally_equal_handles_resolve_identically() {
        let registry = stations();
        let matcher = IdentityMatcher::default();

        let h1 = NodeHandle::home("Mun: Farside", 1.0e9);
        let mut h2 = h1.clone();
        h2.relay_power = 42.0;

        let a = matcher.resolve_ground_station(&registry, &h1).unwrap();
        let b = matcher.resolve_ground_station(&registry, &h2).unwrap();
        assert_eq!(a.key, "Mun: Farside");
        assert!(std::ptr::eq(a, b));
    }

    #[test]
    fn test_miss_is_none() {
        let registry = stations();
        let matcher = IdentityMatcher::default();
        assert!(matcher
            .resolve_ground_station(&registry, &NodeHandle::home("Duna: Nowhere", 1.0))
            .is_none());

        let craft_handle = NodeHandle::craft(
            VesselId::new(),
            "Kerbin: KSC",
            Arc::new(StaticModule::new([Frequency(0)], 1.0, true)),
        );
        assert!(matcher.resolve_ground_station(&registry, &craft_handle).is_none());
    }

    #[test]
    fn test_foreign_comparer_uses_scan() {
        let registry = stations();
        let matcher = IdentityMatcher::new(Box::new(NameComparer));

        let mut handle = NodeHandle::home("rebound-id-17", 1.0);
        handle.name = "Kerbin: KSC".to_string();

        let station = matcher.resolve_ground_station(&registry, &handle).unwrap();
        assert_eq!(station.key, "Kerbin: KSC");
    }

    #[test]
    fn test_resolve_craft() {
        let id = VesselId::new();
        let module = Arc::new(StaticModule::new([Frequency(3)], 5.0, true));
        let vessels = vec![LiveVessel {
            id,
            name: "Relay 1".to_string(),
            vessel_type: VesselType::Relay,
            connection: Some(NodeHandle::craft(id, "Relay 1", module.clone())),
        }];
        let mut cache = ConnectivityCache::new();
        cache.refresh(&vessels);

        let matcher = IdentityMatcher::default();
        let copy = NodeHandle::craft(id, "Relay 1 (copy)", module);
        let craft = matcher.resolve_craft(&cache, &copy).unwrap();
        assert_eq!(craft.vessel_id, id);

        let other = NodeHandle::home("Kerbin: KSC", 1.0);
        assert!(matcher.resolve_craft(&cache, &other).is_none());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use comm_model::{Frequency, FrequencyList};
    use ground_stations::GeoLocation;
    use proptest::prelude::*;

    fn key() -> impl Strategy<Value = String> {
        prop_oneof![Just("Kerbin: KSC".to_string()), "[A-C]{1,2}"]
    }

    proptest! {
        #[test]
        fn same_participant_is_symmetric(a in key(), b in key(), pa in 0.0f64..1e12, pb in 0.0f64..1e12) {
            let matcher = IdentityMatcher::default();
            let ha = NodeHandle::home(a, pa);
            let hb = NodeHandle::home(b, pb);
            prop_assert_eq!(matcher.same_participant(&ha, &hb), matcher.same_participant(&hb, &ha));
            prop_assert!(matcher.same_participant(&ha, &ha));
        }

        #[test]
        fn resolution_agrees_with_key_lookup(
            keys in proptest::collection::btree_set("[A-C]{1,2}", 0..6),
            lookup in "[A-C]{1,2}",
        ) {
            let here = GeoLocation { latitude: 0.0, longitude: 0.0, altitude_m: 0.0 };
            let mut registry = StationRegistry::new();
            for k in &keys {
                registry
                    .insert(GroundStation::new(k.clone(), FrequencyList::from(Frequency(0)), 1.0, here))
                    .unwrap();
            }

            let matcher = IdentityMatcher::default();
            let found = matcher
                .resolve_ground_station(&registry, &NodeHandle::home(lookup.clone(), 1.0))
                .map(|s| s.key.clone());
            prop_assert_eq!(found, keys.contains(&lookup).then_some(lookup));
        }
    }
}
