//! Network-node handles and the participation-module seam
//!
//! A [`NodeHandle`] is what the host's connectivity graph hands out. The
//! overlay never relies on handle identity: two handles are the same
//! participant when their [`NodeOwner`] matches, however many copies of the
//! handle exist.

use crate::{Frequency, FrequencyList};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VesselId(pub Uuid);

impl VesselId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for VesselId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VesselId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity-defining field of a node: which overlay entity owns it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeOwner {
    /// Ground station, by its stable key
    Station(String),
    /// Craft, by vessel id
    Vessel(VesselId),
}

impl fmt::Display for NodeOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeOwner::Station(key) => write!(f, "station '{}'", key),
            NodeOwner::Vessel(id) => write!(f, "vessel {}", id),
        }
    }
}

/// Network-participation module attached to a craft.
///
/// Implemented by the host; the overlay only reads through it, so values may
/// change between calls (players retune antennas at any time).
pub trait CommModule: fmt::Debug + Send + Sync {
    fn frequencies(&self) -> FrequencyList;

    /// Maximum transmission power on `frequency`, 0.0 when not tuned to it.
    fn max_power(&self, frequency: Frequency) -> f64;

    fn is_commandable(&self) -> bool;
}

/// Low-level node handle supplied by the host graph.
#[derive(Clone)]
pub struct NodeHandle {
    pub owner: NodeOwner,
    pub name: String,
    /// Fixed/home node (ground station) rather than a craft
    pub is_home: bool,
    /// Intrinsic relay power of the node's antenna
    pub relay_power: f64,
    /// Participation module, present on craft nodes
    pub module: Option<Arc<dyn CommModule>>,
}

impl NodeHandle {
    pub fn home(key: impl Into<String>, relay_power: f64) -> Self {
        let key = key.into();
        Self {
            name: key.clone(),
            owner: NodeOwner::Station(key),
            is_home: true,
            relay_power,
            module: None,
        }
    }

    pub fn craft(id: VesselId, name: impl Into<String>, module: Arc<dyn CommModule>) -> Self {
        Self {
            owner: NodeOwner::Vessel(id),
            name: name.into(),
            is_home: false,
            relay_power: 0.0,
            module: Some(module),
        }
    }

    pub fn station_key(&self) -> Option<&str> {
        match &self.owner {
            NodeOwner::Station(key) => Some(key),
            NodeOwner::Vessel(_) => None,
        }
    }

    pub fn vessel_id(&self) -> Option<VesselId> {
        match &self.owner {
            NodeOwner::Vessel(id) => Some(*id),
            NodeOwner::Station(_) => None,
        }
    }
}

/// Handles compare structurally by owner only.
impl PartialEq for NodeHandle {
    fn eq(&self, other: &Self) -> bool {
        self.owner == other.owner
    }
}

impl Eq for NodeHandle {}

impl fmt::Debug for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeHandle")
            .field("owner", &self.owner)
            .field("name", &self.name)
            .field("is_home", &self.is_home)
            .field("relay_power", &self.relay_power)
            .field("has_module", &self.module.is_some())
            .finish()
    }
}

/// Decides whether two handles denote the same network participant.
///
/// Third-party overlays may install their own notion of node identity; the
/// matcher only ever goes through this trait.
pub trait NodeComparer: fmt::Debug + Send + Sync {
    fn same_participant(&self, a: &NodeHandle, b: &NodeHandle) -> bool;
}

/// Default comparer: same owning-entity key.
#[derive(Debug, Clone, Copy, Default)]
pub struct OwnerComparer;

impl NodeComparer for OwnerComparer {
    fn same_participant(&self, a: &NodeHandle, b: &NodeHandle) -> bool {
        a.owner == b.owner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct FixedModule;

    impl CommModule for FixedModule {
        fn frequencies(&self) -> FrequencyList {
            FrequencyList::from(Frequency(1))
        }

        fn max_power(&self, _frequency: Frequency) -> f64 {
            1.0
        }

        fn is_commandable(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_structural_equality_ignores_other_fields() {
        let mut a = NodeHandle::home("Kerbin: KSC", 2.0e9);
        let b = NodeHandle::home("Kerbin: KSC", 5.0e11);
        a.name = "Renamed".to_string();

        assert_eq!(a, b);
        assert!(OwnerComparer.same_participant(&a, &b));
    }

    #[test]
    fn test_station_and_vessel_never_equal() {
        let id = VesselId::new();
        let craft = NodeHandle::craft(id, "Relay 1", Arc::new(FixedModule));
        let home = NodeHandle::home(id.to_string(), 1.0);

        assert_ne!(craft, home);
        assert_eq!(craft.vessel_id(), Some(id));
        assert_eq!(craft.station_key(), None);
        assert_eq!(home.station_key(), Some(id.to_string().as_str()));
    }
}
