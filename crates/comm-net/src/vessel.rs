//! Host vessel population seam

use crate::Result;
use comm_model::{NodeHandle, VesselId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Host vessel classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VesselType {
    Base,
    Lander,
    Plane,
    Probe,
    Relay,
    Rover,
    Ship,
    Station,
    DeployedScienceController,
    Debris,
    SpaceObject,
    Eva,
    Flag,
    Unknown,
}

impl VesselType {
    /// Classifications whose creation or destruction can change the set of
    /// communicable craft. Debris and the like never invalidate the cache.
    pub fn is_tracked(self) -> bool {
        matches!(
            self,
            VesselType::Base
                | VesselType::Lander
                | VesselType::Plane
                | VesselType::Probe
                | VesselType::Relay
                | VesselType::Rover
                | VesselType::Ship
                | VesselType::Station
                | VesselType::DeployedScienceController
        )
    }
}

impl fmt::Display for VesselType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// One live vessel as reported by the host.
#[derive(Debug, Clone)]
pub struct LiveVessel {
    pub id: VesselId,
    pub name: String,
    pub vessel_type: VesselType,
    /// Active network connection, if any. The participation module rides on
    /// the node handle.
    pub connection: Option<NodeHandle>,
}

impl LiveVessel {
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }
}

/// Source of the host's live vessel population.
pub trait VesselSource {
    /// All live vessels. May fail when another network overlay has left the
    /// host in an inconsistent state.
    fn live_vessels(&self) -> Result<Vec<LiveVessel>>;
}

impl VesselSource for Vec<LiveVessel> {
    fn live_vessels(&self) -> Result<Vec<LiveVessel>> {
        Ok(self.clone())
    }
}
