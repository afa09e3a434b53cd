//! Connectivity cache
//!
//! Snapshot of which live vessels currently qualify as communication
//! participants. Rebuilding means scanning the whole vessel population, so
//! the list is only recomputed when the population changed, never on
//! connectivity changes.
//!
//! # State machine
//!
//! | Current | Event                                   | Next  |
//! |---------|-----------------------------------------|-------|
//! | Clean   | vessel created/destroyed, tracked type  | Dirty |
//! | Clean   | vessel created/destroyed, other type    | Clean |
//! | Dirty   | vessel created/destroyed, any type      | Dirty |
//! | any     | rebuilt                                 | Clean |
//! | any     | invalidated                             | Dirty |
//!
//! A read while Dirty rebuilds synchronously and emits `Rebuilt`. The initial
//! state is Dirty so the first read of a session always scans.

use crate::vessel::{LiveVessel, VesselSource, VesselType};
use crate::{NetError, Result};
use chrono::{DateTime, Utc};
use comm_model::{CommModule, Frequency, FrequencyList, NodeHandle, VesselId};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CacheState {
    Clean,
    Dirty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheEvent {
    VesselCreated(VesselType),
    VesselDestroyed(VesselType),
    Rebuilt,
    Invalidated,
}

impl CacheState {
    pub fn transition(self, event: CacheEvent) -> CacheState {
        use CacheEvent::*;
        use CacheState::*;

        match (self, event) {
            (_, Rebuilt) => Clean,
            (_, Invalidated) => Dirty,
            (Dirty, VesselCreated(_) | VesselDestroyed(_)) => Dirty,
            (Clean, VesselCreated(t) | VesselDestroyed(t)) if t.is_tracked() => Dirty,
            (Clean, VesselCreated(_) | VesselDestroyed(_)) => Clean,
        }
    }
}

/// A vessel with its participation module, as held by the cache.
#[derive(Debug, Clone)]
pub struct CommunicableCraft {
    pub vessel_id: VesselId,
    pub name: String,
    pub vessel_type: VesselType,
    pub node: NodeHandle,
    pub module: Arc<dyn CommModule>,
}

impl CommunicableCraft {
    pub fn frequencies(&self) -> FrequencyList {
        self.module.frequencies()
    }

    pub fn max_power(&self, frequency: Frequency) -> f64 {
        self.module.max_power(frequency)
    }

    pub fn is_commandable(&self) -> bool {
        self.module.is_commandable()
    }

    pub fn listens_on(&self, frequency: Frequency) -> bool {
        self.frequencies()
            .intersects(&FrequencyList::from(frequency))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub state: CacheState,
    pub entries: usize,
    pub rebuilds: u64,
    pub last_rebuild: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub struct ConnectivityCache {
    state: CacheState,
    craft: Vec<CommunicableCraft>,
    index: HashMap<VesselId, usize>,
    rebuilds: u64,
    last_rebuild: Option<DateTime<Utc>>,
}

impl Default for ConnectivityCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectivityCache {
    pub fn new() -> Self {
        Self {
            state: CacheState::Dirty,
            craft: Vec::new(),
            index: HashMap::new(),
            rebuilds: 0,
            last_rebuild: None,
        }
    }

    pub fn state(&self) -> CacheState {
        self.state
    }

    pub fn apply(&mut self, event: CacheEvent) -> CacheState {
        let next = self.state.transition(event);
        if next != self.state {
            debug!(?event, from = ?self.state, to = ?next, "Craft cache state change");
        }
        self.state = next;
        next
    }

    pub fn on_vessel_created(&mut self, vessel_type: VesselType) {
        self.apply(CacheEvent::VesselCreated(vessel_type));
    }

    pub fn on_vessel_destroyed(&mut self, vessel_type: VesselType) {
        self.apply(CacheEvent::VesselDestroyed(vessel_type));
    }

    pub fn invalidate(&mut self) {
        self.apply(CacheEvent::Invalidated);
    }

    /// Rebuild if dirty, then return the full list.
    pub fn refresh(&mut self, source: &dyn VesselSource) -> &[CommunicableCraft] {
        if self.state == CacheState::Dirty {
            self.rebuild(source);
        }
        &self.craft
    }

    /// Craft listening on `frequency`, or every cached craft for `None`.
    pub fn get_craft(
        &mut self,
        source: &dyn VesselSource,
        frequency: Option<Frequency>,
    ) -> Vec<&CommunicableCraft> {
        self.refresh(source);
        self.filtered(frequency)
    }

    /// Filter the current list without refreshing.
    pub fn filtered(&self, frequency: Option<Frequency>) -> Vec<&CommunicableCraft> {
        match frequency {
            None => self.craft.iter().collect(),
            Some(f) => self.craft.iter().filter(|c| c.listens_on(f)).collect(),
        }
    }

    /// Current list as last built, without refreshing.
    pub fn cached(&self) -> &[CommunicableCraft] {
        &self.craft
    }

    pub fn find(&self, vessel_id: VesselId) -> Option<&CommunicableCraft> {
        self.index.get(&vessel_id).map(|&i| &self.craft[i])
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            state: self.state,
            entries: self.craft.len(),
            rebuilds: self.rebuilds,
            last_rebuild: self.last_rebuild,
        }
    }

    /// Drop every entry and return to the initial state.
    pub fn clear(&mut self) {
        self.craft.clear();
        self.index.clear();
        self.apply(CacheEvent::Invalidated);
    }

    /// A failing scan leaves whatever was collected so far and still marks
    /// the cache clean, so a broken host does not trigger a rescan per read.
    fn rebuild(&mut self, source: &dyn VesselSource) {
        debug!("Craft cache - {} entries deleted", self.craft.len());
        self.craft.clear();
        self.index.clear();

        if let Err(e) = self.scan(source) {
            error!(
                "Craft cache - conflict with a third-party network overlay ({}). \
                 Please remove this or the other network mod",
                e
            );
        }

        self.rebuilds += 1;
        self.last_rebuild = Some(Utc::now());
        self.apply(CacheEvent::Rebuilt);
        debug!("Craft cache - {} entries added", self.craft.len());
    }

    fn scan(&mut self, source: &dyn VesselSource) -> Result<()> {
        for vessel in source.live_vessels()? {
            if !is_eligible(&vessel)? {
                continue;
            }

            // science controllers qualify by type but still need a node
            let Some(node) = vessel.connection else {
                trace!("Skipping unconnected '{}'", vessel.name);
                continue;
            };
            let module = node
                .module
                .clone()
                .ok_or(NetError::MissingModule(vessel.id))?;

            trace!("Caching craft '{}'", vessel.name);
            self.index.insert(vessel.id, self.craft.len());
            self.craft.push(CommunicableCraft {
                vessel_id: vessel.id,
                name: vessel.name,
                vessel_type: vessel.vessel_type,
                node,
                module,
            });
        }
        Ok(())
    }
}

/// (connected AND commandable AND classified) OR deployed science controller.
/// Debris stays eligible: a spent stage may still carry a working probe core.
fn is_eligible(vessel: &LiveVessel) -> Result<bool> {
    if vessel.vessel_type == VesselType::DeployedScienceController {
        return Ok(true);
    }
    let Some(node) = &vessel.connection else {
        return Ok(false);
    };
    let module = node
        .module
        .as_ref()
        .ok_or(NetError::MissingModule(vessel.id))?;
    Ok(module.is_commandable() && vessel.vessel_type != VesselType::Unknown)
}
