//! CommNet Constellation Overlay
//!
//! Multi-channel network model layered over a host simulation that only knows
//! one global connectivity graph. Participants are split into constellations
//! by frequency; this crate keeps track of who they are:
//!
//! - [`cache::ConnectivityCache`]: lazily rebuilt list of eligible craft,
//!   invalidated by vessel lifecycle events
//! - [`matcher::IdentityMatcher`]: node handle → ground station / craft
//! - [`resolver::FrequencyResolver`]: per-node frequency and power queries
//! - [`session::CommNetSession`]: session context owning the registry, with
//!   load / start / save / teardown lifecycle
//!
//! # Lifecycle
//!
//! ```text
//! load(saved doc) ─► start(templates) ─► queries + vessel events ─► save ─► teardown
//! ```

use comm_model::VesselId;
use thiserror::Error;

pub mod cache;
pub mod matcher;
pub mod registry;
pub mod resolver;
pub mod session;
pub mod settings;
pub mod snapshot;
pub mod vessel;

pub use cache::{CacheEvent, CacheState, CacheStats, CommunicableCraft, ConnectivityCache};
pub use matcher::IdentityMatcher;
pub use registry::EntityRegistry;
pub use resolver::FrequencyResolver;
pub use session::CommNetSession;
pub use settings::{DisplayMode, ScenarioSettings, Settings};
pub use snapshot::{SceneSnapshot, StaticModule};
pub use vessel::{LiveVessel, VesselSource, VesselType};

#[derive(Error, Debug)]
pub enum NetError {
    #[error("Vessel {0} is connected but carries no participation module")]
    MissingModule(VesselId),
    #[error("Vessel scan failed: {0}")]
    Scan(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, NetError>;
