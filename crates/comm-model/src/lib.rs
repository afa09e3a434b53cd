//! CommNet Model Library
//!
//! Shared vocabulary of the constellation overlay:
//!
//! - [`Frequency`] / [`FrequencyList`]: discrete channels a participant listens on
//! - [`Constellation`]: named, coloured group of frequencies
//! - [`NodeHandle`]: the host's low-level network node, used as the join key
//!   between the host graph and overlay entities
//! - [`CommModule`]: the participation module attached to a craft

use cfg_node::CfgError;
use thiserror::Error;

pub mod constellation;
pub mod frequency;
pub mod node;

pub use constellation::{Color, Constellation, ConstellationId, CONSTELLATION_NODE};
pub use frequency::{Frequency, FrequencyList, FREQUENCIES_NODE, FREQUENCY_KEY};
pub use node::{CommModule, NodeComparer, NodeHandle, NodeOwner, OwnerComparer, VesselId};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ModelError {
    #[error("Duplicate frequency {0}")]
    DuplicateFrequency(Frequency),
    #[error("Constellation {0} has no frequencies")]
    NoFrequencies(ConstellationId),
    #[error("Invalid color: {0}")]
    InvalidColor(String),
    #[error("Section '{section}' is missing '{field}'")]
    MissingField { section: String, field: String },
    #[error("Config error: {0}")]
    Cfg(#[from] CfgError),
}

pub type Result<T> = std::result::Result<T, ModelError>;
