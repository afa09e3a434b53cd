//! Ground Stations Library
//!
//! Fixed communication participants of the constellation overlay:
//! the station model, its persisted record, the key-indexed registry and the
//! load-time reconciliation of saved stations against host templates.

use cfg_node::CfgNode;
use comm_model::{Color, FrequencyList, ModelError, NodeHandle, FREQUENCIES_NODE};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod reconcile;
pub mod registry;

pub use reconcile::{ReconcileReport, Reconciler, TemplateSource, DEFAULT_REFERENCE_STATION};
pub use registry::StationRegistry;

/// Section name of one persisted ground station.
pub const GROUND_STATION_NODE: &str = "GroundStation";

#[derive(Error, Debug)]
pub enum StationError {
    #[error("Station not found: {0}")]
    NotFound(String),
    #[error("Duplicate station key: {0}")]
    DuplicateKey(String),
    #[error("No clonable reference template for station {0}")]
    NoReferenceTemplate(String),
    #[error("Station section is missing its id")]
    MissingKey,
    #[error("Model error: {0}")]
    Model(#[from] ModelError),
}

pub type Result<T> = std::result::Result<T, StationError>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_m: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroundStation {
    /// Stable identity key, independent of host-assigned handles
    pub key: String,
    pub name: String,
    pub color: Color,
    pub frequencies: FrequencyList,
    pub handle: NodeHandle,
    /// Host capital station; never used as a cloning template
    pub is_primary: bool,
    pub location: GeoLocation,
}

impl GroundStation {
    pub fn new(
        key: impl Into<String>,
        frequencies: FrequencyList,
        relay_power: f64,
        location: GeoLocation,
    ) -> Self {
        let key = key.into();
        Self {
            name: key.clone(),
            handle: NodeHandle::home(key.clone(), relay_power),
            key,
            color: Color::WHITE,
            frequencies,
            is_primary: false,
            location,
        }
    }

    pub fn primary(mut self) -> Self {
        self.is_primary = true;
        self
    }

    /// Re-key a cloned station. The node handle follows the key so that
    /// handle resolution keeps working for the new identity.
    pub fn rekey(&mut self, key: &str) {
        self.key = key.to_string();
        self.name = key.to_string();
        self.handle.owner = comm_model::NodeOwner::Station(key.to_string());
        self.handle.name = key.to_string();
    }

    pub fn apply_record(&mut self, record: &StationRecord) {
        if let Some(name) = &record.name {
            self.name = name.clone();
        }
        if let Some(color) = record.color {
            self.color = color;
        }
        self.frequencies = record.frequencies.clone();
    }

    pub fn to_record(&self) -> StationRecord {
        StationRecord {
            key: self.key.clone(),
            name: Some(self.name.clone()),
            color: Some(self.color),
            frequencies: self.frequencies.clone(),
        }
    }

    pub fn to_cfg(&self) -> CfgNode {
        self.to_record().to_cfg()
    }
}

/// Persisted overrides for one station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationRecord {
    #[serde(rename = "id")]
    pub key: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<Color>,
    #[serde(default)]
    pub frequencies: FrequencyList,
}

impl StationRecord {
    pub fn new(key: impl Into<String>, frequencies: FrequencyList) -> Self {
        Self {
            key: key.into(),
            name: None,
            color: None,
            frequencies,
        }
    }

    /// An empty frequency list is written as no `Frequencies` section at all,
    /// which [`StationRecord::from_cfg`] reads back as explicitly empty.
    pub fn to_cfg(&self) -> CfgNode {
        let mut node = CfgNode::new(GROUND_STATION_NODE);
        node.add_value("id", &self.key);
        if let Some(name) = &self.name {
            node.add_value("name", name);
        }
        if let Some(color) = self.color {
            node.add_value("color", color);
        }
        if !self.frequencies.is_empty() {
            node.add_node(self.frequencies.to_cfg());
        }
        node
    }

    pub fn from_cfg(node: &CfgNode) -> Result<Self> {
        let key = node
            .get_value("id")
            .filter(|k| !k.is_empty())
            .ok_or(StationError::MissingKey)?
            .to_string();
        let color = match node.get_value("color") {
            Some(raw) => Some(raw.parse::<Color>()?),
            None => None,
        };
        let frequencies = match node.get_node(FREQUENCIES_NODE) {
            Some(section) => FrequencyList::from_cfg(section)?,
            None => FrequencyList::new(),
        };

        Ok(Self {
            key,
            name: node.get_value("name").map(str::to_string),
            color,
            frequencies,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use comm_model::Frequency;

    fn freqs(values: &[u16]) -> FrequencyList {
        let mut list = FrequencyList::new();
        for v in values {
            list.insert(Frequency(*v));
        }
        list
    }

    fn origin() -> GeoLocation {
        GeoLocation {
            latitude: 0.0,
            longitude: 0.0,
            altitude_m: 0.0,
        }
    }

    #[test]
    fn test_record_round_trip() {
        let record = StationRecord {
            key: "Kerbin: Alpha".to_string(),
            name: Some("Alpha".to_string()),
            color: Some(Color::rgb(10, 20, 30)),
            frequencies: freqs(&[0, 3]),
        };
        assert_eq!(StationRecord::from_cfg(&record.to_cfg()).unwrap(), record);
    }

    #[test]
    fn test_missing_frequencies_section_is_empty() {
        let mut node = CfgNode::new(GROUND_STATION_NODE);
        node.add_value("id", "Alpha");
        let record = StationRecord::from_cfg(&node).unwrap();
        assert!(record.frequencies.is_empty());

        let empty = StationRecord::new("Beta", FrequencyList::new());
        assert!(!empty.to_cfg().has_node(FREQUENCIES_NODE));
    }

    #[test]
    fn test_record_without_id_rejected() {
        let node = CfgNode::new(GROUND_STATION_NODE);
        assert!(matches!(
            StationRecord::from_cfg(&node),
            Err(StationError::MissingKey)
        ));
    }

    #[test]
    fn test_apply_record_overrides() {
        let mut station = GroundStation::new("Alpha", freqs(&[0]), 1.0e9, origin());
        let record = StationRecord {
            key: "Alpha".to_string(),
            name: Some("Alpha Tracking".to_string()),
            color: None,
            frequencies: FrequencyList::new(),
        };
        station.apply_record(&record);

        assert_eq!(station.name, "Alpha Tracking");
        assert_eq!(station.color, Color::WHITE);
        assert!(station.frequencies.is_empty());
    }

    #[test]
    fn test_rekey_moves_handle() {
        let mut station = GroundStation::new("Kerbin: Baikerbanur", freqs(&[0]), 1.0e9, origin());
        station.rekey("Mun: Farside");
        assert_eq!(station.handle.station_key(), Some("Mun: Farside"));
        assert_eq!(station.name, "Mun: Farside");
    }

    #[test]
    fn test_record_json_uses_id_field() {
        let record: StationRecord =
            serde_json::from_str(r#"{"id": "Kerbin: KSC", "frequencies": [0]}"#).unwrap();
        assert_eq!(record.key, "Kerbin: KSC");
        assert_eq!(record.frequencies, freqs(&[0]));
    }
}
