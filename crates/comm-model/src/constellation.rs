//! Constellations: named groups of frequencies with a display color

use crate::{Frequency, FrequencyList, ModelError, Result, FREQUENCIES_NODE};
use cfg_node::CfgNode;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

pub type ConstellationId = u16;

/// Section name of one persisted constellation.
pub const CONSTELLATION_NODE: &str = "Constellation";

/// RGB display color, persisted as `#RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(0xFF, 0xFF, 0xFF);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(ModelError::InvalidColor(s.to_string()));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| ModelError::InvalidColor(s.to_string()))
        };
        Ok(Color::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl TryFrom<String> for Color {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constellation {
    pub id: ConstellationId,
    pub name: String,
    pub color: Color,
    pub frequencies: FrequencyList,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

fn default_visible() -> bool {
    true
}

impl Constellation {
    pub fn new(
        id: ConstellationId,
        name: impl Into<String>,
        color: Color,
        frequencies: FrequencyList,
    ) -> Result<Self> {
        if frequencies.is_empty() {
            return Err(ModelError::NoFrequencies(id));
        }
        Ok(Self {
            id,
            name: name.into(),
            color,
            frequencies,
            visible: true,
        })
    }

    /// Single-frequency constellation, the common case.
    pub fn on_frequency(id: ConstellationId, name: impl Into<String>, color: Color, frequency: Frequency) -> Self {
        Self {
            id,
            name: name.into(),
            color,
            frequencies: FrequencyList::from(frequency),
            visible: true,
        }
    }

    pub fn carries(&self, frequency: Frequency) -> bool {
        self.frequencies.contains(frequency)
    }

    pub fn to_cfg(&self) -> CfgNode {
        let mut node = CfgNode::new(CONSTELLATION_NODE);
        node.add_value("id", self.id);
        node.add_value("name", &self.name);
        node.add_value("color", self.color);
        node.set_bool("visible", self.visible);
        node.add_node(self.frequencies.to_cfg());
        node
    }

    pub fn from_cfg(node: &CfgNode) -> Result<Self> {
        let id: ConstellationId = node
            .get_parsed("id")?
            .ok_or_else(|| missing(node, "id"))?;
        let name = node
            .get_value("name")
            .ok_or_else(|| missing(node, "name"))?
            .to_string();
        let color = match node.get_value("color") {
            Some(raw) => raw.parse()?,
            None => Color::WHITE,
        };
        let frequencies = match node.get_node(FREQUENCIES_NODE) {
            Some(section) => FrequencyList::from_cfg(section)?,
            None => return Err(ModelError::NoFrequencies(id)),
        };

        let mut constellation = Constellation::new(id, name, color, frequencies)?;
        constellation.visible = node.get_bool("visible")?.unwrap_or(true);
        Ok(constellation)
    }
}

fn missing(node: &CfgNode, field: &str) -> ModelError {
    ModelError::MissingField {
        section: node.name().to_string(),
        field: field.to_string(),
    }
}

impl PartialOrd for Constellation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Constellation {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id
            .cmp(&other.id)
            .then_with(|| self.name.cmp(&other.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_hex() {
        let c: Color = "#1A2b3C".parse().unwrap();
        assert_eq!(c, Color::rgb(0x1A, 0x2B, 0x3C));
        assert_eq!(c.to_string(), "#1A2B3C");
        assert!("#12345".parse::<Color>().is_err());
        assert!("zzzzzz".parse::<Color>().is_err());
    }

    #[test]
    fn test_constellation_requires_frequency() {
        let err = Constellation::new(3, "Empty", Color::WHITE, FrequencyList::new()).unwrap_err();
        assert_eq!(err, ModelError::NoFrequencies(3));
    }

    #[test]
    fn test_cfg_round_trip() {
        let mut freqs = FrequencyList::new();
        freqs.insert(Frequency(10));
        freqs.insert(Frequency(11));
        let mut c = Constellation::new(4, "Deep Space", Color::rgb(0, 128, 255), freqs).unwrap();
        c.visible = false;

        let back = Constellation::from_cfg(&c.to_cfg()).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn test_cfg_missing_name() {
        let mut node = CfgNode::new(CONSTELLATION_NODE);
        node.add_value("id", 2);
        assert!(matches!(
            Constellation::from_cfg(&node),
            Err(ModelError::MissingField { .. })
        ));
    }

    #[test]
    fn test_order_by_id() {
        let mut list = vec![
            Constellation::on_frequency(2, "B", Color::WHITE, Frequency(2)),
            Constellation::on_frequency(0, "Public", Color::WHITE, Frequency(0)),
            Constellation::on_frequency(1, "A", Color::WHITE, Frequency(1)),
        ];
        list.sort();
        let ids: Vec<_> = list.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }
}
