//! Frequencies and duplicate-free frequency sets

use crate::{ModelError, Result};
use cfg_node::CfgNode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Section holding a frequency list in persisted documents.
pub const FREQUENCIES_NODE: &str = "Frequencies";
pub const FREQUENCY_KEY: &str = "frequency";

/// A discrete channel identifier. Two participants can only link when they
/// share at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Frequency(pub u16);

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Frequency {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.trim().parse().map(Frequency)
    }
}

impl From<u16> for Frequency {
    fn from(value: u16) -> Self {
        Frequency(value)
    }
}

/// Ascending, duplicate-free set of frequencies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Frequency>", into = "Vec<Frequency>")]
pub struct FrequencyList(Vec<Frequency>);

impl FrequencyList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Insert keeping ascending order. Returns `false` if already present.
    pub fn insert(&mut self, frequency: Frequency) -> bool {
        match self.0.binary_search(&frequency) {
            Ok(_) => false,
            Err(pos) => {
                self.0.insert(pos, frequency);
                true
            }
        }
    }

    pub fn remove(&mut self, frequency: Frequency) -> bool {
        match self.0.binary_search(&frequency) {
            Ok(pos) => {
                self.0.remove(pos);
                true
            }
            Err(_) => false,
        }
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn contains(&self, frequency: Frequency) -> bool {
        self.0.binary_search(&frequency).is_ok()
    }

    /// Lowest frequency present in both sets.
    pub fn first_common(&self, other: &FrequencyList) -> Option<Frequency> {
        self.0.iter().copied().find(|f| other.contains(*f))
    }

    pub fn intersects(&self, other: &FrequencyList) -> bool {
        self.first_common(other).is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Frequency> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &[Frequency] {
        &self.0
    }

    /// Write as a `Frequencies` section with one `frequency` value per entry.
    pub fn to_cfg(&self) -> CfgNode {
        let mut node = CfgNode::new(FREQUENCIES_NODE);
        for f in &self.0 {
            node.add_value(FREQUENCY_KEY, f);
        }
        node
    }

    /// Read from a `Frequencies` section. Duplicates are rejected.
    pub fn from_cfg(node: &CfgNode) -> Result<Self> {
        let mut list = FrequencyList::new();
        for raw in node.get_values(FREQUENCY_KEY) {
            let frequency: Frequency = raw.parse().map_err(|_| {
                cfg_node::CfgError::InvalidValue {
                    key: FREQUENCY_KEY.to_string(),
                    value: raw.to_string(),
                }
            })?;
            if !list.insert(frequency) {
                return Err(ModelError::DuplicateFrequency(frequency));
            }
        }
        Ok(list)
    }
}

impl TryFrom<Vec<Frequency>> for FrequencyList {
    type Error = ModelError;

    fn try_from(values: Vec<Frequency>) -> Result<Self> {
        let mut list = FrequencyList::new();
        for f in values {
            if !list.insert(f) {
                return Err(ModelError::DuplicateFrequency(f));
            }
        }
        Ok(list)
    }
}

impl From<FrequencyList> for Vec<Frequency> {
    fn from(list: FrequencyList) -> Self {
        list.0
    }
}

impl From<Frequency> for FrequencyList {
    fn from(frequency: Frequency) -> Self {
        Self(vec![frequency])
    }
}

impl fmt::Display for FrequencyList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|x| x.to_string()).collect();
        write!(f, "[{}]", parts.join(", "))
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    proptest! {
        #[test]
        fn insert_keeps_sorted_set(values in proptest::collection::vec(0u16..32, 0..24)) {
            let mut freqs = FrequencyList::new();
            for v in &values {
                freqs.insert(Frequency(*v));
            }
            let expected: Vec<Frequency> = values.iter().copied().collect::<BTreeSet<_>>().into_iter().map(Frequency).collect();
            prop_assert_eq!(freqs.as_slice(), expected.as_slice());
        }

        #[test]
        fn first_common_is_lowest_shared(
            a in proptest::collection::btree_set(0u16..16, 0..8),
            b in proptest::collection::btree_set(0u16..16, 0..8),
        ) {
            let fa: FrequencyList = a.iter().map(|v| Frequency(*v)).collect::<Vec<_>>().try_into().unwrap();
            let fb: FrequencyList = b.iter().map(|v| Frequency(*v)).collect::<Vec<_>>().try_into().unwrap();
            let lowest = a.intersection(&b).next().copied().map(Frequency);
            prop_assert_eq!(fa.first_common(&fb), lowest);
            prop_assert_eq!(fa.intersects(&fb), fb.intersects(&fa));
        }
    }
}
