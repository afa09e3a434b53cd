//! Load-time reconciliation of persisted stations against host templates
//!
//! The host only knows its built-in stations. Every additional station a
//! player created lives solely in the save and has to be re-created from a
//! clonable template on each load, then have its persisted overrides applied.

use crate::{GroundStation, Result, StationError, StationRecord, StationRegistry};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, error, info, warn};

/// Built-in station cloned for user-defined stations. The primary (capital)
/// station carries host-only properties and is never cloned.
pub const DEFAULT_REFERENCE_STATION: &str = "Kerbin: Baikerbanur";

/// Host-provided station templates.
pub trait TemplateSource {
    fn templates(&self) -> Vec<GroundStation>;

    /// Instantiate a new station object from a template.
    fn instantiate(&self, template: &GroundStation) -> GroundStation {
        template.clone()
    }
}

impl TemplateSource for Vec<GroundStation> {
    fn templates(&self) -> Vec<GroundStation> {
        self.clone()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Stations created from the reference template
    pub synthesized: Vec<String>,
    /// Stations that received persisted overrides
    pub updated: Vec<String>,
    /// Duplicate or unplaceable keys that were skipped
    pub rejected: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Reconciler {
    reference_key: String,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new(DEFAULT_REFERENCE_STATION)
    }
}

impl Reconciler {
    pub fn new(reference_key: impl Into<String>) -> Self {
        Self {
            reference_key: reference_key.into(),
        }
    }

    pub fn reference_key(&self) -> &str {
        &self.reference_key
    }

    /// Merge `records` into the host's template set. The records are
    /// consumed; the returned registry is sorted by key.
    pub fn reconcile(
        &self,
        source: &dyn TemplateSource,
        records: Vec<StationRecord>,
    ) -> (StationRegistry, ReconcileReport) {
        let templates = source.templates();
        let mut registry = StationRegistry::new();
        let mut report = ReconcileReport::default();

        for template in &templates {
            if let Err(e) = registry.insert(template.clone()) {
                error!("Host template rejected: {}", e);
                report.rejected.push(template.key.clone());
            }
        }
        registry.sort();

        let reference = self.reference_template(&templates);
        let mut seen: HashSet<String> = HashSet::new();

        for record in records {
            if !seen.insert(record.key.clone()) {
                error!("Duplicate persisted ground station '{}' ignored", record.key);
                report.rejected.push(record.key);
                continue;
            }

            if !registry.contains(&record.key) {
                let station = match synthesize(source, reference, &record.key) {
                    Ok(station) => station,
                    Err(e) => {
                        error!("Cannot create ground station: {}", e);
                        report.rejected.push(record.key);
                        continue;
                    }
                };
                if let Err(e) = registry.insert(station) {
                    error!("Custom ground station '{}' not added: {}", record.key, e);
                    report.rejected.push(record.key);
                    continue;
                }
                debug!("Custom ground station '{}' added", record.key);
                report.synthesized.push(record.key.clone());
            }

            match registry.get_mut(&record.key) {
                Ok(station) => {
                    station.apply_record(&record);
                    report.updated.push(record.key);
                }
                Err(e) => error!("Persisted ground station not applied: {}", e),
            }
        }

        registry.sort();

        info!(
            "Reconciled {} ground stations ({} created, {} updated, {} rejected)",
            registry.len(),
            report.synthesized.len(),
            report.updated.len(),
            report.rejected.len()
        );

        (registry, report)
    }

    fn reference_template<'a>(&self, templates: &'a [GroundStation]) -> Option<&'a GroundStation> {
        if let Some(t) = templates
            .iter()
            .find(|t| t.key == self.reference_key && !t.is_primary)
        {
            return Some(t);
        }

        let fallback = templates.iter().find(|t| !t.is_primary);
        if let Some(t) = fallback {
            warn!(
                "Reference station '{}' not available, cloning '{}' instead",
                self.reference_key, t.key
            );
        }
        fallback
    }
}

/// Clone `reference` under a new key. Never yields a primary station.
fn synthesize(
    source: &dyn TemplateSource,
    reference: Option<&GroundStation>,
    key: &str,
) -> Result<GroundStation> {
    let reference = reference.ok_or_else(|| StationError::NoReferenceTemplate(key.to_string()))?;
    let mut station = source.instantiate(reference);
    station.rekey(key);
    station.is_primary = false;
    Ok(station)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GeoLocation;
    use comm_model::{Color, Frequency, FrequencyList};

    fn freqs(values: &[u16]) -> FrequencyList {
        let mut list = FrequencyList::new();
        for v in values {
            list.insert(Frequency(*v));
        }
        list
    }

    fn at(lat: f64, lon: f64) -> GeoLocation {
        GeoLocation {
            latitude: lat,
            longitude: lon,
            altitude_m: 70.0,
        }
    }

    fn host_templates() -> Vec<GroundStation> {
        vec![
            GroundStation::new("Kerbin: KSC", freqs(&[0]), 5.0e11, at(-0.1, -74.6)).primary(),
            GroundStation::new("Kerbin: Baikerbanur", freqs(&[0]), 2.0e11, at(20.7, -146.4)),
            GroundStation::new("Kerbin: Crater Rim", freqs(&[0]), 2.0e11, at(9.5, -172.1)),
            GroundStation::new("Kerbin: Alpha", freqs(&[0, 1]), 2.0e11, at(12.0, 30.0)),
        ]
    }

    #[test]
    fn test_templates_only() {
        let (registry, report) = Reconciler::default().reconcile(&host_templates(), Vec::new());
        assert_eq!(
            registry.keys().collect::<Vec<_>>(),
            vec!["Kerbin: Alpha", "Kerbin: Baikerbanur", "Kerbin: Crater Rim", "Kerbin: KSC"]
        );
        assert_eq!(report, ReconcileReport::default());
    }

    #[test]
    fn test_synthesizes_missing_station() {
        let record = StationRecord {
            key: "Mun: Farside".to_string(),
            name: Some("Farside Relay".to_string()),
            color: Some(Color::rgb(255, 0, 0)),
            frequencies: freqs(&[4, 5]),
        };
        let (registry, report) = Reconciler::default().reconcile(&host_templates(), vec![record]);

        let station = registry.get("Mun: Farside").unwrap();
        assert!(!station.is_primary);
        assert_eq!(station.name, "Farside Relay");
        assert_eq!(station.frequencies, freqs(&[4, 5]));
        assert_eq!(station.handle.station_key(), Some("Mun: Farside"));
        // cloned from the reference template, not from the primary
        assert_eq!(station.location, at(20.7, -146.4));
        assert_eq!(station.handle.relay_power, 2.0e11);
        assert_eq!(report.synthesized, vec!["Mun: Farside".to_string()]);
    }

    #[test]
    fn test_synthesized_station_with_empty_frequencies() {
        let record = StationRecord::new("K", FrequencyList::new());
        let (registry, _) = Reconciler::default().reconcile(&host_templates(), vec![record]);
        let station = registry.get("K").unwrap();
        assert!(station.frequencies.is_empty());
        assert!(!station.is_primary);
    }

    #[test]
    fn test_explicit_empty_overrides_template_default() {
        let record = StationRecord::new("Kerbin: Alpha", FrequencyList::new());
        let (registry, report) = Reconciler::default().reconcile(&host_templates(), vec![record]);

        assert!(registry.get("Kerbin: Alpha").unwrap().frequencies.is_empty());
        assert!(report.synthesized.is_empty());
        assert_eq!(report.updated, vec!["Kerbin: Alpha".to_string()]);
    }

    #[test]
    fn test_existing_primary_keeps_flag() {
        let record = StationRecord::new("Kerbin: KSC", freqs(&[0, 2]));
        let (registry, _) = Reconciler::default().reconcile(&host_templates(), vec![record]);
        let ksc = registry.get("Kerbin: KSC").unwrap();
        assert!(ksc.is_primary);
        assert_eq!(ksc.frequencies, freqs(&[0, 2]));
    }

    #[test]
    fn test_duplicate_record_rejected() {
        let records = vec![
            StationRecord::new("X", freqs(&[1])),
            StationRecord::new("X", freqs(&[2])),
        ];
        let (registry, report) = Reconciler::default().reconcile(&host_templates(), records);
        assert_eq!(registry.get("X").unwrap().frequencies, freqs(&[1]));
        assert_eq!(report.rejected, vec!["X".to_string()]);
    }

    #[test]
    fn test_duplicate_template_rejected() {
        let mut templates = host_templates();
        templates.push(GroundStation::new("Kerbin: Alpha", freqs(&[9]), 1.0, at(0.0, 0.0)));
        let (registry, report) = Reconciler::default().reconcile(&templates, Vec::new());
        assert_eq!(registry.len(), 4);
        assert_eq!(registry.get("Kerbin: Alpha").unwrap().frequencies, freqs(&[0, 1]));
        assert_eq!(report.rejected, vec!["Kerbin: Alpha".to_string()]);
    }

    #[test]
    fn test_fallback_reference_skips_primary() {
        let templates = vec![
            GroundStation::new("Kerbin: KSC", freqs(&[0]), 5.0e11, at(-0.1, -74.6)).primary(),
            GroundStation::new("Kerbin: Crater Rim", freqs(&[0]), 2.0e11, at(9.5, -172.1)),
        ];
        let (registry, _) =
            Reconciler::default().reconcile(&templates, vec![StationRecord::new("New", freqs(&[3]))]);
        assert_eq!(registry.get("New").unwrap().location, at(9.5, -172.1));
    }

    #[test]
    fn test_no_clonable_template() {
        let templates =
            vec![GroundStation::new("Kerbin: KSC", freqs(&[0]), 5.0e11, at(-0.1, -74.6)).primary()];
        let (registry, report) =
            Reconciler::default().reconcile(&templates, vec![StationRecord::new("New", freqs(&[3]))]);
        assert!(!registry.contains("New"));
        assert_eq!(report.rejected, vec!["New".to_string()]);

        let err = synthesize(&templates, None, "New").unwrap_err();
        assert!(matches!(err, StationError::NoReferenceTemplate(k) if k == "New"));
    }

    #[test]
    fn test_custom_instantiate_is_used() {
        struct Tagging(Vec<GroundStation>);

        impl TemplateSource for Tagging {
            fn templates(&self) -> Vec<GroundStation> {
                self.0.clone()
            }

            fn instantiate(&self, template: &GroundStation) -> GroundStation {
                let mut s = template.clone();
                s.location.altitude_m = -1.0;
                s
            }
        }

        let source = Tagging(host_templates());
        let (registry, _) =
            Reconciler::default().reconcile(&source, vec![StationRecord::new("New", freqs(&[3]))]);
        assert_eq!(registry.get("New").unwrap().location.altitude_m, -1.0);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::GeoLocation;
    use comm_model::{Frequency, FrequencyList};
    use proptest::prelude::*;

    fn templates() -> Vec<GroundStation> {
        let here = GeoLocation {
            latitude: 0.0,
            longitude: 0.0,
            altitude_m: 0.0,
        };
        vec![
            GroundStation::new("Kerbin: KSC", FrequencyList::from(Frequency(0)), 5.0e11, here).primary(),
            GroundStation::new("Kerbin: Baikerbanur", FrequencyList::from(Frequency(0)), 2.0e11, here),
            GroundStation::new("S1", FrequencyList::from(Frequency(1)), 2.0e11, here),
        ]
    }

    fn record() -> impl Strategy<Value = StationRecord> {
        (
            prop_oneof![Just("S1".to_string()), Just("Kerbin: KSC".to_string()), "[A-Z]{1,3}"],
            proptest::collection::btree_set(0u16..8, 0..4),
        )
            .prop_map(|(key, set)| {
                let mut freqs = FrequencyList::new();
                for f in set {
                    freqs.insert(Frequency(f));
                }
                StationRecord::new(key, freqs)
            })
    }

    proptest! {
        #[test]
        fn reconcile_is_idempotent(records in proptest::collection::vec(record(), 0..8)) {
            let reconciler = Reconciler::default();
            let (once, _) = reconciler.reconcile(&templates(), records.clone());
            let (twice, _) = reconciler.reconcile(&templates(), records.clone());
            prop_assert_eq!(&once, &twice);

            // feeding the result back as templates changes nothing either
            let again_templates: Vec<GroundStation> = once.iter().cloned().collect();
            let (again, report) = reconciler.reconcile(&again_templates, records);
            prop_assert_eq!(&once, &again);
            prop_assert!(report.synthesized.is_empty());
        }

        #[test]
        fn every_record_key_exists(records in proptest::collection::vec(record(), 0..8)) {
            let (registry, _) = Reconciler::default().reconcile(&templates(), records.clone());
            for r in &records {
                prop_assert!(registry.contains(&r.key));
            }
            let keys: Vec<&str> = registry.keys().collect();
            let mut sorted = keys.clone();
            sorted.sort();
            prop_assert_eq!(keys, sorted);
        }
    }
}
