// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Record classification policy
//!
//! The string heuristics that decide which records are annotation-only text
//! carriers and which block names are drawing noise are a policy, not
//! fusion logic. They live behind a trait so the collector and fusion
//! engine stay decision-table-agnostic.

use crate::types::{FusedElement, RecordKind};

/// Classification policy consulted by the collector and the fusion engine.
pub trait RecordClassifier {
    /// Display names marking annotation-only instances (pure text carriers
    /// that decorate a nearby symbol, e.g. circuit markers).
    fn is_annotation_name(&self, name: &str) -> bool;

    /// Block names that never produce records (construction geometry,
    /// external references, anonymous blocks).
    fn is_noise_name(&self, name: &str) -> bool;

    /// Whether a collected record is a pure text carrier.
    fn is_carrier(&self, record: &FusedElement) -> bool {
        matches!(record.kind, RecordKind::Text) || self.is_annotation_name(&record.name)
    }
}

/// Default policy: substring markers over display names.
#[derive(Debug, Clone)]
pub struct MarkerClassifier {
    /// Names containing any of these are annotation-only.
    pub annotation_markers: Vec<String>,
    /// Names containing any of these are skipped entirely.
    pub noise_markers: Vec<String>,
}

impl Default for MarkerClassifier {
    fn default() -> Self {
        Self {
            annotation_markers: vec!["Schaltkreis_".to_owned()],
            noise_markers: vec!["Polygonsäule".to_owned(), "_Oblique".to_owned()],
        }
    }
}

impl RecordClassifier for MarkerClassifier {
    fn is_annotation_name(&self, name: &str) -> bool {
        self.annotation_markers.iter().any(|m| name.contains(m))
    }

    fn is_noise_name(&self, name: &str) -> bool {
        // Anonymous blocks and external references are structural noise
        // regardless of configuration.
        name.starts_with('*')
            || name.starts_with("XREF")
            || self.noise_markers.iter().any(|m| name.contains(m))
    }
}
