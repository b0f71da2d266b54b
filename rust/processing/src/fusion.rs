// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Spatial fusion engine
//!
//! Merges free-standing text records into the symbol records they visually
//! belong to, in two passes:
//!
//! - **Pass A** consolidates annotation-pattern carriers into the nearest
//!   layer-compatible owner, at any distance.
//! - **Pass B** fills remaining empty-text records from the nearest
//!   same/companion-layer donor within a bounded distance.
//!
//! Nearest selection is deterministic: strictly smaller distance wins,
//! equal distance resolves by ascending handle. Both passes scan candidates
//! in handle-sorted order, so ties keep the first-seen (smallest) handle.
//! Carriers that end up with no owner are never silently lost; they land in
//! the unattached audit list.

use crate::policy::RecordClassifier;
use crate::types::{FusedElement, FusionConfig, RecordKind};
use planfuse_core::EntityHandle;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::hash_map::Entry;
use tracing::{debug, warn};

/// Result of running both fusion passes.
#[derive(Debug, Clone)]
pub struct FusionOutcome {
    /// Surviving records; at most as many as went in.
    pub elements: FxHashMap<EntityHandle, FusedElement>,
    /// Carriers that found no owner, kept for audit.
    pub unattached: Vec<FusedElement>,
}

/// Run both fusion passes over the collector's output.
///
/// Idempotent on a set with no remaining empty-text orphans: a second run
/// finds no carriers and no donors and changes nothing.
pub fn fuse(
    records: FxHashMap<EntityHandle, FusedElement>,
    config: &FusionConfig,
    classifier: &dyn RecordClassifier,
) -> FusionOutcome {
    let mut elements = records;
    let mut unattached = Vec::new();
    consolidate_carriers(&mut elements, &mut unattached, config, classifier);
    resolve_empty_text(&mut elements, config, classifier);
    FusionOutcome {
        elements,
        unattached,
    }
}

fn sorted_handles(records: &FxHashMap<EntityHandle, FusedElement>) -> Vec<EntityHandle> {
    let mut handles: Vec<EntityHandle> = records.keys().cloned().collect();
    handles.sort();
    handles
}

/// Pass A: annotation-pattern records are pure text carriers, never
/// independent elements. Each carrier picks its nearest layer-compatible
/// owner; per owner only the single closest carrier is kept and absorbed.
fn consolidate_carriers(
    records: &mut FxHashMap<EntityHandle, FusedElement>,
    unattached: &mut Vec<FusedElement>,
    config: &FusionConfig,
    classifier: &dyn RecordClassifier,
) {
    let handles = sorted_handles(records);
    let carriers: Vec<EntityHandle> = handles
        .iter()
        .filter(|h| {
            let r = &records[*h];
            r.kind == RecordKind::Symbol && classifier.is_annotation_name(&r.name)
        })
        .cloned()
        .collect();
    // Free text records are carriers too (pass B material), never owners.
    let owners: Vec<EntityHandle> = handles
        .iter()
        .filter(|h| !classifier.is_carrier(&records[*h]))
        .cloned()
        .collect();

    // owner -> (distance, carrier). Carriers iterate in ascending handle
    // order and only a strictly smaller distance replaces, so distance ties
    // keep the first-seen carrier.
    let mut best: FxHashMap<EntityHandle, (f64, EntityHandle)> = FxHashMap::default();
    let mut had_candidate: FxHashSet<EntityHandle> = FxHashSet::default();

    for c in &carriers {
        let carrier = &records[c];
        let mut nearest: Option<(f64, &EntityHandle)> = None;
        for o in &owners {
            let owner = &records[o];
            if !config.layers_compatible(&owner.layer, &carrier.layer) {
                continue;
            }
            let d = carrier.position.distance_to(&owner.position);
            if nearest.map_or(true, |(bd, _)| d < bd) {
                nearest = Some((d, o));
            }
        }
        if let Some((d, o)) = nearest {
            had_candidate.insert(c.clone());
            match best.entry(o.clone()) {
                Entry::Occupied(mut e) => {
                    if d < e.get().0 {
                        e.insert((d, c.clone()));
                    }
                }
                Entry::Vacant(e) => {
                    e.insert((d, c.clone()));
                }
            }
        }
    }

    let mut assignments: Vec<(EntityHandle, EntityHandle)> =
        best.into_iter().map(|(o, (_, c))| (o, c)).collect();
    assignments.sort();

    let mut absorbed: FxHashSet<EntityHandle> = FxHashSet::default();
    for (owner_handle, carrier_handle) in assignments {
        if let Some(donor) = records.remove(&carrier_handle) {
            if let Some(owner) = records.get_mut(&owner_handle) {
                owner.append_text(&donor.text);
                owner.record_merge(donor.handle.clone());
                debug!(owner = %owner_handle, carrier = %donor.handle, "carrier consolidated");
                absorbed.insert(carrier_handle);
            } else {
                records.insert(carrier_handle.clone(), donor);
            }
        }
    }

    for c in carriers {
        if absorbed.contains(&c) {
            continue;
        }
        if let Some(r) = records.remove(&c) {
            if had_candidate.contains(&c) {
                debug!(carrier = %r.handle, "carrier lost nearest-candidate selection");
            } else {
                warn!(carrier = %r.handle, layer = %r.layer, "carrier has no layer-compatible owner");
            }
            unattached.push(r);
        }
    }
}

/// Pass B: every remaining empty-text record adopts the text of the
/// nearest layer-compatible donor within the fusion threshold. Donors that
/// are pure text carriers are removed after absorption and excluded as
/// candidates for the rest of the pass.
fn resolve_empty_text(
    records: &mut FxHashMap<EntityHandle, FusedElement>,
    config: &FusionConfig,
    classifier: &dyn RecordClassifier,
) {
    let handles = sorted_handles(records);
    let mut removed: FxHashSet<EntityHandle> = FxHashSet::default();

    for h in &handles {
        if removed.contains(h) {
            continue;
        }
        let (layer, position) = match records.get(h) {
            Some(r) if r.text.is_empty() => (r.layer.clone(), r.position),
            _ => continue,
        };

        let mut nearest: Option<(f64, &EntityHandle)> = None;
        for o in &handles {
            if o == h || removed.contains(o) {
                continue;
            }
            let Some(other) = records.get(o) else { continue };
            // A donor with nothing to give is no match.
            if other.text.is_empty() {
                continue;
            }
            if !config.layers_compatible(&layer, &other.layer) {
                continue;
            }
            let d = position.distance_to(&other.position);
            if d >= config.fusion_threshold {
                continue;
            }
            if nearest.map_or(true, |(bd, _)| d < bd) {
                nearest = Some((d, o));
            }
        }

        if let Some((_, donor_handle)) = nearest {
            let donor_handle = donor_handle.clone();
            let donor_is_carrier = classifier.is_carrier(&records[&donor_handle]);
            let donor_text = records[&donor_handle].text.clone();
            if let Some(target) = records.get_mut(h) {
                target.append_text(&donor_text);
                target.record_merge(donor_handle.clone());
            }
            if donor_is_carrier {
                records.remove(&donor_handle);
                removed.insert(donor_handle);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::MarkerClassifier;
    use planfuse_core::{Point2D, Rgb};

    fn record(handle: &str, kind: RecordKind, name: &str, layer: &str, pos: (f64, f64), text: &str) -> FusedElement {
        FusedElement {
            handle: handle.into(),
            kind,
            name: name.into(),
            layer: layer.into(),
            color: Rgb::UNRESOLVED,
            position: Point2D::new(pos.0, pos.1),
            image_position: Point2D::new(pos.0, pos.1),
            text: text.into(),
            merged_from: None,
            grid: None,
        }
    }

    fn map(records: Vec<FusedElement>) -> FxHashMap<EntityHandle, FusedElement> {
        records.into_iter().map(|r| (r.handle.clone(), r)).collect()
    }

    fn run(records: Vec<FusedElement>) -> FusionOutcome {
        fuse(
            map(records),
            &FusionConfig::default(),
            &MarkerClassifier::default(),
        )
    }

    #[test]
    fn carrier_merges_into_nearest_compatible_owner() {
        let out = run(vec![
            record("A1", RecordKind::Symbol, "Dose", "X", (0.0, 0.0), ""),
            record("A2", RecordKind::Symbol, "Dose", "X", (1000.0, 0.0), ""),
            record("C1", RecordKind::Symbol, "Schaltkreis_1", "X", (100.0, 0.0), "SK1"),
        ]);
        assert_eq!(out.elements.len(), 2);
        assert_eq!(out.elements[&EntityHandle::new("A1")].text, "SK1");
        assert_eq!(out.elements[&EntityHandle::new("A2")].text, "");
        assert!(out.unattached.is_empty());
    }

    #[test]
    fn carrier_matches_owner_through_txt_suffix() {
        let out = run(vec![
            record("A1", RecordKind::Symbol, "Dose", "X", (0.0, 0.0), ""),
            record("C1", RecordKind::Symbol, "Schaltkreis_1", "X-TXT", (5000.0, 0.0), "SK1"),
        ]);
        // Pass A is unbounded in distance.
        assert_eq!(out.elements.len(), 1);
        assert_eq!(out.elements[&EntityHandle::new("A1")].text, "SK1");
    }

    #[test]
    fn owner_absorbs_only_the_closest_carrier() {
        let out = run(vec![
            record("A1", RecordKind::Symbol, "Dose", "X", (0.0, 0.0), ""),
            record("C1", RecordKind::Symbol, "Schaltkreis_1", "X", (50.0, 0.0), "near"),
            record("C2", RecordKind::Symbol, "Schaltkreis_2", "X", (80.0, 0.0), "far"),
        ]);
        let owner = &out.elements[&EntityHandle::new("A1")];
        assert_eq!(owner.text, "near");
        assert_eq!(owner.merged_from.as_deref(), Some(&["C1".into()][..]));
        // The losing carrier is not an element, and not lost either.
        assert_eq!(out.elements.len(), 1);
        assert_eq!(out.unattached.len(), 1);
        assert_eq!(out.unattached[0].handle, EntityHandle::new("C2"));
    }

    #[test]
    fn equidistant_carriers_tie_break_by_handle() {
        let out = run(vec![
            record("A1", RecordKind::Symbol, "Dose", "X", (0.0, 0.0), ""),
            record("C2", RecordKind::Symbol, "Schaltkreis_2", "X", (0.0, 60.0), "late"),
            record("C1", RecordKind::Symbol, "Schaltkreis_1", "X", (60.0, 0.0), "early"),
        ]);
        assert_eq!(out.elements[&EntityHandle::new("A1")].text, "early");
    }

    #[test]
    fn incompatible_carrier_goes_unattached() {
        let out = run(vec![
            record("A1", RecordKind::Symbol, "Dose", "X", (0.0, 0.0), ""),
            record("C1", RecordKind::Symbol, "Schaltkreis_1", "Z", (1.0, 0.0), "orphan"),
        ]);
        assert_eq!(out.elements.len(), 1);
        assert_eq!(out.elements[&EntityHandle::new("A1")].text, "");
        assert_eq!(out.unattached.len(), 1);
        assert_eq!(out.unattached[0].text, "orphan");
    }

    #[test]
    fn empty_symbol_adopts_nearby_text_carrier() {
        // Symbol at (100,100), carrier at (105,102) on the companion
        // text layer.
        let out = run(vec![
            record("A1", RecordKind::Symbol, "Dose", "X", (100.0, 100.0), ""),
            record("T1", RecordKind::Text, "", "X-TXT", (105.0, 102.0), "3x16A"),
        ]);
        assert_eq!(out.elements.len(), 1);
        let owner = &out.elements[&EntityHandle::new("A1")];
        assert_eq!(owner.text, "3x16A");
        assert_eq!(owner.position, Point2D::new(100.0, 100.0));
        assert!(out.unattached.is_empty());
    }

    #[test]
    fn pass_b_respects_distance_threshold() {
        let out = run(vec![
            record("A1", RecordKind::Symbol, "Dose", "X", (100.0, 100.0), ""),
            record("T1", RecordKind::Text, "", "X", (200.0, 100.0), "too far"),
        ]);
        assert_eq!(out.elements[&EntityHandle::new("A1")].text, "");
        assert_eq!(out.elements.len(), 2);
    }

    #[test]
    fn pass_b_symbol_donor_keeps_its_text() {
        let out = run(vec![
            record("A1", RecordKind::Symbol, "Dose", "X", (0.0, 0.0), ""),
            record("A2", RecordKind::Symbol, "Dose", "X", (5.0, 0.0), "shared"),
        ]);
        assert_eq!(out.elements.len(), 2);
        assert_eq!(out.elements[&EntityHandle::new("A1")].text, "shared");
        assert_eq!(out.elements[&EntityHandle::new("A2")].text, "shared");
    }

    #[test]
    fn absorbed_carrier_is_not_an_owner_candidate() {
        // T1 is absorbed by A1 first; A2 must not also absorb T1.
        let out = run(vec![
            record("A1", RecordKind::Symbol, "Dose", "X", (0.0, 0.0), ""),
            record("A2", RecordKind::Symbol, "Dose", "X", (6.0, 0.0), ""),
            record("T1", RecordKind::Text, "", "X", (2.0, 0.0), "once"),
        ]);
        assert_eq!(out.elements.len(), 2);
        assert_eq!(out.elements[&EntityHandle::new("A1")].text, "once");
        // A2 then adopts from A1, the remaining in-range donor.
        assert_eq!(out.elements[&EntityHandle::new("A2")].text, "once");
        assert_eq!(
            out.elements[&EntityHandle::new("A2")].merged_from.as_deref(),
            Some(&["A1".into()][..])
        );
    }

    #[test]
    fn fusion_is_idempotent_once_settled() {
        let first = run(vec![
            record("A1", RecordKind::Symbol, "Dose", "X", (100.0, 100.0), ""),
            record("T1", RecordKind::Text, "", "X-TXT", (105.0, 102.0), "3x16A"),
            record("C1", RecordKind::Symbol, "Schaltkreis_1", "X", (90.0, 100.0), "SK1"),
        ]);
        let second = fuse(
            first.elements.clone(),
            &FusionConfig::default(),
            &MarkerClassifier::default(),
        );
        assert_eq!(second.elements, first.elements);
        assert!(second.unattached.is_empty());
    }

    #[test]
    fn no_text_is_duplicated_or_lost_in_pass_a() {
        let records = vec![
            record("A1", RecordKind::Symbol, "Dose", "X", (0.0, 0.0), "base"),
            record("A2", RecordKind::Symbol, "Dose", "Y", (500.0, 0.0), ""),
            record("C1", RecordKind::Symbol, "Schaltkreis_1", "X", (10.0, 0.0), "sk1"),
            record("C2", RecordKind::Symbol, "Schaltkreis_2", "Y", (510.0, 0.0), "sk2"),
            record("C3", RecordKind::Symbol, "Schaltkreis_3", "Q", (0.0, 0.0), "sk3"),
        ];
        let total_before: usize = records.iter().map(|r| r.text.len()).sum();
        let out = run(records);
        let total_after: usize = out
            .elements
            .values()
            .chain(out.unattached.iter())
            .map(|r| r.text.len())
            .sum();
        // Separators are the only growth: one space per absorbed fragment
        // appended to non-empty text.
        let separators = 1; // "base" + " sk1"
        assert_eq!(total_after, total_before + separators);
        assert_eq!(out.unattached.len(), 1);
        assert_eq!(out.unattached[0].text, "sk3");
    }
}
