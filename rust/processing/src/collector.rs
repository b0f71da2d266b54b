// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entity collection
//!
//! Walks the reader's entities in document order and produces the raw
//! identity -> record map. Symbol instances get their block-internal text
//! flattened and cleaned; a single-pass continuation fold appends
//! annotation instances to the element they decorate, relying on document
//! order placing an annotation immediately after its symbol. Non-adjacent
//! matches are left to the fusion engine.

use crate::policy::RecordClassifier;
use crate::types::{FusedElement, FusionConfig, RecordKind};
use planfuse_core::{
    clean_fragment, final_layer_segment, name_prefix, strip_last_dash_part, EntityHandle,
    EntityKind, Point2D, SourceEntity,
};
use planfuse_geometry::Transform2D;
use rustc_hash::FxHashMap;
use tracing::debug;

/// Accumulator threaded through the document walk; always describes the
/// most recently created record.
struct FoldState {
    handle: EntityHandle,
    layer: String,
    name: String,
    position: Point2D,
}

/// Collect raw records from the reader's entities.
///
/// Best-effort: noise blocks and empty text fragments are skipped, nothing
/// aborts the walk.
pub fn collect_records(
    entities: &[SourceEntity],
    transform: &Transform2D,
    config: &FusionConfig,
    classifier: &dyn RecordClassifier,
) -> FxHashMap<EntityHandle, FusedElement> {
    let mut records: FxHashMap<EntityHandle, FusedElement> = FxHashMap::default();
    let mut state: Option<FoldState> = None;

    for entity in entities {
        let image_position = transform.apply(entity.position);
        match &entity.kind {
            EntityKind::Text { content } => {
                let text = clean_fragment(content);
                if text.is_empty() {
                    continue;
                }
                records.insert(
                    entity.handle.clone(),
                    FusedElement {
                        handle: entity.handle.clone(),
                        kind: RecordKind::Text,
                        name: String::new(),
                        layer: entity.layer.trim().to_owned(),
                        color: entity.color,
                        position: entity.position,
                        image_position,
                        text,
                        merged_from: None,
                        grid: None,
                    },
                );
            }
            EntityKind::Symbol { name, children } => {
                let name = name.trim();
                let layer = entity.layer.trim();
                if classifier.is_noise_name(name) {
                    debug!(handle = %entity.handle, name, "skipping noise block");
                    continue;
                }

                let mut text = String::new();
                for child in children.iter() {
                    let frag = clean_fragment(&child.text);
                    if frag.is_empty() {
                        continue;
                    }
                    if !text.is_empty() {
                        text.push(' ');
                    }
                    text.push_str(&frag);
                }

                // Continuation rules compare the raw layer/name of adjacent
                // instances, before normalization.
                if let Some(prev) = &state {
                    if is_continuation(prev, name, layer, entity.position, config, classifier) {
                        if let Some(owner) = records.get_mut(&prev.handle) {
                            owner.append_text(&text);
                            owner.record_merge(entity.handle.clone());
                        }
                        continue;
                    }
                }

                let (norm_name, norm_layer) = normalize_record(name, layer, config);
                records.insert(
                    entity.handle.clone(),
                    FusedElement {
                        handle: entity.handle.clone(),
                        kind: RecordKind::Symbol,
                        name: norm_name,
                        layer: norm_layer,
                        color: entity.color,
                        position: entity.position,
                        image_position,
                        text,
                        merged_from: None,
                        grid: None,
                    },
                );
                state = Some(FoldState {
                    handle: entity.handle.clone(),
                    layer: layer.to_owned(),
                    name: name.to_owned(),
                    position: entity.position,
                });
            }
        }
    }

    records
}

/// Does the current instance continue the previous element instead of
/// starting a new one? Checked in priority order.
fn is_continuation(
    prev: &FoldState,
    name: &str,
    layer: &str,
    position: Point2D,
    config: &FusionConfig,
    classifier: &dyn RecordClassifier,
) -> bool {
    // 1. The previous element's companion text layer.
    if layer.strip_suffix(config.text_layer_suffix.as_str()) == Some(prev.layer.as_str()) {
        return true;
    }
    // 2. An annotation instance placed right next to the previous one.
    if classifier.is_annotation_name(name)
        && prev.position.distance_to(&position) < config.adjacency_threshold
    {
        return true;
    }
    // 3. Same layer, and only the current instance is annotation-only.
    if prev.layer == layer
        && classifier.is_annotation_name(name)
        && !classifier.is_annotation_name(&prev.name)
    {
        return true;
    }
    false
}

/// Name/layer cleanup for inconsistent source data.
///
/// `$`-qualified planning layers reduce to their final segment minus the
/// trailing dash part, and the block name to its leading token. Plain
/// layers are only dash-stripped when configured, since that would erase
/// the companion-text suffix.
fn normalize_record(name: &str, layer: &str, config: &FusionConfig) -> (String, String) {
    if layer.contains('$') || name.contains('$') {
        (
            name_prefix(name).to_owned(),
            strip_last_dash_part(final_layer_segment(layer)).to_owned(),
        )
    } else if config.normalize_plain_layers && layer.contains('-') {
        (name.to_owned(), strip_last_dash_part(layer).to_owned())
    } else {
        (name.to_owned(), layer.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::MarkerClassifier;
    use planfuse_core::{ChildPrimitive, Rgb};

    fn symbol(handle: &str, layer: &str, name: &str, pos: (f64, f64), texts: &[&str]) -> SourceEntity {
        SourceEntity {
            handle: handle.into(),
            layer: layer.into(),
            color: Rgb(10, 20, 30),
            position: Point2D::new(pos.0, pos.1),
            kind: EntityKind::Symbol {
                name: name.into(),
                children: texts
                    .iter()
                    .map(|t| ChildPrimitive::new(*t, Point2D::new(pos.0, pos.1)))
                    .collect(),
            },
        }
    }

    fn text(handle: &str, layer: &str, pos: (f64, f64), content: &str) -> SourceEntity {
        SourceEntity {
            handle: handle.into(),
            layer: layer.into(),
            color: Rgb::UNRESOLVED,
            position: Point2D::new(pos.0, pos.1),
            kind: EntityKind::Text {
                content: content.into(),
            },
        }
    }

    fn collect(entities: &[SourceEntity]) -> FxHashMap<EntityHandle, FusedElement> {
        collect_records(
            entities,
            &Transform2D::IDENTITY,
            &FusionConfig::default(),
            &MarkerClassifier::default(),
        )
    }

    #[test]
    fn child_text_is_cleaned_and_concatenated() {
        let records = collect(&[symbol(
            "A1",
            "ADE_ET_NSV_Steckdose",
            "1xAP-SD",
            (10.0, 10.0),
            &[r"\fArial|b0;16A", "", "CEE 3,5"],
        )]);
        let r = &records[&EntityHandle::new("A1")];
        assert_eq!(r.text, "16A CEE 3.5");
        assert_eq!(r.color, Rgb(10, 20, 30));
    }

    #[test]
    fn companion_text_layer_continues_previous() {
        let records = collect(&[
            symbol("A1", "ADE_ET_BEL", "Leuchte", (0.0, 0.0), &["L1"]),
            symbol("A2", "ADE_ET_BEL-TXT", "Label", (500.0, 500.0), &["3x58W"]),
        ]);
        assert_eq!(records.len(), 1);
        let r = &records[&EntityHandle::new("A1")];
        assert_eq!(r.text, "L1 3x58W");
        assert_eq!(r.merged_from.as_deref(), Some(&["A2".into()][..]));
    }

    #[test]
    fn nearby_annotation_continues_previous() {
        let records = collect(&[
            symbol("A1", "ADE_ET_NSV", "1xAP-SD", (100.0, 100.0), &[]),
            symbol("A2", "OTHER", "Schaltkreis_7", (105.0, 102.0), &["SK7"]),
        ]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[&EntityHandle::new("A1")].text, "SK7");
    }

    #[test]
    fn distant_annotation_starts_its_own_record() {
        let records = collect(&[
            symbol("A1", "ADE_ET_NSV", "1xAP-SD", (100.0, 100.0), &[]),
            symbol("A2", "OTHER", "Schaltkreis_7", (400.0, 400.0), &["SK7"]),
        ]);
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn same_layer_annotation_after_symbol_continues() {
        let records = collect(&[
            symbol("A1", "ADE_ET_NSV", "1xAP-SD", (0.0, 0.0), &[]),
            symbol("A2", "ADE_ET_NSV", "Schaltkreis_3", (900.0, 0.0), &["SK3"]),
        ]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[&EntityHandle::new("A1")].text, "SK3");
    }

    #[test]
    fn annotation_after_annotation_on_same_layer_is_new_record() {
        // Rule 3 requires the previous record NOT to be annotation-only.
        let records = collect(&[
            symbol("A1", "L", "Schaltkreis_1", (0.0, 0.0), &["a"]),
            symbol("A2", "L", "Schaltkreis_2", (900.0, 0.0), &["b"]),
        ]);
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn noise_blocks_are_skipped() {
        let records = collect(&[
            symbol("A1", "L", "*U73", (0.0, 0.0), &[]),
            symbol("A2", "L", "XREF_Grundriss", (0.0, 0.0), &[]),
            symbol("A3", "L", "Polygonsäule 30x30", (0.0, 0.0), &[]),
            symbol("A4", "L", "Leuchte", (0.0, 0.0), &[]),
        ]);
        assert_eq!(records.len(), 1);
        assert!(records.contains_key(&EntityHandle::new("A4")));
    }

    #[test]
    fn free_text_becomes_carrier_record_unless_empty() {
        let records = collect(&[
            text("T1", "X", (1.0, 2.0), "{\\fArial;Verteiler UV-2}"),
            text("T2", "X", (3.0, 4.0), r"\fArial|b0;"),
        ]);
        assert_eq!(records.len(), 1);
        let r = &records[&EntityHandle::new("T1")];
        assert_eq!(r.kind, RecordKind::Text);
        assert_eq!(r.text, "Verteiler UV-2");
    }

    #[test]
    fn text_entities_do_not_disturb_the_fold() {
        let records = collect(&[
            symbol("A1", "ADE_ET_BEL", "Leuchte", (0.0, 0.0), &[]),
            text("T1", "NOTES", (700.0, 700.0), "irrelevant"),
            symbol("A2", "ADE_ET_BEL-TXT", "Label", (0.0, 0.0), &["2x36W"]),
        ]);
        // The label still folds into A1 across the interleaved text entity.
        assert_eq!(records[&EntityHandle::new("A1")].text, "2x36W");
        assert!(!records.contains_key(&EntityHandle::new("A2")));
    }

    #[test]
    fn qualified_layers_are_normalized() {
        let records = collect(&[symbol(
            "A1",
            "Vorplanung$0$ADE_ET_BEL-TXT",
            "Vorplanung$Kabelkanal_A01KSXVQXE",
            (0.0, 0.0),
            &[],
        )]);
        let r = &records[&EntityHandle::new("A1")];
        assert_eq!(r.layer, "ADE_ET_BEL");
        assert_eq!(r.name, "Kabelkanal");
    }

    #[test]
    fn image_positions_use_the_transform() {
        let t = Transform2D::from_rows([2.0, 0.0, 10.0], [0.0, 2.0, -10.0]);
        let records = collect_records(
            &[symbol("A1", "L", "Leuchte", (5.0, 5.0), &[])],
            &t,
            &FusionConfig::default(),
            &MarkerClassifier::default(),
        );
        let r = &records[&EntityHandle::new("A1")];
        assert_eq!(r.image_position, Point2D::new(20.0, 0.0));
        assert_eq!(r.position, Point2D::new(5.0, 5.0));
    }
}
