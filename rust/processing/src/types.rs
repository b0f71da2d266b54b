// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Record types and pipeline configuration

use planfuse_core::{EntityHandle, Point2D, Rgb};
use planfuse_geometry::GridAddress;
use serde::{Deserialize, Serialize};

/// Whether a record came from a placed symbol or from free-standing text.
///
/// Text records carry no symbol semantics; they exist only to donate their
/// content during fusion and are removed once absorbed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Symbol,
    Text,
}

/// One logical plan element, built up through the pipeline.
///
/// Created by the collector, mutated in place by the fusion engine (text
/// appended, absorbed siblings recorded), finalized by the grid addressor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FusedElement {
    pub handle: EntityHandle,
    pub kind: RecordKind,
    /// Display name of the placed block; empty for text records.
    pub name: String,
    pub layer: String,
    pub color: Rgb,
    /// Insertion point in drawing space.
    pub position: Point2D,
    /// Insertion point projected into the image frame.
    pub image_position: Point2D,
    /// Merged label text, possibly concatenated from several fragments.
    pub text: String,
    /// Handles of records absorbed into this one, in absorption order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merged_from: Option<Vec<EntityHandle>>,
    /// Grid address, attached last; `None` when the lookup failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid: Option<GridAddress>,
}

impl FusedElement {
    /// Append donated text, space-separated.
    pub fn append_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if !self.text.is_empty() {
            self.text.push(' ');
        }
        self.text.push_str(text);
    }

    /// Record that `donor` was absorbed into this element.
    pub fn record_merge(&mut self, donor: EntityHandle) {
        self.merged_from.get_or_insert_with(Vec::new).push(donor);
    }
}

/// Tunable thresholds and conventions for collection and fusion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusionConfig {
    /// Layer suffix marking companion text layers (`"X"` owns `"X-TXT"`).
    pub text_layer_suffix: String,
    /// Collector continuation distance, drawing units.
    pub adjacency_threshold: f64,
    /// Pass B nearest-donor distance, drawing units.
    pub fusion_threshold: f64,
    /// Clamp grid lookups to the axis range instead of failing.
    pub clamp_grid: bool,
    /// Also strip the trailing dash part from unqualified layer names.
    ///
    /// Off by default: stripping would erase the `-TXT` suffix the fusion
    /// passes key on. `$`-qualified planning layers are always normalized.
    pub normalize_plain_layers: bool,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            text_layer_suffix: "-TXT".to_owned(),
            adjacency_threshold: 20.0,
            fusion_threshold: 20.0,
            clamp_grid: true,
            normalize_plain_layers: false,
        }
    }
}

impl FusionConfig {
    /// Layer compatibility for fusion: equal, or related through the
    /// companion-text suffix in either direction.
    pub fn layers_compatible(&self, a: &str, b: &str) -> bool {
        if a == b {
            return true;
        }
        let suffix = &self.text_layer_suffix;
        a.strip_suffix(suffix.as_str()) == Some(b) || b.strip_suffix(suffix.as_str()) == Some(a)
    }
}
