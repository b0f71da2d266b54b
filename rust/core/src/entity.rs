// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core types for drawing entities and fused plan elements

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// A 2D point (simplified for serialization)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point2D) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Resolved display color. The document reader resolves ACI and true-color
/// attributes down to RGB before entities reach the pipeline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Fallback used for entities whose color could not be resolved.
    pub const UNRESOLVED: Rgb = Rgb(200, 200, 200);
}

/// Entity identity taken from the drawing's handle field.
///
/// Handles are unique within a document. Their lexicographic order is the
/// tie-break order used everywhere a nearest-candidate search can tie, so
/// results are reproducible across runs on the same input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityHandle(String);

impl EntityHandle {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        Self(raw.trim().to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityHandle {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// A block-internal text primitive, flattened out of a symbol instance and
/// positioned in drawing space.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChildPrimitive {
    pub text: String,
    pub position: Point2D,
}

impl ChildPrimitive {
    pub fn new(text: impl Into<String>, position: Point2D) -> Self {
        Self {
            text: text.into(),
            position,
        }
    }
}

/// What kind of entity the reader handed us.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityKind {
    /// A placed block reference representing a physical device at a point.
    /// Children are the nested text/label primitives the referenced block
    /// expands to.
    Symbol {
        name: String,
        children: SmallVec<[ChildPrimitive; 4]>,
    },
    /// Free-standing text, not bound to any element until fusion.
    Text { content: String },
}

/// One entity as exposed by the external document reader, in document order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceEntity {
    pub handle: EntityHandle,
    pub layer: String,
    pub color: Rgb,
    pub position: Point2D,
    pub kind: EntityKind,
}

impl SourceEntity {
    pub fn is_symbol(&self) -> bool {
        matches!(self.kind, EntityKind::Symbol { .. })
    }

    /// Display name for symbol instances; text fragments have none.
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            EntityKind::Symbol { name, .. } => Some(name),
            EntityKind::Text { .. } => None,
        }
    }
}
