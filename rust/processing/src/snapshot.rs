// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Output snapshot
//!
//! The sole artifact a batch run produces: the fused, grid-addressed
//! element map plus the unattached audit list. Keyed by a sorted map so
//! serialization is byte-stable across runs on the same input.

use crate::error::Result;
use crate::types::FusedElement;
use planfuse_core::EntityHandle;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;

/// Serialized view of one batch run. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FusionSnapshot {
    pub elements: BTreeMap<EntityHandle, FusedElement>,
    /// Carriers that found no owner; reported, never merged.
    pub unattached: Vec<FusedElement>,
}

impl FusionSnapshot {
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}
