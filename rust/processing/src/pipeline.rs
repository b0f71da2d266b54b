// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Batch pipeline
//!
//! Wires the stages together: fit the transform once, collect records,
//! fuse, attach grid addresses, snapshot. Single-threaded by design; the
//! record map is mutated in place during fusion, which is only safe
//! because the stages run strictly sequentially.

use crate::collector::collect_records;
use crate::error::Result;
use crate::fusion::{fuse, FusionOutcome};
use crate::policy::{MarkerClassifier, RecordClassifier};
use crate::snapshot::FusionSnapshot;
use crate::types::FusionConfig;
use planfuse_core::SourceEntity;
use planfuse_geometry::{fit_transform, GridAddress, GridAxis, Transform2D};
use std::collections::BTreeMap;
use tracing::warn;

/// The full collector -> fusion -> grid addressor batch.
pub struct Pipeline {
    transform: Transform2D,
    columns: GridAxis,
    rows: GridAxis,
    config: FusionConfig,
    classifier: Box<dyn RecordClassifier>,
}

impl Pipeline {
    /// Build a pipeline with an already-fitted transform, the default
    /// config and the default marker classifier.
    pub fn new(transform: Transform2D, columns: GridAxis, rows: GridAxis) -> Self {
        Self {
            transform,
            columns,
            rows,
            config: FusionConfig::default(),
            classifier: Box::new(MarkerClassifier::default()),
        }
    }

    /// Build a pipeline from the raw calibration configuration string.
    ///
    /// Calibration failures are fatal; everything downstream degrades per
    /// record instead.
    pub fn from_calibration(calibration: &str, columns: GridAxis, rows: GridAxis) -> Result<Self> {
        let pairs = planfuse_core::parse_calibration(calibration)?;
        let transform = fit_transform(&pairs)?;
        Ok(Self::new(transform, columns, rows))
    }

    pub fn with_config(mut self, config: FusionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_classifier(mut self, classifier: Box<dyn RecordClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn transform(&self) -> &Transform2D {
        &self.transform
    }

    /// Run the batch over the reader's entities.
    ///
    /// Never fails: per-record anomalies are logged and degrade to an
    /// element with empty text, a missing grid address, or an entry in the
    /// unattached list.
    pub fn run(&self, entities: &[SourceEntity]) -> FusionSnapshot {
        let records = collect_records(
            entities,
            &self.transform,
            &self.config,
            self.classifier.as_ref(),
        );
        let FusionOutcome {
            elements,
            unattached,
        } = fuse(records, &self.config, self.classifier.as_ref());

        let mut addressed = BTreeMap::new();
        for (handle, mut element) in elements {
            match GridAddress::locate(
                element.image_position,
                &self.columns,
                &self.rows,
                self.config.clamp_grid,
            ) {
                Ok(address) => element.grid = Some(address),
                Err(err) => {
                    warn!(handle = %element.handle, %err, "grid lookup failed, element kept without address");
                }
            }
            addressed.insert(handle, element);
        }

        FusionSnapshot {
            elements: addressed,
            unattached,
        }
    }
}
