// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal pipeline errors.
///
/// Only calibration and serialization can fail the batch; collection,
/// fusion, and grid anomalies degrade per record instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("calibration config error: {0}")]
    Calibration(#[from] planfuse_core::Error),

    #[error("geometry error: {0}")]
    Geometry(#[from] planfuse_geometry::Error),

    #[error("snapshot serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
