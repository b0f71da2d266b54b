// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for geometry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from calibration fitting and grid addressing
#[derive(Error, Debug)]
pub enum Error {
    #[error("at least 2 calibration pairs are required, got {found}")]
    InsufficientCalibration { found: usize },

    #[error("degenerate calibration baseline in {space} space")]
    DegenerateBaseline {
        /// `"source"` or `"target"`, whichever pair coincides.
        space: &'static str,
    },

    #[error("grid axis has no entries")]
    EmptyAxis,

    #[error("value {value} outside axis range [{lo}, {hi}]")]
    OutOfRange { value: f64, lo: f64, hi: f64 },
}
