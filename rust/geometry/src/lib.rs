// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Planfuse Geometry
//!
//! Coordinate-frame calibration and grid addressing using nalgebra for the
//! least-squares fit.

pub mod error;
pub mod grid;
pub mod transform;

pub use error::{Error, Result};
pub use grid::{AxisEntry, Bracket, CellPosition, GridAddress, GridAxis};
pub use transform::{fit_transform, Transform2D};
