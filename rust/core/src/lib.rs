// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Planfuse Core
//!
//! Shared data model for the floor-plan fusion pipeline:
//!
//! - **Entity model**: typed drawing entities as exposed by the external
//!   document reader (symbol instances with block-internal children, free
//!   text fragments)
//! - **Text cleanup**: inline formatting-code stripping and layer/name
//!   normalization for inconsistent source drawings
//! - **Calibration parsing**: the `sourceX,sourceY:targetX,targetY;...`
//!   control-point configuration string
//!
//! Reading the drawing itself is out of scope; a reader hands this crate an
//! ordered `Vec<SourceEntity>` and the pipeline takes it from there.

pub mod calib;
pub mod entity;
pub mod error;
pub mod text;

pub use calib::{parse_calibration, ControlPointPair};
pub use entity::{ChildPrimitive, EntityHandle, EntityKind, Point2D, Rgb, SourceEntity};
pub use error::{Error, Result};
pub use text::{clean_fragment, final_layer_segment, name_prefix, strip_last_dash_part};
