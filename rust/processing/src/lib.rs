// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Planfuse Processing
//!
//! Reconstructs logical plan elements from a drawing's symbol placements
//! and scattered text fragments:
//!
//! 1. **Collection**: walk entities in document order, flatten block
//!    children, fold adjacent annotation instances onto their symbol
//! 2. **Fusion**: consolidate annotation carriers into the nearest
//!    layer-compatible owner, then fill remaining empty-text records from
//!    nearby donors
//! 3. **Grid addressing**: bracket each element's image position on the
//!    labeled reference grid and describe its in-cell position
//!
//! # Usage
//!
//! ```rust,ignore
//! use planfuse_geometry::GridAxis;
//! use planfuse_processing::Pipeline;
//!
//! let columns = GridAxis::new([("F", 460.0), ("G", 884.0)])?;
//! let rows = GridAxis::new([("45", 234.0), ("44", 543.0)])?;
//! let pipeline = Pipeline::from_calibration("0,0:0,100;10,0:0,0", columns, rows)?;
//!
//! let snapshot = pipeline.run(&entities);
//! snapshot.write_json(std::fs::File::create("elements.json")?)?;
//! ```

pub mod collector;
pub mod error;
pub mod fusion;
pub mod pipeline;
pub mod policy;
pub mod snapshot;
pub mod types;

pub use collector::collect_records;
pub use error::{Error, Result};
pub use fusion::{fuse, FusionOutcome};
pub use pipeline::Pipeline;
pub use policy::{MarkerClassifier, RecordClassifier};
pub use snapshot::FusionSnapshot;
pub use types::{FusedElement, FusionConfig, RecordKind};
