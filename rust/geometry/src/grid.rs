// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Labeled bounding grid and in-cell position description
//!
//! Large plans carry a chessboard-style reference grid (labeled column and
//! row lines at known image coordinates). A fused element's image position
//! is bracketed between two labels on each axis, then described
//! qualitatively inside that cell ("center", "upper left corner", ...).

use crate::error::{Error, Result};
use planfuse_core::Point2D;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fractional radius around the cell midpoint classified as center.
const CENTER_RADIUS: f64 = 0.22;
/// Fractional box size around each cell corner.
const CORNER_BOX: f64 = 0.28;
/// Fractional band width along each cell edge.
const EDGE_BAND: f64 = 0.05;

/// One labeled grid line on an axis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AxisEntry {
    pub label: String,
    pub coord: f64,
}

/// An ordered sequence of labeled coordinates along one dimension.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GridAxis {
    entries: Vec<AxisEntry>,
}

impl GridAxis {
    /// Build an axis from label/coordinate pairs; entries are sorted
    /// ascending by coordinate.
    pub fn new<L, I>(entries: I) -> Result<Self>
    where
        L: Into<String>,
        I: IntoIterator<Item = (L, f64)>,
    {
        let mut entries: Vec<AxisEntry> = entries
            .into_iter()
            .map(|(label, coord)| AxisEntry {
                label: label.into(),
                coord,
            })
            .collect();
        if entries.is_empty() {
            return Err(Error::EmptyAxis);
        }
        entries.sort_by(|a, b| a.coord.total_cmp(&b.coord));
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[AxisEntry] {
        &self.entries
    }

    /// Find the two adjacent entries bounding `value`.
    ///
    /// Outside the axis range the bracket clamps to the first or last
    /// interval; with `clamp` disabled that case is [`Error::OutOfRange`].
    /// A single-entry axis brackets degenerately onto its only entry.
    pub fn bracket(&self, value: f64, clamp: bool) -> Result<Bracket<'_>> {
        let n = self.entries.len();
        let first = &self.entries[0];
        let last = &self.entries[n - 1];

        if value <= first.coord {
            if !clamp && value < first.coord {
                return Err(self.out_of_range(value));
            }
            return Ok(if n >= 2 {
                Bracket::new(first, &self.entries[1])
            } else {
                Bracket::new(first, first)
            });
        }
        if value >= last.coord {
            if !clamp && value > last.coord {
                return Err(self.out_of_range(value));
            }
            return Ok(if n >= 2 {
                Bracket::new(&self.entries[n - 2], last)
            } else {
                Bracket::new(last, last)
            });
        }

        for pair in self.entries.windows(2) {
            if pair[0].coord <= value && value <= pair[1].coord {
                return Ok(Bracket::new(&pair[0], &pair[1]));
            }
        }
        // Unreachable: value is strictly inside [first, last].
        Err(self.out_of_range(value))
    }

    fn out_of_range(&self, value: f64) -> Error {
        Error::OutOfRange {
            value,
            lo: self.entries[0].coord,
            hi: self.entries[self.entries.len() - 1].coord,
        }
    }
}

/// Two adjacent axis entries bounding a value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket<'a> {
    pub lower: &'a AxisEntry,
    pub upper: &'a AxisEntry,
}

impl<'a> Bracket<'a> {
    fn new(lower: &'a AxisEntry, upper: &'a AxisEntry) -> Self {
        Self { lower, upper }
    }

    /// Normalize `value` into [0, 1] within this bracket.
    /// A zero-width bracket normalizes to the cell midpoint.
    pub fn normalize(&self, value: f64) -> f64 {
        let lo = self.lower.coord;
        let hi = self.upper.coord;
        if hi == lo {
            return 0.5;
        }
        ((value - lo) / (hi - lo)).clamp(0.0, 1.0)
    }
}

/// Qualitative position inside a grid cell.
///
/// Classified in priority order center > corners > edges > quadrants with
/// fixed fractional thresholds; the ranges are ordered from most to least
/// specific, so exactly one variant matches any (nx, ny) in [0,1]^2.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CellPosition {
    Center,
    UpperLeftCorner,
    UpperRightCorner,
    LowerLeftCorner,
    LowerRightCorner,
    LeftSide,
    RightSide,
    UpperSide,
    LowerSide,
    UpperLeftArea,
    UpperRightArea,
    LowerLeftArea,
    LowerRightArea,
}

impl CellPosition {
    /// Classify a normalized in-cell position (nx left-to-right, ny
    /// upper-to-lower).
    pub fn classify(nx: f64, ny: f64) -> CellPosition {
        if (nx - 0.5).abs() <= CENTER_RADIUS && (ny - 0.5).abs() <= CENTER_RADIUS {
            return CellPosition::Center;
        }

        if nx <= CORNER_BOX && ny <= CORNER_BOX {
            return CellPosition::UpperLeftCorner;
        }
        if nx >= 1.0 - CORNER_BOX && ny <= CORNER_BOX {
            return CellPosition::UpperRightCorner;
        }
        if nx <= CORNER_BOX && ny >= 1.0 - CORNER_BOX {
            return CellPosition::LowerLeftCorner;
        }
        if nx >= 1.0 - CORNER_BOX && ny >= 1.0 - CORNER_BOX {
            return CellPosition::LowerRightCorner;
        }

        if nx <= EDGE_BAND {
            return CellPosition::LeftSide;
        }
        if nx >= 1.0 - EDGE_BAND {
            return CellPosition::RightSide;
        }
        if ny <= EDGE_BAND {
            return CellPosition::UpperSide;
        }
        if ny >= 1.0 - EDGE_BAND {
            return CellPosition::LowerSide;
        }

        if ny < 0.5 && nx < 0.5 {
            return CellPosition::UpperLeftArea;
        }
        if ny < 0.5 {
            return CellPosition::UpperRightArea;
        }
        if nx < 0.5 {
            return CellPosition::LowerLeftArea;
        }
        CellPosition::LowerRightArea
    }
}

impl fmt::Display for CellPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CellPosition::Center => "center",
            CellPosition::UpperLeftCorner => "upper left corner",
            CellPosition::UpperRightCorner => "upper right corner",
            CellPosition::LowerLeftCorner => "lower left corner",
            CellPosition::LowerRightCorner => "lower right corner",
            CellPosition::LeftSide => "left side",
            CellPosition::RightSide => "right side",
            CellPosition::UpperSide => "upper side",
            CellPosition::LowerSide => "lower side",
            CellPosition::UpperLeftArea => "upper left area",
            CellPosition::UpperRightArea => "upper right area",
            CellPosition::LowerLeftArea => "lower left area",
            CellPosition::LowerRightArea => "lower right area",
        };
        f.write_str(s)
    }
}

/// A resolved grid address: bracketing labels per axis plus the in-cell
/// position description.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GridAddress {
    /// `[left_label, right_label]`
    pub columns: [String; 2],
    /// `[upper_label, lower_label]` (upper = smaller y)
    pub rows: [String; 2],
    /// Rendered as `"[left,right],[upper-lower]"`.
    pub cell_id: String,
    pub position: CellPosition,
}

impl GridAddress {
    /// Locate an image-space point on the column/row axes.
    pub fn locate(
        point: Point2D,
        columns: &GridAxis,
        rows: &GridAxis,
        clamp: bool,
    ) -> Result<GridAddress> {
        let col = columns.bracket(point.x, clamp)?;
        let row = rows.bracket(point.y, clamp)?;
        let nx = col.normalize(point.x);
        let ny = row.normalize(point.y);
        let position = CellPosition::classify(nx, ny);
        let cell_id = format!(
            "[{},{}],[{}-{}]",
            col.lower.label, col.upper.label, row.lower.label, row.upper.label
        );
        Ok(GridAddress {
            columns: [col.lower.label.clone(), col.upper.label.clone()],
            rows: [row.lower.label.clone(), row.upper.label.clone()],
            cell_id,
            position,
        })
    }
}
