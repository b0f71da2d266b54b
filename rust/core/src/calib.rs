// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Calibration configuration parsing
//!
//! Control points arrive as a single configuration string of
//! semicolon-separated `sourceX,sourceY:targetX,targetY` pairs, e.g.
//! `282.14,1169.69:885,588;282.14,513:885,4460`.

use crate::entity::Point2D;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// A drawing-space point and the image-space point it must map to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ControlPointPair {
    pub source: Point2D,
    pub target: Point2D,
}

impl ControlPointPair {
    pub fn new(source: Point2D, target: Point2D) -> Self {
        Self { source, target }
    }
}

/// Parse a calibration string into control-point pairs.
///
/// Empty segments (trailing `;`, doubled separators) are skipped; a
/// malformed segment is a hard error since a silently dropped control point
/// would change the fitted transform.
pub fn parse_calibration(s: &str) -> Result<Vec<ControlPointPair>> {
    let mut pairs = Vec::new();
    for seg in s.split(';') {
        let seg = seg.trim();
        if seg.is_empty() {
            continue;
        }
        let (left, right) = seg.split_once(':').ok_or_else(|| Error::InvalidCalibration {
            segment: seg.to_owned(),
            reason: "expected `sourceX,sourceY:targetX,targetY`".to_owned(),
        })?;
        let source = parse_point(left, seg)?;
        let target = parse_point(right, seg)?;
        pairs.push(ControlPointPair::new(source, target));
    }
    Ok(pairs)
}

fn parse_point(s: &str, segment: &str) -> Result<Point2D> {
    let (x, y) = s.split_once(',').ok_or_else(|| Error::InvalidCalibration {
        segment: segment.to_owned(),
        reason: format!("expected `x,y`, got `{s}`"),
    })?;
    let parse = |v: &str| -> Result<f64> {
        v.trim().parse::<f64>().map_err(|_| Error::InvalidCalibration {
            segment: segment.to_owned(),
            reason: format!("`{v}` is not a number"),
        })
    };
    Ok(Point2D::new(parse(x)?, parse(y)?))
}
