// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Drawing-space to image-space transform fitting
//!
//! A `Transform2D` is fitted once per run from user-supplied control points
//! and then applied to every coordinate that ever needs the image frame.
//! Two control points give a similarity transform (uniform scale + rotation
//! + translation); three or more give a full affine fit by ordinary least
//! squares. No outlier rejection is attempted.

use crate::error::{Error, Result};
use nalgebra::{DMatrix, DVector, Matrix2, Vector2};
use planfuse_core::{ControlPointPair, Point2D};
use serde::{Deserialize, Serialize};

/// A 2x3 matrix mapping drawing space to image space:
/// `[X, Y]^T = A * [x, y]^T + t`.
///
/// Built once per run, immutable thereafter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Transform2D {
    m: [[f64; 3]; 2],
}

impl Transform2D {
    pub const IDENTITY: Transform2D = Transform2D {
        m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
    };

    pub fn from_rows(row_x: [f64; 3], row_y: [f64; 3]) -> Self {
        Self { m: [row_x, row_y] }
    }

    pub fn apply(&self, p: Point2D) -> Point2D {
        Point2D::new(
            self.m[0][0] * p.x + self.m[0][1] * p.y + self.m[0][2],
            self.m[1][0] * p.x + self.m[1][1] * p.y + self.m[1][2],
        )
    }

    /// Total squared residual of this transform over a set of control points.
    pub fn residual(&self, pairs: &[ControlPointPair]) -> f64 {
        pairs
            .iter()
            .map(|pair| {
                let mapped = self.apply(pair.source);
                let dx = mapped.x - pair.target.x;
                let dy = mapped.y - pair.target.y;
                dx * dx + dy * dy
            })
            .sum()
    }
}

/// Fit a transform from control-point pairs.
///
/// - 2 pairs: similarity fit, exact on the first pair
/// - 3+ pairs: least-squares affine fit
/// - fewer than 2 pairs: [`Error::InsufficientCalibration`]
pub fn fit_transform(pairs: &[ControlPointPair]) -> Result<Transform2D> {
    match pairs.len() {
        0 | 1 => Err(Error::InsufficientCalibration { found: pairs.len() }),
        2 => fit_similarity(&pairs[0], &pairs[1]),
        _ => Ok(fit_affine(pairs)),
    }
}

/// Similarity transform from exactly two pairs.
///
/// Maps the first source point exactly onto the first target point and
/// preserves the bearing and length ratio of the baseline to the second.
fn fit_similarity(first: &ControlPointPair, second: &ControlPointPair) -> Result<Transform2D> {
    let v_src = Vector2::new(
        second.source.x - first.source.x,
        second.source.y - first.source.y,
    );
    let v_dst = Vector2::new(
        second.target.x - first.target.x,
        second.target.y - first.target.y,
    );
    let n_src = v_src.norm();
    let n_dst = v_dst.norm();
    if n_src == 0.0 {
        return Err(Error::DegenerateBaseline { space: "source" });
    }
    if n_dst == 0.0 {
        return Err(Error::DegenerateBaseline { space: "target" });
    }

    let scale = n_dst / n_src;
    let u = v_src / n_src;
    let v = v_dst / n_dst;
    let cos = u.dot(&v).clamp(-1.0, 1.0);
    let sin = u.x * v.y - u.y * v.x;
    let rot = Matrix2::new(cos, -sin, sin, cos);

    let p1 = Vector2::new(first.source.x, first.source.y);
    let q1 = Vector2::new(first.target.x, first.target.y);
    let t = q1 - scale * (rot * p1);

    Ok(Transform2D::from_rows(
        [scale * cos, scale * -sin, t.x],
        [scale * sin, scale * cos, t.y],
    ))
}

/// Full 6-parameter affine fit by ordinary least squares.
///
/// Stacks two equations per pair,
/// `[x y 0 0 1 0] . [a b c d tx ty] = X` and
/// `[0 0 x y 0 1] . [a b c d tx ty] = Y`,
/// and solves via SVD, which also handles rank-deficient (e.g. collinear)
/// point sets with the minimum-norm solution.
fn fit_affine(pairs: &[ControlPointPair]) -> Transform2D {
    let rows = 2 * pairs.len();
    let mut a = DMatrix::<f64>::zeros(rows, 6);
    let mut b = DVector::<f64>::zeros(rows);
    for (i, pair) in pairs.iter().enumerate() {
        let r = 2 * i;
        a[(r, 0)] = pair.source.x;
        a[(r, 1)] = pair.source.y;
        a[(r, 4)] = 1.0;
        b[r] = pair.target.x;
        a[(r + 1, 2)] = pair.source.x;
        a[(r + 1, 3)] = pair.source.y;
        a[(r + 1, 5)] = 1.0;
        b[r + 1] = pair.target.y;
    }

    let svd = a.svd(true, true);
    let x = svd
        .solve(&b, 1e-12)
        .expect("SVD solve with U and V computed cannot fail");

    Transform2D::from_rows([x[0], x[1], x[4]], [x[2], x[3], x[5]])
}
