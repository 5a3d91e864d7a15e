// SPDX-License-Identifier: MPL-2.0

//! Deformation map: the shape function linking a reference pixel
//! to its location in a deformed image.

use nalgebra::{Matrix3, Vector3};

/// Parameters of a first order shape function.
///
/// The map is applied about a center (usually the subset centroid):
///
/// ```text
/// dx = x - cx,  dy = y - cy
/// Dx = (1 + ex) dx + gxy dy
/// Dy = (1 + ey) dy + gxy dx
/// x' = cos(theta) Dx - sin(theta) Dy + u + cx
/// y' = sin(theta) Dx + cos(theta) Dy + v + cy
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DefMap {
    /// Horizontal displacement.
    pub u: f32,
    /// Vertical displacement.
    pub v: f32,
    /// Rotation in radians.
    pub theta: f32,
    /// Normal strain along x.
    pub ex: f32,
    /// Normal strain along y.
    pub ey: f32,
    /// Shear strain.
    pub gxy: f32,
}

impl DefMap {
    /// Identity map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pure translation.
    pub fn translation(u: f32, v: f32) -> Self {
        Self {
            u,
            v,
            ..Self::default()
        }
    }

    /// True when the map does not move any point.
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    /// True when only the displacement terms are set.
    pub fn is_translation(&self) -> bool {
        self.theta == 0.0 && self.ex == 0.0 && self.ey == 0.0 && self.gxy == 0.0
    }

    /// Apply the map about the origin.
    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        self.apply_about(0.0, 0.0, x, y)
    }

    /// Apply the map about the center `(cx, cy)`.
    ///
    /// Pure translations only add `u` and `v`,
    /// so integer displacements of integer coordinates stay exact.
    pub fn apply_about(&self, cx: f32, cy: f32, x: f32, y: f32) -> (f32, f32) {
        if self.is_translation() {
            return (x + self.u, y + self.v);
        }
        let dx = x - cx;
        let dy = y - cy;
        let stretched_x = (1.0 + self.ex) * dx + self.gxy * dy;
        let stretched_y = (1.0 + self.ey) * dy + self.gxy * dx;
        let (sin_t, cos_t) = self.theta.sin_cos();
        (
            cos_t * stretched_x - sin_t * stretched_y + self.u + cx,
            sin_t * stretched_x + cos_t * stretched_y + self.v + cy,
        )
    }

    /// Homogeneous affine matrix equivalent to `apply_about(cx, cy, ..)`.
    #[rustfmt::skip]
    pub fn affine(&self, cx: f32, cy: f32) -> Matrix3<f32> {
        let (sin_t, cos_t) = self.theta.sin_cos();
        let rotation = Matrix3::new(
            cos_t, -sin_t, 0.0,
            sin_t, cos_t, 0.0,
            0.0, 0.0, 1.0,
        );
        let stretch = Matrix3::new(
            1.0 + self.ex, self.gxy, 0.0,
            self.gxy, 1.0 + self.ey, 0.0,
            0.0, 0.0, 1.0,
        );
        let to_center = Matrix3::new_translation(&nalgebra::Vector2::new(-cx, -cy));
        let from_center =
            Matrix3::new_translation(&nalgebra::Vector2::new(cx + self.u, cy + self.v));
        from_center * rotation * stretch * to_center
    }

    /// Apply the affine form of the map to a point.
    /// Subsets build the matrix once and warp all their pixels with it.
    pub fn apply_affine(mat: &Matrix3<f32>, x: f32, y: f32) -> (f32, f32) {
        let p = mat * Vector3::new(x, y, 1.0);
        (p.x, p.y)
    }
}

#[cfg(test)]
mod tests {
    use super::DefMap;
    use approx::assert_abs_diff_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn identity_and_translation() {
        let id = DefMap::new();
        assert!(id.is_identity());
        assert_eq!(id.apply_about(125.0, 250.0, 17.0, -4.0), (17.0, -4.0));

        let t = DefMap::translation(200.0, 50.0);
        assert!(!t.is_identity());
        assert!(t.is_translation());
        assert_eq!(t.apply(119.0, 241.0), (319.0, 291.0));
        assert_eq!(t.apply_about(125.0, 250.0, 119.0, 241.0), (319.0, 291.0));
    }

    #[test]
    fn rotation_about_centroid() {
        let map = DefMap {
            theta: FRAC_PI_2,
            ..DefMap::default()
        };
        let (x, y) = map.apply_about(10.0, 20.0, 11.0, 20.0);
        assert_abs_diff_eq!(x, 10.0, epsilon = 1e-5);
        assert_abs_diff_eq!(y, 21.0, epsilon = 1e-5);
        // The center itself does not move.
        let (x, y) = map.apply_about(10.0, 20.0, 10.0, 20.0);
        assert_abs_diff_eq!(x, 10.0, epsilon = 1e-5);
        assert_abs_diff_eq!(y, 20.0, epsilon = 1e-5);
    }

    #[test]
    fn strains_scale_offsets_from_center() {
        let map = DefMap {
            ex: 0.1,
            ey: -0.2,
            gxy: 0.05,
            ..DefMap::default()
        };
        let (x, y) = map.apply_about(5.0, 5.0, 15.0, 5.0);
        assert_abs_diff_eq!(x, 16.0, epsilon = 1e-5);
        assert_abs_diff_eq!(y, 5.5, epsilon = 1e-5);
        let (x, y) = map.apply_about(5.0, 5.0, 5.0, 15.0);
        assert_abs_diff_eq!(x, 5.5, epsilon = 1e-5);
        assert_abs_diff_eq!(y, 13.0, epsilon = 1e-5);
    }

    #[test]
    fn affine_matches_apply() {
        let map = DefMap {
            u: 1.5,
            v: -2.25,
            theta: 0.3,
            ex: 0.02,
            ey: -0.01,
            gxy: 0.015,
        };
        let mat = map.affine(40.0, 30.0);
        for &(px, py) in &[(40.0, 30.0), (35.0, 28.0), (52.0, 41.0)] {
            let (ax, ay) = map.apply_about(40.0, 30.0, px, py);
            let (bx, by) = DefMap::apply_affine(&mat, px, py);
            assert_abs_diff_eq!(ax, bx, epsilon = 1e-3);
            assert_abs_diff_eq!(ay, by, epsilon = 1e-3);
        }
    }
}
