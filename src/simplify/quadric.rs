use std::ops::{Add, AddAssign};

use glam::Vec3;

/// Face normals shorter than this are treated as degenerate.
const DEGENERATE_NORMAL_EPSILON: f32 = 1e-12;

/// Quadric error metric: a symmetric 4x4 matrix stored as its 10
/// independent coefficients.
///
/// For a plane `n.x + d = 0` the quadric is the outer product of
/// `[a, b, c, d]` with itself; evaluating `p^T Q p` at a point gives the
/// squared distance to the plane. Summing the quadrics of every face
/// incident to a vertex gives the summed squared distance to all of its
/// supporting planes, which is what ranks candidate edge collapses.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Quadric {
    // Upper triangle, row-major:
    // [ m[0] m[1] m[2] m[3] ]
    // [      m[4] m[5] m[6] ]
    // [           m[7] m[8] ]
    // [                m[9] ]
    m: [f64; 10],
}

impl Quadric {
    pub const ZERO: Quadric = Quadric { m: [0.0; 10] };

    /// Quadric of the supporting plane of triangle `(v0, v1, v2)`.
    ///
    /// Zero-area triangles have no well-defined plane and yield the zero
    /// quadric, so they contribute nothing to their vertices.
    pub fn from_triangle(v0: Vec3, v1: Vec3, v2: Vec3) -> Quadric {
        let cross = (v1 - v0).cross(v2 - v0);
        if cross.length_squared() < DEGENERATE_NORMAL_EPSILON {
            return Quadric::ZERO;
        }
        let n = cross.normalize();

        let a = n.x as f64;
        let b = n.y as f64;
        let c = n.z as f64;
        let d = -(n.dot(v0) as f64);

        Quadric {
            m: [
                a * a,
                a * b,
                a * c,
                a * d,
                b * b,
                b * c,
                b * d,
                c * c,
                c * d,
                d * d,
            ],
        }
    }

    /// Evaluate the quadratic form `p^T Q p`.
    ///
    /// Non-negative in exact arithmetic; rounding can push it slightly
    /// below zero, which callers treat as zero cost.
    pub fn error(&self, p: Vec3) -> f64 {
        let x = p.x as f64;
        let y = p.y as f64;
        let z = p.z as f64;
        let m = &self.m;

        m[0] * x * x
            + 2.0 * m[1] * x * y
            + 2.0 * m[2] * x * z
            + 2.0 * m[3] * x
            + m[4] * y * y
            + 2.0 * m[5] * y * z
            + 2.0 * m[6] * y
            + m[7] * z * z
            + 2.0 * m[8] * z
            + m[9]
    }

    /// Position a collapsed edge `(a, b)` moves its merged vertex to.
    ///
    /// The midpoint, not the minimiser of the summed quadric. Solving the
    /// 3x3 system would place the vertex slightly better at the cost of an
    /// inversion per candidate; the quadric still does the ranking.
    pub fn optimal_point(a: Vec3, b: Vec3) -> Vec3 {
        (a + b) * 0.5
    }
}

impl Add for Quadric {
    type Output = Quadric;

    fn add(mut self, rhs: Quadric) -> Quadric {
        self += rhs;
        self
    }
}

impl AddAssign for Quadric {
    fn add_assign(&mut self, rhs: Quadric) {
        for (a, b) in self.m.iter_mut().zip(rhs.m.iter()) {
            *a += b;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn xy_plane_quadric() -> Quadric {
        Quadric::from_triangle(Vec3::ZERO, Vec3::X, Vec3::Y)
    }

    #[test]
    fn zero_on_plane() {
        let q = xy_plane_quadric();
        assert_relative_eq!(q.error(Vec3::ZERO), 0.0, epsilon = 1e-12);
        assert_relative_eq!(q.error(Vec3::new(3.0, -2.0, 0.0)), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn squared_distance_off_plane() {
        let q = xy_plane_quadric();
        // 2 units off the XY plane -> squared distance 4
        assert_relative_eq!(q.error(Vec3::new(0.5, 0.5, 2.0)), 4.0, epsilon = 1e-9);
    }

    #[test]
    fn offset_plane() {
        // Plane z = 1
        let q = Quadric::from_triangle(
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(0.0, 1.0, 1.0),
        );
        assert_relative_eq!(q.error(Vec3::new(0.2, 0.7, 1.0)), 0.0, epsilon = 1e-9);
        assert_relative_eq!(q.error(Vec3::new(0.0, 0.0, 3.0)), 4.0, epsilon = 1e-9);
    }

    #[test]
    fn degenerate_triangle_is_zero() {
        let q = Quadric::from_triangle(Vec3::ZERO, Vec3::X, Vec3::X * 2.0);
        assert_eq!(q, Quadric::ZERO);
        assert_eq!(q.error(Vec3::new(5.0, 5.0, 5.0)), 0.0);
    }

    #[test]
    fn sum_accumulates_planes() {
        // XY plane + XZ plane: error at a point is the sum of both squared
        // distances.
        let q_xy = xy_plane_quadric();
        let q_xz = Quadric::from_triangle(Vec3::ZERO, Vec3::Z, Vec3::X);
        let sum = q_xy + q_xz;

        let p = Vec3::new(0.0, 3.0, 4.0);
        assert_relative_eq!(sum.error(p), 9.0 + 16.0, epsilon = 1e-9);
    }

    #[test]
    fn add_assign_matches_add() {
        let a = xy_plane_quadric();
        let b = Quadric::from_triangle(Vec3::ZERO, Vec3::Z, Vec3::X);
        let mut acc = a;
        acc += b;
        assert_eq!(acc, a + b);
    }

    #[test]
    fn optimal_point_is_midpoint() {
        let p = Quadric::optimal_point(Vec3::ZERO, Vec3::new(2.0, 4.0, -6.0));
        assert_eq!(p, Vec3::new(1.0, 2.0, -3.0));
    }
}
