//! Deterministic synthetic meshes for the simulation binary and benches.

use std::f32::consts::PI;

use glam::Vec3;

use crate::types::{Mesh, PrimitiveTopology};

/// Flat grid of `n x n` quads (2 triangles each) spanning [0,1]^2 at z=0.
pub fn grid(n: usize) -> Mesh {
    let verts_per_side = n + 1;
    let vertex_count = verts_per_side * verts_per_side;
    let mut mesh = Mesh {
        positions: Vec::with_capacity(vertex_count * 3),
        normals: Vec::with_capacity(vertex_count * 3),
        indices: Vec::with_capacity(n * n * 6),
        topology: PrimitiveTopology::Triangles,
    };

    for y in 0..verts_per_side {
        for x in 0..verts_per_side {
            let fx = x as f32 / n as f32;
            let fy = y as f32 / n as f32;
            mesh.push_vertex(Vec3::new(fx, fy, 0.0));
            mesh.push_normal(Vec3::Z);
        }
    }

    for y in 0..n {
        for x in 0..n {
            let tl = (y * verts_per_side + x) as u32;
            let tr = tl + 1;
            let bl = tl + verts_per_side as u32;
            let br = bl + 1;
            for i in [tl, bl, tr, tr, bl, br] {
                mesh.push_index(i);
            }
        }
    }

    mesh
}

/// Unit UV sphere with `segments` longitudinal segments and `segments`
/// latitudinal rings. Pole quads emit a single triangle each, so no
/// degenerate faces are produced.
pub fn uv_sphere(segments: usize) -> Mesh {
    let segments = segments.max(3);
    let rings = segments;
    let verts_per_ring = segments + 1;

    let mut mesh = Mesh {
        topology: PrimitiveTopology::Triangles,
        ..Default::default()
    };

    for y in 0..=rings {
        let theta = PI * y as f32 / rings as f32;
        for x in 0..verts_per_ring {
            let phi = 2.0 * PI * x as f32 / segments as f32;
            let p = Vec3::new(
                theta.sin() * phi.cos(),
                theta.cos(),
                theta.sin() * phi.sin(),
            );
            mesh.push_vertex(p);
            mesh.push_normal(p);
        }
    }

    for y in 0..rings {
        for x in 0..segments {
            let i0 = (y * verts_per_ring + x) as u32;
            let i1 = i0 + 1;
            let i2 = i0 + verts_per_ring as u32;
            let i3 = i2 + 1;

            if y != 0 {
                for i in [i0, i2, i1] {
                    mesh.push_index(i);
                }
            }
            if y != rings - 1 {
                for i in [i1, i2, i3] {
                    mesh.push_index(i);
                }
            }
        }
    }

    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_counts() {
        let mesh = grid(10);
        assert_eq!(mesh.vertex_count(), 121);
        assert_eq!(mesh.triangle_count(), 200);
        assert!(mesh.has_normals());
    }

    #[test]
    fn sphere_counts() {
        let mesh = uv_sphere(8);
        // 8 rings x 8 segments: interior rows give 2 triangles per quad,
        // pole rows give 1
        assert_eq!(mesh.triangle_count(), 2 * 8 * (8 - 1));
        assert!(mesh.has_normals());
    }

    #[test]
    fn sphere_vertices_on_unit_sphere() {
        let mesh = uv_sphere(12);
        for i in 0..mesh.vertex_count() {
            let r = mesh.position(i).length();
            assert!((r - 1.0).abs() < 1e-5, "vertex {i} radius {r}");
        }
    }

    #[test]
    fn sphere_has_no_degenerate_triangles() {
        let mesh = uv_sphere(6);
        for t in mesh.indices.chunks_exact(3) {
            let p0 = mesh.position(t[0] as usize);
            let p1 = mesh.position(t[1] as usize);
            let p2 = mesh.position(t[2] as usize);
            let area2 = (p1 - p0).cross(p2 - p0).length();
            assert!(area2 > 1e-7, "zero-area triangle {t:?}");
        }
    }
}
