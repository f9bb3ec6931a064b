use glam::Vec3;

use super::mesh::Mesh;

/// Axis-aligned bounding box in 3-D.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    /// Degenerate box that expands to any point merged into it.
    pub const EMPTY: BoundingBox = BoundingBox {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    /// Extents of all vertex positions in `mesh`.
    pub fn from_mesh(mesh: &Mesh) -> BoundingBox {
        let mut bounds = BoundingBox::EMPTY;
        for i in 0..mesh.vertex_count() {
            bounds.expand(mesh.position(i));
        }
        bounds
    }

    /// Grow the box to include `p`.
    pub fn expand(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Centre point of the box.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Length of the space diagonal.
    pub fn diagonal(&self) -> f32 {
        (self.max - self.min).length()
    }

    /// Whether the box has been expanded by at least one point.
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x
    }
}

/// Bounding sphere used by the screen-space selection policies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl BoundingSphere {
    /// Sphere enclosing the mesh's axis-aligned extents.
    ///
    /// Centre is the box centre, radius the half-diagonal. Not the minimal
    /// enclosing sphere, but stable and cheap; adequate for screen-coverage
    /// estimation.
    pub fn from_mesh(mesh: &Mesh) -> BoundingSphere {
        let bounds = BoundingBox::from_mesh(mesh);
        if !bounds.is_valid() {
            return BoundingSphere {
                center: Vec3::ZERO,
                radius: 0.0,
            };
        }
        BoundingSphere {
            center: bounds.center(),
            radius: bounds.diagonal() * 0.5,
        }
    }
}
