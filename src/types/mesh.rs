use glam::Vec3;

/// Primitive topology of a mesh's index (or vertex) stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrimitiveTopology {
    #[default]
    Triangles,
    Lines,
    Points,
}

/// The fundamental geometry container.
///
/// All buffers are contiguous `Vec<f32>` / `Vec<u32>` for zero-copy upload
/// to whatever rendering backend consumes the selected level.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    /// Interleaved positions: [x, y, z, x, y, z, ...]
    pub positions: Vec<f32>,
    /// Interleaved normals: [nx, ny, nz, ...] or empty
    pub normals: Vec<f32>,
    /// Triangle indices into the vertex buffers; empty for raw triangle soup
    pub indices: Vec<u32>,
    /// How the vertex/index stream is interpreted
    pub topology: PrimitiveTopology,
}

impl Mesh {
    /// Number of vertices (positions / 3).
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Number of triangles. Falls back to the vertex stream when the mesh
    /// carries no index buffer (raw triangle soup).
    pub fn triangle_count(&self) -> usize {
        if self.topology != PrimitiveTopology::Triangles {
            return 0;
        }
        if self.indices.is_empty() {
            self.vertex_count() / 3
        } else {
            self.indices.len() / 3
        }
    }

    /// Whether normals are present.
    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty()
    }

    /// Whether an index buffer is present.
    pub fn is_indexed(&self) -> bool {
        !self.indices.is_empty()
    }

    /// Whether the mesh contains no geometry.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Position of vertex `i`.
    pub fn position(&self, i: usize) -> Vec3 {
        Vec3::new(
            self.positions[i * 3],
            self.positions[i * 3 + 1],
            self.positions[i * 3 + 2],
        )
    }

    /// Normal of vertex `i`. Callers must check `has_normals` first.
    pub fn normal(&self, i: usize) -> Vec3 {
        Vec3::new(
            self.normals[i * 3],
            self.normals[i * 3 + 1],
            self.normals[i * 3 + 2],
        )
    }

    /// Append a vertex position.
    pub fn push_vertex(&mut self, p: Vec3) {
        self.positions.extend_from_slice(&[p.x, p.y, p.z]);
    }

    /// Append a vertex normal.
    pub fn push_normal(&mut self, n: Vec3) {
        self.normals.extend_from_slice(&[n.x, n.y, n.z]);
    }

    /// Append an index.
    pub fn push_index(&mut self, i: u32) {
        self.indices.push(i);
    }

    /// Clear all buffers, keeping allocations for reuse.
    pub fn reset(&mut self) {
        self.positions.clear();
        self.normals.clear();
        self.indices.clear();
        self.topology = PrimitiveTopology::Triangles;
    }

    /// Recompute per-vertex normals from the triangle topology.
    ///
    /// Face normals are accumulated unnormalised (the cross product weights
    /// each face by twice its area), then normalised per vertex. Existing
    /// normals are discarded.
    pub fn generate_normals(&mut self) {
        if self.topology != PrimitiveTopology::Triangles || self.is_empty() {
            return;
        }

        let vertex_count = self.vertex_count();
        let mut accum = vec![Vec3::ZERO; vertex_count];

        let tri_count = self.triangle_count();
        for t in 0..tri_count {
            let (i0, i1, i2) = if self.is_indexed() {
                (
                    self.indices[t * 3] as usize,
                    self.indices[t * 3 + 1] as usize,
                    self.indices[t * 3 + 2] as usize,
                )
            } else {
                (t * 3, t * 3 + 1, t * 3 + 2)
            };

            let v0 = self.position(i0);
            let v1 = self.position(i1);
            let v2 = self.position(i2);
            let face = (v1 - v0).cross(v2 - v0);

            accum[i0] += face;
            accum[i1] += face;
            accum[i2] += face;
        }

        self.normals.clear();
        self.normals.reserve(vertex_count * 3);
        for n in accum {
            let n = n.normalize_or_zero();
            self.normals.extend_from_slice(&[n.x, n.y, n.z]);
        }
    }
}
