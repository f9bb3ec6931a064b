use glam::Vec3;
use tracing::info;

use crate::simplify::simplify;
use crate::types::Mesh;

/// Hard bounds on the number of detail levels per mesh.
pub const MIN_LEVELS: usize = 1;
pub const MAX_LEVELS: usize = 16;

/// Base distance threshold for level 0; each coarser level multiplies it.
const BASE_DISTANCE: f32 = 10.0;

/// Base screen-coverage threshold for level 0; each coarser level halves it.
const BASE_COVERAGE: f32 = 0.5;

/// One precomputed detail level.
#[derive(Debug, Clone)]
pub struct LodLevel {
    pub mesh: Mesh,
    pub triangle_count: usize,
    /// Largest (bias-adjusted) distance at which this level is drawn.
    pub max_distance: f32,
    /// Smallest screen-height fraction at which this level is drawn.
    pub min_coverage: f32,
}

/// An ordered chain of detail levels, finest (level 0 = untouched source)
/// to coarsest.
#[derive(Debug, Clone)]
pub struct LodMesh {
    levels: Vec<LodLevel>,
}

/// Cumulative triangle ratio per level.
///
/// Up to four levels the chain follows `reduction_factor^i`. Beyond four
/// the per-step factor is re-solved so the chain bottoms out near 1% of
/// the source (at least halving per step), and the last two levels drop
/// toward the simplifier's 4-triangle floor so far-field objects render
/// almost for free.
fn level_ratios(level_count: usize, reduction_factor: f32) -> Vec<f32> {
    let mut ratios = Vec::with_capacity(level_count);
    ratios.push(1.0);

    if level_count <= 4 {
        for i in 1..level_count {
            ratios.push(reduction_factor.powi(i as i32));
        }
    } else {
        let step = 0.01f32
            .powf(1.0 / (level_count as f32 - 1.0))
            .min(0.5);
        for i in 1..level_count {
            ratios.push(step.powi(i as i32));
        }
        ratios[level_count - 2] *= 0.5;
        ratios[level_count - 1] *= 0.1;
    }

    ratios
}

impl LodMesh {
    /// Build a LOD chain for `source`.
    ///
    /// `level_count` is clamped to [1, 16], `reduction_factor` to
    /// (0, 0.95]. Level 0 is always an exact copy of the source; coarser
    /// levels cascade, each simplifying its predecessor.
    pub fn generate(source: &Mesh, level_count: usize, reduction_factor: f32) -> LodMesh {
        let level_count = level_count.clamp(MIN_LEVELS, MAX_LEVELS);
        let reduction_factor = reduction_factor.clamp(0.01, 0.95);
        let multiplier: f32 = if level_count > 4 { 1.5 } else { 2.0 };

        let ratios = level_ratios(level_count, reduction_factor);

        let mut levels: Vec<LodLevel> = Vec::with_capacity(level_count);
        levels.push(LodLevel {
            triangle_count: source.triangle_count(),
            mesh: source.clone(),
            max_distance: BASE_DISTANCE,
            min_coverage: BASE_COVERAGE,
        });

        for i in 1..level_count {
            // Cascade from the previous level; the per-step ratio is the
            // quotient of consecutive cumulative ratios.
            let step_ratio = ratios[i] / ratios[i - 1];
            let mesh = simplify(&levels[i - 1].mesh, step_ratio);
            let triangle_count = mesh.triangle_count();

            info!(
                level = i,
                cumulative_ratio = ratios[i],
                triangles = triangle_count,
                "generated LOD level"
            );

            levels.push(LodLevel {
                mesh,
                triangle_count,
                max_distance: BASE_DISTANCE * multiplier.powi(i as i32),
                min_coverage: BASE_COVERAGE * 0.5f32.powi(i as i32),
            });
        }

        LodMesh { levels }
    }

    /// Number of levels in the chain.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Level `i`, saturating out-of-range requests to the nearest valid
    /// level.
    pub fn level(&self, i: usize) -> &LodLevel {
        let i = i.min(self.levels.len() - 1);
        &self.levels[i]
    }

    /// Triangle count of level `i` (saturating).
    pub fn triangle_count(&self, i: usize) -> usize {
        self.level(i).triangle_count
    }

    /// Override the per-level distance thresholds. Extra entries are
    /// ignored; missing entries leave the derived values in place.
    pub fn set_distances(&mut self, distances: &[f32]) {
        for (level, &d) in self.levels.iter_mut().zip(distances.iter()) {
            level.max_distance = d.max(0.0);
        }
    }

    /// Index of the level for a bias-adjusted view distance.
    ///
    /// Walks the chain finest to coarsest and returns the first level whose
    /// distance threshold is not exceeded; past the last threshold the
    /// coarsest level wins.
    pub fn index_for_distance(&self, distance: f32, bias: f32) -> usize {
        let adjusted = distance * bias;
        for (i, level) in self.levels.iter().enumerate() {
            if adjusted <= level.max_distance {
                return i;
            }
        }
        self.levels.len() - 1
    }

    /// Index of the level for a screen-height coverage fraction.
    ///
    /// Bias above 1 shrinks the effective coverage, shifting selection
    /// toward coarser levels.
    pub fn index_for_coverage(&self, coverage: f32, bias: f32) -> usize {
        let adjusted = if bias > 0.0 { coverage / bias } else { coverage };
        for (i, level) in self.levels.iter().enumerate() {
            if adjusted >= level.min_coverage {
                return i;
            }
        }
        self.levels.len() - 1
    }

    /// Mesh to draw at a bias-adjusted view distance.
    pub fn select_by_distance(&self, distance: f32, bias: f32) -> &Mesh {
        &self.levels[self.index_for_distance(distance, bias)].mesh
    }

    /// Mesh to draw for a screen-height coverage fraction.
    pub fn select_by_coverage(&self, coverage: f32, bias: f32) -> &Mesh {
        &self.levels[self.index_for_coverage(coverage, bias)].mesh
    }
}

/// A member of a [`LodGroup`].
#[derive(Debug, Clone)]
pub struct GroupEntry {
    pub lod: LodMesh,
    pub position: Vec3,
    pub scale: f32,
    pub current_level: usize,
}

/// Batches several LOD meshes so one camera position updates them all.
#[derive(Debug, Clone)]
pub struct LodGroup {
    entries: Vec<GroupEntry>,
    bias: f32,
    visible_triangles: usize,
}

impl Default for LodGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl LodGroup {
    pub fn new() -> LodGroup {
        LodGroup {
            entries: Vec::new(),
            bias: 1.0,
            visible_triangles: 0,
        }
    }

    /// Add a member at `position` with uniform `scale`.
    pub fn add(&mut self, lod: LodMesh, position: Vec3, scale: f32) {
        self.entries.push(GroupEntry {
            lod,
            position,
            scale: scale.max(f32::EPSILON),
            current_level: 0,
        });
    }

    pub fn set_bias(&mut self, bias: f32) {
        self.bias = bias.max(0.0);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Recompute every member's level from `camera` and return the total
    /// triangle count the group would draw.
    pub fn update(&mut self, camera: Vec3) -> usize {
        let mut total = 0;
        for entry in &mut self.entries {
            let distance = (entry.position - camera).length() / entry.scale;
            entry.current_level = entry.lod.index_for_distance(distance, self.bias);
            total += entry.lod.triangle_count(entry.current_level);
        }
        self.visible_triangles = total;
        total
    }

    /// Total triangles chosen by the last `update`.
    pub fn visible_triangles(&self) -> usize {
        self.visible_triangles
    }

    /// Level chosen for member `i` by the last `update`.
    pub fn level_of(&self, i: usize) -> usize {
        self.entries[i].current_level
    }

    /// Mesh to draw for member `i`.
    pub fn mesh_of(&self, i: usize) -> &Mesh {
        let entry = &self.entries[i];
        &entry.lod.level(entry.current_level).mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PrimitiveTopology;

    /// Generate a flat grid mesh with `n x n` quads (2 triangles each).
    fn make_grid(n: usize) -> Mesh {
        let verts_per_side = n + 1;
        let mut positions = Vec::with_capacity(verts_per_side * verts_per_side * 3);

        for y in 0..verts_per_side {
            for x in 0..verts_per_side {
                let fx = x as f32 / n as f32;
                let fy = y as f32 / n as f32;
                positions.extend_from_slice(&[fx, fy, 0.0]);
            }
        }

        let mut indices = Vec::with_capacity(n * n * 6);
        for y in 0..n {
            for x in 0..n {
                let tl = (y * verts_per_side + x) as u32;
                let tr = tl + 1;
                let bl = tl + verts_per_side as u32;
                let br = bl + 1;
                indices.extend_from_slice(&[tl, bl, tr, tr, bl, br]);
            }
        }

        Mesh {
            positions,
            indices,
            topology: PrimitiveTopology::Triangles,
            ..Default::default()
        }
    }

    #[test]
    fn level_zero_is_exact_copy() {
        let mesh = make_grid(10);
        let lod = LodMesh::generate(&mesh, 4, 0.5);
        assert_eq!(lod.level(0).mesh.positions, mesh.positions);
        assert_eq!(lod.level(0).mesh.indices, mesh.indices);
        assert_eq!(lod.level(0).triangle_count, mesh.triangle_count());
    }

    #[test]
    fn triangle_counts_monotonically_decrease() {
        let mesh = make_grid(20); // 800 triangles
        let lod = LodMesh::generate(&mesh, 5, 0.5);
        for i in 1..lod.len() {
            assert!(
                lod.triangle_count(i) <= lod.triangle_count(i - 1),
                "level {} ({}) > level {} ({})",
                i,
                lod.triangle_count(i),
                i - 1,
                lod.triangle_count(i - 1),
            );
        }
    }

    #[test]
    fn level_count_is_clamped() {
        let mesh = make_grid(4);
        assert_eq!(LodMesh::generate(&mesh, 0, 0.5).len(), MIN_LEVELS);
        assert_eq!(LodMesh::generate(&mesh, 100, 0.5).len(), MAX_LEVELS);
    }

    #[test]
    fn deep_chains_reach_the_floor() {
        let mesh = make_grid(16); // 512 triangles
        let lod = LodMesh::generate(&mesh, 8, 0.5);
        // With >4 levels the tail is forced toward the 4-triangle floor;
        // flip rejections can leave it slightly above the exact target.
        assert!(
            lod.triangle_count(7) <= 20,
            "tail level too heavy: {}",
            lod.triangle_count(7)
        );
        assert!(lod.triangle_count(7) < lod.triangle_count(3));
    }

    #[test]
    fn distance_thresholds_grow_geometrically() {
        let mesh = make_grid(4);
        let lod = LodMesh::generate(&mesh, 4, 0.5);
        assert_eq!(lod.level(0).max_distance, 10.0);
        assert_eq!(lod.level(1).max_distance, 20.0);
        assert_eq!(lod.level(2).max_distance, 40.0);

        let deep = LodMesh::generate(&mesh, 6, 0.5);
        assert_eq!(deep.level(1).max_distance, 15.0);
    }

    #[test]
    fn selection_by_distance_is_monotone() {
        let mesh = make_grid(10);
        let lod = LodMesh::generate(&mesh, 4, 0.5);
        let mut prev = 0;
        for d in [1.0, 15.0, 30.0, 60.0, 500.0] {
            let idx = lod.index_for_distance(d, 1.0);
            assert!(idx >= prev, "index decreased at distance {d}");
            prev = idx;
        }
        assert_eq!(lod.index_for_distance(1.0, 1.0), 0);
        assert_eq!(lod.index_for_distance(1e6, 1.0), lod.len() - 1);
    }

    #[test]
    fn bias_shifts_selection_coarser() {
        let mesh = make_grid(10);
        let lod = LodMesh::generate(&mesh, 4, 0.5);
        let neutral = lod.index_for_distance(15.0, 1.0);
        let biased = lod.index_for_distance(15.0, 3.0);
        assert!(biased >= neutral);
        assert_eq!(lod.index_for_distance(15.0, 0.5), 0);
    }

    #[test]
    fn selection_by_coverage() {
        let mesh = make_grid(10);
        let lod = LodMesh::generate(&mesh, 4, 0.5);
        // Large on screen -> finest
        assert_eq!(lod.index_for_coverage(0.9, 1.0), 0);
        // Tiny on screen -> coarsest
        assert_eq!(lod.index_for_coverage(0.001, 1.0), lod.len() - 1);
        // Bias above 1 never selects finer
        assert!(lod.index_for_coverage(0.3, 2.0) >= lod.index_for_coverage(0.3, 1.0));
    }

    #[test]
    fn level_access_saturates() {
        let mesh = make_grid(4);
        let lod = LodMesh::generate(&mesh, 3, 0.5);
        let last = lod.level(2).triangle_count;
        assert_eq!(lod.level(99).triangle_count, last);
        assert_eq!(lod.triangle_count(99), last);
    }

    #[test]
    fn set_distances_overrides_thresholds() {
        let mesh = make_grid(4);
        let mut lod = LodMesh::generate(&mesh, 4, 0.5);
        lod.set_distances(&[5.0, 50.0]);
        assert_eq!(lod.level(0).max_distance, 5.0);
        assert_eq!(lod.level(1).max_distance, 50.0);
        // Levels past the override keep derived values
        assert_eq!(lod.level(2).max_distance, 40.0);
        assert_eq!(lod.index_for_distance(30.0, 1.0), 1);
    }

    #[test]
    fn group_update_accumulates_triangles() {
        let mesh = make_grid(10); // 200 triangles
        let mut group = LodGroup::new();
        group.add(LodMesh::generate(&mesh, 4, 0.5), Vec3::ZERO, 1.0);
        group.add(
            LodMesh::generate(&mesh, 4, 0.5),
            Vec3::new(1000.0, 0.0, 0.0),
            1.0,
        );

        let total = group.update(Vec3::ZERO);
        assert_eq!(total, group.visible_triangles());
        assert_eq!(group.level_of(0), 0, "near member draws full detail");
        assert_eq!(group.level_of(1), 3, "far member draws coarsest");
        assert!(group.mesh_of(1).triangle_count() < group.mesh_of(0).triangle_count());
        assert!(total < 2 * mesh.triangle_count());
    }
}
