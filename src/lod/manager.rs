use std::collections::HashMap;

use glam::{Mat4, Vec3};
use tracing::{debug, info};

use crate::telemetry::FrameStats;
use crate::types::{BoundingSphere, Mesh, PrimitiveTopology};

use super::mesh::{LodMesh, MAX_LEVELS, MIN_LEVELS};

/// Caller-assigned stable identity for a source mesh.
///
/// Keys the LOD cache. Handles must be unique per mesh and must not be
/// reused for different geometry while the manager holds entries for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u64);

impl MeshHandle {
    pub const fn new(id: u64) -> MeshHandle {
        MeshHandle(id)
    }
}

/// How the manager chooses a level each draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionPolicy {
    /// Compare bias-adjusted view distance against level thresholds.
    #[default]
    Distance,
    /// Project the bounding sphere to a screen-height fraction.
    ScreenSize,
    /// Bound the on-screen pixel error introduced by each level.
    ScreenError,
    /// Enforce a per-frame triangle budget, falling back to `ScreenSize`
    /// while under budget.
    TriangleBudget,
}

/// Cached per-mesh state: the generated chain plus the bounding sphere the
/// screen-space policies need.
#[derive(Debug)]
struct CacheEntry {
    lod: LodMesh,
    sphere: BoundingSphere,
}

/// Outcome of the per-draw decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    /// Input not managed; draw the original.
    PassThrough,
    /// Beyond the unload distance; draw nothing.
    Unload,
    /// Draw this level from the cache.
    Level(usize),
}

/// Per-frame, per-object LOD decision layer.
///
/// Owns the chain cache and all selection knobs. One instance per render
/// thread; selection runs synchronously inside the draw loop and the first
/// encounter with a mesh pays its chain generation on the spot.
#[derive(Debug)]
pub struct AutoLodManager {
    enabled: bool,
    policy: SelectionPolicy,
    level_count: usize,
    reduction_factor: f32,
    bias: f32,
    distance_scale: f32,
    min_full_quality_distance: f32,
    min_vertex_count: usize,
    unload_enabled: bool,
    unload_distance: f32,
    screen_height: f32,
    fov_y: f32,
    screen_error_budget: f32,
    triangle_budget: usize,
    adaptive_enabled: bool,
    target_frame_time: f32,
    frame_time: f32,
    stats_enabled: bool,
    camera: Vec3,
    distance_overrides: Option<Vec<f32>>,
    cache: HashMap<MeshHandle, CacheEntry>,
    frame_triangles: usize,
    frame_meshes: usize,
    empty_mesh: Mesh,
}

/// Adaptive bias never leaves this range.
const BIAS_MIN: f32 = 0.5;
const BIAS_MAX: f32 = 3.0;

impl Default for AutoLodManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AutoLodManager {
    pub fn new() -> AutoLodManager {
        AutoLodManager {
            enabled: true,
            policy: SelectionPolicy::Distance,
            level_count: 4,
            reduction_factor: 0.5,
            bias: 1.0,
            distance_scale: 1.0,
            min_full_quality_distance: 5.0,
            min_vertex_count: 32,
            unload_enabled: false,
            unload_distance: 1000.0,
            screen_height: 1080.0,
            fov_y: 60f32.to_radians(),
            screen_error_budget: 4.0,
            triangle_budget: 500_000,
            adaptive_enabled: false,
            target_frame_time: 1.0 / 60.0,
            frame_time: 0.0,
            stats_enabled: true,
            camera: Vec3::ZERO,
            distance_overrides: None,
            cache: HashMap::new(),
            frame_triangles: 0,
            frame_meshes: 0,
            empty_mesh: Mesh::default(),
        }
    }

    // -- frame loop ------------------------------------------------------

    /// Start a frame: record the camera and zero the accumulators.
    pub fn begin_frame(&mut self, camera: Vec3) {
        self.camera = camera;
        self.frame_triangles = 0;
        self.frame_meshes = 0;
    }

    /// End a frame, recording its measured duration in seconds.
    pub fn end_frame(&mut self, frame_time: f32) {
        self.frame_time = frame_time.max(0.0);
    }

    /// Nudge the global bias against the measured frame time.
    ///
    /// Called once per frame by the host. Over 1.2x the target the bias
    /// steps up (coarser); under 0.8x it steps down (finer); the band in
    /// between leaves it alone.
    pub fn adapt_quality(&mut self) {
        if !self.adaptive_enabled {
            return;
        }
        if self.frame_time > self.target_frame_time * 1.2 {
            self.bias = (self.bias * 1.1).min(BIAS_MAX);
        } else if self.frame_time < self.target_frame_time * 0.8 {
            self.bias = (self.bias * 0.95).max(BIAS_MIN);
        }
    }

    // -- selection -------------------------------------------------------

    /// Pick the mesh to draw for `handle` this frame.
    ///
    /// Returns the original mesh when the input is not managed (disabled
    /// manager, too few vertices, non-triangle topology), the shared empty
    /// mesh when the object is beyond the unload distance, and otherwise a
    /// cached level chosen by the active policy. Never fails; the worst
    /// outcome is drawing finer detail than strictly needed.
    pub fn select_mesh<'a>(
        &'a mut self,
        handle: MeshHandle,
        mesh: &'a Mesh,
        model: &Mat4,
    ) -> &'a Mesh {
        match self.decide(handle, mesh, model) {
            Decision::PassThrough => mesh,
            Decision::Unload => &self.empty_mesh,
            Decision::Level(i) => {
                let Some(entry) = self.cache.get(&handle) else {
                    return mesh;
                };
                let triangles = entry.lod.triangle_count(i);
                if self.stats_enabled {
                    self.frame_triangles += triangles;
                    self.frame_meshes += 1;
                }
                match self.cache.get(&handle) {
                    Some(entry) => &entry.lod.level(i).mesh,
                    None => mesh,
                }
            }
        }
    }

    /// Level index the manager would draw, for telemetry and debugging.
    ///
    /// `None` means the mesh is passed through or unloaded. Does not touch
    /// the frame statistics, but does fill the cache like `select_mesh`.
    pub fn select_index(
        &mut self,
        handle: MeshHandle,
        mesh: &Mesh,
        model: &Mat4,
    ) -> Option<usize> {
        match self.decide(handle, mesh, model) {
            Decision::Level(i) => Some(i),
            _ => None,
        }
    }

    fn decide(&mut self, handle: MeshHandle, mesh: &Mesh, model: &Mat4) -> Decision {
        if !self.enabled
            || mesh.topology != PrimitiveTopology::Triangles
            || mesh.vertex_count() < self.min_vertex_count
        {
            return Decision::PassThrough;
        }

        let object_pos = model.w_axis.truncate();
        let distance = (object_pos - self.camera).length();

        // Unloaded objects bypass the cache and the statistics so the
        // frame totals describe geometry that is actually rendered.
        if self.unload_enabled && distance > self.unload_distance * self.distance_scale {
            return Decision::Unload;
        }

        self.ensure_cached(handle, mesh);

        if distance <= self.min_full_quality_distance * self.distance_scale {
            return Decision::Level(0);
        }

        let scale = uniform_scale(model);
        let d_eff = distance / self.distance_scale.max(f32::EPSILON);

        let Some(entry) = self.cache.get(&handle) else {
            return Decision::PassThrough;
        };

        let index = match self.policy {
            SelectionPolicy::Distance => entry.lod.index_for_distance(d_eff, self.bias),
            SelectionPolicy::ScreenSize => {
                let coverage = self.screen_coverage(entry.sphere.radius * scale, distance);
                entry.lod.index_for_coverage(coverage, self.bias)
            }
            SelectionPolicy::ScreenError => {
                self.screen_error_index(&entry.lod, entry.sphere.radius * scale, distance)
            }
            SelectionPolicy::TriangleBudget => {
                let coverage = self.screen_coverage(entry.sphere.radius * scale, distance);
                let base = entry.lod.index_for_coverage(coverage, self.bias);
                self.budget_index(&entry.lod, base, distance)
            }
        };

        Decision::Level(index)
    }

    /// Generate and insert the chain for `handle` if it is not cached yet.
    fn ensure_cached(&mut self, handle: MeshHandle, mesh: &Mesh) {
        if self.cache.contains_key(&handle) {
            return;
        }
        info!(
            handle = handle.0,
            vertices = mesh.vertex_count(),
            triangles = mesh.triangle_count(),
            levels = self.level_count,
            "building LOD chain"
        );
        let mut lod = LodMesh::generate(mesh, self.level_count, self.reduction_factor);
        if let Some(distances) = &self.distance_overrides {
            lod.set_distances(distances);
        }
        let entry = CacheEntry {
            lod,
            sphere: BoundingSphere::from_mesh(mesh),
        };
        self.cache.insert(handle, entry);
    }

    /// Fraction of the screen height the bounding sphere covers.
    fn screen_coverage(&self, world_radius: f32, distance: f32) -> f32 {
        let d = (distance / self.distance_scale).max(f32::EPSILON);
        let half_height = d * (self.fov_y * 0.5).tan();
        (world_radius / half_height.max(f32::EPSILON)).min(1.0)
    }

    /// Coarsest level whose introduced error projects below the pixel
    /// budget. Level 0 introduces no error and always qualifies.
    fn screen_error_index(&self, lod: &LodMesh, world_radius: f32, distance: f32) -> usize {
        let d = (distance / self.distance_scale).max(f32::EPSILON);
        let pixels_per_unit = self.screen_height / (2.0 * d * (self.fov_y * 0.5).tan());

        for i in (0..lod.len()).rev() {
            let world_error = world_radius * (1.0 - self.reduction_factor.powi(i as i32));
            if world_error * pixels_per_unit <= self.screen_error_budget {
                return i;
            }
        }
        0
    }

    /// When the frame is over budget, force a level coarser than `base`,
    /// scaled by how far out the object sits.
    fn budget_index(&self, lod: &LodMesh, base: usize, distance: f32) -> usize {
        if self.frame_triangles <= self.triangle_budget {
            return base;
        }
        let range = (self.unload_distance * self.distance_scale).max(f32::EPSILON);
        let normalized = (distance / range).clamp(0.0, 1.0);
        let forced = ((lod.len() - 1) as f32 * normalized).round() as usize;
        forced.max(base + 1).min(lod.len() - 1)
    }

    // -- setters (all clamping, none failing) ----------------------------

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn set_policy(&mut self, policy: SelectionPolicy) {
        self.policy = policy;
    }

    /// Change the number of levels per chain. Invalidates every cached
    /// chain so the next selection regenerates at the new depth.
    pub fn set_level_count(&mut self, count: usize) {
        let count = count.clamp(MIN_LEVELS, MAX_LEVELS);
        if count != self.level_count {
            self.level_count = count;
            debug!(levels = count, "level count changed, clearing LOD cache");
            self.cache.clear();
        }
    }

    pub fn set_reduction_factor(&mut self, factor: f32) {
        self.reduction_factor = factor.clamp(0.01, 0.95);
    }

    pub fn set_bias(&mut self, bias: f32) {
        self.bias = bias.clamp(BIAS_MIN, BIAS_MAX);
    }

    pub fn set_distance_scale(&mut self, scale: f32) {
        self.distance_scale = scale.max(f32::EPSILON);
    }

    pub fn set_min_full_quality_distance(&mut self, distance: f32) {
        self.min_full_quality_distance = distance.max(0.0);
    }

    /// Override per-level distance thresholds for every chain, cached and
    /// future.
    pub fn set_distances(&mut self, distances: &[f32]) {
        for entry in self.cache.values_mut() {
            entry.lod.set_distances(distances);
        }
        self.distance_overrides = Some(distances.to_vec());
    }

    pub fn set_min_vertex_count(&mut self, count: usize) {
        self.min_vertex_count = count;
    }

    pub fn set_unload_enabled(&mut self, enabled: bool) {
        self.unload_enabled = enabled;
    }

    pub fn set_unload_distance(&mut self, distance: f32) {
        self.unload_distance = distance.max(0.0);
    }

    /// Viewport height in pixels and vertical field of view in radians.
    pub fn set_screen_params(&mut self, height: f32, fov_y: f32) {
        self.screen_height = height.max(1.0);
        self.fov_y = fov_y.clamp(0.01, std::f32::consts::PI - 0.01);
    }

    pub fn set_screen_error_budget(&mut self, pixels: f32) {
        self.screen_error_budget = pixels.max(0.0);
    }

    pub fn set_triangle_budget(&mut self, budget: usize) {
        self.triangle_budget = budget;
    }

    pub fn set_adaptive_enabled(&mut self, enabled: bool) {
        self.adaptive_enabled = enabled;
    }

    pub fn set_target_frame_time(&mut self, seconds: f32) {
        self.target_frame_time = seconds.max(1e-4);
    }

    pub fn set_stats_enabled(&mut self, enabled: bool) {
        self.stats_enabled = enabled;
    }

    /// Drop every cached chain.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    // -- telemetry -------------------------------------------------------

    /// Triangles selected so far this frame.
    pub fn frame_triangles(&self) -> usize {
        self.frame_triangles
    }

    /// Managed meshes drawn so far this frame.
    pub fn frame_meshes(&self) -> usize {
        self.frame_meshes
    }

    /// Number of cached LOD chains.
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Whether a chain exists for `handle`.
    pub fn is_cached(&self, handle: MeshHandle) -> bool {
        self.cache.contains_key(&handle)
    }

    /// Current global bias.
    pub fn bias(&self) -> f32 {
        self.bias
    }

    /// Last recorded frame time in seconds.
    pub fn frame_time(&self) -> f32 {
        self.frame_time
    }

    /// Snapshot of this frame's counters for the stats log.
    pub fn frame_stats(&self, frame: u64) -> FrameStats {
        FrameStats {
            frame,
            triangles: self.frame_triangles,
            meshes_drawn: self.frame_meshes,
            cache_entries: self.cache.len(),
            bias: self.bias,
            frame_time: self.frame_time,
        }
    }
}

/// Best-effort uniform scale of an affine transform: the mean of the three
/// basis-column magnitudes. Exact for uniform scale, approximate otherwise.
fn uniform_scale(model: &Mat4) -> f32 {
    let s = model.x_axis.truncate().length()
        + model.y_axis.truncate().length()
        + model.z_axis.truncate().length();
    (s / 3.0).max(f32::EPSILON)
}
