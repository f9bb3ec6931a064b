use std::time::{Duration, Instant};

use glam::{Mat4, Quat, Vec3};
use tracing::info;

use crate::config::{MeshShape, SimConfig};
use crate::error::Result;
use crate::lod::{AutoLodManager, MeshHandle};
use crate::procedural;
use crate::telemetry::StatsLog;
use crate::types::Mesh;

/// Synthetic per-triangle GPU cost used to model frame time, seconds.
const COST_PER_TRIANGLE: f32 = 50e-9;

/// Fixed per-frame overhead of the modeled renderer, seconds.
const FRAME_OVERHEAD: f32 = 0.004;

/// One placed object: which mesh it instances, where, how big.
struct SceneObject {
    handle: MeshHandle,
    mesh_index: usize,
    position: Vec3,
    scale: f32,
}

/// Summary of a completed simulation run.
#[derive(Debug)]
pub struct SimReport {
    pub frames: usize,
    pub peak_triangles: usize,
    pub final_bias: f32,
    pub cache_entries: usize,
    pub stats: StatsLog,
    pub duration: Duration,
}

/// Camera-flythrough driver -- exercises the manager the way a render
/// loop would, with a synthetic frame-time model in place of a GPU.
pub struct Simulation;

impl Simulation {
    /// Run the full simulation.
    pub fn run(config: &SimConfig) -> Result<SimReport> {
        config.validate()?;
        let start = Instant::now();

        info!(
            objects = config.objects,
            shape = %config.shape,
            resolution = config.resolution,
            "Setting up scene"
        );
        let (meshes, objects) = build_scene(config);

        let mut manager = AutoLodManager::new();
        manager.set_policy(config.policy);
        manager.set_level_count(config.levels);
        manager.set_reduction_factor(config.reduction_factor);
        manager.set_triangle_budget(config.triangle_budget);
        manager.set_target_frame_time(config.target_frame_time);
        manager.set_adaptive_enabled(config.adaptive);
        if let Some(distance) = config.unload_distance {
            manager.set_unload_enabled(true);
            manager.set_unload_distance(distance);
        }

        info!(frames = config.frames, policy = ?config.policy, "Running flythrough");
        let mut stats = StatsLog::new();

        for frame in 0..config.frames {
            // Fly along the ring axis, one scene diameter per run
            let t = frame as f32 / config.frames as f32;
            let camera = Vec3::new(-200.0 + 400.0 * t, 10.0, 0.0);

            manager.begin_frame(camera);
            for object in &objects {
                let model = Mat4::from_scale_rotation_translation(
                    Vec3::splat(object.scale),
                    Quat::IDENTITY,
                    object.position,
                );
                let _ = manager.select_mesh(object.handle, &meshes[object.mesh_index], &model);
            }

            let frame_time =
                FRAME_OVERHEAD + manager.frame_triangles() as f32 * COST_PER_TRIANGLE;
            manager.end_frame(frame_time);
            manager.adapt_quality();

            stats.push(manager.frame_stats(frame as u64));
        }

        if let Some(path) = &config.stats_out {
            info!(path = %path.display(), "Writing stats log");
            stats.write_json(path)?;
        }

        let duration = start.elapsed();
        info!(
            frames = config.frames,
            peak_triangles = stats.peak_triangles(),
            final_bias = manager.bias(),
            elapsed = ?duration,
            "Simulation complete"
        );

        Ok(SimReport {
            frames: config.frames,
            peak_triangles: stats.peak_triangles(),
            final_bias: manager.bias(),
            cache_entries: manager.cache_len(),
            stats,
            duration,
        })
    }
}

/// Place `config.objects` instances of a few mesh variants on a ring
/// around the origin. Objects sharing a variant share a handle, so the
/// cache holds one chain per variant.
fn build_scene(config: &SimConfig) -> (Vec<Mesh>, Vec<SceneObject>) {
    let variant_count = config.objects.min(4);
    let meshes: Vec<Mesh> = (0..variant_count)
        .map(|i| {
            let resolution = config.resolution + i * 4;
            match config.shape {
                MeshShape::Grid => procedural::grid(resolution),
                MeshShape::Sphere => procedural::uv_sphere(resolution),
            }
        })
        .collect();

    let objects = (0..config.objects)
        .map(|i| {
            let angle = i as f32 / config.objects as f32 * std::f32::consts::TAU;
            let radius = 40.0 + (i % 5) as f32 * 25.0;
            SceneObject {
                handle: MeshHandle::new((i % variant_count) as u64),
                mesh_index: i % variant_count,
                position: Vec3::new(angle.cos() * radius, 0.0, angle.sin() * radius),
                scale: 0.5 + (i % 4) as f32 * 0.5,
            }
        })
        .collect();

    (meshes, objects)
}
