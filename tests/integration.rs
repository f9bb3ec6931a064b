//! End-to-end integration tests.
//!
//! These tests drive the manager the way a render loop would: generate
//! chains on first sight, fly a camera, and validate the telemetry that
//! comes out the other side.

use glam::{Mat4, Vec3};

use auto_lod::config::SimConfig;
use auto_lod::lod::{AutoLodManager, LodMesh, MeshHandle, SelectionPolicy};
use auto_lod::procedural::{grid, uv_sphere};
use auto_lod::simulation::Simulation;
use auto_lod::telemetry::StatsLog;

fn at(x: f32) -> Mat4 {
    Mat4::from_translation(Vec3::new(x, 0.0, 0.0))
}

#[test]
fn chain_covers_full_distance_range() {
    let mesh = uv_sphere(32);
    let lod = LodMesh::generate(&mesh, 6, 0.5);

    assert_eq!(lod.len(), 6);
    assert_eq!(lod.level(0).mesh.positions, mesh.positions);

    // Sweeping the whole range walks the chain coarser, never finer
    let mut prev = 0;
    let mut distance = 1.0;
    while distance < 10_000.0 {
        let idx = lod.index_for_distance(distance, 1.0);
        assert!(idx >= prev, "selection went finer at distance {distance}");
        prev = idx;
        distance *= 2.0;
    }
    assert_eq!(prev, 5, "far end of the sweep must reach the coarsest level");
}

#[test]
fn frame_loop_with_mixed_objects() {
    let near_mesh = grid(24);
    let far_mesh = uv_sphere(24);

    let mut manager = AutoLodManager::new();
    manager.set_unload_enabled(true);
    manager.set_unload_distance(400.0);

    let near = MeshHandle::new(1);
    let far = MeshHandle::new(2);
    let gone = MeshHandle::new(3);

    for frame in 0..5u64 {
        manager.begin_frame(Vec3::ZERO);

        let t1 = manager.select_mesh(near, &near_mesh, &at(2.0)).triangle_count();
        assert_eq!(t1, near_mesh.triangle_count());

        let t2 = manager.select_mesh(far, &far_mesh, &at(120.0)).triangle_count();
        assert!(t2 > 0);
        assert!(t2 < far_mesh.triangle_count());

        assert!(manager.select_mesh(gone, &far_mesh, &at(500.0)).is_empty());

        manager.end_frame(0.016);

        let stats = manager.frame_stats(frame);
        assert_eq!(stats.meshes_drawn, 2, "unloaded object must not count");
        assert_eq!(stats.triangles, t1 + t2);
    }

    // Unloaded object never entered the cache; the two drawn ones did
    assert_eq!(manager.cache_len(), 2);
}

#[test]
fn regeneration_after_level_count_change() {
    let mesh = grid(16);
    let handle = MeshHandle::new(1);
    let mut manager = AutoLodManager::new();

    manager.begin_frame(Vec3::ZERO);
    manager.select_mesh(handle, &mesh, &at(30.0));
    assert!(manager.is_cached(handle));

    manager.set_level_count(8);
    assert_eq!(manager.cache_len(), 0);

    manager.select_mesh(handle, &mesh, &at(30.0));
    assert!(manager.is_cached(handle));
    // The regenerated chain carries the new depth: a very distant object
    // now lands past index 3
    let idx = manager.select_index(handle, &mesh, &at(5_000.0)).unwrap();
    assert!(idx > 3);
}

#[test]
fn policies_agree_on_extremes() {
    let mesh = uv_sphere(32);
    let handle = MeshHandle::new(1);

    for policy in [
        SelectionPolicy::Distance,
        SelectionPolicy::ScreenSize,
        SelectionPolicy::ScreenError,
        SelectionPolicy::TriangleBudget,
    ] {
        let mut manager = AutoLodManager::new();
        manager.set_policy(policy);
        manager.begin_frame(Vec3::ZERO);

        // Hugging the camera: full quality under every policy
        assert_eq!(
            manager.select_index(handle, &mesh, &at(1.0)),
            Some(0),
            "{policy:?} near"
        );

        // Far out: never full quality
        let idx = manager.select_index(handle, &mesh, &at(2_000.0)).unwrap();
        assert!(idx > 0, "{policy:?} far picked level 0");
    }
}

#[test]
fn simulation_writes_stats_log() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stats.json");

    let config = SimConfig {
        objects: 6,
        resolution: 8,
        frames: 12,
        stats_out: Some(path.clone()),
        ..Default::default()
    };
    let report = Simulation::run(&config).unwrap();
    assert_eq!(report.stats.len(), 12);

    let text = std::fs::read_to_string(&path).unwrap();
    let log: StatsLog = serde_json::from_str(&text).unwrap();
    assert_eq!(log.frames.len(), 12);
    assert!(log.frames.iter().all(|f| f.cache_entries <= 4));
    assert_eq!(log.peak_triangles(), report.peak_triangles);
}

#[test]
fn adaptive_simulation_converges_coarser_under_load() {
    let config = SimConfig {
        objects: 16,
        resolution: 40,
        frames: 80,
        adaptive: true,
        target_frame_time: 0.0001,
        ..Default::default()
    };
    let report = Simulation::run(&config).unwrap();

    // An unreachable frame-time target drives the bias to its ceiling
    assert!(report.final_bias > 1.5);
    let first = &report.stats.frames[0];
    let last = report.stats.frames.last().unwrap();
    assert!(last.bias > first.bias);
}
