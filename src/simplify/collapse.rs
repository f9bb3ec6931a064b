use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use glam::Vec3;
use tracing::debug;

use crate::types::{Mesh, PrimitiveTopology};

use super::quadric::Quadric;

/// Simplification never reduces a mesh below this many triangles.
const MIN_TRIANGLES: usize = 4;

/// Fixed cost added to collapses of boundary edges (edges used by exactly
/// one triangle). Keeps silhouette-defining edges alive until everything
/// interior has been drained.
const BOUNDARY_PENALTY: f64 = 1000.0;

/// Weight of the edge-length term in the collapse cost. Prefers collapsing
/// short edges first; not part of the classical quadric cost.
const EDGE_LENGTH_WEIGHT: f64 = 0.1;

/// A collapse that reverses a face normal produces a dot product between
/// old and new normal below this threshold.
const FLIP_THRESHOLD: f32 = -0.1;

/// A candidate edge collapse in the priority queue.
#[derive(Debug, Clone, Copy)]
struct EdgeCollapse {
    v1: u32,
    v2: u32,
    cost: f64,
}

impl PartialEq for EdgeCollapse {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost
    }
}

impl Eq for EdgeCollapse {}

impl PartialOrd for EdgeCollapse {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EdgeCollapse {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap, we want the cheapest collapse
        other
            .cost
            .partial_cmp(&self.cost)
            .unwrap_or(Ordering::Equal)
    }
}

/// Scratch state for one `simplify` call.
struct WorkingMesh {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    triangles: Vec<[u32; 3]>,
    quadrics: Vec<Quadric>,
    /// Triangle indices incident to each vertex.
    vertex_triangles: Vec<HashSet<u32>>,
    triangle_valid: Vec<bool>,
    /// Union-find: resolves a vertex to its current collapse target.
    vertex_map: Vec<u32>,
    live_triangles: usize,
}

impl WorkingMesh {
    fn build(mesh: &Mesh) -> WorkingMesh {
        let (positions, normals, triangles) = if mesh.is_indexed() {
            let positions: Vec<Vec3> = (0..mesh.vertex_count()).map(|i| mesh.position(i)).collect();
            let normals: Vec<Vec3> = if mesh.has_normals() {
                (0..mesh.vertex_count()).map(|i| mesh.normal(i)).collect()
            } else {
                Vec::new()
            };
            let triangles = mesh
                .indices
                .chunks_exact(3)
                .map(|t| [t[0], t[1], t[2]])
                .collect();
            (positions, normals, triangles)
        } else {
            weld(mesh)
        };

        let vertex_count = positions.len();
        let triangle_count = triangles.len();

        let mut quadrics = vec![Quadric::ZERO; vertex_count];
        let mut vertex_triangles = vec![HashSet::new(); vertex_count];

        for (t, tri) in triangles.iter().enumerate() {
            let q = Quadric::from_triangle(
                positions[tri[0] as usize],
                positions[tri[1] as usize],
                positions[tri[2] as usize],
            );
            for &v in tri {
                quadrics[v as usize] += q;
                vertex_triangles[v as usize].insert(t as u32);
            }
        }

        WorkingMesh {
            positions,
            normals,
            triangles,
            quadrics,
            vertex_triangles,
            triangle_valid: vec![true; triangle_count],
            vertex_map: (0..vertex_count as u32).collect(),
            live_triangles: triangle_count,
        }
    }

    /// Resolve a vertex to its collapse target, compressing the path.
    fn find(&mut self, v: u32) -> u32 {
        let mut root = v;
        while self.vertex_map[root as usize] != root {
            root = self.vertex_map[root as usize];
        }
        let mut cur = v;
        while self.vertex_map[cur as usize] != root {
            let next = self.vertex_map[cur as usize];
            self.vertex_map[cur as usize] = root;
            cur = next;
        }
        root
    }

    /// Resolved indices of triangle `t`.
    fn resolved(&mut self, t: u32) -> [u32; 3] {
        let tri = self.triangles[t as usize];
        [self.find(tri[0]), self.find(tri[1]), self.find(tri[2])]
    }

    /// Count faces around `a` or `b` whose normal would reverse if both
    /// endpoints moved to `candidate`. Faces that the collapse removes
    /// (incident to both endpoints) are excluded.
    fn count_flips(&mut self, a: u32, b: u32, candidate: Vec3) -> usize {
        let mut affected: Vec<u32> = self.vertex_triangles[a as usize]
            .iter()
            .chain(self.vertex_triangles[b as usize].iter())
            .copied()
            .collect();
        affected.sort_unstable();
        affected.dedup();

        let mut flips = 0;
        for t in affected {
            if !self.triangle_valid[t as usize] {
                continue;
            }
            let tri = self.resolved(t);
            let touches_a = tri.contains(&a);
            let touches_b = tri.contains(&b);
            if touches_a && touches_b {
                continue; // degenerates away, not a flip
            }
            if !touches_a && !touches_b {
                continue; // stale incidence entry
            }

            let old = [
                self.positions[tri[0] as usize],
                self.positions[tri[1] as usize],
                self.positions[tri[2] as usize],
            ];
            let new: Vec<Vec3> = tri
                .iter()
                .zip(old.iter())
                .map(|(&v, &p)| if v == a || v == b { candidate } else { p })
                .collect();

            let old_n = (old[1] - old[0]).cross(old[2] - old[0]).normalize_or_zero();
            let new_n = (new[1] - new[0]).cross(new[2] - new[0]).normalize_or_zero();
            if old_n != Vec3::ZERO && new_n != Vec3::ZERO && old_n.dot(new_n) < FLIP_THRESHOLD {
                flips += 1;
            }
        }
        flips
    }

    /// Merge `b` into `a` at `candidate`, invalidating degenerate faces.
    fn collapse(&mut self, a: u32, b: u32, candidate: Vec3) {
        self.positions[a as usize] = candidate;
        if !self.normals.is_empty() {
            let n = self.normals[a as usize] + self.normals[b as usize];
            self.normals[a as usize] = n.normalize_or_zero();
        }

        let qb = self.quadrics[b as usize];
        self.quadrics[a as usize] += qb;
        self.vertex_map[b as usize] = a;

        let moved: Vec<u32> = self.vertex_triangles[b as usize].drain().collect();
        for t in moved {
            self.vertex_triangles[a as usize].insert(t);
        }

        let incident: Vec<u32> = self.vertex_triangles[a as usize].iter().copied().collect();
        for t in incident {
            if !self.triangle_valid[t as usize] {
                continue;
            }
            let tri = self.resolved(t);
            if tri[0] == tri[1] || tri[1] == tri[2] || tri[0] == tri[2] {
                self.triangle_valid[t as usize] = false;
                self.live_triangles -= 1;
            }
        }
    }

    /// Re-index the surviving triangles into a fresh output mesh.
    fn rebuild(&mut self, regenerate_normals: bool) -> Mesh {
        let mut remap: HashMap<u32, u32> = HashMap::new();
        let mut out = Mesh::default();

        for t in 0..self.triangles.len() as u32 {
            if !self.triangle_valid[t as usize] {
                continue;
            }
            let tri = self.resolved(t);
            if tri[0] == tri[1] || tri[1] == tri[2] || tri[0] == tri[2] {
                continue;
            }
            for v in tri {
                let next = remap.len() as u32;
                let idx = *remap.entry(v).or_insert(next);
                if idx == next {
                    out.push_vertex(self.positions[v as usize]);
                }
                out.push_index(idx);
            }
        }

        if regenerate_normals {
            // Averaging normals during collapse only approximates the final
            // surface; rebuild them from the surviving topology.
            out.generate_normals();
        }
        out
    }
}

/// Merge positionally coincident vertices of a raw triangle soup so edge
/// adjacency can be computed. Matches on exact bit patterns.
fn weld(mesh: &Mesh) -> (Vec<Vec3>, Vec<Vec3>, Vec<[u32; 3]>) {
    let mut lookup: HashMap<[u32; 3], u32> = HashMap::new();
    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let has_normals = mesh.has_normals();

    let mut map_vertex = |i: usize, positions: &mut Vec<Vec3>, normals: &mut Vec<Vec3>| -> u32 {
        let p = mesh.position(i);
        let key = [p.x.to_bits(), p.y.to_bits(), p.z.to_bits()];
        *lookup.entry(key).or_insert_with(|| {
            positions.push(p);
            if has_normals {
                normals.push(mesh.normal(i));
            }
            positions.len() as u32 - 1
        })
    };

    let mut triangles = Vec::with_capacity(mesh.vertex_count() / 3);
    for t in 0..mesh.vertex_count() / 3 {
        triangles.push([
            map_vertex(t * 3, &mut positions, &mut normals),
            map_vertex(t * 3 + 1, &mut positions, &mut normals),
            map_vertex(t * 3 + 2, &mut positions, &mut normals),
        ]);
    }

    (positions, normals, triangles)
}

/// Undirected edges of the working mesh in first-encounter order, each with
/// its incident-face count.
fn collect_edges(triangles: &[[u32; 3]]) -> Vec<((u32, u32), u32)> {
    let mut order: Vec<(u32, u32)> = Vec::new();
    let mut counts: HashMap<(u32, u32), u32> = HashMap::new();

    for tri in triangles {
        for (i, j) in [(0, 1), (1, 2), (2, 0)] {
            let a = tri[i].min(tri[j]);
            let b = tri[i].max(tri[j]);
            if a == b {
                continue;
            }
            let entry = counts.entry((a, b)).or_insert(0);
            if *entry == 0 {
                order.push((a, b));
            }
            *entry += 1;
        }
    }

    order
        .into_iter()
        .map(|e| (e, counts[&e]))
        .collect()
}

/// Simplify `mesh` down to `target_ratio` of its triangle count by greedy
/// quadric-guided edge collapse.
///
/// `target_ratio` is the fraction of triangles to retain; values >= 1 (or
/// inputs already at the 4-triangle floor) return an unmodified copy. The
/// operation cannot fail -- inputs it cannot handle pass through as copies.
pub fn simplify(mesh: &Mesh, target_ratio: f32) -> Mesh {
    if mesh.is_empty() || mesh.topology != PrimitiveTopology::Triangles || target_ratio >= 1.0 {
        return mesh.clone();
    }

    let original = mesh.triangle_count();
    let target = MIN_TRIANGLES.max((original as f64 * target_ratio as f64).round() as usize);
    if original <= target {
        return mesh.clone();
    }

    let mut work = WorkingMesh::build(mesh);

    let mut heap = BinaryHeap::new();
    for ((a, b), faces) in collect_edges(&work.triangles) {
        let midpoint = Quadric::optimal_point(
            work.positions[a as usize],
            work.positions[b as usize],
        );
        let quadric = work.quadrics[a as usize] + work.quadrics[b as usize];
        let length =
            (work.positions[a as usize] - work.positions[b as usize]).length() as f64;

        let mut cost = quadric.error(midpoint).max(0.0) + EDGE_LENGTH_WEIGHT * length;
        if faces == 1 {
            cost += BOUNDARY_PENALTY;
        }
        heap.push(EdgeCollapse { v1: a, v2: b, cost });
    }

    while work.live_triangles > target {
        let Some(edge) = heap.pop() else {
            break;
        };

        let a = work.find(edge.v1);
        let b = work.find(edge.v2);
        if a == b {
            continue; // already collapsed
        }

        let candidate =
            Quadric::optimal_point(work.positions[a as usize], work.positions[b as usize]);

        // A single reversed face is tolerated as numerical noise; more than
        // one means the collapse folds the surface over itself.
        if work.count_flips(a, b, candidate) > 1 {
            continue;
        }

        work.collapse(a, b, candidate);
    }

    let out = work.rebuild(mesh.has_normals());
    debug!(
        original,
        target,
        produced = out.triangle_count(),
        "simplified mesh"
    );
    out
}
