use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One frame's counters, as reported by the manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameStats {
    pub frame: u64,
    /// Triangles selected for drawing this frame.
    pub triangles: usize,
    /// Managed meshes drawn this frame.
    pub meshes_drawn: usize,
    /// LOD chains resident in the cache.
    pub cache_entries: usize,
    /// Global bias at the end of the frame.
    pub bias: f32,
    /// Measured frame time in seconds.
    pub frame_time: f32,
}

/// Accumulated per-frame snapshots for a run, written as one JSON document
/// for host-side tooling.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatsLog {
    pub frames: Vec<FrameStats>,
}

impl StatsLog {
    pub fn new() -> StatsLog {
        StatsLog::default()
    }

    pub fn push(&mut self, stats: FrameStats) {
        self.frames.push(stats);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Highest per-frame triangle count in the log.
    pub fn peak_triangles(&self) -> usize {
        self.frames.iter().map(|f| f.triangles).max().unwrap_or(0)
    }

    /// Mean frame time across the log, in seconds.
    pub fn mean_frame_time(&self) -> f32 {
        if self.frames.is_empty() {
            return 0.0;
        }
        self.frames.iter().map(|f| f.frame_time).sum::<f32>() / self.frames.len() as f32
    }

    /// Write the log as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
