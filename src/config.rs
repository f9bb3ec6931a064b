use std::path::PathBuf;

use clap::Parser;

use crate::error::{AutoLodError, Result};
use crate::lod::SelectionPolicy;

/// Shape of the procedural test meshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum MeshShape {
    #[value(name = "grid")]
    Grid,
    #[value(name = "sphere")]
    Sphere,
}

impl std::fmt::Display for MeshShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MeshShape::Grid => write!(f, "grid"),
            MeshShape::Sphere => write!(f, "sphere"),
        }
    }
}

/// CLI name for each selection policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PolicyArg {
    #[value(name = "distance")]
    Distance,
    #[value(name = "screen-size")]
    ScreenSize,
    #[value(name = "screen-error")]
    ScreenError,
    #[value(name = "budget")]
    Budget,
}

impl std::fmt::Display for PolicyArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolicyArg::Distance => write!(f, "distance"),
            PolicyArg::ScreenSize => write!(f, "screen-size"),
            PolicyArg::ScreenError => write!(f, "screen-error"),
            PolicyArg::Budget => write!(f, "budget"),
        }
    }
}

impl From<PolicyArg> for SelectionPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Distance => SelectionPolicy::Distance,
            PolicyArg::ScreenSize => SelectionPolicy::ScreenSize,
            PolicyArg::ScreenError => SelectionPolicy::ScreenError,
            PolicyArg::Budget => SelectionPolicy::TriangleBudget,
        }
    }
}

/// Fully resolved simulation configuration (constructed from CLI args).
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub objects: usize,
    pub shape: MeshShape,
    pub resolution: usize,
    pub levels: usize,
    pub reduction_factor: f32,
    pub policy: SelectionPolicy,
    pub triangle_budget: usize,
    pub unload_distance: Option<f32>,
    pub frames: usize,
    pub target_frame_time: f32,
    pub adaptive: bool,
    pub stats_out: Option<PathBuf>,
    pub verbose: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            objects: 24,
            shape: MeshShape::Grid,
            resolution: 32,
            levels: 4,
            reduction_factor: 0.5,
            policy: SelectionPolicy::Distance,
            triangle_budget: 500_000,
            unload_distance: None,
            frames: 300,
            target_frame_time: 1.0 / 60.0,
            adaptive: false,
            stats_out: None,
            verbose: false,
        }
    }
}

impl SimConfig {
    /// Reject configurations the simulation cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.objects == 0 {
            return Err(AutoLodError::Config("object count must be non-zero".into()));
        }
        if self.frames == 0 {
            return Err(AutoLodError::Config("frame count must be non-zero".into()));
        }
        if self.resolution < 2 {
            return Err(AutoLodError::Config(
                "mesh resolution must be at least 2".into(),
            ));
        }
        Ok(())
    }
}

/// CLI argument definition (clap derive).
#[derive(Parser, Debug)]
#[command(
    name = "lod-sim",
    about = "Camera flythrough simulation for the auto-lod runtime",
    version
)]
pub struct CliArgs {
    /// Number of objects placed in the scene
    #[arg(short = 'n', long, default_value_t = 24)]
    pub objects: usize,

    /// Procedural mesh shape
    #[arg(long, value_enum, default_value = "grid")]
    pub shape: MeshShape,

    /// Mesh resolution (grid quads / sphere segments per side)
    #[arg(long, default_value_t = 32)]
    pub resolution: usize,

    /// LOD levels per mesh (1-16)
    #[arg(long, default_value_t = 4)]
    pub levels: usize,

    /// Per-level triangle reduction factor
    #[arg(long, default_value_t = 0.5)]
    pub reduction_factor: f32,

    /// Selection policy
    #[arg(long, value_enum, default_value = "distance")]
    pub policy: PolicyArg,

    /// Per-frame triangle budget (used by the budget policy)
    #[arg(long, default_value_t = 500_000)]
    pub triangle_budget: usize,

    /// Unload objects beyond this distance
    #[arg(long)]
    pub unload_distance: Option<f32>,

    /// Number of frames to simulate
    #[arg(long, default_value_t = 300)]
    pub frames: usize,

    /// Target frame rate for the adaptive controller
    #[arg(long, default_value_t = 60.0)]
    pub target_fps: f32,

    /// Enable the adaptive quality controller
    #[arg(long)]
    pub adaptive: bool,

    /// Write per-frame stats as JSON to this path
    #[arg(long)]
    pub stats_out: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl From<CliArgs> for SimConfig {
    fn from(args: CliArgs) -> Self {
        SimConfig {
            objects: args.objects,
            shape: args.shape,
            resolution: args.resolution,
            levels: args.levels,
            reduction_factor: args.reduction_factor,
            policy: args.policy.into(),
            triangle_budget: args.triangle_budget,
            unload_distance: args.unload_distance,
            frames: args.frames,
            target_frame_time: 1.0 / args.target_fps.max(1.0),
            adaptive: args.adaptive,
            stats_out: args.stats_out,
            verbose: args.verbose,
        }
    }
}
