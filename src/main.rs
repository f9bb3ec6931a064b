use anyhow::Context;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use auto_lod::config::{CliArgs, SimConfig};
use auto_lod::simulation::Simulation;

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // Init tracing
    let filter = if args.verbose {
        EnvFilter::new("auto_lod=debug")
    } else {
        EnvFilter::new("auto_lod=info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config: SimConfig = args.into();

    match Simulation::run(&config) {
        Ok(report) => {
            println!(
                "Done: {} frames, peak {} triangles, final bias {:.2}, {:.2}s",
                report.frames,
                report.peak_triangles,
                report.final_bias,
                report.duration.as_secs_f64()
            );
            Ok(())
        }
        Err(e) => {
            error!(%e, "Simulation failed");
            Err(anyhow::anyhow!(e)).context("lod-sim run failed")
        }
    }
}
