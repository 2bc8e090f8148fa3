//! Writes a synthetic heightmap in the binary layout the scene loads.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use terrain_scene::generation::{perlin_terrain, NoiseSettings};

/// Perlin heightmap generator.
#[derive(Parser, Debug)]
#[command(name = "gen_heightmap")]
#[command(about = "Generates a binary heightmap for the terrain scene")]
struct Args {
    /// Output file.
    #[arg(short, long, default_value = "assets/terrain/heightmap.bin")]
    output: PathBuf,

    /// Number of columns.
    #[arg(long, default_value_t = 257)]
    cols: usize,

    /// Number of rows.
    #[arg(long, default_value_t = 257)]
    rows: usize,

    /// Distance between neighbouring samples.
    #[arg(long, default_value_t = 10.0)]
    cell_size: f64,

    /// Peak height above the lowest sample.
    #[arg(long, default_value_t = 600.0)]
    height_scale: f32,

    /// Shift applied after scaling; negative values put part of the terrain under water.
    #[arg(long, default_value_t = -150.0, allow_hyphen_values = true)]
    offset: f32,

    #[arg(long, default_value_t = 2)]
    seed: u32,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut terrain = perlin_terrain((args.cols, args.rows), args.seed, NoiseSettings::default())
        .context("generating terrain")?
        .with_cell_size(args.cell_size);

    terrain.multiply(args.height_scale);
    terrain.offset(args.offset);

    if let Some(parent) = args.output.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }

    terrain
        .save(&args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;

    println!(
        "Wrote {}x{} heightmap to {}",
        args.cols,
        args.rows,
        args.output.display()
    );

    Ok(())
}
