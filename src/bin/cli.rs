// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! hemesh CLI

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use hemesh::{io, AttributedMesh, ExportOptions, KernelConfig, Primitive, Shading};
use log::info;
use nalgebra::{Vector2, Vector3};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "hemesh")]
#[command(about = "Half-edge mesh kernel - build and export demo shapes", long_about = None)]
struct Cli {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Configuration file (defaults to ./hemesh.toml when present)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct OutputArgs {
    /// Output file; the format follows the extension (stl, gltf, glb, json)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Shading applied to every face
    #[arg(long)]
    shading: Option<Shading>,

    /// Reverse the winding of every triangle
    #[arg(long)]
    flip_faces: bool,

    /// Emit both sides of every face
    #[arg(long)]
    two_sided: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Box welded from one grid patch per side
    Box {
        /// Edge lengths along x, y and z
        #[arg(long, num_args = 3, default_values_t = [2.0, 2.0, 2.0])]
        size: Vec<f64>,

        /// Segments along x, y and z
        #[arg(long, num_args = 3, default_values_t = [1, 1, 1])]
        segments: Vec<usize>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Flat quad grid
    Grid {
        #[arg(long, default_value_t = 1.0)]
        width: f64,

        #[arg(long, default_value_t = 1.0)]
        height: f64,

        /// Segments along width and height
        #[arg(long, num_args = 2, default_values_t = [4, 4])]
        segments: Vec<usize>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Triangle fan around a shared apex
    Fan {
        #[arg(long, default_value_t = 6)]
        sides: usize,

        #[arg(long, default_value_t = 1.0)]
        radius: f64,

        #[arg(long, default_value_t = 0.5)]
        height: f64,

        #[command(flatten)]
        output: OutputArgs,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(&cli.log_level);

    let mut config = match &cli.config {
        Some(path) => KernelConfig::from_file(path)?,
        None => KernelConfig::load()?,
    };
    if cli.config.is_some() {
        config.apply_overrides(|name| std::env::var(name).ok());
    }

    let (primitive, output) = match cli.command {
        Commands::Box {
            size,
            segments,
            output,
        } => (
            Primitive::box_(
                Vector3::new(size[0], size[1], size[2]),
                [segments[0], segments[1], segments[2]],
            ),
            output,
        ),
        Commands::Grid {
            width,
            height,
            segments,
            output,
        } => (
            Primitive::grid(Vector2::new(width, height), [segments[0], segments[1]]),
            output,
        ),
        Commands::Fan {
            sides,
            radius,
            height,
            output,
        } => (Primitive::apex_fan(sides, radius, height), output),
    };

    run(&primitive, &output, &config)
}

fn init_logger(level: &str) {
    env_logger::Builder::new()
        .parse_filters(level)
        .format_timestamp(None)
        .target(env_logger::Target::Stderr)
        .init();
}

fn run(primitive: &Primitive, args: &OutputArgs, config: &KernelConfig) -> Result<()> {
    let start = Instant::now();
    let mesh = primitive
        .to_attributed_mesh()
        .with_context(|| format!("Failed to build {primitive:?}"))?;
    let build_time = start.elapsed();

    let mut options = ExportOptions::from(config);
    options.flip_faces |= args.flip_faces;
    options.two_sided |= args.two_sided;
    if args.shading.is_some() {
        options.shading_override = args.shading;
    }

    let export_start = Instant::now();
    let triangles = mesh.to_mesh(&options);
    let export_time = export_start.elapsed();

    print_stats(&mesh, &triangles, build_time, export_time);

    if let Some(path) = &args.output {
        io::export_auto(&triangles, path)?;
        info!("wrote {path:?}");
        println!("{} {}", "Wrote".green().bold(), path.display());
    }
    Ok(())
}

fn print_stats(
    mesh: &AttributedMesh,
    triangles: &hemesh::Mesh,
    build_time: std::time::Duration,
    export_time: std::time::Duration,
) {
    let half = mesh.mesh();
    let valid = half.check_invariants();

    println!("{}", "Half-edge mesh".bold().cyan());
    println!("  Vertices:    {}", half.vertex_count());
    println!("  Edges:       {}", half.edge_count());
    println!("  Faces:       {}", half.face_count());
    println!("  Boundary:    {}", half.boundary_halfedges().len());
    println!("  Components:  {}", half.connected_components());
    println!("  Euler:       {}", half.euler_characteristic());
    match valid {
        Ok(()) => println!("  Invariants:  {}", "ok".green()),
        Err(e) => println!("  Invariants:  {}", e.to_string().red()),
    }
    println!("  Built in {:.2?}", build_time);

    println!("{}", "Exported mesh".bold().cyan());
    println!("  Vertices:    {}", triangles.vertex_count());
    println!("  Triangles:   {}", triangles.triangle_count());
    println!("  Area:        {:.6}", triangles.surface_area());
    println!("  Exported in {:.2?}", export_time);
}
