//! Washout CLI - terrain erosion simulator.
//!
//! Generate a toroidal terrain, run erosion ticks over it, and export
//! the result as a heightmap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Instant;

use washout::export::{
    expected_raw_size, export_heightmap_png, export_heightmap_raw, export_wetness_png,
    PngExportOptions, RawFormat,
};
use washout::field::expected_file_size;
use washout::{SimulationConfig, TerrainSim};

/// Stylized terrain-erosion simulator.
#[derive(Parser)]
#[command(name = "washout")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a terrain, erode it, and export the result.
    Generate {
        /// Grid width in cells.
        #[arg(long, default_value = "256")]
        width: u32,

        /// Grid height in cells.
        #[arg(long, default_value = "256")]
        height: u32,

        /// Random seed for reproducible runs.
        #[arg(short, long)]
        seed: Option<u64>,

        /// Number of simulation ticks to run.
        #[arg(short, long, default_value = "200")]
        ticks: u32,

        /// Particle pool size.
        #[arg(short, long, default_value = "4000")]
        particles: usize,

        /// Output directory for generated files.
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,

        /// Base name for output files.
        #[arg(short, long, default_value = "terrain")]
        name: String,

        /// Export format.
        #[arg(short, long, default_value = "png")]
        format: ExportFormat,

        /// Vertical scale of the initial terrain.
        #[arg(long, default_value = "24.0")]
        relief: f32,

        /// Initial blanket of loose sediment per cell.
        #[arg(long, default_value = "0.3")]
        loose_blanket: f32,

        /// Hydraulic sub-steps per tick.
        #[arg(long, default_value = "2")]
        water_iters: u32,

        /// Particle momentum factor (0-1).
        #[arg(long, default_value = "0.0")]
        momentum: f32,

        /// Particle turbulence factor (0-1).
        #[arg(long, default_value = "0.0")]
        turbulence: f32,

        /// Also export the moving-water accumulator as a wetness map.
        #[arg(long)]
        wetness_map: bool,

        /// Save the eroded terrain to this file in the binary format.
        #[arg(long)]
        save: Option<PathBuf>,

        /// Load terrain from this file instead of generating;
        /// regenerates procedurally if the load fails.
        #[arg(long)]
        load: Option<PathBuf>,
    },

    /// Display sizes and defaults for a simulation configuration.
    Info {
        /// Grid width in cells.
        #[arg(long, default_value = "256")]
        width: u32,

        /// Grid height in cells.
        #[arg(long, default_value = "256")]
        height: u32,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    /// 16-bit PNG (universal compatibility).
    Png,
    /// 16-bit RAW little-endian (Unity).
    Raw,
    /// 32-bit float RAW (high precision).
    RawFloat,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            width,
            height,
            seed,
            ticks,
            particles,
            output,
            name,
            format,
            relief,
            loose_blanket,
            water_iters,
            momentum,
            turbulence,
            wetness_map,
            save,
            load,
        } => {
            run_generate(
                width,
                height,
                seed,
                ticks,
                particles,
                output,
                name,
                format,
                relief,
                loose_blanket,
                water_iters,
                momentum,
                turbulence,
                wetness_map,
                save,
                load,
            );
        }
        Commands::Info { width, height } => {
            run_info(width, height);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run_generate(
    width: u32,
    height: u32,
    seed: Option<u64>,
    ticks: u32,
    particles: usize,
    output: PathBuf,
    name: String,
    format: ExportFormat,
    relief: f32,
    loose_blanket: f32,
    water_iters: u32,
    momentum: f32,
    turbulence: f32,
    wetness_map: bool,
    save: Option<PathBuf>,
    load: Option<PathBuf>,
) {
    if width < 16 || width > 8192 || height < 16 || height > 8192 {
        eprintln!("Error: Dimensions must be between 16 and 8192");
        std::process::exit(1);
    }

    // Generate seed if not provided
    let seed = seed.unwrap_or_else(|| {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0)
    });

    println!("Washout - Terrain Erosion Simulator");
    println!("===================================");
    println!("Grid: {}x{}", width, height);
    println!("Seed: {}", seed);
    println!("Particles: {}", particles);
    println!("Ticks: {}", ticks);
    println!("Output: {}", output.display());

    let mut config = SimulationConfig::with_seed(seed, width, height);
    config.particles = particles;
    config.water_iterations_per_frame = water_iters;
    config.hydraulic.momentum = momentum;
    config.hydraulic.turbulence = turbulence;
    config.init.relief = relief;
    config.init.loose_blanket = loose_blanket;

    let start = Instant::now();
    let mut sim = TerrainSim::new(config).unwrap_or_else(|e| {
        eprintln!("Error: invalid configuration: {}", e);
        std::process::exit(1);
    });

    if let Some(path) = load {
        if sim.load_or_reset(&path) {
            println!("Loaded terrain from {}", path.display());
        } else {
            println!(
                "Could not load {}, regenerated procedurally",
                path.display()
            );
        }
    }

    println!("\nRunning erosion...");
    let report_every = (ticks / 10).max(1);
    for i in 0..ticks {
        sim.modify_terrain();
        if (i + 1) % report_every == 0 {
            println!("  tick {}/{}", i + 1, ticks);
        }
    }
    println!("Simulation completed in {:.2?}", start.elapsed());

    let (min_h, max_h) = (sim.min_height(), sim.max_height());
    println!("Height range: [{:.4}, {:.4}]", min_h, max_h);

    if let Some(path) = save {
        sim.save(&path).unwrap_or_else(|e| {
            eprintln!("Error saving terrain: {}", e);
            std::process::exit(1);
        });
        println!("Saved terrain: {}", path.display());
    }

    println!("\nExporting...");
    std::fs::create_dir_all(&output).unwrap_or_else(|e| {
        eprintln!("Error creating output directory: {}", e);
        std::process::exit(1);
    });

    match format {
        ExportFormat::Png => {
            let options = PngExportOptions {
                min_height: min_h,
                max_height: max_h,
                ..Default::default()
            };
            let path = output.join(format!("{}.png", name));
            export_heightmap_png(sim.field(), &path, &options).unwrap_or_else(|e| {
                eprintln!("Error exporting PNG: {}", e);
                std::process::exit(1);
            });
            println!("  Exported PNG: {}", path.display());
        }
        ExportFormat::Raw => {
            let path = output.join(format!("{}.raw", name));
            export_heightmap_raw(sim.field(), &path, RawFormat::R16LittleEndian, min_h, max_h)
                .unwrap_or_else(|e| {
                    eprintln!("Error exporting RAW: {}", e);
                    std::process::exit(1);
                });
            println!("  Exported RAW (R16): {}", path.display());
        }
        ExportFormat::RawFloat => {
            let path = output.join(format!("{}.raw", name));
            export_heightmap_raw(sim.field(), &path, RawFormat::R32Float, min_h, max_h)
                .unwrap_or_else(|e| {
                    eprintln!("Error exporting RAW: {}", e);
                    std::process::exit(1);
                });
            println!("  Exported RAW (R32 float): {}", path.display());
        }
    }

    if wetness_map {
        let max_water = sim
            .field()
            .wetness_field()
            .into_iter()
            .fold(f32::MIN, f32::max)
            .max(1e-6);
        let options = PngExportOptions {
            min_height: 0.0,
            max_height: max_water,
            ..Default::default()
        };
        let path = output.join(format!("{}_wetness.png", name));
        export_wetness_png(sim.field(), &path, &options).unwrap_or_else(|e| {
            eprintln!("Error exporting wetness map: {}", e);
            std::process::exit(1);
        });
        println!("  Exported wetness map: {}", path.display());
    }

    println!("\nDone in {:.2?}", start.elapsed());
}

fn run_info(width: u32, height: u32) {
    let config = SimulationConfig::with_seed(0, width, height);

    println!("Washout configuration");
    println!("=====================");
    println!("Grid: {}x{} ({} cells)", width, height, width as u64 * height as u64);
    println!("Particles: {}", config.particles);
    println!(
        "Hydraulic: {} sub-steps/tick, {} crossings/particle",
        config.water_iterations_per_frame, config.hydraulic.cells_per_run
    );
    println!(
        "Slump: common {}it @ {:.2}, smoothing {}it @ {:.2}, rockfall {}it @ {:.2}",
        config.slump_common.iterations,
        config.slump_common.threshold,
        config.slump_smoothing.iterations,
        config.slump_smoothing.threshold,
        config.collapse.iterations,
        config.collapse.threshold,
    );
    println!(
        "Cliff collapse: {}it, threshold {:.1}-{:.1}, {} cascade rounds",
        config.cliff.iterations,
        config.cliff.threshold_min,
        config.cliff.threshold_max,
        config.cliff.cascade_rounds,
    );
    println!();
    println!(
        "Terrain file size: {} bytes",
        expected_file_size(width, height)
    );
    println!(
        "RAW R16 export size: {} bytes",
        expected_raw_size(width, height, RawFormat::R16LittleEndian)
    );
    println!(
        "RAW R32 export size: {} bytes",
        expected_raw_size(width, height, RawFormat::R32Float)
    );
}
