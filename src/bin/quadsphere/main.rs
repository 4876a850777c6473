//! quadsphere CLI - generate and relax quad spheres.
//!
//! Usage: quadsphere <COMMAND> [OPTIONS]
//!
//! Run `quadsphere --help` for available commands.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};

use quadsphere::algo::relax::{relax_with_progress, RelaxOptions};
use quadsphere::algo::subdivide::{
    subdivide_quad_with_progress, subdivide_with_progress, SubdivideOptions,
};
use quadsphere::algo::{LiftMode, Progress};
use quadsphere::graph::{length_histogram, Graph};
use quadsphere::io;
use quadsphere::pipeline::{run_with_progress, PipelineConfig};

#[derive(Parser)]
#[command(name = "quadsphere")]
#[command(author, version, about = "Quad sphere generation CLI", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a sphere from a subdivided icosahedron
    Generate {
        /// Output mesh file (.obj or .ply)
        output: PathBuf,

        /// Triangle subdivision passes
        #[arg(short, long, default_value = "2")]
        subdivisions: usize,

        /// Merge triangle pairs into quads
        #[arg(long)]
        quadify: bool,

        /// Quad subdivision passes after quadification
        #[arg(long, default_value = "1")]
        quad_subdivisions: usize,

        /// Lift applied after each subdivision pass
        #[arg(long, value_enum, default_value = "normalized")]
        lift: LiftArg,

        /// Relax the result onto the sphere
        #[arg(long)]
        relax: bool,

        /// Relaxation iterations (at most 1000)
        #[arg(short, long, default_value = "100")]
        iterations: usize,

        /// Laplacian step factor (0.0 to 1.0)
        #[arg(short, long, default_value = "1.0")]
        lambda: f64,

        /// Stop relaxing once no vertex moves further than this
        #[arg(short, long)]
        tolerance: Option<f64>,

        /// Sphere radius
        #[arg(short, long, default_value = "1.0")]
        radius: f64,

        /// Quadification seed
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Display graph information
    Info {
        /// Input mesh file
        input: PathBuf,
    },

    /// Subdivide a mesh
    Subdivide {
        /// Input mesh file
        input: PathBuf,

        /// Output mesh file
        output: PathBuf,

        /// Subdivision method
        #[arg(short, long, value_enum, default_value = "triangle")]
        method: SubdivideMethod,

        /// Number of subdivision passes
        #[arg(short, long, default_value = "1")]
        iterations: usize,

        /// Lift applied after each pass
        #[arg(long, value_enum, default_value = "none")]
        lift: LiftArg,

        /// Sphere radius used by the lift
        #[arg(short, long, default_value = "1.0")]
        radius: f64,
    },

    /// Relax a mesh onto a sphere
    Relax {
        /// Input mesh file
        input: PathBuf,

        /// Output mesh file
        output: PathBuf,

        /// Relaxation iterations (at most 1000)
        #[arg(short, long, default_value = "100")]
        iterations: usize,

        /// Laplacian step factor (0.0 to 1.0)
        #[arg(short, long, default_value = "1.0")]
        lambda: f64,

        /// Stop once no vertex moves further than this
        #[arg(short, long)]
        tolerance: Option<f64>,

        /// Sphere radius
        #[arg(short, long, default_value = "1.0")]
        radius: f64,

        /// Use single-threaded execution (for benchmarking)
        #[arg(long)]
        sequential: bool,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum LiftArg {
    /// Leave vertices where subdivision put them
    None,
    /// Snap vertices onto the sphere
    Normalized,
    /// Scale vertices by their distance from the sphere
    Unnormalized,
}

impl From<LiftArg> for LiftMode {
    fn from(arg: LiftArg) -> Self {
        match arg {
            LiftArg::None => LiftMode::None,
            LiftArg::Normalized => LiftMode::Normalized,
            LiftArg::Unnormalized => LiftMode::Unnormalized,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum SubdivideMethod {
    /// Split each triangle into four (triangle meshes only)
    Triangle,
    /// Split each triangle or quad into quads around its center
    Quad,
}

fn main() {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    let mut builder = env_logger::Builder::new();
    builder.target(env_logger::Target::Stderr);
    builder.filter_level(level);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.format(|buf, record| {
        writeln!(buf, "[{}] {}", record.level(), record.args())
    });

    if let Err(err) = builder.try_init() {
        eprintln!("Failed to initialize logger: {}", err);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Generate {
            output,
            subdivisions,
            quadify,
            quad_subdivisions,
            lift,
            relax,
            iterations,
            lambda,
            tolerance,
            radius,
            seed,
        } => {
            let config = PipelineConfig {
                subdivisions,
                quadify,
                quad_subdivisions,
                lift: lift.into(),
                relax,
                max_iterations: iterations,
                laplacian_lambda: lambda,
                tolerance,
                radius,
                seed,
            };
            cmd_generate(&output, &config)?;
        }

        Commands::Info { input } => {
            cmd_info(&input)?;
        }

        Commands::Subdivide {
            input,
            output,
            method,
            iterations,
            lift,
            radius,
        } => {
            let options = SubdivideOptions::new(iterations)
                .with_lift(lift.into())
                .with_radius(radius);
            cmd_subdivide(&input, &output, method, &options)?;
        }

        Commands::Relax {
            input,
            output,
            iterations,
            lambda,
            tolerance,
            radius,
            sequential,
        } => {
            let mut options = RelaxOptions::default()
                .with_max_iterations(iterations)
                .with_lambda(lambda)
                .with_radius(radius);
            options.tolerance = tolerance;
            if sequential {
                options = options.sequential();
            }
            cmd_relax(&input, &output, &options)?;
        }
    }

    Ok(())
}

fn create_progress() -> Progress {
    let max_percent = Arc::new(AtomicUsize::new(0));

    Progress::new(move |current, total, message| {
        if total == 0 {
            return;
        }

        let raw_percent = if current >= total {
            100
        } else {
            (current * 100) / total
        };

        // Only redraw when the bar advances; stages may report out of order.
        let previous = max_percent.fetch_max(raw_percent, Ordering::Relaxed);
        if raw_percent <= previous && raw_percent != 100 {
            return;
        }

        let bar_width = 30;
        let filled = (raw_percent * bar_width) / 100;
        eprint!(
            "\r[{}{}] {:3}% {:<24}",
            "=".repeat(filled),
            " ".repeat(bar_width - filled),
            raw_percent,
            message
        );
        let _ = std::io::stderr().flush();

        if current >= total {
            eprintln!();
        }
    })
}

fn print_summary(graph: &Graph) -> Result<(), Box<dyn std::error::Error>> {
    let loops = graph.all_vert_loops()?;
    println!(
        "Graph: {} vertices, {} edges, {} faces",
        graph.vertex_count(),
        graph.edge_count(),
        loops.len()
    );
    let histogram: Vec<String> = length_histogram(&loops)
        .iter()
        .map(|(len, count)| format!("{}x{}", count, len))
        .collect();
    println!("Face sizes: {}", histogram.join(", "));
    Ok(())
}

fn cmd_generate(output: &Path, config: &PipelineConfig) -> Result<(), Box<dyn std::error::Error>> {
    let progress = create_progress();

    let start = Instant::now();
    let out = run_with_progress(config, &progress)?;
    let elapsed = start.elapsed();

    if let Some(seed) = out.report.seed {
        println!("Quadification seed: {}", seed);
    }
    if let Some(relax) = out.report.relax {
        println!(
            "Relaxation: {} iterations, converged={}, last max move={:.3e}",
            relax.iterations, relax.converged, relax.last_max_displacement
        );
    }
    print_summary(&out.graph)?;

    io::save(&out.graph, output)?;
    println!("Saved: {} ({:.2?})", output.display(), elapsed);

    Ok(())
}

fn cmd_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let graph = io::load(input)?;

    println!("File: {}", input.display());
    print_summary(&graph)?;
    println!("Average edge length: {:.6}", graph.average_edge_length());

    let radii: Vec<f64> = graph.vertices().map(|(_, v)| v.position.coords.norm()).collect();
    let min = radii.iter().copied().fold(f64::INFINITY, f64::min);
    let max = radii.iter().copied().fold(0.0, f64::max);
    println!("Radius range: [{:.6}, {:.6}]", min, max);

    match graph.validate() {
        Ok(()) => println!("Topology: Closed (every edge borders two faces)"),
        Err(e) => println!("Topology: Invalid ({})", e),
    }

    Ok(())
}

fn cmd_subdivide(
    input: &Path,
    output: &Path,
    method: SubdivideMethod,
    options: &SubdivideOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut graph = io::load(input)?;
    println!("Loaded: {} vertices, {} edges", graph.vertex_count(), graph.edge_count());

    let progress = create_progress();
    let start = Instant::now();
    let report = match method {
        SubdivideMethod::Triangle => {
            println!("Applying triangle subdivision ({} passes)...", options.iterations);
            subdivide_with_progress(&mut graph, options, &progress)?
        }
        SubdivideMethod::Quad => {
            println!("Applying quad subdivision ({} passes)...", options.iterations);
            subdivide_quad_with_progress(&mut graph, options, &progress)?
        }
    };
    let elapsed = start.elapsed();

    println!("Result: {} faces", report.faces);
    print_summary(&graph)?;
    io::save(&graph, output)?;
    println!("Saved: {} ({:.2?})", output.display(), elapsed);

    Ok(())
}

fn cmd_relax(input: &Path, output: &Path, options: &RelaxOptions) -> Result<(), Box<dyn std::error::Error>> {
    let mut graph = io::load(input)?;
    println!("Loaded: {} vertices, {} edges", graph.vertex_count(), graph.edge_count());

    let mode = if options.parallel { "parallel" } else { "sequential" };
    println!(
        "Relaxing ({} iterations, lambda={}, radius={}, {})...",
        options.max_iterations, options.laplacian_lambda, options.radius, mode
    );

    let progress = create_progress();
    let start = Instant::now();
    let report = relax_with_progress(&mut graph, options, &progress)?;
    let elapsed = start.elapsed();

    println!(
        "Result: {} iterations, converged={}, corner distance={:.6}",
        report.iterations, report.converged, report.corner_distance
    );
    io::save(&graph, output)?;
    println!("Saved: {} ({:.2?})", output.display(), elapsed);

    Ok(())
}
