use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use rand::SeedableRng;
use rand::rngs::StdRng;

use softras::line::DdaOrientation;
use softras::linebench::{random_lines, time_algorithms};
use softras::scene::{NullSink, PngSequenceSink, PresentationSink};
use softras::{LineAlgorithm, SceneConfig};

#[derive(Parser)]
#[command(name = "softras", version, about = "CPU software rasterizer")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a scene for a number of frames
    Render {
        /// JSON scene description; a spinning cube when omitted
        #[arg(long)]
        config: Option<PathBuf>,

        /// Stop after this many frames
        #[arg(long, default_value_t = 120)]
        frames: u64,

        /// Write frames as PNGs into this directory
        #[arg(long)]
        output: Option<PathBuf>,

        /// Only write every Nth frame
        #[arg(long, default_value_t = 1)]
        every: u64,

        /// Worker threads (defaults to all logical cores)
        #[arg(long)]
        threads: Option<usize>,
    },
    /// Time every line algorithm on the same random segments
    Lines {
        #[arg(long, default_value_t = 50)]
        count: usize,

        #[arg(long, default_value_t = 7)]
        thickness: u32,

        /// Side of the square canvas in pixels
        #[arg(long, default_value_t = 1000)]
        size: usize,

        #[arg(long, default_value_t = 3)]
        runs: u32,

        /// Time a single algorithm instead of all of them
        #[arg(long, value_enum)]
        algorithm: Option<LineAlgorithm>,

        /// How the DDA walker picks its thickening axis
        #[arg(long, value_enum, default_value_t = DdaOrientation::PerStep)]
        dda_orientation: DdaOrientation,

        /// Seed for reproducible segments
        #[arg(long)]
        seed: Option<u64>,

        /// Directory for one PNG per algorithm
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Render { config, frames, output, every, threads } => render(config, frames, output, every, threads),
        Command::Lines { count, thickness, size, runs, algorithm, dda_orientation, seed, output } => {
            let algorithms = match algorithm {
                Some(algorithm) => vec![algorithm],
                None => LineAlgorithm::ALL.to_vec(),
            };
            let options = LineOptions { count, thickness, size, runs, orientation: dda_orientation };
            lines(&algorithms, options, seed, output)
        }
    }
}

fn render(config: Option<PathBuf>, frames: u64, output: Option<PathBuf>, every: u64, threads: Option<usize>) -> Result<()> {
    let mut config = match config {
        Some(path) => SceneConfig::load(&path).with_context(|| format!("loading scene {}", path.display()))?,
        None => SceneConfig::default(),
    };
    if threads.is_some() {
        config.threads = threads;
    }

    let mut scene = config.build_scene().context("building scene")?;
    let mut input = config.scripted_input();
    let mut sink: Box<dyn PresentationSink> = match &output {
        Some(dir) => Box::new(PngSequenceSink::new(dir, every).with_context(|| format!("creating {}", dir.display()))?),
        None => Box::new(NullSink::default()),
    };

    let start = Instant::now();
    let presented = scene.run(&mut input, sink.as_mut(), Some(frames)).context("rendering")?;
    let elapsed = start.elapsed().as_secs_f64();

    let stats = scene.last_stats();
    info!("last frame: {} triangles, draw {:?}", stats.triangles, stats.draw_time);
    println!(
        "Rendered {presented} frames at {}x{} in {elapsed:.2}s ({:.1} fps, {} threads)",
        config.width,
        config.height,
        if elapsed > 0.0 { presented as f64 / elapsed } else { 0.0 },
        scene.threads(),
    );
    if let Some(dir) = output {
        println!("Frames written to {}", dir.display());
    }
    Ok(())
}

struct LineOptions {
    count: usize,
    thickness: u32,
    size: usize,
    runs: u32,
    orientation: DdaOrientation,
}

fn lines(algorithms: &[LineAlgorithm], options: LineOptions, seed: Option<u64>, output: Option<PathBuf>) -> Result<()> {
    let LineOptions { count, thickness, size, runs, orientation } = options;
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let segments = random_lines(&mut rng, count, size as i32);

    for run in time_algorithms(&segments, algorithms, size, thickness, orientation, runs) {
        println!("time {}: {:?} per line", run.algorithm.name(), run.per_line);
        if let Some(dir) = &output {
            std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
            let path = dir.join(format!("lines_{}.png", run.algorithm.name()));
            run.image.to_rgb8().save(&path).with_context(|| format!("writing {}", path.display()))?;
            info!("saved {}", path.display());
        }
    }
    Ok(())
}
