use std::path::PathBuf;
use std::str::FromStr;
use std::thread;
use std::time::Duration;

use anyhow::{ Context, Result };
use clap::{ Parser, Subcommand };
use log::{ info, warn };

use chunk_tracer::consts::{ DEFAULT_WIDTH, DEFAULT_HEIGHT, DEFAULT_FOV,
    DEFAULT_OUT_FILE, BENCHMARK_WIDTH, BENCHMARK_HEIGHT };
use chunk_tracer::allocation::ChunkAllocationMode;
use chunk_tracer::canvas::Canvas;
use chunk_tracer::context::{ RaytraceContext, RaytracerOptions };
use chunk_tracer::dispatcher::{ Dispatcher, RenderOutcome };
use chunk_tracer::scene::Scene;

/// Renders scenes in parallel chunks and scores the throughput.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a scene to a PPM image.
    Render(RenderArgs),

    /// Render the benchmark scene at 1920x1080 on every core, then on one.
    Benchmark(BenchmarkArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Scene description (JSON). Defaults to the built-in showcase scene.
    #[clap(long)]
    scene: Option<PathBuf>,

    /// Where to write the image.
    #[clap(short, long, default_value = DEFAULT_OUT_FILE)]
    output: PathBuf,

    /// One of 720p, 1080p, 1440p, 4k or 8k. Overridden by --width/--height.
    #[clap(short, long)]
    resolution: Option<Resolution>,

    #[clap(long)]
    width: Option<u32>,

    #[clap(long)]
    height: Option<u32>,

    /// Stop the render after this many milliseconds.
    #[clap(long)]
    stop_after: Option<u64>,

    #[clap(flatten)]
    tracing: TracingArgs,
}

#[derive(Parser, Debug)]
struct BenchmarkArgs {
    #[clap(flatten)]
    tracing: TracingArgs,
}

#[derive(Parser, Debug)]
struct TracingArgs {
    /// Worker threads. Defaults to the number of available cores.
    #[clap(short, long)]
    threads: Option<usize>,

    /// Chunk edge length in pixels; 0 picks one from the frame height.
    #[clap(long, default_value = "0")]
    chunk_size: u32,

    /// sequential, random, center-to-edge or edge-to-center.
    #[clap(long, default_value = "sequential")]
    allocation: ChunkAllocationMode,

    #[clap(long)]
    max_depth: Option<u32>,

    #[clap(long)]
    draw_distance: Option<f64>,

    #[clap(long)]
    no_shadows: bool,

    #[clap(long)]
    no_diffuse: bool,

    #[clap(long)]
    no_specular: bool,

    #[clap(long)]
    no_reflections: bool,

    #[clap(long)]
    no_refractions: bool,
}

impl TracingArgs {
    fn options(&self) -> RaytracerOptions {
        let defaults = RaytracerOptions::default();

        RaytracerOptions {
            shadows: !self.no_shadows,
            diffuse_lighting: !self.no_diffuse,
            specular_lighting: !self.no_specular,
            reflections: !self.no_reflections,
            refractions: !self.no_refractions,
            max_recurse_depth: self.max_depth
                .unwrap_or(defaults.max_recurse_depth),
            max_draw_distance: self.draw_distance
                .unwrap_or(defaults.max_draw_distance),
            num_threads: self.threads.unwrap_or_else(available_threads),
            chunk_size: self.chunk_size,
            chunk_allocation_mode: self.allocation,
            ..defaults
        }
    }
}

/// Named frame sizes.
#[derive(Copy, Clone, Debug)]
struct Resolution {
    width: u32,
    height: u32,
}

impl FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Resolution, String> {
        let (width, height) = match s.to_ascii_lowercase().as_str() {
            "720p" => (1280, 720),
            "1080p" => (1920, 1080),
            "1440p" => (2560, 1440),
            "4k" => (3840, 2160),
            "8k" => (7680, 4320),
            other => return Err(format!("unknown resolution '{}'", other)),
        };

        Ok(Resolution { width, height })
    }
}

fn available_threads() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn render(args: RenderArgs) -> Result<()> {
    let scene = match &args.scene {
        Some(path) => Scene::from_json_file(path)
            .with_context(|| format!("loading scene {}", path.display()))?,
        None => Scene::showcase(),
    };

    let preset = args.resolution.unwrap_or(Resolution {
        width: DEFAULT_WIDTH,
        height: DEFAULT_HEIGHT,
    });
    let width = args.width.unwrap_or(preset.width);
    let height = args.height.unwrap_or(preset.height);

    let context = RaytraceContext::new(width, height, DEFAULT_FOV, scene,
        args.tracing.options());
    let mut dispatcher = Dispatcher::new(context)
        .context("invalid render request")?;

    if let Some(millis) = args.stop_after {
        let handle = dispatcher.stop_handle();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(millis));
            handle.stop();
        });
    }

    let mut canvas = Canvas::new(width, height);
    match dispatcher.render(&mut canvas).context("render failed")? {
        RenderOutcome::Completed { score, elapsed } => {
            println!("rendered {}x{} in {:.3}s, score {}",
                width, height, elapsed.as_secs_f64(), score);
        },
        RenderOutcome::Aborted => {
            warn!("render stopped early; saving the partial image");
        },
    }

    canvas.save(&args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;
    info!("wrote {}", args.output.display());

    Ok(())
}

fn benchmark_pass(options: RaytracerOptions) -> Result<u64> {
    let context = RaytraceContext::new(BENCHMARK_WIDTH, BENCHMARK_HEIGHT,
        DEFAULT_FOV, Scene::benchmark(), options);
    let mut canvas = Canvas::new(BENCHMARK_WIDTH, BENCHMARK_HEIGHT);

    let outcome = Dispatcher::new(context)?.render(&mut canvas)?;
    outcome.score().context("benchmark render did not complete")
}

fn benchmark(args: BenchmarkArgs) -> Result<()> {
    let multi = args.tracing.options();

    info!("multi-core pass on {} threads", multi.num_threads);
    let multi_score = benchmark_pass(multi)?;

    info!("single-core pass");
    let single_score = benchmark_pass(RaytracerOptions {
        num_threads: 1,
        ..multi
    })?;

    println!("multi-core ({} threads): {}", multi.num_threads, multi_score);
    println!("single-core: {}", single_score);

    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        Command::Render(args) => render(args),
        Command::Benchmark(args) => benchmark(args),
    }
}
