use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use polybreed::{persistence, Breeder, BreederEvent, BreederSettings, Raster, StopReason, WorkerPriority};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(name = "polybreed")]
#[command(about = "Approximate an image with evolving semi-transparent polygons")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Breed a lineage against a target image
    Run {
        /// Target image (png, jpeg, bmp, gif, tiff, webp)
        #[arg(long)]
        target: PathBuf,
        /// Breeder settings JSON; missing file means defaults
        #[arg(long)]
        settings: Option<PathBuf>,
        /// Override the settings' RNG seed
        #[arg(long)]
        seed: Option<u64>,
        /// Continue a saved lineage (.json, .dna or .svg)
        #[arg(long)]
        resume: Option<PathBuf>,
        /// Stop once this many generations have been attempted
        #[arg(long)]
        generations: Option<u64>,
        /// Stop after this many seconds of breeding
        #[arg(long)]
        seconds: Option<f64>,
        /// Where to save the lineage; repeatable, format from extension
        #[arg(long)]
        save: Vec<PathBuf>,
        /// Save every N seconds while the lineage has unsaved improvements
        #[arg(long)]
        autosave_secs: Option<u64>,
        /// Write the final rendering as PNG
        #[arg(long)]
        snapshot: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = CliPriority::Inherit)]
        priority: CliPriority,
    },
    /// Convert a saved lineage between formats (e.g. JSON to SVG)
    Export { input: PathBuf, output: PathBuf },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliPriority {
    Idle,
    Low,
    Inherit,
    High,
}

impl From<CliPriority> for WorkerPriority {
    fn from(p: CliPriority) -> Self {
        match p {
            CliPriority::Idle => WorkerPriority::Idle,
            CliPriority::Low => WorkerPriority::Low,
            CliPriority::Inherit => WorkerPriority::Inherit,
            CliPriority::High => WorkerPriority::High,
        }
    }
}

struct RunArgs {
    target: PathBuf,
    settings: Option<PathBuf>,
    seed: Option<u64>,
    resume: Option<PathBuf>,
    generations: Option<u64>,
    seconds: Option<f64>,
    save: Vec<PathBuf>,
    autosave_secs: Option<u64>,
    snapshot: Option<PathBuf>,
    priority: WorkerPriority,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // name rayon workers once at startup ("rayon-0", ...)
    let _ = rayon::ThreadPoolBuilder::new()
        .thread_name(|i| format!("rayon-{i}"))
        .build_global();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            target,
            settings,
            seed,
            resume,
            generations,
            seconds,
            save,
            autosave_secs,
            snapshot,
            priority,
        } => run(RunArgs {
            target,
            settings,
            seed,
            resume,
            generations,
            seconds,
            save,
            autosave_secs,
            snapshot,
            priority: priority.into(),
        }),
        Commands::Export { input, output } => {
            let lineage = persistence::load(&input)
                .with_context(|| format!("failed to load {}", input.display()))?;
            persistence::save(&output, &lineage)
                .with_context(|| format!("failed to write {}", output.display()))?;
            Ok(())
        }
    }
}

fn load_target(path: &Path) -> Result<Raster> {
    let img = image::open(path)
        .with_context(|| format!("failed to open target image {}", path.display()))?
        .to_rgba8();
    Ok(Raster::from_straight(img.width(), img.height(), img.as_raw())?)
}

fn save_all(breeder: &Breeder, paths: &[PathBuf]) {
    for path in paths {
        if let Err(e) = breeder.save_lineage(path) {
            tracing::warn!(path = %path.display(), error = %e, "save failed");
        }
    }
}

fn run(args: RunArgs) -> Result<()> {
    let mut settings = match &args.settings {
        Some(path) => BreederSettings::load(path)?,
        None => BreederSettings::default(),
    };
    if let Some(seed) = args.seed {
        settings.seed = seed;
    }

    let (mut breeder, events) = Breeder::new(settings)?;
    breeder.set_target_image(load_target(&args.target)?)?;
    if let Some(path) = &args.resume {
        breeder
            .load_genome(path)
            .with_context(|| format!("failed to resume from {}", path.display()))?;
    }

    breeder.start(args.priority)?;

    let started = Instant::now();
    let time_limit = args.seconds.map(Duration::from_secs_f64);
    let autosave = args.autosave_secs.map(Duration::from_secs);
    let mut last_save = Instant::now();
    let mut failure = None;

    loop {
        match events.recv_timeout(Duration::from_millis(100)) {
            Ok(BreederEvent::Stopped { reason: StopReason::Failed(message), .. }) => {
                failure = Some(message);
                break;
            }
            Ok(BreederEvent::Stopped { .. }) => break,
            Ok(_) => {}
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {}
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
        }

        if args.generations.is_some_and(|n| breeder.generation() >= n) {
            break;
        }
        if time_limit.is_some_and(|limit| started.elapsed() >= limit) {
            break;
        }
        if let Some(every) = autosave {
            if breeder.is_dirty() && last_save.elapsed() >= every {
                save_all(&breeder, &args.save);
                last_save = Instant::now();
            }
        }
    }

    breeder.stop()?;
    tracing::info!(
        generation = breeder.generation(),
        selected = breeder.selected(),
        fitness = breeder.fitness().unwrap_or_default(),
        elapsed_secs = breeder.elapsed().as_secs_f64(),
        "run finished"
    );

    save_all(&breeder, &args.save);

    if let Some(path) = &args.snapshot {
        let image = breeder
            .current_image()
            .and_then(|raster| raster.to_rgba_image())
            .context("no rendering to snapshot")?;
        image
            .save(path)
            .with_context(|| format!("failed to write snapshot {}", path.display()))?;
    }

    if let Some(message) = failure.or_else(|| breeder.last_failure()) {
        bail!("breeding stopped on error: {message}");
    }
    Ok(())
}
