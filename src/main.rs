use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use terrain_sandbox::biomes::Biome;
use terrain_sandbox::config::SandboxConfig;
use terrain_sandbox::error::{Result, SandboxError};
use terrain_sandbox::explorer::run_explorer;
use terrain_sandbox::journal::{compose_entry, nearby_features, JournalDesk, JournalRequest, LlmJournal, TimeOfDay};
use terrain_sandbox::player::{MovementIntent, PlayerBody, TerrainGround};
use terrain_sandbox::world::WorldController;

#[derive(Parser, Debug)]
#[command(name = "terrain_sandbox")]
#[command(about = "Explore a procedurally generated terrain tile with biomes, props and a journal")]
struct Args {
    /// World seed (uses a seed from the session source if not specified)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Seed for the session seed source (makes regenerations reproducible)
    #[arg(long)]
    session_seed: Option<u64>,

    /// JSON config file; CLI flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Cells per side of the terrain tile
    #[arg(long)]
    segments: Option<usize>,

    /// World units between vertices
    #[arg(long)]
    world_scale: Option<f64>,

    /// Number of prop scatter trials
    #[arg(short = 'p', long)]
    props: Option<usize>,

    /// Half-width of the prop scatter area
    #[arg(long)]
    range: Option<f32>,

    /// Base URL of the OpenAI-compatible journal server
    #[arg(long)]
    llm_url: Option<String>,

    /// Model name for the journal server
    #[arg(long)]
    model: Option<String>,

    /// Run a scripted walk of N frames without the terminal UI
    #[arg(long)]
    headless: Option<usize>,

    /// Request one journal entry at the end of a headless walk
    #[arg(long)]
    journal: bool,

    /// Log file for the explorer (the terminal is taken by the UI)
    #[arg(long, default_value = "terrain_sandbox.log")]
    log_file: PathBuf,
}

impl Args {
    fn apply(&self, config: &mut SandboxConfig) {
        if let Some(segments) = self.segments {
            config.terrain.segments = segments;
        }
        if let Some(scale) = self.world_scale {
            config.terrain.world_scale = scale;
        }
        if let Some(count) = self.props {
            config.props.count = count;
        }
        if let Some(range) = self.range {
            config.props.range = range;
        }
        if let Some(url) = &self.llm_url {
            config.journal.base_url = url.clone();
        }
        if self.model.is_some() {
            config.journal.model = self.model.clone();
        }
        if self.session_seed.is_some() {
            config.session_seed = self.session_seed;
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn init_logging(args: &Args) {
    if args.headless.is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_writer(std::io::stderr)
            .init();
        return;
    }

    match File::create(&args.log_file) {
        Ok(file) => tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init(),
        Err(e) => eprintln!("Could not open log file {}: {}", args.log_file.display(), e),
    }
}

fn load_config(args: &Args) -> Result<SandboxConfig> {
    let mut config = match &args.config {
        Some(path) => SandboxConfig::load(path)?,
        None => SandboxConfig::default(),
    };
    args.apply(&mut config);
    config.validate()?;
    Ok(config)
}

/// Walk a wide circle around spawn, reporting biome changes and resets.
fn run_headless(mut world: WorldController, config: &SandboxConfig, frames: usize, journal: bool) -> Result<()> {
    let terrain = world.terrain();
    let stats = terrain.stats();
    println!("Seed: {}", world.seed());
    println!(
        "Terrain: {}x{} vertices, height {:.2} to {:.2}",
        terrain.width(),
        terrain.width(),
        stats.min_height,
        stats.max_height
    );
    for biome in Biome::ALL {
        println!("  {:<10} {}", biome.display_name(), stats.count(biome));
    }
    println!("Props: {}", world.props().len());

    let dt = 1.0 / 30.0;
    let mut ground = TerrainGround::new(world.snapshot().seeds.terrain);
    let mut body = PlayerBody::default();
    body.respawn(&ground);

    for frame in 0..frames {
        let angle = frame as f32 * 0.01;
        let intent = MovementIntent {
            forward: angle.cos(),
            strafe: angle.sin(),
            jump: frame % 90 == 0,
        };
        body.step(&intent, &ground, dt);

        let report = world.update(body.position);
        if let Some(biome) = report.biome_changed {
            println!("[{:>5}] entered {}", frame, biome);
        }
        if let Some(seed) = report.new_seed {
            println!("[{:>5}] fell into a mine, new seed {}", frame, seed);
            ground = TerrainGround::new(world.snapshot().seeds.terrain);
        }
    }

    println!(
        "Final position: ({:.1}, {:.1}, {:.1}) in {}",
        body.position.x,
        body.position.y,
        body.position.z,
        world.current_biome()
    );

    if journal {
        let service = LlmJournal::new(config.journal.clone())?;
        let request = JournalRequest {
            biome: world.current_biome(),
            time_of_day: TimeOfDay::now(),
            nearby_features: nearby_features(body.position.y, &mut rand::thread_rng()),
        };
        let entry = compose_entry(&service, &request);
        println!("Journal ({}): {}", entry.written_at.format("%H:%M"), entry.text);
    }

    Ok(())
}

fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;
    let world = match args.seed {
        Some(seed) => WorldController::with_seed(&config, seed),
        None => WorldController::new(&config),
    };
    info!(seed = world.seed(), segments = config.terrain.segments, "starting sandbox");

    if let Some(frames) = args.headless {
        return run_headless(world, &config, frames, args.journal);
    }

    let service = LlmJournal::new(config.journal.clone())?;
    let desk = JournalDesk::new(Arc::new(service)).map_err(SandboxError::Runtime)?;
    run_explorer(world, desk)
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "sandbox failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
