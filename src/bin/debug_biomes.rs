//! Debug script to output the biome map of a seed as ASCII

use std::fs::File;
use std::io::{self, Write};
use std::error::Error;
use std::path::PathBuf;

use clap::Parser;

use terrain_sandbox::biomes::Biome;
use terrain_sandbox::config::SandboxConfig;
use terrain_sandbox::props::{scatter_props, PropKind};
use terrain_sandbox::seeds::WorldSeeds;
use terrain_sandbox::terrain::generate_terrain;

#[derive(Parser, Debug)]
#[command(name = "debug_biomes")]
#[command(about = "Dump the biome map and statistics of a seed")]
struct Args {
    #[arg(short, long, default_value = "12345")]
    seed: u64,

    #[arg(long, default_value = "64")]
    segments: usize,

    #[arg(long, default_value = "1.5")]
    world_scale: f64,

    /// Write to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Overlay props on the map
    #[arg(long)]
    props: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt().with_writer(io::stderr).init();
    let args = Args::parse();

    let mut config = SandboxConfig::default();
    config.terrain.segments = args.segments;
    config.terrain.world_scale = args.world_scale;
    config.validate()?;

    let seeds = WorldSeeds::from_master(args.seed);
    let terrain = generate_terrain(&seeds, &config.terrain);
    let props = scatter_props(&seeds, &config.props);

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(io::stdout().lock()),
    };

    let width = terrain.width();
    writeln!(out, "=== BIOME DEBUG MAP ({}x{}) seed={} ===", width, width, args.seed)?;
    writeln!(out, "Sub-seeds: {}", seeds)?;
    writeln!(out)?;

    writeln!(out, "LEGEND:")?;
    for biome in Biome::ALL {
        writeln!(out, "  {} = {}", biome.glyph(), biome.display_name())?;
    }
    if args.props {
        writeln!(out, "  M = Mine  T = Tree  a = Animal")?;
    }
    writeln!(out)?;

    let mut rows: Vec<Vec<char>> = (0..width)
        .map(|j| (0..width).map(|i| terrain.biome_map().get(i, j).glyph()).collect())
        .collect();

    if args.props {
        for prop in props.instances() {
            if let Some(index) = terrain.mapping.world_to_grid(prop.position.x as f64, prop.position.z as f64) {
                rows[index.j][index.i] = prop.kind.glyph();
            }
        }
    }

    // Row j = 0 is the far (-Z) edge
    writeln!(out, "BIOME MAP:")?;
    for row in &rows {
        writeln!(out, "{}", row.iter().collect::<String>())?;
    }
    writeln!(out)?;

    let stats = terrain.stats();
    let total = terrain.vertex_count() as f32;
    writeln!(out, "Height range: {:.2} to {:.2}", stats.min_height, stats.max_height)?;
    writeln!(out, "BIOME DISTRIBUTION:")?;
    for biome in Biome::ALL {
        let count = stats.count(biome);
        writeln!(
            out,
            "  {:<10} {:>6} ({:.1}%)",
            biome.display_name(),
            count,
            100.0 * count as f32 / total
        )?;
    }

    writeln!(out, "PROPS ({} trials):", config.props.count)?;
    for kind in [PropKind::Mine, PropKind::Tree, PropKind::Animal] {
        writeln!(out, "  {:<10} {:>6}", kind.name(), props.count(kind))?;
    }

    Ok(())
}
