use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use armap::config::{Palette, RenderConfig};
use armap::export;
use armap::render::MapRenderer;

#[derive(Parser, Debug)]
#[command(name = "armap")]
#[command(about = "Render stylized world maps from exported world layers")]
struct Args {
    /// Folder holding el.bmp, veg.bmp, bm.bmp, hyd.bmp, str.bmp and world.json
    #[arg(short, long)]
    input: PathBuf,

    /// Folder of palette TOML files
    #[arg(short, long, default_value = "palettes")]
    palettes: PathBuf,

    /// Render configuration TOML (defaults if omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output folder
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Palettes to render by name (all if omitted)
    #[arg(long, num_args = 1..)]
    colors: Vec<String>,

    /// Draw political territories
    #[arg(long)]
    territory: bool,

    /// Draw the road network
    #[arg(long)]
    roads: bool,

    /// Draw roads as exported, without joining fragments
    #[arg(long)]
    no_merge: bool,

    /// Tint farmland
    #[arg(long)]
    agriculture: bool,

    /// Draw settlement markers
    #[arg(long)]
    markers: bool,

    /// Draw the reference grid
    #[arg(long)]
    grid: bool,

    /// Only draw territories of entities ruling more than this many sites
    #[arg(long)]
    min_settlements: Option<usize>,
}

impl Args {
    /// Command line flags switch features on over the loaded configuration.
    fn apply(&self, config: &mut RenderConfig) {
        config.territory |= self.territory;
        config.roads |= self.roads;
        if self.no_merge {
            config.merge_roads = false;
        }
        config.agriculture.enabled |= self.agriculture;
        config.markers.enabled |= self.markers;
        config.grid.enabled |= self.grid;
        if let Some(min) = self.min_settlements {
            config.min_settlements = min;
        }
    }
}

fn run(args: &Args) -> armap::Result<()> {
    let mut config = match &args.config {
        Some(path) => RenderConfig::load(path)?,
        None => RenderConfig::default(),
    };
    args.apply(&mut config);

    let palettes = Palette::load_dir(&args.palettes)?;
    let selected = Palette::select(&palettes, &args.colors)?;
    if selected.is_empty() {
        tracing::warn!("No palettes found in {}", args.palettes.display());
        return Ok(());
    }

    let layers = export::load_layers(&args.input)?;
    let world = export::load_world(&args.input)?;
    let world_name = world.name.clone().unwrap_or_else(|| "map".to_string());

    let renderer = MapRenderer::new(&layers, &world, &config)?;
    for (palette, canvas) in renderer.render_palettes(&selected)? {
        export::save_png(&canvas, &export::output_path(&args.output, &world_name, &palette))?;
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
