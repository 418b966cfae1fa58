use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use carousel::{PreparedSlide, ResourceLoader, SlideSource};
use deckconfig::DeckConfig;
use renderer::{CarouselPlan, Renderer, RendererConfig};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::cli::{PaletteArgs, RunArgs};
use crate::paths::resolve_config_file;

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

pub fn run(config: Option<PathBuf>, args: RunArgs) -> Result<()> {
    let path = resolve_config_file(config)?;
    let deck = load_deck(&path)?;

    let start = args.start.unwrap_or(0);
    if start >= deck.slides.len() {
        bail!(
            "--start {start} is out of range; {} lists {} slides",
            path.display(),
            deck.slides.len()
        );
    }

    let surface_size = args.size.unwrap_or_else(|| deck.surface_size());
    tracing::info!(
        config = %path.display(),
        slides = deck.slides.len(),
        width = surface_size.0,
        height = surface_size.1,
        start,
        "starting gridwarp carousel"
    );

    let renderer = Renderer::new(RendererConfig {
        surface_size,
        title: deck.window.title.clone(),
        clear_color: deck.clear_color,
        time_step: deck.time_step,
        grid_size: deck.grid_size,
    });
    renderer.run(CarouselPlan {
        slides: slide_sources(&deck),
        noise: deck.noise.clone(),
        start,
    })
}

pub fn palette(config: Option<PathBuf>, args: PaletteArgs) -> Result<()> {
    let path = resolve_config_file(config)?;
    let deck = load_deck(&path)?;

    let loader = ResourceLoader::new().context("failed to prepare asset loader")?;
    let prepared = loader
        .prepare(&slide_sources(&deck))
        .context("failed to load carousel assets")?;
    let noise = loader
        .decode_noise(&deck.noise)
        .context("failed to load carousel assets")?;

    let report = PaletteReport {
        config: path.display().to_string(),
        noise: NoiseReport {
            image: deck.noise.clone(),
            width: noise.width(),
            height: noise.height(),
        },
        slides: prepared.iter().map(SlideReport::from).collect(),
    };
    let json = if args.compact {
        serde_json::to_string(&report)
    } else {
        serde_json::to_string_pretty(&report)
    }
    .context("failed to serialise palette report")?;
    println!("{json}");
    Ok(())
}

fn load_deck(path: &Path) -> Result<DeckConfig> {
    DeckConfig::load(path)
        .with_context(|| format!("failed to load carousel config {}", path.display()))
}

fn slide_sources(deck: &DeckConfig) -> Vec<SlideSource> {
    deck.slides
        .iter()
        .map(|entry| SlideSource {
            locator: entry.image.clone(),
            title: entry.title.clone(),
            body: entry.body.clone(),
        })
        .collect()
}

#[derive(Debug, Serialize)]
struct PaletteReport {
    config: String,
    noise: NoiseReport,
    slides: Vec<SlideReport>,
}

#[derive(Debug, Serialize)]
struct NoiseReport {
    image: String,
    width: u32,
    height: u32,
}

#[derive(Debug, Serialize)]
struct SlideReport {
    index: usize,
    image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    width: u32,
    height: u32,
    primary: String,
    secondary: String,
    palette: Vec<String>,
}

impl From<&PreparedSlide> for SlideReport {
    fn from(slide: &PreparedSlide) -> Self {
        Self {
            index: slide.index,
            image: slide.source.locator.clone(),
            title: slide.source.title.clone(),
            width: slide.image.width(),
            height: slide.image.height(),
            primary: slide.colors.primary.hex(),
            secondary: slide.colors.secondary.hex(),
            palette: slide.palette.iter().map(|color| color.hex()).collect(),
        }
    }
}
