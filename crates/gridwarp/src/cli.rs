use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::paths::ENV_CONFIG_FILE;

#[derive(Parser, Debug)]
#[command(
    name = "gridwarp",
    author,
    version,
    about = "Image carousel with a grid-warp dissolve shader",
    arg_required_else_help = false
)]
pub struct Cli {
    /// Carousel TOML file (defaults to `<config dir>/gridwarp/carousel.toml`).
    #[arg(long, value_name = "FILE", env = ENV_CONFIG_FILE, global = true)]
    pub config: Option<PathBuf>,
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Window size override (e.g. 1920x1080).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_dimensions)]
    pub size: Option<(u32, u32)>,

    /// Index of the slide shown first.
    #[arg(long, value_name = "INDEX")]
    pub start: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode every slide and print its extracted colors as JSON.
    Palette(PaletteArgs),
}

#[derive(Args, Debug)]
pub struct PaletteArgs {
    /// Emit a single JSON line instead of pretty-printed output.
    #[arg(long)]
    pub compact: bool,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_dimensions(value: &str) -> Result<(u32, u32), String> {
    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| "expected WIDTHxHEIGHT".to_string())?;
    let width = w
        .trim()
        .parse::<u32>()
        .map_err(|_| "invalid width in window size".to_string())?;
    let height = h
        .trim()
        .parse::<u32>()
        .map_err(|_| "invalid height in window size".to_string())?;
    if width == 0 || height == 0 {
        return Err("window size must be greater than zero".into());
    }
    Ok((width, height))
}
