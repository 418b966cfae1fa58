mod cli;
mod paths;
mod run;

use anyhow::Result;
use cli::Command;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Some(Command::Palette(args)) => run::palette(cli.config, args),
        None => run::run(cli.config, cli.run),
    }
}
