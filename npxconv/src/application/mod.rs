pub mod handlers;

use crate::presentation::cli::{Cli, Commands};
use clap::Parser;
use npx_core::error::Result;

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        None => handlers::handle_convert(cli.convert),
        Some(Commands::Convert(args)) => handlers::handle_convert(args),
        Some(Commands::Jar { dir, suffix }) => handlers::handle_jar(cli.convert, dir, suffix),
        Some(Commands::Show { snapshot }) => handlers::handle_show(snapshot),
    }
}
