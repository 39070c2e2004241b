//! `eru image` command family.

use clap::{Args, Subcommand};

use eru_image_core::{ClientConfig, Result};

use super::build;

#[derive(Args)]
pub struct ImageArgs {
    #[command(subcommand)]
    pub command: ImageCommand,
}

/// Image subcommands.
#[derive(Subcommand)]
pub enum ImageCommand {
    /// Build an image from a multi-stage spec or a directory
    Build(build::BuildArgs),
}

pub async fn execute(args: ImageArgs, config: ClientConfig) -> Result<()> {
    match args.command {
        ImageCommand::Build(args) => build::execute(args, config).await,
    }
}
