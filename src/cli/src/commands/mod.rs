//! CLI command definitions and dispatch.

mod build;
mod image;
mod version;

use clap::{Args, Parser, Subcommand};

use eru_image_core::config::DEFAULT_ENDPOINT;
use eru_image_core::{ClientConfig, Result};

/// Eru image build client.
#[derive(Parser)]
#[command(name = "eru", version, about)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Connection and logging options shared by every command.
#[derive(Args)]
pub struct GlobalArgs {
    /// Eru core endpoint
    #[arg(long = "eru", env = "ERU", default_value = DEFAULT_ENDPOINT, global = true)]
    pub endpoint: String,

    /// Username for the Eru core
    #[arg(long, env = "ERU_USERNAME", global = true)]
    pub username: Option<String>,

    /// Password for the Eru core
    #[arg(long, env = "ERU_PASSWORD", hide_env_values = true, global = true)]
    pub password: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

impl GlobalArgs {
    /// Build the client configuration from the global flags.
    pub fn client_config(&self) -> Result<ClientConfig> {
        ClientConfig {
            endpoint: self.endpoint.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            ..Default::default()
        }
        .validate()
    }
}

/// Available commands.
#[derive(Subcommand)]
pub enum Command {
    /// Image commands
    Image(image::ImageArgs),
    /// Show version information
    Version(version::VersionArgs),
}

/// Dispatch a parsed CLI to the appropriate command handler.
pub async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Image(args) => image::execute(args, cli.global.client_config()?).await,
        Command::Version(args) => version::execute(args).await,
    }
}
