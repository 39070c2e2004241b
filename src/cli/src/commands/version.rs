//! `eru version` command.

use clap::Args;

use eru_image_core::Result;

#[derive(Args)]
pub struct VersionArgs;

pub async fn execute(_args: VersionArgs) -> Result<()> {
    println!("eru version {}", eru_image_core::VERSION);
    Ok(())
}
