mod auth;
mod cli;
mod config;
mod error;
mod extract;
mod model;
mod output;
mod pipeline;
mod providers;
mod server;

#[cfg(test)]
mod test_support;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    output::print_banner();

    let cli = Cli::parse();
    info!("Starting Repo Surgeon");
    cli.execute().await?;

    Ok(())
}
