mod app;
mod cli;
mod domain;
mod infra;
mod pricing;
mod util;

use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    app::run(cli).await
}
