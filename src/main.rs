use std::process::ExitCode;

use anyhow::Result;
use clap::Parser as _;
use keylight_exporter::app;
use keylight_exporter::config::{Args, Settings};

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = run().await {
        eprintln!("{e:#}");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

async fn run() -> Result<()> {
    let args = Args::parse();
    let settings = Settings::load(&args)?;

    app::init_logging(&settings.log_level);

    app::run(settings).await
}
