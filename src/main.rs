use anyhow::Result;
use clap::Parser;
use colored::Colorize;

use repodoc::cli::{load_config, Cli, CliApp};
use repodoc::logging::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    let app = CliApp::new(&config, cli.verbose)?;

    if let Err(e) = app.run(cli.command).await {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(1);
    }
    Ok(())
}
