//! Election Guide sync CLI

use clap::Parser;
use election_guide_sync::cli::{Cli, Runner};
use election_guide_sync::config::Settings;
use election_guide_sync::error::EXIT_FAILURE;
use election_guide_sync::logging::init_logging;
use tracing::error;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // .env is optional; real environment variables win
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let started = chrono::Local::now().naive_local();

    let settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(EXIT_FAILURE);
        }
    };

    let guard = match init_logging(settings.general.log_path.as_deref(), cli.verbose, started) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(EXIT_FAILURE);
        }
    };

    let runner = Runner::new(cli, settings);
    if let Err(e) = runner.run().await {
        error!("{e}");
        drop(guard);
        std::process::exit(EXIT_FAILURE);
    }
}
