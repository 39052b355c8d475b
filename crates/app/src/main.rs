//! Box Office Cart CLI

use std::process;

use boxoffice_cart::observability;
use clap::Parser;

use crate::cli::Cli;

mod cli;

#[tokio::main]
pub async fn main() {
    _ = dotenvy::dotenv();

    let cli = Cli::parse();

    if let Err(error) = observability::init_subscriber(&cli.logging) {
        #[expect(
            clippy::print_stderr,
            reason = "logging is not initialised, stderr is the only channel"
        )]
        {
            eprintln!("{error}");
        }

        process::exit(1);
    }

    if let Err(error) = cli.run().await {
        tracing::error!("{error}");

        process::exit(1);
    }
}
