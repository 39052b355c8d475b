use clap::{Parser, Subcommand};

use boxoffice_cart::config::LoggingConfig;

mod cart;
mod db;
mod product;

#[derive(Debug, Parser)]
#[command(name = "boxoffice-cart", about = "Box office cart operations", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) logging: LoggingConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Cart(cart::CartCommand),
    Db(db::DbCommand),
    Product(product::ProductCommand),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        match self.command {
            Commands::Cart(command) => cart::run(command).await,
            Commands::Db(command) => db::run(command).await,
            Commands::Product(command) => product::run(command).await,
        }
    }
}
