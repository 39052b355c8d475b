use boxoffice_cart::{
    config::{DatabaseConfig, ReservationConfig},
    context::AppContext,
    domain::{products::ProductTypeTag, reservations::ReservationLine},
};
use clap::{Args, Subcommand};

#[derive(Debug, Args)]
pub(crate) struct ProductCommand {
    #[command(flatten)]
    database: DatabaseConfig,

    #[command(flatten)]
    reservations: ReservationConfig,

    #[command(subcommand)]
    command: ProductSubcommand,
}

#[derive(Debug, Subcommand)]
enum ProductSubcommand {
    /// Create a gift voucher
    Voucher {
        /// Amount in minor currency units
        #[arg(long)]
        amount: u64,
    },

    /// Record a ticket for a line the reservation system holds
    Ticket {
        #[arg(long)]
        performance_no: i64,

        #[arg(long)]
        line_seq_no: i64,

        /// Cost in minor currency units
        #[arg(long)]
        cost: u64,
    },

    /// Create a package product
    Package {
        #[arg(long)]
        package_no: i64,

        #[arg(long)]
        title: String,

        /// Cost in minor currency units
        #[arg(long)]
        cost: u64,
    },
}

pub(crate) async fn run(command: ProductCommand) -> Result<(), String> {
    let context = AppContext::from_config(&command.database, &command.reservations)
        .await
        .map_err(|error| format!("failed to initialise: {error}"))?;

    let (tag, uuid) = match command.command {
        ProductSubcommand::Voucher { amount } => {
            let voucher = context
                .vouchers
                .create_voucher(amount)
                .await
                .map_err(|error| format!("failed to create voucher: {error}"))?;

            (ProductTypeTag::VOUCHER, voucher.uuid)
        }
        ProductSubcommand::Ticket {
            performance_no,
            line_seq_no,
            cost,
        } => {
            let ticket = context
                .tickets
                .create_ticket(
                    ReservationLine {
                        performance_no,
                        line_seq_no,
                    },
                    cost,
                )
                .await
                .map_err(|error| format!("failed to create ticket: {error}"))?;

            (ProductTypeTag::TICKET, ticket.uuid)
        }
        ProductSubcommand::Package {
            package_no,
            title,
            cost,
        } => {
            let package = context
                .packages
                .create_package(package_no, &title, cost)
                .await
                .map_err(|error| format!("failed to create package: {error}"))?;

            (ProductTypeTag::PACKAGE, package.uuid)
        }
    };

    println!("product_type: {tag}");
    println!("product_uuid: {uuid}");

    Ok(())
}
