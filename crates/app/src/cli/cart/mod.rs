use boxoffice_cart::{
    config::{DatabaseConfig, ReservationConfig},
    context::AppContext,
    domain::{
        carts::{CartsService, LoginEvent, handle_login, models::CartItemUuid},
        owners::{AccountId, Actor, Owner, SessionKey, resolve_owner},
        products::{ExtraAttrs, ProductRef, ProductTypeTag, ProductUuid},
        reservations::ReservationToken,
    },
};
use clap::{Args, Subcommand};
use uuid::Uuid;

mod render;

#[derive(Debug, Args)]
pub(crate) struct CartCommand {
    #[command(flatten)]
    database: DatabaseConfig,

    #[command(flatten)]
    reservations: ReservationConfig,

    #[command(subcommand)]
    command: CartSubcommand,
}

/// Whose cart to operate on.
#[derive(Debug, Args)]
struct OwnerArgs {
    /// Authenticated account UUID
    #[arg(long)]
    account: Option<Uuid>,

    /// Anonymous session key
    #[arg(long)]
    session: Option<String>,

    /// Reservation system token; defaults to the session key
    #[arg(long, env = "RESERVATION_TOKEN")]
    token: Option<String>,
}

impl OwnerArgs {
    fn owner(&self) -> Result<Owner, String> {
        resolve_owner(&Actor {
            account: self.account,
            session_key: self.session.clone(),
        })
        .map_err(|error| format!("invalid owner: {error}"))
    }

    fn token(&self) -> Result<ReservationToken, String> {
        self.token
            .as_ref()
            .or(self.session.as_ref())
            .map(ReservationToken::new)
            .ok_or_else(|| "--token is required for account carts".to_string())
    }
}

#[derive(Debug, Subcommand)]
enum CartSubcommand {
    /// List cart items
    List {
        #[command(flatten)]
        owner: OwnerArgs,

        /// Include paid items
        #[arg(long)]
        include_paid: bool,
    },

    /// Add a product to the cart
    Add {
        #[command(flatten)]
        owner: OwnerArgs,

        /// Product type tag, e.g. `ticket`
        #[arg(long)]
        product_type: String,

        #[arg(long)]
        product_uuid: Uuid,

        /// Extra attributes as a JSON object
        #[arg(long, default_value = "{}")]
        attrs: String,
    },

    /// Remove one cart item
    Remove {
        #[command(flatten)]
        owner: OwnerArgs,

        #[arg(long)]
        item: Uuid,
    },

    /// Remove every unpaid item
    Clear {
        #[command(flatten)]
        owner: OwnerArgs,
    },

    /// Print the total cost of unpaid items
    Total {
        #[command(flatten)]
        owner: OwnerArgs,
    },

    /// Print the product types in the cart
    Types {
        #[command(flatten)]
        owner: OwnerArgs,
    },

    /// Mark the cart paid
    Pay {
        #[command(flatten)]
        owner: OwnerArgs,
    },

    /// Reconcile ticket holds and print the cart
    Summary {
        #[command(flatten)]
        owner: OwnerArgs,
    },

    /// Move a session's cart to an account, as a login would
    Transfer {
        #[arg(long)]
        session: String,

        #[arg(long)]
        account: Uuid,
    },
}

pub(crate) async fn run(command: CartCommand) -> Result<(), String> {
    let context = AppContext::from_config(&command.database, &command.reservations)
        .await
        .map_err(|error| format!("failed to initialise: {error}"))?;

    let carts = context.carts.as_ref();

    match command.command {
        CartSubcommand::List {
            owner,
            include_paid,
        } => {
            let items = carts
                .list(&owner.owner()?, include_paid)
                .await
                .map_err(|error| format!("failed to list cart: {error}"))?;

            render::items(&items);
        }
        CartSubcommand::Add {
            owner,
            product_type,
            product_uuid,
            attrs,
        } => add(carts, &owner, product_type, product_uuid, &attrs).await?,
        CartSubcommand::Remove { owner, item } => {
            carts
                .remove(
                    &owner.owner()?,
                    &owner.token()?,
                    CartItemUuid::from_uuid(item),
                )
                .await
                .map_err(|error| format!("failed to remove item: {error}"))?;
        }
        CartSubcommand::Clear { owner } => {
            let removed = carts
                .clear(&owner.owner()?, &owner.token()?)
                .await
                .map_err(|error| format!("failed to clear cart: {error}"))?;

            render::count("removed", removed);
        }
        CartSubcommand::Total { owner } => {
            let total = carts
                .total_cost(&owner.owner()?)
                .await
                .map_err(|error| format!("failed to total cart: {error}"))?;

            render::amount("total", total);
        }
        CartSubcommand::Types { owner } => types(carts, &owner).await?,
        CartSubcommand::Pay { owner } => {
            let paid = carts
                .set_as_paid(&owner.owner()?, &owner.token()?)
                .await
                .map_err(|error| format!("failed to mark cart paid: {error}"))?;

            render::count("paid", paid);
        }
        CartSubcommand::Summary { owner } => {
            let summary = carts
                .summary(&owner.owner()?, &owner.token()?)
                .await
                .map_err(|error| format!("failed to summarise cart: {error}"))?;

            render::summary(&summary);
        }
        CartSubcommand::Transfer { session, account } => transfer(carts, session, account).await?,
    }

    Ok(())
}

async fn add(
    carts: &dyn CartsService,
    owner: &OwnerArgs,
    product_type: String,
    product_uuid: Uuid,
    attrs: &str,
) -> Result<(), String> {
    let attrs: ExtraAttrs = serde_json::from_str(attrs)
        .map_err(|error| format!("--attrs must be a JSON object: {error}"))?;

    let product = ProductRef::new(
        ProductTypeTag::new(product_type),
        ProductUuid::from_uuid(product_uuid),
    );

    let item = carts
        .add(&owner.owner()?, &owner.token()?, product, attrs)
        .await
        .map_err(|error| {
            if error.is_retryable() {
                format!("failed to add product, try again: {error}")
            } else {
                format!("failed to add product: {error}")
            }
        })?;

    render::items(&[item]);

    Ok(())
}

async fn types(carts: &dyn CartsService, owner: &OwnerArgs) -> Result<(), String> {
    let owner = owner.owner()?;

    let types = carts
        .types(&owner)
        .await
        .map_err(|error| format!("failed to read cart types: {error}"))?;

    let only_packages = carts
        .is_only_packages(&owner)
        .await
        .map_err(|error| format!("failed to read cart types: {error}"))?;

    render::types(&types, only_packages);

    Ok(())
}

async fn transfer(carts: &dyn CartsService, session: String, account: Uuid) -> Result<(), String> {
    let anonymous_session_key =
        SessionKey::new(session).map_err(|error| format!("invalid session key: {error}"))?;

    let moved = handle_login(
        carts,
        LoginEvent {
            account: AccountId::from_uuid(account),
            anonymous_session_key: Some(anonymous_session_key),
        },
    )
    .await
    .map_err(|error| format!("failed to transfer cart: {error}"))?;

    render::count("moved", moved);

    Ok(())
}
