//! Storefront CLI - command-line client for the storefront API
//!
//! Browse the catalogue, manage the cart and start checkout from a terminal.

mod api;
mod app;
mod auth;
mod config;
mod models;
mod notify;

use anyhow::Result;
use clap::{ArgGroup, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::{CartAction, ProductQuery};
use models::{LoginData, RegisterData};

#[derive(Parser)]
#[command(name = "storefront")]
#[command(about = "Command-line client for the storefront API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// API base URL (overrides config file and STOREFRONT_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in with email or phone number
    #[command(group(ArgGroup::new("identity").required(true).args(["email", "phone"])))]
    Login {
        #[arg(short, long)]
        email: Option<String>,

        /// Phone number, including country code
        #[arg(long)]
        phone: Option<String>,

        #[arg(short, long, env = "STOREFRONT_PASSWORD")]
        password: String,

        /// Log in again even if a stored session is still usable
        #[arg(short, long)]
        force: bool,
    },

    /// Create an account
    Register {
        #[arg(short, long)]
        email: String,

        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        #[arg(long)]
        phone: Option<String>,

        #[arg(short, long)]
        password: String,

        #[arg(long)]
        password_confirm: String,
    },

    /// Log out and clear stored credentials
    Logout,

    /// Show stored token status
    Status,

    /// Show the current user
    Whoami,

    /// List products
    Products {
        #[arg(short, long)]
        search: Option<String>,

        /// Category ID (from `categories` output)
        #[arg(short, long)]
        category: Option<i64>,

        /// Sort field, e.g. `price` or `-created_at`
        #[arg(short, long)]
        ordering: Option<String>,

        #[arg(long)]
        page: Option<u32>,
    },

    /// Show a product
    Product { id: i64 },

    /// List product categories
    Categories,

    /// Show or change the cart
    Cart {
        #[command(subcommand)]
        action: Option<CartCommand>,
    },

    /// List your orders
    Orders,

    /// Show an order
    Order { id: i64 },

    /// Start payment for an order
    Checkout { order_id: i64 },

    /// List your payments
    Payments,

    /// List saved addresses
    Addresses,
}

#[derive(Subcommand)]
enum CartCommand {
    /// Show cart contents
    Show,

    /// Add a product
    Add {
        product_id: i64,

        #[arg(short, long, default_value = "1")]
        quantity: u32,
    },

    /// Set the quantity of a product (0 removes it)
    Update { product_id: i64, quantity: u32 },

    /// Remove a product
    Remove { product_id: i64 },

    /// Remove everything
    Clear,
}

impl From<CartCommand> for CartAction {
    fn from(cmd: CartCommand) -> Self {
        match cmd {
            CartCommand::Show => CartAction::Show,
            CartCommand::Add {
                product_id,
                quantity,
            } => CartAction::Add {
                product_id,
                quantity,
            },
            CartCommand::Update {
                product_id,
                quantity,
            } => CartAction::Update {
                product_id,
                quantity,
            },
            CartCommand::Remove { product_id } => CartAction::Remove { product_id },
            CartCommand::Clear => CartAction::Clear,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if let Err(e) = run(cli.command, cli.api_url).await {
        // Notified failures have already been shown.
        if !notify::already_reported(&e) {
            eprintln!("Error: {:#}", e);
        }
        std::process::exit(1);
    }
}

async fn run(command: Commands, api_url: Option<String>) -> Result<()> {
    match command {
        Commands::Login {
            email,
            phone,
            password,
            force,
        } => {
            let data = LoginData {
                email,
                phone_number: phone,
                password,
            };
            auth::login(api_url, data, force).await?;
        }
        Commands::Register {
            email,
            first_name,
            last_name,
            phone,
            password,
            password_confirm,
        } => {
            let data = RegisterData {
                email,
                first_name,
                last_name,
                phone_number: phone,
                password,
                password_confirm,
            };
            auth::register(api_url, data).await?;
        }
        Commands::Logout => {
            tracing::info!("Logging out...");
            auth::logout(api_url).await?;
        }
        Commands::Status => {
            auth::status(api_url).await?;
        }
        Commands::Whoami => {
            auth::whoami(api_url).await?;
        }
        Commands::Products {
            search,
            category,
            ordering,
            page,
        } => {
            let query = ProductQuery {
                search,
                category,
                ordering,
                page,
            };
            api::list_products(api_url, query).await?;
        }
        Commands::Product { id } => {
            api::show_product(api_url, id).await?;
        }
        Commands::Categories => {
            api::list_categories(api_url).await?;
        }
        Commands::Cart { action } => {
            let action = action.map(CartAction::from).unwrap_or(CartAction::Show);
            api::cart(api_url, action).await?;
        }
        Commands::Orders => {
            api::list_orders(api_url).await?;
        }
        Commands::Order { id } => {
            api::show_order(api_url, id).await?;
        }
        Commands::Checkout { order_id } => {
            tracing::info!("Creating checkout session...");
            api::checkout(api_url, order_id).await?;
        }
        Commands::Payments => {
            api::list_payments(api_url).await?;
        }
        Commands::Addresses => {
            api::list_addresses(api_url).await?;
        }
    }

    Ok(())
}
