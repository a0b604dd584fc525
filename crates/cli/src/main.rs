//! Vitrine CLI - Terminal storefront.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (the session is persisted between runs)
//! vitrine login -e ana@x.com -p secret1
//!
//! # Browse
//! vitrine products --search camiseta --sort price_asc
//! vitrine products --category 65f0c0ffee --sort title_desc
//! vitrine product 65f1c0ffee
//!
//! # Cart
//! vitrine cart add 65f1c0ffee -q 2
//! vitrine cart set 65f1c0ffee 0
//!
//! # Reviews
//! vitrine review add 65f1c0ffee -r 5 -c "Ótimo"
//! ```
//!
//! # Commands
//!
//! - `login` / `register` / `logout` / `whoami` - Session
//! - `products` / `product` / `categories` - Catalog
//! - `cart` - Show and edit the cart
//! - `review` - Add or delete your review of a product
//!
//! Configuration comes from `VITRINE_*` environment variables (see
//! `vitrine_client::config`). Logs go to stderr; set `RUST_LOG` to tune them.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use vitrine_core::SortKey;

mod commands;

use commands::Context;

#[derive(Parser)]
#[command(name = "vitrine")]
#[command(author, version, about = "Vitrine storefront in your terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in to an existing account
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long)]
        password: String,
    },
    /// Create an account and sign in
    Register {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Account email
        #[arg(short, long)]
        email: String,

        /// Password
        #[arg(short, long)]
        password: String,
    },
    /// Sign out (always succeeds locally)
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List products
    Products {
        /// Free-text search
        #[arg(short, long, conflicts_with = "category")]
        search: Option<String>,

        /// Only products in this category
        #[arg(short, long)]
        category: Option<String>,

        /// Ordering (`price_asc`, `price_desc`, `title_asc`, `title_desc`)
        #[arg(long)]
        sort: Option<SortKey>,
    },
    /// Show a product with its reviews
    Product {
        /// Product id
        id: String,
    },
    /// List categories
    Categories,
    /// Show or edit the cart
    Cart {
        #[command(subcommand)]
        action: Option<CartAction>,
    },
    /// Add or delete your review of a product
    Review {
        #[command(subcommand)]
        action: ReviewAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart (default)
    Show,
    /// Add a product
    Add {
        /// Product id
        id: String,

        /// Units to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set a line's quantity (0 removes it)
    Set {
        /// Product id
        id: String,

        /// New quantity
        quantity: u32,
    },
    /// Remove a line
    Remove {
        /// Product id
        id: String,
    },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum ReviewAction {
    /// Review a product
    Add {
        /// Product id
        id: String,

        /// Stars, 1 to 5
        #[arg(short, long)]
        rating: u8,

        /// Optional comment
        #[arg(short, long)]
        comment: Option<String>,
    },
    /// Delete your review of a product
    Delete {
        /// Product id
        id: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("vitrine=info,vitrine_client=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::from_env()?;

    match cli.command {
        Commands::Login { email, password } => {
            commands::auth::login(&ctx, &email, &password).await?;
        }
        Commands::Register {
            name,
            email,
            password,
        } => commands::auth::register(&ctx, &name, &email, &password).await?,
        Commands::Logout => commands::auth::logout(&ctx).await?,
        Commands::Whoami => commands::auth::whoami(&ctx)?,
        Commands::Products {
            search,
            category,
            sort,
        } => commands::catalog::products(&ctx, search, category, sort).await?,
        Commands::Product { id } => commands::catalog::product(&ctx, &id).await?,
        Commands::Categories => commands::catalog::categories(&ctx).await?,
        Commands::Cart { action } => match action.unwrap_or(CartAction::Show) {
            CartAction::Show => commands::cart::show(&ctx).await?,
            CartAction::Add { id, quantity } => commands::cart::add(&ctx, &id, quantity).await?,
            CartAction::Set { id, quantity } => commands::cart::set(&ctx, &id, quantity).await?,
            CartAction::Remove { id } => commands::cart::remove(&ctx, &id).await?,
            CartAction::Clear => commands::cart::clear(&ctx).await?,
        },
        Commands::Review { action } => match action {
            ReviewAction::Add {
                id,
                rating,
                comment,
            } => commands::reviews::add(&ctx, &id, rating, comment).await?,
            ReviewAction::Delete { id } => commands::reviews::delete(&ctx, &id).await?,
        },
    }
    Ok(())
}
