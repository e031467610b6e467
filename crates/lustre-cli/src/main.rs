use std::path::PathBuf;

use clap::{Parser, Subcommand};
use uuid::Uuid;

mod db;
mod import;
mod local;
mod products;

#[derive(Debug, Parser)]
#[command(name = "lustre-cli")]
#[command(about = "Lustre storefront command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Import products from a CSV file
    Import {
        /// Path to the CSV file
        file: PathBuf,
        /// Parse and report without writing to the database
        #[arg(long)]
        dry_run: bool,
    },
    /// Inspect the catalog
    Products {
        #[command(subcommand)]
        command: ProductsCommands,
    },
    /// Manage the local shopping cart
    Cart {
        #[command(subcommand)]
        command: CartCommands,
    },
    /// Manage local favorites
    Favorites {
        #[command(subcommand)]
        command: FavoritesCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
    /// Upsert shipping rates from the configured YAML file
    Seed,
}

#[derive(Debug, Subcommand)]
enum ProductsCommands {
    /// List products, newest first
    List {
        /// Only show products in this category
        #[arg(long)]
        category: Option<String>,
    },
    /// List products that are running out of stock
    LowStock,
}

#[derive(Debug, Subcommand)]
enum CartCommands {
    /// Show cart contents
    Show {
        /// Quote tax and shipping for this country code (e.g., US)
        #[arg(long)]
        country: Option<String>,
    },
    /// Add a product to the cart
    Add {
        product_id: Uuid,
        /// Size: a standard suffix (e.g., 8x10) or the full label
        #[arg(long)]
        size: Option<String>,
        #[arg(long, default_value = "1")]
        quantity: u32,
    },
    /// Remove a line from the cart
    Remove {
        product_id: Uuid,
        /// Size: a standard suffix (e.g., 8x10) or the full label
        #[arg(long)]
        size: Option<String>,
    },
    /// Set the quantity of a line; zero or less removes it
    Set {
        product_id: Uuid,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
        /// Size: a standard suffix (e.g., 8x10) or the full label
        #[arg(long)]
        size: Option<String>,
    },
    /// Empty the cart
    Clear,
}

#[derive(Debug, Subcommand)]
enum FavoritesCommands {
    /// List favorited product ids
    Show,
    /// Add or remove a product from favorites
    Toggle { product_id: Uuid },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("lustre-cli: no command given; run with --help for usage");
        return Ok(());
    };

    let config = lustre_core::load_app_config()?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let store = lustre_core::LocalStore::new(config.local_state_dir.clone());

    match command {
        Commands::Db { command } => match command {
            DbCommands::Ping => db::run_db_ping(&config).await?,
            DbCommands::Migrate => db::run_db_migrate(&config).await?,
            DbCommands::Seed => db::run_db_seed(&config).await?,
        },
        Commands::Import { file, dry_run } => {
            import::run_import(&config, &file, dry_run).await?;
        }
        Commands::Products { command } => {
            let pool = db::connect(&config).await?;
            match command {
                ProductsCommands::List { category } => {
                    products::run_products_list(&pool, category.as_deref()).await?;
                }
                ProductsCommands::LowStock => products::run_products_low_stock(&pool).await?,
            }
        }
        Commands::Cart { command } => match command {
            CartCommands::Show { country: None } => local::print_cart(&local::load_cart(&store)),
            CartCommands::Show {
                country: Some(country),
            } => {
                let pool = db::connect(&config).await?;
                local::run_cart_quote(&pool, &store, &country).await?;
            }
            CartCommands::Add {
                product_id,
                size,
                quantity,
            } => {
                let pool = db::connect(&config).await?;
                local::run_cart_add(&pool, &store, product_id, size.as_deref(), quantity).await?;
            }
            CartCommands::Remove { product_id, size } => {
                local::cart_remove(&store, product_id, size.as_deref())?;
            }
            CartCommands::Set {
                product_id,
                quantity,
                size,
            } => local::cart_set(&store, product_id, size.as_deref(), quantity)?,
            CartCommands::Clear => local::cart_clear(&store)?,
        },
        Commands::Favorites { command } => match command {
            FavoritesCommands::Show => local::print_favorites(&local::load_favorites(&store)),
            FavoritesCommands::Toggle { product_id } => {
                local::favorites_toggle(&store, product_id)?;
            }
        },
    }

    Ok(())
}
