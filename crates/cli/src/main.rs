//! Catalog CLI - browse and edit the product catalog from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # List products, sorted by stock count
//! catalog list --sort count
//!
//! # Show one product with its comments
//! catalog show 3f2b...
//!
//! # Create a product
//! catalog create --name Box --count 5 --image-url https://cdn.example.com/box.png \
//!     --weight 450g --width 30 --height 15
//!
//! # Change the stock count
//! catalog update 3f2b... --count 10
//!
//! # Comment on a product, then remove the comment
//! catalog comment add 3f2b... "Arrived dented"
//! catalog comment delete 3f2b... 9a1c...
//! ```
//!
//! # Environment Variables
//!
//! - `CATALOG_BASE_URL` - Backend root (default `http://localhost:3001`)
//! - `CATALOG_TIMEOUT_SECS` - Per-request timeout
//! - `CATALOG_CASCADE_COMMENTS` - Delete a product's comments along with it
//! - `CATALOG_LOG_JSON` - Emit logs as JSON
//! - `RUST_LOG` - Log filter

#![cfg_attr(not(test), forbid(unsafe_code))]

use catalog_client::{ClientConfig, parse_base_url};
use catalog_core::ProductSortKey;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

mod commands;
mod error;
mod render;

use commands::{CommentArgs, ProductArgs, ProductEdits};
use error::CliError;

#[derive(Parser)]
#[command(name = "catalog")]
#[command(author, version, about = "Product catalog client")]
struct Cli {
    /// Backend root, overriding `CATALOG_BASE_URL`
    #[arg(long, global = true, value_parser = parse_base_url)]
    base_url: Option<Url>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all products
    List {
        /// Sort order (`name` or `count`)
        #[arg(short, long, default_value_t = ProductSortKey::Name)]
        sort: ProductSortKey,
    },
    /// Show a product and its comments
    Show {
        /// Product id
        id: String,
    },
    /// Create a product
    Create(ProductArgs),
    /// Edit a product; omitted fields keep their current value
    Update {
        /// Product id
        id: String,

        #[command(flatten)]
        edits: ProductEdits,
    },
    /// Delete a product
    Delete {
        /// Product id
        id: String,
    },
    /// Manage product comments
    Comment {
        #[command(subcommand)]
        action: CommentAction,
    },
}

#[derive(Subcommand)]
enum CommentAction {
    /// Add a comment to a product
    Add(CommentArgs),
    /// Remove a comment from a product
    Delete {
        /// Product id
        product_id: String,
        /// Comment id
        comment_id: String,
    },
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

/// Text logs on stderr by default, JSON when `CATALOG_LOG_JSON` is set.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "catalog_client=info,catalog_cli=info".into());

    let json = std::env::var_os("CATALOG_LOG_JSON").is_some();
    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer = (!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }

    let store = commands::connect(&config)?;
    let mut out = std::io::stdout().lock();

    let result = match cli.command {
        Commands::List { sort } => commands::product::list(&store, sort, &mut out).await,
        Commands::Show { id } => commands::product::show(&store, id.into(), &mut out).await,
        Commands::Create(args) => commands::product::create(&store, args, &mut out).await,
        Commands::Update { id, edits } => {
            commands::product::update(&store, id.into(), edits, &mut out).await
        }
        Commands::Delete { id } => commands::product::delete(&store, id.into(), &mut out).await,
        Commands::Comment { action } => match action {
            CommentAction::Add(args) => commands::comment::add(&store, args, &mut out).await,
            CommentAction::Delete {
                product_id,
                comment_id,
            } => {
                commands::comment::delete(&store, product_id.into(), comment_id.into(), &mut out)
                    .await
            }
        },
    };

    store.shutdown().await;
    result
}
