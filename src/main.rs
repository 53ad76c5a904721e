use std::fs;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use listing::config::{DEFAULT_FRONT_URL, DEFAULT_MAX_IMAGE_BYTES, ServerConfig};
use listing::images::ImageStore;
use listing::server::{AppState, create_router};
use listing::store::{SqliteStore, Store};

#[derive(Parser)]
#[command(name = "listing")]
#[command(about = "An item listing server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and image directory
    Init {
        /// Data directory for the database and images
        #[arg(long, default_value = "./data")]
        data_dir: String,
    },

    /// Start the server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(long, short, default_value = "9000")]
        port: u16,

        /// Data directory for the database and images
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Origin allowed to call the API from a browser
        #[arg(long, env = "FRONT_URL", default_value = DEFAULT_FRONT_URL)]
        front_url: String,

        /// Largest accepted image upload, in bytes
        #[arg(long, default_value_t = DEFAULT_MAX_IMAGE_BYTES)]
        max_image_bytes: usize,
    },
}

/// Opens the database and makes sure the schema and default image exist.
async fn bootstrap(config: &ServerConfig) -> anyhow::Result<SqliteStore> {
    fs::create_dir_all(&config.data_dir)?;

    let db_path = config.db_path();
    if !db_path.exists() {
        info!("Creating database at {}", db_path.display());
    }

    let store = SqliteStore::new(&db_path)?;
    store.initialize()?;

    ImageStore::new(&config.images_dir()).ensure_default().await?;

    Ok(store)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("listing=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { data_dir } => {
            let config = ServerConfig {
                data_dir: data_dir.into(),
                ..ServerConfig::default()
            };
            bootstrap(&config).await?;

            println!("Database: {}", config.db_path().display());
            println!("Images:   {}", config.images_dir().display());
        }
        Commands::Serve {
            host,
            port,
            data_dir,
            front_url,
            max_image_bytes,
        } => {
            let config = ServerConfig {
                host,
                port,
                data_dir: data_dir.into(),
                front_url,
                max_image_bytes,
            };

            let store = bootstrap(&config).await?;
            let state = Arc::new(AppState::new(Arc::new(store), &config)?);

            let app = create_router(state);
            let addr = config.socket_addr()?;

            info!("Allowing cross-origin requests from {}", config.front_url);
            info!("Starting server on {}", addr);

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
