use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Read from a seed file instead of the hosted backend
    #[arg(long, env = "CATALOG_SEED")]
    seed: Option<PathBuf>,

    #[arg(long, env = "BACKEND_URL")]
    backend_url: Option<String>,

    #[arg(long, env = "BACKEND_KEY", hide_env_values = true)]
    backend_key: Option<String>,

    #[arg(long, env = "IMAGE_BUCKET", default_value = "menu-images")]
    bucket: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Items ranked by how many customers favourited them
    Favourites {
        #[arg(long)]
        json: bool,
    },
    /// Categories with their menu items
    Catalog {
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let source = report::source(args.seed, args.backend_url, args.backend_key, args.bucket)?;
    let repository = source.open()?;

    match args.command {
        Command::Favourites { json } => report::print_favourites(repository.as_ref(), json).await,
        Command::Catalog { json } => report::print_catalog(repository.as_ref(), json).await,
    }
}
