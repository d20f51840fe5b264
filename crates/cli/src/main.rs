//! rowfs: filesystem operations over a SQLite-backed file store.

mod config;
mod op;
mod ops;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::op::{Op, OpContext};

#[derive(Parser, Debug)]
#[command(
    name = "rowfs",
    version,
    about = "Filesystem operations over files stored as rows in SQLite"
)]
struct Cli {
    /// SQLite database file (defaults to the user data directory)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Bucket to operate on
    #[arg(long, global = true)]
    bucket: Option<String>,

    /// Cache directory for the local read cache
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a local file (or stdin) into the store
    Put(ops::put::Put),
    /// Print a stored file
    Cat(ops::cat::Cat),
    /// List a directory
    Ls(ops::ls::Ls),
    /// Remove a file
    Rm(ops::rm::Rm),
    /// Remove a directory and everything under it
    Rmdir(ops::rmdir::Rmdir),
    /// Create an empty directory
    Mkdir(ops::mkdir::Mkdir),
    /// Move a file
    Mv(ops::mv::Mv),
    /// Copy a file
    Cp(ops::cp::Cp),
    /// Show a file's metadata
    Stat(ops::stat::Stat),
    /// Show or change a file's visibility
    Visibility(ops::visibility::Visibility),
    /// Remove every record in the bucket
    Clear(ops::clear::Clear),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let store = config::open_store(config::Overrides {
        database: cli.database.clone(),
        bucket: cli.bucket.clone(),
        cache_dir: cli.cache_dir.clone(),
    })
    .await?;
    let ctx = OpContext { store };

    match cli.command {
        Command::Put(op) => run(op, &ctx).await,
        Command::Cat(op) => run(op, &ctx).await,
        Command::Ls(op) => run(op, &ctx).await,
        Command::Rm(op) => run(op, &ctx).await,
        Command::Rmdir(op) => run(op, &ctx).await,
        Command::Mkdir(op) => run(op, &ctx).await,
        Command::Mv(op) => run(op, &ctx).await,
        Command::Cp(op) => run(op, &ctx).await,
        Command::Stat(op) => run(op, &ctx).await,
        Command::Visibility(op) => run(op, &ctx).await,
        Command::Clear(op) => run(op, &ctx).await,
    }
}

async fn run<O: Op>(op: O, ctx: &OpContext) -> anyhow::Result<()> {
    let output = op.execute(ctx).await.map_err(anyhow::Error::new)?;
    println!("{output}");
    Ok(())
}
