use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "trackmap", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project root that relative data paths are resolved against
    /// (default: TRACKMAP_ROOT, the config file, or the current directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Export the trained model as static data for the web client
    ///
    /// Reads the track vectors, the track metadata table and the artist
    /// metadata table, then writes into the output directory:
    ///
    /// - tracks.json: one record per exported track
    /// - embeddings.bin: raw little-endian f32 vectors, one row per track
    /// - embeddings_meta.json: row count and dimensionality of the blob
    /// - tsne_coords.json: a 3D point per track, each axis in [-1, 1]
    /// - search_index.json: token → track positions
    /// - genres.json: the most common artist genres
    ///
    /// Every file is indexed by the same track position. Playlist counts are
    /// taken from the Million Playlist Dataset slices when the playlist
    /// directory exists, and are 0 otherwise.
    ///
    /// Nothing is written unless every stage succeeds.
    Export,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, clap::Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Show the config file path
    Path,
    /// Print an example config file
    Example,
    /// Create the config file with commented defaults
    Init,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Export => {
            let config = commands::load_config(cli.root)?;
            commands::run_export(&config)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let config = commands::load_config(cli.root)?;
                commands::config::show_config(&config);
            }
            ConfigAction::Path => commands::config::show_path(),
            ConfigAction::Example => commands::config::show_example(),
            ConfigAction::Init => commands::config::init_config()?,
        },
    }

    Ok(())
}
