use anyhow::Result;
use trackmap_etl::{config, Config};

/// Show the current effective configuration.
pub fn show_config(config: &Config) {
    println!("Current Configuration");
    println!("=====================\n");

    let config_path = config::config_file_path();
    println!("Config file: {}", config_path.display());

    let exists = config_path.exists();
    println!("File exists: {}\n", if exists { "yes" } else { "no (using defaults)" });

    let sources = config.source_paths();
    println!("Settings:");
    println!("  root: {}", config.root.display());
    println!("  vocabulary_path: {}", sources.vocabulary.display());
    println!("  track_metadata_path: {}", sources.track_metadata.display());
    println!("  artist_info_path: {}", sources.artist_info.display());
    println!("  playlist_dir: {}", config.playlist_dir().display());
    println!("  output_dir: {}", config.output_dir().display());
    println!("  top_genres: {}", config.top_genres);
    println!("  max_track_genres: {}", config.max_track_genres);
    println!("  projection_iterations: {}", config.projection_iterations);

    println!("\nPriority: CLI args > ENV vars (TRACKMAP_*) > Config file > Defaults");
}

/// Show the config file path.
pub fn show_path() {
    println!("{}", config::config_file_path().display());
}

/// Show example configuration.
pub fn show_example() {
    print!("{}", config::example_config());
}

/// Initialize config file with defaults.
pub fn init_config() -> Result<()> {
    let created = config::ensure_config_file()?;
    let config_path = config::config_file_path();

    if created {
        println!("✓ Created config file: {}", config_path.display());
        println!("\nEdit this file to configure trackmap.");
    } else {
        println!("Config file already exists: {}", config_path.display());
    }

    Ok(())
}
