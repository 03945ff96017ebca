use anyhow::{Context, Result};
use confyg::{env, Confygery};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use trackmap_core::model::MAX_TRACK_GENRES;

use crate::genres::DEFAULT_TOP_GENRES;
use crate::source::SourcePaths;

/// Configuration for trackmap.
///
/// Configuration is loaded from multiple sources with the following priority:
/// 1. CLI arguments (highest priority)
/// 2. Environment variables (TRACKMAP_* prefix)
/// 3. Config file (~/.config/trackmap/config.toml)
/// 4. Built-in defaults (lowest priority)
///
/// Relative paths are resolved against `root`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Project root that relative paths are resolved against.
    ///
    /// Can be set via:
    /// - CLI: --root /path/to/project
    /// - ENV: TRACKMAP_ROOT
    /// - Config: root = "/path/to/project"
    pub root: PathBuf,

    /// Trained track vectors in word2vec text format (optionally `.gz`).
    pub vocabulary_path: PathBuf,

    /// Track metadata, JSON Lines.
    pub track_metadata_path: PathBuf,

    /// Artist metadata, JSON Lines.
    pub artist_info_path: PathBuf,

    /// Directory of `mpd.slice.*.json` playlist files. Optional: when it
    /// does not exist every playlist count is 0.
    pub playlist_dir: PathBuf,

    /// Where the web client's data files are written.
    pub output_dir: PathBuf,

    /// Number of genres kept in `genres.json`.
    pub top_genres: usize,

    /// Genres kept per track in `tracks.json`.
    pub max_track_genres: usize,

    /// Power-iteration rounds per principal component.
    pub projection_iterations: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            vocabulary_path: PathBuf::from("models/track2vec.txt"),
            track_metadata_path: PathBuf::from("models/track_metadata.jsonl"),
            artist_info_path: PathBuf::from("data/processed/artist_info.jsonl"),
            playlist_dir: default_playlist_dir(),
            output_dir: PathBuf::from("web/public/data"),
            top_genres: DEFAULT_TOP_GENRES,
            max_track_genres: MAX_TRACK_GENRES,
            projection_iterations: 100,
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Searches for config file at: ~/.config/trackmap/config.toml
    /// Reads environment variables with TRACKMAP_ prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        let config_path = config_file_path();

        let mut builder = Confygery::new().context("Failed to create config builder")?;

        if config_path.exists() {
            let path_str = config_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Config path contains invalid UTF-8"))?;
            builder
                .add_file(path_str)
                .context("Failed to load config file")?;
        }

        let env_opts = env::Options::with_top_level("trackmap");
        builder
            .add_env(env_opts)
            .context("Failed to load environment variables")?;

        let config: Self = builder
            .build()
            .context("Failed to build configuration")?;

        Ok(config)
    }

    /// Load configuration with a custom project root.
    ///
    /// This is used when the --root CLI flag is provided.
    pub fn load_with_root(root: PathBuf) -> Result<Self> {
        let mut config = Self::load()?;
        config.root = root;
        Ok(config)
    }

    /// Resolve `path` against the project root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    pub fn source_paths(&self) -> SourcePaths {
        SourcePaths {
            vocabulary: self.resolve(&self.vocabulary_path),
            track_metadata: self.resolve(&self.track_metadata_path),
            artist_info: self.resolve(&self.artist_info_path),
        }
    }

    pub fn playlist_dir(&self) -> PathBuf {
        self.resolve(&self.playlist_dir)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.resolve(&self.output_dir)
    }
}

/// Where the Million Playlist Dataset lands when fetched with kagglehub.
fn default_playlist_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".cache/kagglehub/datasets/himanshuwagh/spotify-million/versions/1/data")
}

/// Get the config file path.
///
/// Returns:
/// - Linux: ~/.config/trackmap/config.toml
/// - macOS: ~/Library/Application Support/trackmap/config.toml
/// - Windows: %APPDATA%\trackmap\config.toml
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("trackmap")
        .join("config.toml")
}

/// Get the example config file content.
pub fn example_config() -> &'static str {
    r#"# Trackmap Configuration File
#
# Configuration is loaded from multiple sources with the following priority:
# 1. CLI arguments (highest priority)
# 2. Environment variables (TRACKMAP_* prefix)
# 3. This config file
# 4. Built-in defaults (lowest priority)
#
# Relative paths are resolved against `root`.

# Project root
#
# Can also be set via:
# - CLI: trackmap --root /path/to/project export
# - Environment: TRACKMAP_ROOT=/path/to/project
#root = "."

# Trained track vectors, word2vec text format (a .gz suffix is decompressed)
#vocabulary_path = "models/track2vec.txt"

# Track metadata, one JSON object per line with track_uri, artist_uri,
# track_name, artist_name and optionally album_name
#track_metadata_path = "models/track_metadata.jsonl"

# Artist metadata, one JSON object per line with artist_id, genres,
# artist_popularity and artist_followers
#artist_info_path = "data/processed/artist_info.jsonl"

# Million Playlist Dataset slices (mpd.slice.*.json). If the directory is
# missing, playlist counts are exported as 0.
#playlist_dir = "/home/me/.cache/kagglehub/datasets/himanshuwagh/spotify-million/versions/1/data"

# Output directory for the web client's data files
#output_dir = "web/public/data"

# Genres kept in genres.json
#top_genres = 50

# Genres kept per track in tracks.json
#max_track_genres = 5

# Power-iteration rounds per principal component for the 3D projection
#projection_iterations = 100
"#
}

/// Create default config file if it doesn't exist.
///
/// Returns true if a new file was created, false if it already existed.
pub fn ensure_config_file() -> Result<bool> {
    let config_path = config_file_path();

    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    std::fs::write(&config_path, example_config()).context("Failed to write config file")?;

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.top_genres, 50);
        assert_eq!(config.max_track_genres, 5);
        assert!(config.playlist_dir.ends_with("data"));
    }

    #[test]
    fn test_resolve_relative_and_absolute() {
        let config = Config {
            root: PathBuf::from("/srv/project"),
            ..Config::default()
        };
        assert_eq!(
            config.output_dir(),
            PathBuf::from("/srv/project/web/public/data")
        );
        assert_eq!(
            config.source_paths().artist_info,
            PathBuf::from("/srv/project/data/processed/artist_info.jsonl")
        );
        assert_eq!(
            config.resolve(Path::new("/abs/vectors.txt")),
            PathBuf::from("/abs/vectors.txt")
        );
    }

    #[test]
    fn test_config_load() {
        // Should not fail even if config file doesn't exist
        let result = Config::load();
        assert!(result.is_ok());
    }

    #[test]
    fn test_config_with_custom_root() {
        let root = PathBuf::from("/tmp/project");
        let config = Config::load_with_root(root.clone()).unwrap();
        assert_eq!(config.root, root);
    }

    #[test]
    fn test_example_config_is_fully_commented() {
        // The example documents defaults without overriding any of them.
        assert!(example_config()
            .lines()
            .filter(|l| !l.trim().is_empty())
            .all(|l| l.trim_start().starts_with('#')));
    }
}
