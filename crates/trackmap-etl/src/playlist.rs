//! Optional playlist-log source used to count track occurrences.
//!
//! When the raw playlist dump is not available every count is zero; the
//! rest of the pipeline never checks for the data itself.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use walkdir::WalkDir;

use crate::error::{PipelineError, PipelineResult};

/// Occurrence counts keyed by raw track URI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaylistCounts {
    counts: HashMap<String, u64>,
}

impl PlaylistCounts {
    pub fn record(&mut self, track_uri: &str) {
        *self.counts.entry(track_uri.to_string()).or_insert(0) += 1;
    }

    /// Count for a track, zero when it never appeared.
    pub fn get(&self, track_uri: &str) -> u64 {
        self.counts.get(track_uri).copied().unwrap_or(0)
    }

    /// Number of distinct tracks seen.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, u64)> for PlaylistCounts {
    fn from_iter<I: IntoIterator<Item = (S, u64)>>(iter: I) -> Self {
        Self {
            counts: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// A source of playlist occurrence counts.
pub trait PlaylistSource: std::fmt::Debug {
    fn name(&self) -> &str;

    fn counts(&self) -> PipelineResult<PlaylistCounts>;
}

/// Used when no playlist data is available: every count is zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPlaylists;

impl PlaylistSource for NoPlaylists {
    fn name(&self) -> &str {
        "none"
    }

    fn counts(&self) -> PipelineResult<PlaylistCounts> {
        Ok(PlaylistCounts::default())
    }
}

/// A directory of Million Playlist Dataset slices (`mpd.slice.*.json`).
#[derive(Debug, Clone)]
pub struct SliceDirectory {
    dir: PathBuf,
}

#[derive(Debug, Deserialize)]
struct Slice {
    #[serde(default)]
    playlists: Vec<Playlist>,
}

#[derive(Debug, Deserialize)]
struct Playlist {
    #[serde(default)]
    tracks: Vec<PlaylistTrack>,
}

#[derive(Debug, Deserialize)]
struct PlaylistTrack {
    track_uri: String,
}

impl SliceDirectory {
    #[must_use]
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Matches `mpd.slice.*.json`.
    fn is_slice(path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_prefix("mpd.slice."))
            .is_some_and(|rest| rest.ends_with(".json"))
    }

    /// Slice files in file-name order.
    ///
    /// Only directories are skipped; anything else matching the name is
    /// returned so that opening it reports why it cannot be read.
    fn slice_files(&self) -> PipelineResult<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(self.dir.as_path()).to_path_buf();
                let message = e.to_string();
                PipelineError::Read {
                    path,
                    error: e
                        .into_io_error()
                        .unwrap_or_else(|| std::io::Error::other(message)),
                }
            })?;
            if entry.file_type().is_dir() || !Self::is_slice(entry.path()) {
                continue;
            }
            files.push(entry.into_path());
        }
        Ok(files)
    }
}

impl PlaylistSource for SliceDirectory {
    fn name(&self) -> &str {
        "mpd slices"
    }

    fn counts(&self) -> PipelineResult<PlaylistCounts> {
        let mut counts = PlaylistCounts::default();
        let files = self.slice_files()?;

        for path in &files {
            log::debug!("Counting playlist slice {}", path.display());
            let file = File::open(path).map_err(|error| PipelineError::Read {
                path: path.clone(),
                error,
            })?;
            let slice: Slice =
                serde_json::from_reader(BufReader::new(file)).map_err(|e| PipelineError::Parse {
                    path: path.clone(),
                    line: e.line(),
                    message: e.to_string(),
                })?;

            for playlist in &slice.playlists {
                for track in &playlist.tracks {
                    counts.record(&track.track_uri);
                }
            }
        }

        log::info!(
            "Counted {} distinct tracks across {} playlist slices",
            counts.len(),
            files.len()
        );
        Ok(counts)
    }
}

/// Pick the playlist source for `dir`: slices if the directory exists,
/// otherwise the no-op source.
pub fn probe(dir: &Path) -> Box<dyn PlaylistSource> {
    if dir.is_dir() {
        log::info!("Loading playlist counts from {}", dir.display());
        Box::new(SliceDirectory::new(dir.to_path_buf()))
    } else {
        log::warn!(
            "Raw playlist data not found at {}, using 0 for playlist counts",
            dir.display()
        );
        Box::new(NoPlaylists)
    }
}
