//! Consolidate stage: join, normalize, filter and deduplicate track rows.
//!
//! The result is a [`TrackUniverse`]: the single ordered set of tracks that
//! every positional artifact (track list, embedding matrix, projection,
//! search postings) is derived from. Its order is the source order after
//! filtering and deduplication and cannot be changed once built.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use trackmap_core::model::artist::DEFAULT_POPULARITY;
use trackmap_core::model::{ArtistAttributes, ArtistId, ConsolidatedTrack, Vocabulary};

use crate::playlist::PlaylistCounts;
use crate::source::{ArtistRow, TrackRow};

/// The frozen, ordered set of consolidated tracks.
///
/// Every track's URI is a vocabulary key and no URI appears twice.
#[derive(Debug, Clone, Default)]
pub struct TrackUniverse {
    tracks: Vec<ConsolidatedTrack>,
}

impl TrackUniverse {
    pub(crate) fn from_tracks(tracks: Vec<ConsolidatedTrack>) -> Self {
        Self { tracks }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&ConsolidatedTrack> {
        self.tracks.get(position)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ConsolidatedTrack> {
        self.tracks.iter()
    }
}

impl<'a> IntoIterator for &'a TrackUniverse {
    type Item = &'a ConsolidatedTrack;
    type IntoIter = std::slice::Iter<'a, ConsolidatedTrack>;

    fn into_iter(self) -> Self::IntoIter {
        self.tracks.iter()
    }
}

/// What happened to the source rows during consolidation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsolidationStats {
    pub rows_read: usize,
    pub out_of_vocabulary: usize,
    pub duplicates: usize,
    /// Kept tracks whose artist has no row in the artist table.
    pub artist_misses: usize,
    pub kept: usize,
}

/// Output of the consolidate stage.
#[derive(Debug, Clone)]
pub struct Consolidation {
    pub universe: TrackUniverse,
    pub stats: ConsolidationStats,
}

/// Artist attributes indexed by canonical artist id. The first row for an
/// id wins.
#[derive(Debug, Clone, Default)]
pub struct ArtistTable {
    by_id: HashMap<ArtistId, ArtistAttributes>,
}

impl ArtistTable {
    pub fn from_rows(rows: &[ArtistRow]) -> Self {
        let mut by_id = HashMap::with_capacity(rows.len());
        for row in rows {
            by_id
                .entry(ArtistId::from_uri(&row.artist_id))
                .or_insert_with(|| ArtistAttributes {
                    popularity: coerce_popularity(row.artist_popularity),
                    followers: coerce_followers(row.artist_followers),
                    genres: normalize_genres(row.genres.as_ref()),
                });
        }
        Self { by_id }
    }

    pub fn get(&self, id: &ArtistId) -> Option<&ArtistAttributes> {
        self.by_id.get(id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Normalize a raw genre field.
///
/// - absent or `null` → empty
/// - array → its string elements, in order (other elements are skipped)
/// - anything else → empty
pub fn normalize_genres(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(String::from))
            .collect(),
        Some(_) | None => Vec::new(),
    }
}

/// Artist popularity as an integer, [`DEFAULT_POPULARITY`] when absent.
#[allow(clippy::cast_possible_truncation)]
pub fn coerce_popularity(value: Option<f64>) -> i64 {
    match value {
        Some(v) if v.is_finite() => v as i64,
        _ => DEFAULT_POPULARITY,
    }
}

/// Follower count as a non-negative integer, 0 when absent.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn coerce_followers(value: Option<f64>) -> u64 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => v as u64,
        _ => 0,
    }
}

/// Build the track universe.
///
/// Rows are left-joined to `artists` on canonical artist id, kept only when
/// their raw track URI is in `vocabulary`, and deduplicated on that URI
/// keeping the first occurrence. A join miss keeps default artist
/// attributes. Playlist counts are attached by raw track URI.
pub fn consolidate(
    tracks: &[TrackRow],
    artists: &[ArtistRow],
    vocabulary: &Vocabulary,
    playlists: &PlaylistCounts,
) -> Consolidation {
    let artist_table = ArtistTable::from_rows(artists);
    let mut stats = ConsolidationStats {
        rows_read: tracks.len(),
        ..ConsolidationStats::default()
    };

    let mut seen: HashSet<&str> = HashSet::with_capacity(tracks.len());
    let mut kept = Vec::new();

    for row in tracks {
        if !vocabulary.contains(&row.track_uri) {
            stats.out_of_vocabulary += 1;
            continue;
        }
        if !seen.insert(row.track_uri.as_str()) {
            stats.duplicates += 1;
            continue;
        }

        let mut track = ConsolidatedTrack::new(
            row.track_uri.as_str(),
            row.artist_uri.as_str(),
            row.track_name.as_str(),
            row.artist_name.as_str(),
        )
        .with_album(row.album_name.as_str())
        .with_playlist_count(playlists.get(&row.track_uri));

        match artist_table.get(&track.artist_id) {
            Some(attributes) => track.artist_attributes = attributes.clone(),
            None => {
                log::debug!(
                    "No artist info for {} ({}), using defaults",
                    track.artist_id,
                    track.track_uri
                );
                stats.artist_misses += 1;
            }
        }

        kept.push(track);
    }

    stats.kept = kept.len();
    Consolidation {
        universe: TrackUniverse::from_tracks(kept),
        stats,
    }
}
