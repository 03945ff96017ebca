use serde::{Deserialize, Serialize};

use crate::model::artist::ArtistAttributes;
use crate::model::ids::ArtistId;

/// Genres kept on a public track record.
pub const MAX_TRACK_GENRES: usize = 5;

/// A track as published to the web client in `tracks.json`.
///
/// The embedding is not part of the record; it is written to the embedding
/// matrix at the same position as the record in the track list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// Vocabulary key of the track.
    pub id: String,
    pub name: String,
    pub artist: String,
    pub album: String,
    pub genres: Vec<String>,
    pub popularity: i64,
    pub playlist_count: u64,
}

/// A track row after joining, normalization, vocabulary filtering and
/// deduplication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsolidatedTrack {
    /// Raw source URI; this is the vocabulary key.
    pub track_uri: String,
    pub artist_uri: String,
    pub artist_id: ArtistId,
    pub name: String,
    pub artist: String,
    pub album: String,
    pub artist_attributes: ArtistAttributes,
    pub playlist_count: u64,
}

impl ConsolidatedTrack {
    #[must_use]
    pub fn new(
        track_uri: impl Into<String>,
        artist_uri: impl Into<String>,
        name: impl Into<String>,
        artist: impl Into<String>,
    ) -> Self {
        let track_uri = track_uri.into();
        let artist_uri = artist_uri.into();
        Self {
            artist_id: ArtistId::from_uri(&artist_uri),
            track_uri,
            artist_uri,
            name: name.into(),
            artist: artist.into(),
            album: String::new(),
            artist_attributes: ArtistAttributes::default(),
            playlist_count: 0,
        }
    }

    #[must_use]
    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = album.into();
        self
    }

    #[must_use]
    pub fn with_artist_attributes(mut self, attributes: ArtistAttributes) -> Self {
        self.artist_attributes = attributes;
        self
    }

    #[must_use]
    pub fn with_playlist_count(mut self, count: u64) -> Self {
        self.playlist_count = count;
        self
    }

    /// All genres of the track's artist, untruncated.
    pub fn genres(&self) -> &[String] {
        &self.artist_attributes.genres
    }

    /// Project onto the public record, keeping at most `max_genres` genres.
    #[must_use]
    pub fn to_track(&self, max_genres: usize) -> Track {
        Track {
            id: self.track_uri.clone(),
            name: self.name.clone(),
            artist: self.artist.clone(),
            album: self.album.clone(),
            genres: self.genres().iter().take(max_genres).cloned().collect(),
            popularity: self.artist_attributes.popularity,
            playlist_count: self.playlist_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ConsolidatedTrack {
        ConsolidatedTrack::new("spotify:track:t1", "spotify:artist:a1", "Song A", "Art X")
            .with_album("Album")
            .with_artist_attributes(ArtistAttributes {
                popularity: 73,
                followers: 1200,
                genres: ["a", "b", "c", "d", "e", "f", "g"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            })
            .with_playlist_count(4)
    }

    #[test]
    fn test_new_derives_canonical_artist_id() {
        let track = sample();
        assert_eq!(track.track_uri, "spotify:track:t1");
        assert_eq!(track.artist_id.as_str(), "a1");
    }

    #[test]
    fn test_to_track_truncates_genres() {
        let track = sample().to_track(MAX_TRACK_GENRES);
        assert_eq!(track.genres, vec!["a", "b", "c", "d", "e"]);
        assert_eq!(sample().genres().len(), 7);
    }

    #[test]
    fn test_to_track_copies_fields() {
        let track = sample().to_track(MAX_TRACK_GENRES);
        assert_eq!(track.id, "spotify:track:t1");
        assert_eq!(track.name, "Song A");
        assert_eq!(track.artist, "Art X");
        assert_eq!(track.album, "Album");
        assert_eq!(track.popularity, 73);
        assert_eq!(track.playlist_count, 4);
    }

    #[test]
    fn test_track_serializes_camel_case() {
        let json = serde_json::to_value(sample().to_track(2)).unwrap();
        assert_eq!(json["playlistCount"], 4);
        assert_eq!(json["genres"], serde_json::json!(["a", "b"]));
        assert!(json.get("playlist_count").is_none());
        assert!(json.get("embedding").is_none());
    }
}
