use serde::{Deserialize, Serialize};

/// Popularity assumed for artists missing from the artist table (midpoint
/// of the 0..=100 scale).
pub const DEFAULT_POPULARITY: i64 = 50;

/// Artist attributes merged into each track by canonical artist id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistAttributes {
    pub popularity: i64,
    pub followers: u64,
    pub genres: Vec<String>,
}

impl Default for ArtistAttributes {
    fn default() -> Self {
        Self {
            popularity: DEFAULT_POPULARITY,
            followers: 0,
            genres: Vec::new(),
        }
    }
}

impl ArtistAttributes {
    #[must_use]
    pub fn with_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genres = genres.into_iter().map(Into::into).collect();
        self
    }
}
