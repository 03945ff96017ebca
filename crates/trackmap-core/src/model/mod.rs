pub mod artist;
pub mod genre;
pub mod ids;
pub mod track;
pub mod vocabulary;

pub use artist::ArtistAttributes;
pub use genre::GenreCount;
pub use ids::{canonical_id, ArtistId};
pub use track::{ConsolidatedTrack, Track, MAX_TRACK_GENRES};
pub use vocabulary::Vocabulary;
