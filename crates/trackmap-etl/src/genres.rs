//! Genre summary: the most common artist genres across the universe.

use indexmap::IndexMap;

use trackmap_core::model::GenreCount;

use crate::consolidate::TrackUniverse;

/// Default number of genres kept in `genres.json`.
pub const DEFAULT_TOP_GENRES: usize = 50;

/// Count genre memberships and keep the `limit` most common.
///
/// Each occurrence of a genre in a track's (untruncated) genre list counts
/// once. The result is sorted by descending count; ties keep the order in
/// which the genres were first encountered.
pub fn top_genres(universe: &TrackUniverse, limit: usize) -> Vec<GenreCount> {
    let mut counts: IndexMap<&str, u64> = IndexMap::new();
    for track in universe {
        for genre in track.genres() {
            *counts.entry(genre.as_str()).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<(&str, u64)> = counts.into_iter().collect();
    // stable: equal counts stay in first-seen order
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(limit);

    ranked
        .into_iter()
        .map(|(name, count)| GenreCount::new(name, count))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use trackmap_core::model::{ArtistAttributes, ConsolidatedTrack};

    fn universe(genre_lists: &[&[&str]]) -> TrackUniverse {
        TrackUniverse::from_tracks(
            genre_lists
                .iter()
                .enumerate()
                .map(|(i, genres)| {
                    ConsolidatedTrack::new(format!("t{i}"), "a", "Song", "Artist")
                        .with_artist_attributes(
                            ArtistAttributes::default().with_genres(genres.iter().copied()),
                        )
                })
                .collect(),
        )
    }

    #[test]
    fn test_counts_descending() {
        let u = universe(&[&["pop", "rock"], &["rock"], &["jazz", "rock"], &["pop"]]);
        let top = top_genres(&u, DEFAULT_TOP_GENRES);
        assert_eq!(
            top,
            vec![
                GenreCount::new("rock", 3),
                GenreCount::new("pop", 2),
                GenreCount::new("jazz", 1),
            ]
        );
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let u = universe(&[&["b", "a"], &["c"], &["a", "b", "c"]]);
        let names: Vec<String> = top_genres(&u, 10).into_iter().map(|g| g.name).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_limit_applies() {
        let genres: Vec<String> = (0..60).map(|i| format!("genre {i}")).collect();
        let refs: Vec<&str> = genres.iter().map(String::as_str).collect();
        let u = universe(&[&refs]);

        let top = top_genres(&u, DEFAULT_TOP_GENRES);
        assert_eq!(top.len(), 50);
        assert_eq!(top[0].name, "genre 0");
    }

    #[test]
    fn test_counts_full_genre_lists() {
        // more than the five genres kept on public records
        let u = universe(&[&["a", "b", "c", "d", "e", "f"]]);
        let top = top_genres(&u, 10);
        assert!(top.iter().any(|g| g.name == "f"));
    }

    #[test]
    fn test_sum_bounded_by_memberships() {
        let u = universe(&[&["pop", "rock"], &[], &["pop"]]);
        let memberships: usize = u.iter().map(|t| t.genres().len()).sum();
        let top = top_genres(&u, 1);
        let total: u64 = top.iter().map(|g| g.count).sum();

        assert!(total <= memberships as u64);
        assert_eq!(top, vec![GenreCount::new("pop", 2)]);
    }

    #[test]
    fn test_empty_universe() {
        assert!(top_genres(&TrackUniverse::default(), 50).is_empty());
    }
}
