//! Track records and the embedding matrix, built together.
//!
//! Record `i` of the track list and row `i` of the matrix come from the same
//! iteration over the [`TrackUniverse`], so they cannot drift apart.

use std::io::Write;

use serde::{Deserialize, Serialize};

use trackmap_core::model::{Track, Vocabulary};

use crate::consolidate::TrackUniverse;
use crate::error::{PipelineError, PipelineResult};

/// Dense row-major `f32` matrix, one row per exported track.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbeddingMatrix {
    rows: usize,
    dimensions: usize,
    data: Vec<f32>,
}

/// Sidecar describing `embeddings.bin`, which has no header of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingMeta {
    pub num_tracks: usize,
    pub dimensions: usize,
}

impl EmbeddingMatrix {
    #[must_use]
    pub fn with_capacity(rows: usize, dimensions: usize) -> Self {
        Self {
            rows: 0,
            dimensions,
            data: Vec::with_capacity(rows * dimensions),
        }
    }

    /// Build a matrix from explicit rows, mainly for projector tests.
    ///
    /// # Errors
    /// Returns an error if the rows have different lengths.
    pub fn from_rows(dimensions: usize, rows: &[Vec<f32>]) -> PipelineResult<Self> {
        let mut matrix = Self::with_capacity(rows.len(), dimensions);
        for row in rows {
            matrix.push_row(row)?;
        }
        Ok(matrix)
    }

    fn push_row(&mut self, row: &[f32]) -> PipelineResult<()> {
        if row.len() != self.dimensions {
            return Err(trackmap_core::Error::InvalidData(format!(
                "row has {} values, matrix has {} dimensions",
                row.len(),
                self.dimensions
            ))
            .into());
        }
        self.data.extend_from_slice(row);
        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn row(&self, index: usize) -> Option<&[f32]> {
        if index >= self.rows {
            return None;
        }
        let start = index * self.dimensions;
        self.data.get(start..start + self.dimensions)
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f32]> {
        // chunks_exact panics on a zero chunk size
        self.data.chunks_exact(self.dimensions.max(1)).take(self.rows)
    }

    pub fn meta(&self) -> EmbeddingMeta {
        EmbeddingMeta {
            num_tracks: self.rows,
            dimensions: self.dimensions,
        }
    }

    /// Write the matrix as raw little-endian `f32` values, row-major.
    pub fn write_le<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for value in &self.data {
            writer.write_all(&value.to_le_bytes())?;
        }
        Ok(())
    }

    /// The raw little-endian bytes of the matrix.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.data.iter().flat_map(|v| v.to_le_bytes()).collect()
    }
}

/// Positionally aligned track list and embedding matrix.
#[derive(Debug, Clone)]
pub struct AlignedExport {
    pub tracks: Vec<Track>,
    pub embeddings: EmbeddingMatrix,
}

impl AlignedExport {
    /// Project every track of `universe` and copy its vector, in one pass.
    ///
    /// # Errors
    /// Returns `PipelineError::MissingEmbedding` if a track has no vector,
    /// which means the universe was not built against `vocabulary`.
    pub fn build(
        universe: &TrackUniverse,
        vocabulary: &Vocabulary,
        max_genres: usize,
    ) -> PipelineResult<Self> {
        let mut tracks = Vec::with_capacity(universe.len());
        let mut embeddings = EmbeddingMatrix::with_capacity(universe.len(), vocabulary.dimensions());

        for consolidated in universe {
            let vector = vocabulary.get(&consolidated.track_uri).ok_or_else(|| {
                PipelineError::MissingEmbedding {
                    id: consolidated.track_uri.clone(),
                }
            })?;
            embeddings.push_row(vector)?;
            tracks.push(consolidated.to_track(max_genres));
        }

        Ok(Self { tracks, embeddings })
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trackmap_core::model::{ArtistAttributes, ConsolidatedTrack, MAX_TRACK_GENRES};

    fn vocab() -> Vocabulary {
        Vocabulary::from_pairs(
            2,
            [
                ("t1", vec![1.0, 0.0]),
                ("t2", vec![0.0, 1.0]),
                ("t3", vec![0.5, -0.5]),
            ],
        )
        .unwrap()
    }

    fn universe(uris: &[&str]) -> TrackUniverse {
        TrackUniverse::from_tracks(
            uris.iter()
                .map(|u| ConsolidatedTrack::new(*u, "a1", format!("Song {u}"), "Artist"))
                .collect(),
        )
    }

    #[test]
    fn test_rows_align_with_tracks() {
        let vocab = vocab();
        let export = AlignedExport::build(&universe(&["t3", "t1", "t2"]), &vocab, MAX_TRACK_GENRES)
            .unwrap();

        assert_eq!(export.len(), 3);
        assert_eq!(export.embeddings.rows(), 3);
        for (i, track) in export.tracks.iter().enumerate() {
            assert_eq!(export.embeddings.row(i), vocab.get(&track.id));
        }
        assert_eq!(export.embeddings.row(3), None);
    }

    #[test]
    fn test_missing_embedding_is_an_error() {
        let err = AlignedExport::build(&universe(&["t1", "t9"]), &vocab(), MAX_TRACK_GENRES)
            .unwrap_err();
        assert!(matches!(err, PipelineError::MissingEmbedding { ref id } if id == "t9"));
    }

    #[test]
    fn test_genres_truncated_in_records() {
        let track = ConsolidatedTrack::new("t1", "a1", "Song", "Artist").with_artist_attributes(
            ArtistAttributes::default().with_genres(["a", "b", "c", "d", "e", "f"]),
        );
        let export =
            AlignedExport::build(&TrackUniverse::from_tracks(vec![track]), &vocab(), MAX_TRACK_GENRES)
                .unwrap();
        assert_eq!(export.tracks[0].genres.len(), 5);
    }

    #[test]
    fn test_little_endian_blob() {
        let vocab = vocab();
        let export = AlignedExport::build(&universe(&["t1"]), &vocab, MAX_TRACK_GENRES).unwrap();

        let bytes = export.embeddings.to_le_bytes();
        assert_eq!(bytes.len(), 8);
        assert_eq!(&bytes[0..4], &1.0_f32.to_le_bytes());
        assert_eq!(&bytes[4..8], &0.0_f32.to_le_bytes());

        let mut written = Vec::new();
        export.embeddings.write_le(&mut written).unwrap();
        assert_eq!(written, bytes);
    }

    #[test]
    fn test_meta_sidecar() {
        let export = AlignedExport::build(&universe(&["t1", "t2"]), &vocab(), MAX_TRACK_GENRES)
            .unwrap();
        let json = serde_json::to_string(&export.embeddings.meta()).unwrap();
        assert_eq!(json, r#"{"numTracks":2,"dimensions":2}"#);
    }

    #[test]
    fn test_empty_universe() {
        let export = AlignedExport::build(&TrackUniverse::default(), &vocab(), MAX_TRACK_GENRES)
            .unwrap();
        assert!(export.is_empty());
        assert_eq!(export.embeddings.meta().num_tracks, 0);
        assert_eq!(export.embeddings.meta().dimensions, 2);
        assert!(export.embeddings.to_le_bytes().is_empty());
        assert_eq!(export.embeddings.iter_rows().count(), 0);
    }

    #[test]
    fn test_from_rows_rejects_ragged_input() {
        assert!(EmbeddingMatrix::from_rows(2, &[vec![1.0, 2.0], vec![3.0]]).is_err());
        let matrix = EmbeddingMatrix::from_rows(2, &[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        let rows: Vec<&[f32]> = matrix.iter_rows().collect();
        assert_eq!(rows, vec![&[1.0, 2.0][..], &[3.0, 4.0][..]]);
    }
}
