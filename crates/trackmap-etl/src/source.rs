//! Source loader: embedding vocabulary, track table and artist table.
//!
//! The vocabulary is read from the word2vec text format; both metadata
//! tables are JSON Lines. Any file ending in `.gz` is decompressed on the
//! fly. Every failure here is fatal for the run.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

use trackmap_core::model::Vocabulary;

use crate::error::{PipelineError, PipelineResult};

/// One row of the track-metadata table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrackRow {
    pub track_uri: String,
    pub artist_uri: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub track_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub artist_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub album_name: String,
}

/// One row of the artist-metadata table.
///
/// `genres` is kept as raw JSON because source rows carry it as null, as a
/// list, or as something else entirely; the consolidator normalizes it.
/// Any `artist_name` column is ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ArtistRow {
    #[serde(alias = "artist_uri")]
    pub artist_id: String,
    #[serde(default)]
    pub genres: Option<serde_json::Value>,
    #[serde(default)]
    pub artist_popularity: Option<f64>,
    #[serde(default)]
    pub artist_followers: Option<f64>,
}

/// Locations of the three required sources.
#[derive(Debug, Clone)]
pub struct SourcePaths {
    pub vocabulary: PathBuf,
    pub track_metadata: PathBuf,
    pub artist_info: PathBuf,
}

/// Everything the consolidator needs, fully loaded.
#[derive(Debug)]
pub struct Sources {
    pub vocabulary: Vocabulary,
    pub tracks: Vec<TrackRow>,
    pub artists: Vec<ArtistRow>,
}

/// Load all required sources.
///
/// # Errors
/// Fails if any source is missing, unreadable or malformed, or if the
/// vocabulary is empty.
pub fn load_sources(paths: &SourcePaths) -> PipelineResult<Sources> {
    let vocabulary = load_vocabulary(&paths.vocabulary)?;
    log::info!(
        "Loaded {} track embeddings (dim={})",
        vocabulary.len(),
        vocabulary.dimensions()
    );

    let tracks: Vec<TrackRow> = load_json_lines(&paths.track_metadata, "track metadata")?;
    log::info!("Loaded {} track metadata rows", tracks.len());

    let artists: Vec<ArtistRow> = load_json_lines(&paths.artist_info, "artist info")?;
    log::info!("Loaded {} artist info rows", artists.len());

    Ok(Sources {
        vocabulary,
        tracks,
        artists,
    })
}

/// Load a vocabulary in word2vec text format.
///
/// An optional `<count> <dimensions>` header may open the file. Each other
/// non-blank line is a key followed by its vector components. The first
/// vector fixes the dimension unless the header already did.
///
/// A first line of two integers is ambiguous: it is also a one-dimensional
/// row with a numeric key. It is read as a header unless the next row has a
/// single component and the "header" declared more than one dimension.
pub fn load_vocabulary(path: &Path) -> PipelineResult<Vocabulary> {
    let reader = open_source(path, "embedding vocabulary")?;

    let mut expected: Option<usize> = None;
    let mut declared_count: Option<usize> = None;
    // key, component and line of a header line that may still be a row
    let mut header_row: Option<(String, String, usize)> = None;
    let mut vocab: Option<Vocabulary> = None;
    let mut duplicates = 0usize;

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.map_err(|error| PipelineError::Read {
            path: path.to_path_buf(),
            error,
        })?;
        let mut fields = line.split_whitespace();
        let Some(key) = fields.next() else {
            continue;
        };

        let rest: Vec<&str> = fields.collect();
        if vocab.is_none() && declared_count.is_none() {
            if let Some((count, dims)) = parse_header(key, &rest) {
                declared_count = Some(count);
                expected = Some(dims);
                header_row = Some((key.to_string(), rest[0].to_string(), line_no));
                continue;
            }
        }

        if rest.is_empty() {
            return Err(PipelineError::Parse {
                path: path.to_path_buf(),
                line: line_no,
                message: format!("no vector components for {key}"),
            });
        }

        let vector = rest
            .iter()
            .map(|v| v.parse::<f32>())
            .collect::<Result<Vec<f32>, _>>()
            .map_err(|e| PipelineError::Parse {
                path: path.to_path_buf(),
                line: line_no,
                message: format!("invalid vector component for {key}: {e}"),
            })?;

        if let Some((header_key, component, header_line)) = header_row.take() {
            if vector.len() == 1 && expected != Some(1) {
                let value = component.parse::<f32>().map_err(|e| PipelineError::Parse {
                    path: path.to_path_buf(),
                    line: header_line,
                    message: format!("invalid vector component for {header_key}: {e}"),
                })?;
                declared_count = None;
                expected = Some(1);
                vocab
                    .get_or_insert_with(|| Vocabulary::new(1))
                    .insert(header_key, &[value])?;
            }
        }

        let dims = *expected.get_or_insert(vector.len());
        if vector.len() != dims {
            return Err(PipelineError::DimensionMismatch {
                path: path.to_path_buf(),
                line: line_no,
                expected: dims,
                found: vector.len(),
            });
        }

        let vocab = vocab.get_or_insert_with(|| Vocabulary::new(dims));
        if !vocab.insert(key, &vector)? {
            duplicates += 1;
        }
    }

    let vocab = match vocab {
        Some(v) if !v.is_empty() => v,
        _ => {
            return Err(PipelineError::EmptyVocabulary {
                path: path.to_path_buf(),
            })
        }
    };

    if duplicates > 0 {
        log::warn!(
            "{} duplicate vocabulary keys in {} (first vector kept)",
            duplicates,
            path.display()
        );
    }
    if let Some(count) = declared_count {
        if count != vocab.len() + duplicates {
            log::warn!(
                "{} declares {} vectors but contains {}",
                path.display(),
                count,
                vocab.len() + duplicates
            );
        }
    }

    Ok(vocab)
}

/// Load a JSON Lines table, one object per non-blank line.
pub fn load_json_lines<T: DeserializeOwned>(
    path: &Path,
    source_name: &'static str,
) -> PipelineResult<Vec<T>> {
    let reader = open_source(path, source_name)?;
    let mut rows = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|error| PipelineError::Read {
            path: path.to_path_buf(),
            error,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let row = serde_json::from_str(&line).map_err(|e| PipelineError::Parse {
            path: path.to_path_buf(),
            line: idx + 1,
            message: e.to_string(),
        })?;
        rows.push(row);
    }

    Ok(rows)
}

/// Open a required source, decompressing `.gz` files.
fn open_source(path: &Path, source_name: &'static str) -> PipelineResult<Box<dyn BufRead>> {
    if !path.is_file() {
        return Err(PipelineError::MissingSource {
            source_name,
            path: path.to_path_buf(),
        });
    }

    let file = File::open(path).map_err(|error| PipelineError::Read {
        path: path.to_path_buf(),
        error,
    })?;

    let is_gzip = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"));
    if is_gzip {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Recognize a `<count> <dimensions>` header line.
fn parse_header(first: &str, rest: &[&str]) -> Option<(usize, usize)> {
    match rest {
        [dims] => Some((first.parse().ok()?, dims.parse().ok()?)),
        _ => None,
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::fs;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_load_vocabulary_with_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vectors.txt");
        fs::write(&path, "2 2\nt1 1.0 0.0\nt2 0 1\n").unwrap();

        let vocab = load_vocabulary(&path).unwrap();
        assert_eq!(vocab.len(), 2);
        assert_eq!(vocab.dimensions(), 2);
        assert_eq!(vocab.get("t1"), Some(&[1.0, 0.0][..]));
        assert_eq!(vocab.get("t2"), Some(&[0.0, 1.0][..]));
    }

    #[test]
    fn test_load_vocabulary_without_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vectors.txt");
        fs::write(&path, "spotify:track:a 0.5 -0.25 1e-3\n\nspotify:track:b 1 2 3\n").unwrap();

        let vocab = load_vocabulary(&path).unwrap();
        assert_eq!(vocab.dimensions(), 3);
        assert!(vocab.contains("spotify:track:a"));
        assert!(vocab.contains("spotify:track:b"));
    }

    #[test]
    fn test_load_vocabulary_gzip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vectors.txt.gz");
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"t1 1 0\nt2 0 1\n").unwrap();
        fs::write(&path, encoder.finish().unwrap()).unwrap();

        let vocab = load_vocabulary(&path).unwrap();
        assert_eq!(vocab.len(), 2);
    }

    #[test]
    fn test_load_vocabulary_dimension_mismatch() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vectors.txt");
        fs::write(&path, "t1 1 0\nt2 0 1 2\n").unwrap();

        let err = load_vocabulary(&path).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::DimensionMismatch {
                line: 2,
                expected: 2,
                found: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_load_vocabulary_header_fixes_dimension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vectors.txt");
        fs::write(&path, "1 3\nt1 1 0\n").unwrap();

        let err = load_vocabulary(&path).unwrap_err();
        assert!(matches!(err, PipelineError::DimensionMismatch { line: 2, .. }));
    }

    #[test]
    fn test_load_vocabulary_numeric_keys_one_dimension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vectors.txt");
        fs::write(&path, "123 4\n456 0.5\n789 -1\n").unwrap();

        let vocab = load_vocabulary(&path).unwrap();
        assert_eq!(vocab.dimensions(), 1);
        assert_eq!(vocab.len(), 3);
        assert_eq!(vocab.get("123"), Some(&[4.0][..]));
        assert_eq!(vocab.get("456"), Some(&[0.5][..]));
    }

    #[test]
    fn test_load_vocabulary_header_with_one_dimension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vectors.txt");
        fs::write(&path, "2 1\nt1 0.5\nt2 -1\n").unwrap();

        let vocab = load_vocabulary(&path).unwrap();
        assert_eq!(vocab.len(), 2);
        assert!(!vocab.contains("2"));
    }

    #[test]
    fn test_load_vocabulary_bad_component() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vectors.txt");
        fs::write(&path, "t1 1 zero\n").unwrap();

        let err = load_vocabulary(&path).unwrap_err();
        assert!(matches!(err, PipelineError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_empty_vocabulary_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vectors.txt");
        fs::write(&path, "0 8\n").unwrap();

        let err = load_vocabulary(&path).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyVocabulary { .. }));
        assert!(err.is_fatal_input());
    }

    #[test]
    fn test_missing_source_is_fatal() {
        let dir = TempDir::new().unwrap();
        let err = load_vocabulary(&dir.path().join("nope.txt")).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MissingSource {
                source_name: "embedding vocabulary",
                ..
            }
        ));
    }

    #[test]
    fn test_load_track_rows_with_nulls() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tracks.jsonl");
        fs::write(
            &path,
            concat!(
                r#"{"track_uri":"spotify:track:t1","artist_uri":"spotify:artist:a1","track_name":"Song A","artist_name":"Art X","album_name":null}"#,
                "\n\n",
                r#"{"track_uri":"spotify:track:t2","artist_uri":"spotify:artist:a2","track_name":null,"artist_name":"Art Y"}"#,
                "\n"
            ),
        )
        .unwrap();

        let rows: Vec<TrackRow> = load_json_lines(&path, "track metadata").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].album_name, "");
        assert_eq!(rows[1].track_name, "");
        assert_eq!(rows[1].artist_name, "Art Y");
    }

    #[test]
    fn test_load_artist_rows_accepts_irregular_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("artists.jsonl");
        fs::write(
            &path,
            concat!(
                r#"{"artist_id":"a1","artist_name":"ignored","genres":["pop"],"artist_popularity":71.0,"artist_followers":1000}"#,
                "\n",
                r#"{"artist_uri":"spotify:artist:a2","genres":null}"#,
                "\n"
            ),
        )
        .unwrap();

        let rows: Vec<ArtistRow> = load_json_lines(&path, "artist info").unwrap();
        assert_eq!(rows[0].artist_popularity, Some(71.0));
        assert_eq!(rows[1].artist_id, "spotify:artist:a2");
        assert_eq!(rows[1].genres, None);
        assert_eq!(rows[1].artist_followers, None);
    }

    #[test]
    fn test_malformed_json_line_reports_line_number() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tracks.jsonl");
        fs::write(&path, "{\"track_uri\":\"x\",\"artist_uri\":\"y\"}\n{not json}\n").unwrap();

        let err = load_json_lines::<TrackRow>(&path, "track metadata").unwrap_err();
        assert!(matches!(err, PipelineError::Parse { line: 2, .. }));
    }
}
