//! The export pipeline: load → consolidate → export → project → index →
//! summarize → write.
//!
//! Every stage runs to completion before the next starts, and nothing is
//! written until all artifacts are computed, so a fatal error leaves the
//! output directory untouched.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use trackmap_core::model::{GenreCount, Track};
use trackmap_search::SearchIndex;

use crate::config::Config;
use crate::consolidate::{consolidate, ConsolidationStats};
use crate::error::{PipelineError, PipelineResult};
use crate::export::{AlignedExport, EmbeddingMatrix};
use crate::genres::{top_genres, DEFAULT_TOP_GENRES};
use crate::playlist::{self, NoPlaylists, PlaylistSource};
use crate::projection::{project_normalized, PcaProjector, Projector};
use crate::source::{load_sources, SourcePaths};

pub const TRACKS_FILE: &str = "tracks.json";
pub const EMBEDDINGS_FILE: &str = "embeddings.bin";
pub const EMBEDDINGS_META_FILE: &str = "embeddings_meta.json";
pub const COORDS_FILE: &str = "tsne_coords.json";
pub const SEARCH_INDEX_FILE: &str = "search_index.json";
pub const GENRES_FILE: &str = "genres.json";

#[derive(Serialize)]
struct TracksFile<'a> {
    tracks: &'a [Track],
}

#[derive(Serialize)]
struct CoordsFile<'a> {
    coords: &'a [[f64; 3]],
}

#[derive(Serialize)]
struct GenresFile<'a> {
    genres: &'a [GenreCount],
}

/// A file written by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFile {
    pub path: PathBuf,
    pub bytes: u64,
}

/// What a completed run produced.
#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub stats: ConsolidationStats,
    pub tracks: usize,
    pub dimensions: usize,
    pub tokens: usize,
    pub genres: usize,
    pub files: Vec<WrittenFile>,
}

/// Everything one run computes before anything is written.
#[derive(Debug)]
struct Artifacts {
    stats: ConsolidationStats,
    export: AlignedExport,
    coords: Vec<[f64; 3]>,
    index: SearchIndex,
    genres: Vec<GenreCount>,
}

/// The full export run.
#[derive(Debug)]
pub struct ExportPipeline {
    sources: SourcePaths,
    output_dir: PathBuf,
    playlists: Box<dyn PlaylistSource>,
    projector: Box<dyn Projector>,
    top_genres: usize,
    max_track_genres: usize,
}

impl ExportPipeline {
    /// A pipeline without playlist data, projecting with default PCA.
    #[must_use]
    pub fn new(sources: SourcePaths, output_dir: PathBuf) -> Self {
        Self {
            sources,
            output_dir,
            playlists: Box::new(NoPlaylists),
            projector: Box::new(PcaProjector::default()),
            top_genres: DEFAULT_TOP_GENRES,
            max_track_genres: trackmap_core::model::MAX_TRACK_GENRES,
        }
    }

    /// Build the pipeline described by `config`, probing for playlist data.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.source_paths(), config.output_dir())
            .with_playlists(playlist::probe(&config.playlist_dir()))
            .with_projector(Box::new(PcaProjector::new(config.projection_iterations)))
            .with_top_genres(config.top_genres)
            .with_max_track_genres(config.max_track_genres)
    }

    #[must_use]
    pub fn with_playlists(mut self, playlists: Box<dyn PlaylistSource>) -> Self {
        self.playlists = playlists;
        self
    }

    #[must_use]
    pub fn with_projector(mut self, projector: Box<dyn Projector>) -> Self {
        self.projector = projector;
        self
    }

    #[must_use]
    pub fn with_top_genres(mut self, top_genres: usize) -> Self {
        self.top_genres = top_genres;
        self
    }

    #[must_use]
    pub fn with_max_track_genres(mut self, max_track_genres: usize) -> Self {
        self.max_track_genres = max_track_genres;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Run every stage and write all artifacts.
    ///
    /// # Errors
    /// Returns the first fatal error; no artifact is written in that case.
    pub fn run(&self) -> PipelineResult<ExportSummary> {
        let artifacts = self.compute()?;
        let files = self.write(&artifacts)?;

        Ok(ExportSummary {
            stats: artifacts.stats,
            tracks: artifacts.export.len(),
            dimensions: artifacts.export.embeddings.dimensions(),
            tokens: artifacts.index.len(),
            genres: artifacts.genres.len(),
            files,
        })
    }

    fn compute(&self) -> PipelineResult<Artifacts> {
        log::info!("Loading data...");
        let sources = load_sources(&self.sources)?;

        log::info!("Building enriched dataset...");
        let counts = self.playlists.counts()?;
        let consolidation = consolidate(
            &sources.tracks,
            &sources.artists,
            &sources.vocabulary,
            &counts,
        );
        let stats = consolidation.stats;
        log::info!(
            "Enriched dataset: {} tracks in vocabulary ({} out of vocabulary, {} duplicates, {} without artist info)",
            stats.kept,
            stats.out_of_vocabulary,
            stats.duplicates,
            stats.artist_misses
        );

        let export = AlignedExport::build(
            &consolidation.universe,
            &sources.vocabulary,
            self.max_track_genres,
        )?;

        let coords = project_normalized(self.projector.as_ref(), &export.embeddings)?;

        log::info!("Building search index...");
        let index = SearchIndex::build(&export.tracks);

        let genres = top_genres(&consolidation.universe, self.top_genres);

        Ok(Artifacts {
            stats,
            export,
            coords,
            index,
            genres,
        })
    }

    fn write(&self, artifacts: &Artifacts) -> PipelineResult<Vec<WrittenFile>> {
        fs::create_dir_all(&self.output_dir).map_err(|error| PipelineError::Write {
            path: self.output_dir.clone(),
            error,
        })?;

        let embeddings = &artifacts.export.embeddings;
        let files = vec![
            self.write_json(
                TRACKS_FILE,
                &TracksFile {
                    tracks: &artifacts.export.tracks,
                },
            )?,
            self.write_embeddings(embeddings)?,
            self.write_json(EMBEDDINGS_META_FILE, &embeddings.meta())?,
            self.write_json(
                COORDS_FILE,
                &CoordsFile {
                    coords: &artifacts.coords,
                },
            )?,
            self.write_json(SEARCH_INDEX_FILE, &artifacts.index)?,
            self.write_json(
                GENRES_FILE,
                &GenresFile {
                    genres: &artifacts.genres,
                },
            )?,
        ];

        for file in &files {
            log::info!(
                "Saved {} ({:.2} MB)",
                file.path.display(),
                file.bytes as f64 / (1024.0 * 1024.0)
            );
        }

        let manifest: Vec<String> = files
            .iter()
            .filter_map(|f| f.path.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect();
        log::info!(
            "Export complete in {}: {}",
            self.output_dir.display(),
            manifest.join(", ")
        );
        Ok(files)
    }

    fn write_json<T: Serialize>(&self, name: &str, value: &T) -> PipelineResult<WrittenFile> {
        self.write_file(name, |writer| {
            serde_json::to_writer(&mut *writer, value).map_err(std::io::Error::from)
        })
    }

    fn write_embeddings(&self, embeddings: &EmbeddingMatrix) -> PipelineResult<WrittenFile> {
        self.write_file(EMBEDDINGS_FILE, |writer| embeddings.write_le(writer))
    }

    fn write_file<F>(&self, name: &str, body: F) -> PipelineResult<WrittenFile>
    where
        F: FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
    {
        let path = self.output_dir.join(name);
        let result = File::create(&path).and_then(|file| {
            let mut writer = BufWriter::new(file);
            body(&mut writer)?;
            writer.flush()?;
            writer.get_ref().metadata().map(|m| m.len())
        });

        match result {
            Ok(bytes) => Ok(WrittenFile { path, bytes }),
            Err(error) => Err(PipelineError::Write { path, error }),
        }
    }
}
