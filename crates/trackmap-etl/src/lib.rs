//! Export pipeline stages for trackmap.
//!
//! Loads the trained vocabulary and metadata tables, consolidates them into
//! the track universe, and writes the positionally aligned artifacts the
//! web client reads: track records, the embedding blob and its sidecar,
//! 3D coordinates, the search index, and the genre summary.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod config;
pub mod consolidate;
pub mod error;
pub mod export;
pub mod genres;
pub mod pipeline;
pub mod playlist;
pub mod projection;
pub mod source;

pub use config::Config;
pub use consolidate::{consolidate, Consolidation, ConsolidationStats, TrackUniverse};
pub use error::{PipelineError, PipelineResult};
pub use export::{AlignedExport, EmbeddingMatrix, EmbeddingMeta};
pub use pipeline::{ExportPipeline, ExportSummary, WrittenFile};
pub use playlist::{PlaylistCounts, PlaylistSource};
pub use projection::{PcaProjector, Projector};
pub use source::SourcePaths;
