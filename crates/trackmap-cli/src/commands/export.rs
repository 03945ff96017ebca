use anyhow::{Context, Result};
use trackmap_etl::{Config, ExportPipeline};

/// Run the full export and report what was written.
pub fn run_export(config: &Config) -> Result<()> {
    let sources = config.source_paths();

    println!("\n🗺️  Trackmap Export\n");
    println!("  Vocabulary: {}", sources.vocabulary.display());
    println!("  Track metadata: {}", sources.track_metadata.display());
    println!("  Artist info: {}", sources.artist_info.display());
    println!("  Output: {}", config.output_dir().display());
    println!();

    let pipeline = ExportPipeline::from_config(config);
    let summary = pipeline.run().context("Export failed")?;

    let stats = summary.stats;
    println!("📚 Consolidated {} of {} track rows", stats.kept, stats.rows_read);
    println!("  {} not in the vocabulary", stats.out_of_vocabulary);
    println!("  {} duplicates", stats.duplicates);
    println!("  {} without artist info", stats.artist_misses);

    println!(
        "\n🔢 {} tracks × {} dimensions",
        summary.tracks, summary.dimensions
    );
    println!("🔍 {} search tokens", summary.tokens);
    println!("🎸 {} genres", summary.genres);

    println!("\n💾 Wrote {} files:", summary.files.len());
    for file in &summary.files {
        println!("  ✓ {} ({} bytes)", file.path.display(), file.bytes);
    }

    println!("\n✓ Data ready in {}", pipeline.output_dir().display());
    Ok(())
}
