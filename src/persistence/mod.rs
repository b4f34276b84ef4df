//! Saved lineages: a JSON record (`.json` / `.dna`) that round-trips exactly and
//! an SVG rendition (`.svg`) that carries the same metadata. Loads never touch
//! a live breeder; they hand back a value the caller may assign.

pub mod json;
pub mod svg;

use std::path::Path;

use crate::dna::{Genome, LineageStats};
use crate::error::{BreedError, Result};
use crate::settings::Deltas;

/// everything needed to resume or re-render a lineage
#[derive(Clone, Debug, PartialEq)]
pub struct SavedLineage {
    /// wall-clock time of the save, `%Y-%m-%d %H:%M:%S%.3f`
    pub datetime: String,
    pub stats: LineageStats,
    /// jitter spreads in effect when the lineage was saved
    pub deltas: Deltas,
    pub genome: Genome,
}

impl SavedLineage {
    /// stamp with the current local time
    pub fn now(genome: Genome, stats: LineageStats, deltas: Deltas) -> Self {
        Self {
            datetime: chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
            stats,
            deltas,
            genome,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Json,
    Svg,
}

impl Format {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "json" | "dna" => Ok(Format::Json),
            "svg" => Ok(Format::Svg),
            _ => Err(BreedError::UnsupportedFormat(format!(
                "{} (expected .json, .dna or .svg)",
                path.display()
            ))),
        }
    }
}

pub fn save(path: impl AsRef<Path>, lineage: &SavedLineage) -> Result<()> {
    let path = path.as_ref();
    let text = match Format::from_path(path)? {
        Format::Json => json::to_string(lineage)?,
        Format::Svg => svg::to_string(lineage),
    };
    std::fs::write(path, text).map_err(|e| BreedError::io(path, e))?;
    tracing::info!(
        path = %path.display(),
        genes = lineage.genome.len(),
        generation = lineage.stats.generation,
        "saved lineage"
    );
    Ok(())
}

pub fn load(path: impl AsRef<Path>) -> Result<SavedLineage> {
    let path = path.as_ref();
    let format = Format::from_path(path)?;
    let text = std::fs::read_to_string(path).map_err(|e| BreedError::io(path, e))?;
    let lineage = match format {
        Format::Json => json::from_str(&text)?,
        Format::Svg => svg::from_str(&text)?,
    };
    tracing::info!(
        path = %path.display(),
        genes = lineage.genome.len(),
        points = lineage.genome.point_count(),
        generation = lineage.stats.generation,
        "loaded lineage"
    );
    Ok(lineage)
}

/// alpha fraction back to 0..=255
pub(crate) fn alpha_from_fraction(a: f64) -> u8 {
    (a * 255.0).round().clamp(0.0, 255.0) as u8
}
