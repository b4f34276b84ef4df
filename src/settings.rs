//! breeder settings for polybreed
//! one immutable value handed to the engine when a run starts
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{BreedError, Result};

/// jitter spreads recorded alongside every saved lineage
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Deltas {
    /// vertex nudge, in normalized canvas units
    pub xy: f64,
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Default for Deltas {
    fn default() -> Self {
        Self { xy: 0.1, r: 20, g: 20, b: 20, a: 20 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreederSettings {
    // genome-level rates, "one in N" per mutation pass
    pub gene_emergence_rate: u32,
    pub gene_kill_rate: u32,
    pub gene_move_rate: u32,

    // gene-level rates
    pub point_emergence_rate: u32,
    pub point_kill_rate: u32,
    /// checked once per vertex
    pub point_jitter_rate: u32,
    pub color_jitter_rate: u32,

    // genome limits
    pub min_genes: usize,
    pub max_genes: usize,

    // polygon limits
    pub min_points_per_gene: usize,
    pub max_points_per_gene: usize,

    // alpha range, 0..=255
    pub min_alpha: u8,
    pub max_alpha: u8,

    pub deltas: Deltas,

    /// split one gene into triangles, "one in N" per pass. None keeps splicing off
    pub splice_rate: Option<u32>,

    /// edge anti-aliasing in the rasterizer
    pub polygon_antialiasing: bool,

    /// seed for the mutation stream
    pub seed: u64,

    /// log an improvement line every Nth acceptance (1 = every acceptance)
    pub log_every: u64,
}

impl Default for BreederSettings {
    fn default() -> Self {
        Self {
            gene_emergence_rate: 50,
            gene_kill_rate: 100,
            gene_move_rate: 100,

            point_emergence_rate: 200,
            point_kill_rate: 200,
            point_jitter_rate: 100,
            color_jitter_rate: 100,

            min_genes: 1,
            max_genes: 500,

            min_points_per_gene: 3,
            max_points_per_gene: 9,

            min_alpha: 10,
            max_alpha: 180,

            deltas: Deltas::default(),

            splice_rate: None,

            polygon_antialiasing: true,

            seed: 0xDEADBEEF,

            log_every: 100,
        }
    }
}

impl BreederSettings {
    /// reject settings the mutation operators cannot honor
    pub fn validate(&self) -> Result<()> {
        let rates = [
            ("gene_emergence_rate", self.gene_emergence_rate),
            ("gene_kill_rate", self.gene_kill_rate),
            ("gene_move_rate", self.gene_move_rate),
            ("point_emergence_rate", self.point_emergence_rate),
            ("point_kill_rate", self.point_kill_rate),
            ("point_jitter_rate", self.point_jitter_rate),
            ("color_jitter_rate", self.color_jitter_rate),
        ];
        for (name, rate) in rates {
            if rate < 2 {
                return Err(BreedError::InvalidConfiguration(format!(
                    "{name} must be at least 2, got {rate}"
                )));
            }
        }
        if let Some(rate) = self.splice_rate {
            if rate < 2 {
                return Err(BreedError::InvalidConfiguration(format!(
                    "splice_rate must be at least 2, got {rate}"
                )));
            }
        }
        if self.min_genes > self.max_genes {
            return Err(BreedError::InvalidConfiguration(format!(
                "min_genes {} > max_genes {}",
                self.min_genes, self.max_genes
            )));
        }
        if self.min_points_per_gene < 3 {
            return Err(BreedError::InvalidConfiguration(format!(
                "min_points_per_gene must be at least 3, got {}",
                self.min_points_per_gene
            )));
        }
        if self.min_points_per_gene > self.max_points_per_gene {
            return Err(BreedError::InvalidConfiguration(format!(
                "min_points_per_gene {} > max_points_per_gene {}",
                self.min_points_per_gene, self.max_points_per_gene
            )));
        }
        if self.min_alpha > self.max_alpha {
            return Err(BreedError::InvalidConfiguration(format!(
                "min_alpha {} > max_alpha {}",
                self.min_alpha, self.max_alpha
            )));
        }
        if !(self.deltas.xy.is_finite() && self.deltas.xy >= 0.0) {
            return Err(BreedError::InvalidConfiguration(format!(
                "deltas.xy must be a non-negative number, got {}",
                self.deltas.xy
            )));
        }
        Ok(())
    }

    /// save settings to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(|e| BreedError::Parse(e.to_string()))?;
        std::fs::write(path, json).map_err(|e| BreedError::io(path, e))
    }

    /// load settings from a JSON file, or return defaults if the file doesn't exist
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(json) => {
                let settings: Self = serde_json::from_str(&json)
                    .map_err(|e| BreedError::Parse(format!("{}: {e}", path.display())))?;
                settings.validate()?;
                Ok(settings)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(BreedError::io(path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(BreederSettings::default().validate().is_ok());
    }

    #[test]
    fn test_degenerate_rate_rejected() {
        let settings = BreederSettings { gene_kill_rate: 1, ..Default::default() };
        assert!(matches!(settings.validate(), Err(BreedError::InvalidConfiguration(_))));

        let settings = BreederSettings { splice_rate: Some(0), ..Default::default() };
        assert!(matches!(settings.validate(), Err(BreedError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let settings = BreederSettings { min_genes: 10, max_genes: 2, ..Default::default() };
        assert!(settings.validate().is_err());

        let settings = BreederSettings { min_alpha: 200, max_alpha: 100, ..Default::default() };
        assert!(settings.validate().is_err());

        let settings = BreederSettings {
            min_points_per_gene: 6,
            max_points_per_gene: 4,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings: BreederSettings = serde_json::from_str(r#"{ "max_genes": 42 }"#).unwrap();
        assert_eq!(settings.max_genes, 42);
        assert_eq!(settings.min_genes, BreederSettings::default().min_genes);
    }

    #[test]
    fn test_save_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = BreederSettings { seed: 17, max_alpha: 255, ..Default::default() };
        settings.save(&path).unwrap();
        assert_eq!(BreederSettings::load(&path).unwrap(), settings);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = BreederSettings::load(dir.path().join("nope.json")).unwrap();
        assert_eq!(loaded, BreederSettings::default());
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(BreederSettings::load(&path), Err(BreedError::Parse(_))));
    }
}
