use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use super::{alpha_from_fraction, SavedLineage};
use crate::dna::{Color, Gene, Genome, LineageStats};
use crate::error::{BreedError, Result};
use crate::settings::Deltas;

#[derive(Serialize, Deserialize)]
struct Record {
    #[serde(default)]
    datetime: String,
    #[serde(default)]
    elapsed_secs: f64,
    #[serde(deserialize_with = "lenient_u64")]
    generation: u64,
    #[serde(deserialize_with = "lenient_u64")]
    selected: u64,
    #[serde(deserialize_with = "lenient_u64")]
    fitness: u64,
    #[serde(default)]
    deltas: Deltas,
    size: Size,
    dna: Vec<GeneRecord>,
}

#[derive(Serialize, Deserialize)]
struct Size {
    width: u32,
    height: u32,
}

#[derive(Serialize, Deserialize)]
struct GeneRecord {
    color: ColorRecord,
    vertices: Vec<Vertex>,
}

/// channels 0..=255, alpha as a fraction
#[derive(Serialize, Deserialize)]
struct ColorRecord {
    r: u8,
    g: u8,
    b: u8,
    a: f64,
}

#[derive(Serialize, Deserialize)]
struct Vertex {
    x: f64,
    y: f64,
}

/// counters may be written as numbers or as decimal strings
fn lenient_u64<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrStr {
        Num(u64),
        Str(String),
    }
    match NumOrStr::deserialize(d)? {
        NumOrStr::Num(n) => Ok(n),
        NumOrStr::Str(s) => s.trim().parse().map_err(de::Error::custom),
    }
}

pub fn to_string(lineage: &SavedLineage) -> Result<String> {
    let genome = &lineage.genome;
    let record = Record {
        datetime: lineage.datetime.clone(),
        elapsed_secs: lineage.stats.elapsed_secs,
        generation: lineage.stats.generation,
        selected: lineage.stats.selected,
        fitness: lineage.stats.fitness,
        deltas: lineage.deltas,
        size: Size { width: genome.width(), height: genome.height() },
        dna: genome
            .genes
            .iter()
            .map(|g| GeneRecord {
                color: ColorRecord { r: g.color.r, g: g.color.g, b: g.color.b, a: g.color.alpha_f() },
                vertices: g.vertices.iter().map(|&(x, y)| Vertex { x, y }).collect(),
            })
            .collect(),
    };
    serde_json::to_string_pretty(&record).map_err(|e| BreedError::Parse(e.to_string()))
}

pub fn from_str(text: &str) -> Result<SavedLineage> {
    let record: Record = serde_json::from_str(text).map_err(|e| BreedError::Parse(e.to_string()))?;

    if record.selected > record.generation {
        return Err(BreedError::Parse(format!(
            "selected {} exceeds generation {}",
            record.selected, record.generation
        )));
    }

    let mut genes = Vec::with_capacity(record.dna.len());
    for (i, g) in record.dna.into_iter().enumerate() {
        if !(0.0..=1.0).contains(&g.color.a) {
            return Err(BreedError::Parse(format!("gene {i}: alpha {} outside [0, 1]", g.color.a)));
        }
        let mut vertices = Vec::with_capacity(g.vertices.len());
        for v in g.vertices {
            if !(v.x.is_finite() && v.y.is_finite()) {
                return Err(BreedError::Parse(format!("gene {i}: non-finite vertex")));
            }
            vertices.push((v.x, v.y));
        }
        let color = Color::rgba(g.color.r, g.color.g, g.color.b, alpha_from_fraction(g.color.a));
        genes.push(Gene::new(vertices, color));
    }

    let genome = Genome::from_genes(record.size.width, record.size.height, genes)
        .map_err(|e| BreedError::Parse(e.to_string()))?;

    Ok(SavedLineage {
        datetime: record.datetime,
        stats: LineageStats {
            generation: record.generation,
            selected: record.selected,
            fitness: record.fitness,
            elapsed_secs: record.elapsed_secs,
        },
        deltas: record.deltas,
        genome,
    })
}
