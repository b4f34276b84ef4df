use crate::error::{BreedError, Result};
use crate::rng::RandomSource;
use crate::settings::BreederSettings;

/// vertex in normalized canvas coordinates, both axes in [0, 1]
pub type Point = (f64, f64);

/// straight (un-premultiplied) RGBA, 0..=255 per channel
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// alpha as a fraction in [0, 1]
    pub fn alpha_f(&self) -> f64 {
        self.a as f64 / 255.0
    }
}

/// one filled polygon. fewer than 3 vertices is a legal transient state, never drawn
#[derive(Clone, Debug, PartialEq)]
pub struct Gene {
    pub vertices: Vec<Point>,
    pub color: Color,
}

impl Gene {
    pub fn new(vertices: Vec<Point>, color: Color) -> Self {
        Self { vertices, color }
    }

    /// random polygon: vertex count, positions, color and alpha all drawn uniformly
    /// within the configured bounds
    pub fn random(settings: &BreederSettings, rng: &mut RandomSource) -> Result<Self> {
        profiling::scope!("Gene::random");
        let n = rng.uniform_int_between(
            settings.min_points_per_gene as i64,
            settings.max_points_per_gene as i64,
        )? as usize;

        let mut vertices = Vec::with_capacity(n);
        for _ in 0..n {
            let x = rng.uniform_real();
            let y = rng.uniform_real();
            vertices.push((x, y));
        }

        let r = rng.uniform_int(256)? as u8;
        let g = rng.uniform_int(256)? as u8;
        let b = rng.uniform_int(256)? as u8;
        let a = rng.uniform_int_between(settings.min_alpha as i64, settings.max_alpha as i64)? as u8;

        Ok(Self { vertices, color: Color::rgba(r, g, b, a) })
    }

    /// whether the renderer will draw this gene
    #[inline]
    pub fn is_renderable(&self) -> bool {
        self.vertices.len() >= 3
    }
}

/// ordered genes; index order is paint order, first gene at the back.
/// `Clone` is a deep copy: a mutated clone never touches the original's genes.
#[derive(Clone, Debug, PartialEq)]
pub struct Genome {
    width: u32,
    height: u32,
    pub genes: Vec<Gene>,
}

impl Genome {
    pub fn new_blank(width: u32, height: u32) -> Result<Self> {
        Self::from_genes(width, height, Vec::new())
    }

    pub fn from_genes(width: u32, height: u32, genes: Vec<Gene>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(BreedError::InvalidState(format!(
                "canvas must not be empty, got {width}x{height}"
            )));
        }
        Ok(Self { width, height, genes })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.genes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// total vertex count over all genes
    pub fn point_count(&self) -> usize {
        self.genes.iter().map(|g| g.vertices.len()).sum()
    }

    /// Reject a genome the mutation pass could not keep within `settings`:
    /// too many genes, a vertex count outside the per-gene range, an alpha
    /// outside the alpha range, or a vertex off the unit square. Fewer than
    /// `min_genes` is allowed; the next pass tops the genome up.
    pub fn check_bounds(&self, settings: &BreederSettings) -> Result<()> {
        if self.genes.len() > settings.max_genes {
            return Err(BreedError::InvalidState(format!(
                "genome has {} genes, max_genes is {}",
                self.genes.len(),
                settings.max_genes
            )));
        }
        for (i, gene) in self.genes.iter().enumerate() {
            let n = gene.vertices.len();
            if n < settings.min_points_per_gene || n > settings.max_points_per_gene {
                return Err(BreedError::InvalidState(format!(
                    "gene {i} has {n} vertices, allowed {}..={}",
                    settings.min_points_per_gene, settings.max_points_per_gene
                )));
            }
            let a = gene.color.a;
            if a < settings.min_alpha || a > settings.max_alpha {
                return Err(BreedError::InvalidState(format!(
                    "gene {i} alpha {a} outside {}..={}",
                    settings.min_alpha, settings.max_alpha
                )));
            }
            if let Some(&(x, y)) = gene
                .vertices
                .iter()
                .find(|&&(x, y)| !((0.0..=1.0).contains(&x) && (0.0..=1.0).contains(&y)))
            {
                return Err(BreedError::InvalidState(format!(
                    "gene {i} vertex ({x}, {y}) is off the canvas"
                )));
            }
        }
        Ok(())
    }
}

/// counters that travel with a lineage across save/resume
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LineageStats {
    /// mutation attempts
    pub generation: u64,
    /// accepted attempts
    pub selected: u64,
    pub fitness: u64,
    pub elapsed_secs: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_gene_within_bounds() {
        let settings = BreederSettings::default();
        let mut rng = RandomSource::new(1);
        for _ in 0..1000 {
            let gene = Gene::random(&settings, &mut rng).unwrap();
            let n = gene.vertices.len();
            assert!(n >= settings.min_points_per_gene && n <= settings.max_points_per_gene);
            assert!(gene.color.a >= settings.min_alpha && gene.color.a <= settings.max_alpha);
            for &(x, y) in &gene.vertices {
                assert!((0.0..1.0).contains(&x) && (0.0..1.0).contains(&y));
            }
        }
    }

    #[test]
    fn test_empty_canvas_rejected() {
        assert!(matches!(Genome::new_blank(0, 10), Err(BreedError::InvalidState(_))));
        assert!(Genome::new_blank(1, 1).is_ok());
    }

    #[test]
    fn test_clone_does_not_alias() {
        let gene = Gene::new(vec![(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)], Color::rgba(1, 2, 3, 4));
        let original = Genome::from_genes(4, 4, vec![gene]).unwrap();
        let mut copy = original.clone();
        copy.genes[0].vertices[0] = (0.5, 0.5);
        copy.genes[0].color.r = 200;
        assert_eq!(original.genes[0].vertices[0], (0.0, 0.0));
        assert_eq!(original.genes[0].color.r, 1);
    }

    #[test]
    fn test_check_bounds() {
        let settings = BreederSettings::default();
        let tri = |a: u8| Gene::new(vec![(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)], Color::rgba(9, 9, 9, a));

        let ok = Genome::from_genes(4, 4, vec![tri(100)]).unwrap();
        assert!(ok.check_bounds(&settings).is_ok());
        // below min_genes is topped up by mutation, not rejected
        assert!(Genome::new_blank(4, 4).unwrap().check_bounds(&settings).is_ok());

        let opaque = Genome::from_genes(4, 4, vec![tri(255)]).unwrap();
        assert!(matches!(opaque.check_bounds(&settings), Err(BreedError::InvalidState(_))));

        let line = Gene::new(vec![(0.0, 0.0), (1.0, 1.0)], Color::rgba(9, 9, 9, 100));
        let degenerate = Genome::from_genes(4, 4, vec![line]).unwrap();
        assert!(degenerate.check_bounds(&settings).is_err());

        let off = Gene::new(vec![(0.0, 0.0), (1.5, 0.0), (0.0, 1.0)], Color::rgba(9, 9, 9, 100));
        assert!(Genome::from_genes(4, 4, vec![off]).unwrap().check_bounds(&settings).is_err());

        let crowded = BreederSettings { max_genes: 1, ..Default::default() };
        let two = Genome::from_genes(4, 4, vec![tri(100), tri(100)]).unwrap();
        assert!(two.check_bounds(&crowded).is_err());
    }

    #[test]
    fn test_point_count() {
        let tri = Gene::new(vec![(0.0, 0.0); 3], Color::rgba(0, 0, 0, 255));
        let quad = Gene::new(vec![(0.0, 0.0); 4], Color::rgba(0, 0, 0, 255));
        let genome = Genome::from_genes(2, 2, vec![tri, quad]).unwrap();
        assert_eq!(genome.point_count(), 7);
    }
}
