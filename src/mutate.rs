use crate::dna::{Gene, Genome};
use crate::error::Result;
use crate::geom::{bisect_triangle, convex_hull, fan_triangulate, polygon_area};
use crate::rng::RandomSource;
use crate::settings::BreederSettings;

impl Gene {
    /// One gene-level pass. Every rule rolls its own gate, in this order:
    /// point emergence, point kill, per-vertex jitter, color jitter.
    pub fn mutate(&mut self, settings: &BreederSettings, rng: &mut RandomSource) -> Result<()> {
        profiling::scope!("Gene::mutate");

        // insert the midpoint of a random edge
        if rng.bernoulli(settings.point_emergence_rate)?
            && self.vertices.len() < settings.max_points_per_gene
            && !self.vertices.is_empty()
        {
            let n = self.vertices.len();
            let i = rng.uniform_int(n)?;
            let j = (i + 1) % n;
            let (p0, p1) = (self.vertices[i], self.vertices[j]);
            let mid = ((p0.0 + p1.0) / 2.0, (p0.1 + p1.1) / 2.0);
            self.vertices.insert(j, mid);
        }

        if rng.bernoulli(settings.point_kill_rate)?
            && self.vertices.len() > settings.min_points_per_gene
        {
            let i = rng.uniform_int(self.vertices.len())?;
            self.vertices.remove(i);
        }

        let d_xy = settings.deltas.xy;
        for p in self.vertices.iter_mut() {
            if rng.bernoulli(settings.point_jitter_rate)? {
                p.0 = rng.jitter_real(p.0, d_xy, 0.0, 1.0);
                p.1 = rng.jitter_real(p.1, d_xy, 0.0, 1.0);
            }
        }

        if rng.bernoulli(settings.color_jitter_rate)? {
            let d = &settings.deltas;
            let c = &mut self.color;
            c.r = rng.jitter_int(c.r as i64, d.r as i64, 0, 255) as u8;
            c.g = rng.jitter_int(c.g as i64, d.g as i64, 0, 255) as u8;
            c.b = rng.jitter_int(c.b as i64, d.b as i64, 0, 255) as u8;
            c.a = rng.jitter_int(
                c.a as i64,
                d.a as i64,
                settings.min_alpha as i64,
                settings.max_alpha as i64,
            ) as u8;
        }

        Ok(())
    }

    /// Break the gene into triangles of the same color covering the same area:
    /// a triangle is bisected through its longest edge, a convex polygon is
    /// fan-triangulated. Concave, self-intersecting and degenerate polygons
    /// yield nothing.
    pub fn splice(&self) -> Vec<Gene> {
        if let Some((a, b)) = bisect_triangle(&self.vertices) {
            return vec![Gene::new(a.to_vec(), self.color), Gene::new(b.to_vec(), self.color)];
        }
        let hull = convex_hull(&self.vertices);
        // convex and simple iff every vertex is on the hull and the outline encloses the hull's area
        let area = polygon_area(&self.vertices);
        let hull_area = polygon_area(&hull);
        if hull.len() != self.vertices.len() || (area - hull_area).abs() > 1e-9 * hull_area.max(1e-12) {
            return Vec::new();
        }
        fan_triangulate(&hull)
            .into_iter()
            .map(|tri| Gene::new(tri.to_vec(), self.color))
            .collect()
    }
}

impl Genome {
    /// One genome-level pass, applied to a private candidate copy.
    /// Structural changes run first so a freshly spawned gene gets its first
    /// jitter in the same pass; the order is part of the replay contract.
    pub fn mutate(&mut self, settings: &BreederSettings, rng: &mut RandomSource) -> Result<()> {
        profiling::scope!("Genome::mutate");

        // 1. spawn; a genome under min_genes is topped up without rolling the gate
        if self.genes.len() < settings.min_genes {
            while self.genes.len() < settings.min_genes {
                let gene = Gene::random(settings, rng)?;
                self.genes.push(gene);
            }
        } else if rng.bernoulli(settings.gene_emergence_rate)? && self.genes.len() < settings.max_genes {
            let gene = Gene::random(settings, rng)?;
            self.genes.push(gene);
        }

        // 2. kill
        if rng.bernoulli(settings.gene_kill_rate)? && self.genes.len() > settings.min_genes {
            let i = rng.uniform_int(self.genes.len())?;
            self.genes.remove(i);
        }

        // 3. move: two distinct indices, relocate first to second
        if rng.bernoulli(settings.gene_move_rate)? && self.genes.len() >= 2 {
            let n = self.genes.len();
            let from = rng.uniform_int(n)?;
            let mut to = rng.uniform_int(n - 1)?;
            if to >= from {
                to += 1;
            }
            let gene = self.genes.remove(from);
            self.genes.insert(to, gene);
        }

        // optional: split one gene into triangles
        if let Some(rate) = settings.splice_rate {
            self.maybe_splice(rate, settings, rng)?;
        }

        // 4. every remaining gene
        for gene in self.genes.iter_mut() {
            gene.mutate(settings, rng)?;
        }

        Ok(())
    }

    fn maybe_splice(&mut self, rate: u32, settings: &BreederSettings, rng: &mut RandomSource) -> Result<()> {
        if !rng.bernoulli(rate)? || self.genes.is_empty() || settings.min_points_per_gene > 3 {
            return Ok(());
        }
        let i = rng.uniform_int(self.genes.len())?;
        let pieces = self.genes[i].splice();
        if pieces.is_empty() || self.genes.len() - 1 + pieces.len() > settings.max_genes {
            return Ok(());
        }
        self.genes.splice(i..=i, pieces);
        Ok(())
    }
}
