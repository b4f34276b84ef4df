use std::sync::Arc;

use crate::dna::{Genome, LineageStats};
use crate::error::{BreedError, Result};
use crate::fitness;
use crate::render::{CpuRenderer, Raster};
use crate::rng::RandomSource;
use crate::settings::BreederSettings;

/// immutable view of the last accepted state; what readers and events carry
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub genome: Arc<Genome>,
    pub image: Arc<Raster>,
    pub fitness: u64,
    pub selected: u64,
    pub generation: u64,
}

/// result of a single iteration
#[derive(Clone, Debug)]
pub enum Step {
    Accepted(Arc<Snapshot>),
    Rejected { generation: u64 },
}

impl Step {
    pub fn generation(&self) -> u64 {
        match self {
            Step::Accepted(s) => s.generation,
            Step::Rejected { generation } => *generation,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Step::Accepted(_))
    }
}

/// Hill climber over one lineage. Owns the mutation stream and the accepted
/// genome; every candidate is a private deep copy, so a failed or rejected
/// iteration leaves the accepted state untouched.
pub struct Evolver {
    rng: RandomSource,
    settings: Arc<BreederSettings>,
    renderer: CpuRenderer,
    target: Arc<Raster>,
    genome: Arc<Genome>,
    image: Arc<Raster>,
    generation: u64,
    selected: u64,
    fitness: u64,
}

impl Evolver {
    /// fresh lineage: empty genome sized to the target, counters at zero
    pub fn new(settings: Arc<BreederSettings>, target: Arc<Raster>) -> Result<Self> {
        profiling::scope!("Evolver::new");
        settings.validate()?;
        let genome = Genome::new_blank(target.width(), target.height())?;
        Self::with_genome(settings, target, genome, 0, 0)
    }

    /// Continue a saved lineage. The genome's canvas must match the target and
    /// its genes must sit within the configured bounds; fitness is recomputed
    /// so the acceptance baseline is always consistent.
    pub fn resume(
        settings: Arc<BreederSettings>,
        target: Arc<Raster>,
        genome: Genome,
        stats: LineageStats,
    ) -> Result<Self> {
        profiling::scope!("Evolver::resume");
        settings.validate()?;
        if genome.width() != target.width() || genome.height() != target.height() {
            return Err(BreedError::InvalidState(format!(
                "genome canvas {}x{} does not match target {}x{}",
                genome.width(),
                genome.height(),
                target.width(),
                target.height()
            )));
        }
        genome.check_bounds(&settings)?;
        if stats.selected > stats.generation {
            return Err(BreedError::InvalidState(format!(
                "selected {} exceeds generation {}",
                stats.selected, stats.generation
            )));
        }
        let evolver = Self::with_genome(settings, target, genome, stats.generation, stats.selected)?;
        if evolver.fitness != stats.fitness {
            tracing::debug!(
                saved = stats.fitness,
                recomputed = evolver.fitness,
                "resumed lineage scores differently against this target"
            );
        }
        Ok(evolver)
    }

    fn with_genome(
        settings: Arc<BreederSettings>,
        target: Arc<Raster>,
        genome: Genome,
        generation: u64,
        selected: u64,
    ) -> Result<Self> {
        let renderer = CpuRenderer::new(settings.polygon_antialiasing);
        let image = renderer.render(&genome)?;
        let fitness = fitness::score(&image, &target)?;
        Ok(Self {
            rng: RandomSource::new(settings.seed),
            settings,
            renderer,
            target,
            genome: Arc::new(genome),
            image: Arc::new(image),
            generation,
            selected,
            fitness,
        })
    }

    /// One iteration: clone, mutate, render, score, then accept when the
    /// candidate is at least as good (ties accepted so neutral drift continues).
    pub fn step(&mut self) -> Result<Step> {
        profiling::scope!("Evolver::step");

        let mut candidate = (*self.genome).clone();
        candidate.mutate(&self.settings, &mut self.rng)?;

        let image = self.renderer.render(&candidate)?;
        let fitness = fitness::score(&image, &self.target)?;

        self.generation += 1;

        if fitness <= self.fitness {
            self.genome = Arc::new(candidate);
            self.image = Arc::new(image);
            self.fitness = fitness;
            self.selected += 1;
            Ok(Step::Accepted(Arc::new(self.snapshot())))
        } else {
            Ok(Step::Rejected { generation: self.generation })
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            genome: Arc::clone(&self.genome),
            image: Arc::clone(&self.image),
            fitness: self.fitness,
            selected: self.selected,
            generation: self.generation,
        }
    }

    pub fn genome(&self) -> &Arc<Genome> {
        &self.genome
    }

    pub fn target(&self) -> &Arc<Raster> {
        &self.target
    }

    pub fn settings(&self) -> &BreederSettings {
        &self.settings
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn selected(&self) -> u64 {
        self.selected
    }

    pub fn fitness(&self) -> u64 {
        self.fitness
    }
}
