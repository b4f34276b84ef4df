//! Approximates a target image with a genome of semi-transparent polygons,
//! bred by a mutate-render-score hill climber on a background thread.

pub mod app_types;
pub mod dna;
pub mod engine;
pub mod engine_thread;
pub mod error;
pub mod fitness;
pub mod geom;
pub mod mutate;
pub mod persistence;
pub mod render;
pub mod rng;
pub mod settings;

pub use app_types::{BreederEvent, BreederState, StopReason, WorkerPriority};
pub use dna::{Color, Gene, Genome, LineageStats, Point};
pub use engine::{Evolver, Snapshot, Step};
pub use engine_thread::Breeder;
pub use error::{BreedError, Result};
pub use persistence::SavedLineage;
pub use render::{CpuRenderer, Raster};
pub use rng::RandomSource;
pub use settings::{BreederSettings, Deltas};
