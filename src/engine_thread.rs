use parking_lot::{Mutex, RwLock};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use crate::app_types::{BreederEvent, BreederState, StopReason, WorkerPriority};
use crate::dna::{Genome, LineageStats};
use crate::engine::{Evolver, Snapshot, Step};
use crate::error::{BreedError, Result};
use crate::persistence::{self, SavedLineage};
use crate::render::Raster;
use crate::settings::BreederSettings;

/// state the worker publishes and the controller reads without waiting on it
#[derive(Default)]
struct Shared {
    head: RwLock<Option<Arc<Snapshot>>>,
    generation: AtomicU64,
    running: AtomicBool,
    dirty: AtomicBool,
    // time spent in finished runs
    elapsed_nanos: AtomicU64,
    failure: Mutex<Option<String>>,
}

/// Owns one lineage and the single background thread that breeds it.
///
/// The worker locks the engine slot for a whole run; the controller only
/// touches the slot after the worker has been joined. Readers go through the
/// published snapshot, swapped only when a candidate is accepted.
pub struct Breeder {
    settings: Arc<BreederSettings>,
    target: Option<Arc<Raster>>,
    engine: Arc<Mutex<Option<Evolver>>>,
    shared: Arc<Shared>,
    stop_flag: Arc<AtomicBool>,
    worker: Option<thread::JoinHandle<()>>,
    events: mpsc::Sender<BreederEvent>,
    running_since: Option<Instant>,
    priority: WorkerPriority,
}

impl Breeder {
    pub fn new(settings: BreederSettings) -> Result<(Self, mpsc::Receiver<BreederEvent>)> {
        settings.validate()?;
        let (events, rx) = mpsc::channel();
        let breeder = Self {
            settings: Arc::new(settings),
            target: None,
            engine: Arc::new(Mutex::new(None)),
            shared: Arc::new(Shared::default()),
            stop_flag: Arc::new(AtomicBool::new(false)),
            worker: None,
            events,
            running_since: None,
            priority: WorkerPriority::default(),
        };
        Ok((breeder, rx))
    }

    pub fn settings(&self) -> &BreederSettings {
        &self.settings
    }

    /// (Re)define the canvas. Any running lineage is stopped and discarded.
    pub fn set_target_image(&mut self, target: Raster) -> Result<()> {
        self.stop()?;
        tracing::info!(width = target.width(), height = target.height(), "target image set");
        self.target = Some(Arc::new(target));
        self.clear_lineage();
        Ok(())
    }

    pub fn target(&self) -> Option<&Arc<Raster>> {
        self.target.as_ref()
    }

    /// fresh empty genome at the target's size, counters zeroed
    pub fn populate(&mut self) -> Result<()> {
        profiling::scope!("Breeder::populate");
        let target = self.require_target()?;
        let evolver = Evolver::new(Arc::clone(&self.settings), target)?;
        self.stop()?;
        self.install(evolver, Duration::ZERO);
        tracing::info!("populated fresh lineage");
        Ok(())
    }

    /// Spawn the worker. Populates first when no lineage exists; a no-op while running.
    pub fn start(&mut self, priority: WorkerPriority) -> Result<()> {
        if self.worker.is_some() {
            if self.shared.running.load(Ordering::Acquire) {
                return Ok(());
            }
            // worker ended on its own (failure); reap it before restarting
            self.stop()?;
        }
        if self.shared.head.read().is_none() {
            self.populate()?;
        }

        self.priority = priority;
        self.stop_flag.store(false, Ordering::Release);
        self.shared.running.store(true, Ordering::Release);
        *self.shared.failure.lock() = None;

        let engine = Arc::clone(&self.engine);
        let shared = Arc::clone(&self.shared);
        let stop = Arc::clone(&self.stop_flag);
        let events = self.events.clone();
        let log_every = self.settings.log_every;

        let spawned = thread::Builder::new()
            .name("breeder".to_owned())
            .spawn(move || run_worker(engine, shared, stop, events, log_every));
        match spawned {
            Ok(handle) => {
                self.worker = Some(handle);
                self.running_since = Some(Instant::now());
                tracing::info!(?priority, generation = self.generation(), "breeder started");
                Ok(())
            }
            Err(e) => {
                self.shared.running.store(false, Ordering::Release);
                Err(BreedError::InvalidState(format!("failed to spawn breeder thread: {e}")))
            }
        }
    }

    /// Request a stop and wait for the in-flight iteration to finish.
    pub fn stop(&mut self) -> Result<()> {
        let Some(handle) = self.worker.take() else {
            return Ok(());
        };
        self.stop_flag.store(true, Ordering::Release);
        let joined = handle.join();
        self.running_since = None;
        if joined.is_err() {
            self.shared.running.store(false, Ordering::Release);
            self.clear_lineage();
            return Err(BreedError::InvalidState("breeder thread panicked; lineage discarded".into()));
        }
        tracing::info!(generation = self.generation(), selected = self.selected(), "breeder stopped");
        Ok(())
    }

    /// back to Idle, discarding the lineage (the target is kept)
    pub fn reset(&mut self) -> Result<()> {
        self.stop()?;
        self.clear_lineage();
        tracing::info!("breeder reset");
        Ok(())
    }

    /// resume a lineage without mutation; fitness is recomputed against the current target
    pub fn assign_genome(&mut self, genome: Genome, generation: u64, selected: u64) -> Result<()> {
        let stats = LineageStats { generation, selected, ..Default::default() };
        self.assign_lineage(genome, stats)
    }

    /// Like `assign_genome`, also restoring elapsed time. Fails without touching
    /// the current lineage; restarts the worker if it was running.
    pub fn assign_lineage(&mut self, genome: Genome, stats: LineageStats) -> Result<()> {
        let target = self.require_target()?;
        let evolver = Evolver::resume(Arc::clone(&self.settings), target, genome, stats)?;
        let was_running = self.worker.is_some() && self.shared.running.load(Ordering::Acquire);
        self.stop()?;
        let elapsed = Duration::try_from_secs_f64(stats.elapsed_secs).unwrap_or_default();
        self.install(evolver, elapsed);
        tracing::info!(
            generation = stats.generation,
            selected = stats.selected,
            genes = self.current_genome().map_or(0, |g| g.len()),
            "lineage assigned"
        );
        if was_running {
            self.start(self.priority)?;
        }
        Ok(())
    }

    /// load a saved lineage from disk and assign it
    pub fn load_genome(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let saved = persistence::load(path)?;
        if saved.deltas != self.settings.deltas {
            tracing::info!(saved = ?saved.deltas, active = ?self.settings.deltas, "saved deltas differ from active settings");
        }
        self.assign_lineage(saved.genome, saved.stats)
    }

    /// the current lineage head as a saveable value
    pub fn lineage(&self) -> Option<SavedLineage> {
        let head = self.snapshot()?;
        let stats = LineageStats {
            generation: self.generation(),
            selected: head.selected,
            fitness: head.fitness,
            elapsed_secs: self.elapsed().as_secs_f64(),
        };
        Some(SavedLineage::now((*head.genome).clone(), stats, self.settings.deltas))
    }

    /// Save the lineage head. A failure is reported but leaves the worker running.
    pub fn save_lineage(&self, path: impl AsRef<Path>) -> Result<()> {
        let lineage = self
            .lineage()
            .ok_or_else(|| BreedError::InvalidState("no lineage to save".into()))?;
        persistence::save(path, &lineage)?;
        self.set_dirty(false);
        Ok(())
    }

    pub fn state(&self) -> BreederState {
        if self.shared.running.load(Ordering::Acquire) {
            BreederState::Running
        } else if self.shared.head.read().is_some() {
            BreederState::Stopped
        } else {
            BreederState::Idle
        }
    }

    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.shared.head.read().clone()
    }

    pub fn current_genome(&self) -> Option<Arc<Genome>> {
        self.snapshot().map(|s| Arc::clone(&s.genome))
    }

    pub fn current_image(&self) -> Option<Arc<Raster>> {
        self.snapshot().map(|s| Arc::clone(&s.image))
    }

    /// attempts so far, updated every iteration
    pub fn generation(&self) -> u64 {
        self.shared.generation.load(Ordering::Acquire)
    }

    pub fn selected(&self) -> u64 {
        self.snapshot().map_or(0, |s| s.selected)
    }

    pub fn fitness(&self) -> Option<u64> {
        self.snapshot().map(|s| s.fitness)
    }

    /// wall-clock time spent Running over the lineage's life
    pub fn elapsed(&self) -> Duration {
        let base = Duration::from_nanos(self.shared.elapsed_nanos.load(Ordering::Acquire));
        match self.running_since {
            Some(since) if self.shared.running.load(Ordering::Acquire) => base + since.elapsed(),
            _ => base,
        }
    }

    /// true once a candidate has been accepted since the last save
    pub fn is_dirty(&self) -> bool {
        self.shared.dirty.load(Ordering::Acquire)
    }

    pub fn set_dirty(&self, dirty: bool) {
        self.shared.dirty.store(dirty, Ordering::Release);
    }

    /// message of the error that ended the last run, if it failed
    pub fn last_failure(&self) -> Option<String> {
        self.shared.failure.lock().clone()
    }

    pub fn priority(&self) -> WorkerPriority {
        self.priority
    }

    fn require_target(&self) -> Result<Arc<Raster>> {
        self.target
            .clone()
            .ok_or_else(|| BreedError::InvalidState("no target image set".into()))
    }

    // caller guarantees the worker is joined
    fn install(&mut self, evolver: Evolver, elapsed: Duration) {
        let head = Arc::new(evolver.snapshot());
        self.shared.generation.store(evolver.generation(), Ordering::Release);
        *self.engine.lock() = Some(evolver);
        *self.shared.head.write() = Some(head);
        self.shared.elapsed_nanos.store(elapsed.as_nanos() as u64, Ordering::Release);
        self.shared.dirty.store(false, Ordering::Release);
        *self.shared.failure.lock() = None;
    }

    fn clear_lineage(&mut self) {
        *self.engine.lock() = None;
        *self.shared.head.write() = None;
        self.shared.generation.store(0, Ordering::Release);
        self.shared.elapsed_nanos.store(0, Ordering::Release);
        self.shared.dirty.store(false, Ordering::Release);
        *self.shared.failure.lock() = None;
    }
}

impl Drop for Breeder {
    fn drop(&mut self) {
        if let Some(handle) = self.worker.take() {
            self.stop_flag.store(true, Ordering::Release);
            let _ = handle.join();
        }
    }
}

fn run_worker(
    engine: Arc<Mutex<Option<Evolver>>>,
    shared: Arc<Shared>,
    stop: Arc<AtomicBool>,
    events: mpsc::Sender<BreederEvent>,
    log_every: u64,
) {
    let started = Instant::now();
    let mut slot = engine.lock();
    let reason = match slot.as_mut() {
        Some(evolver) => breed(evolver, &shared, &stop, &events, log_every),
        None => StopReason::Failed("no lineage to breed".into()),
    };
    let generation = slot.as_ref().map_or(0, |e| e.generation());
    drop(slot);

    shared
        .elapsed_nanos
        .fetch_add(started.elapsed().as_nanos() as u64, Ordering::AcqRel);
    if let StopReason::Failed(message) = &reason {
        tracing::error!(generation, %message, "breeder halted");
        *shared.failure.lock() = Some(message.clone());
    }
    shared.running.store(false, Ordering::Release);
    let _ = events.send(BreederEvent::Stopped { generation, reason });
}

fn breed(
    evolver: &mut Evolver,
    shared: &Shared,
    stop: &AtomicBool,
    events: &mpsc::Sender<BreederEvent>,
    log_every: u64,
) -> StopReason {
    while !stop.load(Ordering::Acquire) {
        match evolver.step() {
            Ok(Step::Accepted(snapshot)) => {
                *shared.head.write() = Some(Arc::clone(&snapshot));
                shared.dirty.store(true, Ordering::Release);
                if log_every > 0 && snapshot.selected % log_every == 0 {
                    tracing::debug!(
                        generation = snapshot.generation,
                        selected = snapshot.selected,
                        fitness = snapshot.fitness,
                        genes = snapshot.genome.len(),
                        points = snapshot.genome.point_count(),
                        "improved"
                    );
                }
                let _ = events.send(BreederEvent::Evolved(snapshot));
            }
            Ok(Step::Rejected { .. }) => {}
            Err(e) => return StopReason::Failed(e.to_string()),
        }
        let generation = evolver.generation();
        shared.generation.store(generation, Ordering::Release);
        let _ = events.send(BreederEvent::Progressed { generation });
    }
    StopReason::Requested
}
