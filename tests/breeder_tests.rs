use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use polybreed::{
    BreedError, Breeder, BreederEvent, BreederSettings, BreederState, Color, Gene, Genome, Raster,
    StopReason, WorkerPriority,
};

fn black(w: u32, h: u32) -> Raster {
    let data = [0u8, 0, 0, 255].repeat((w * h) as usize);
    Raster::from_straight(w, h, &data).unwrap()
}

fn gradient(w: u32, h: u32) -> Raster {
    let mut data = Vec::with_capacity((w * h * 4) as usize);
    for y in 0..h {
        for x in 0..w {
            data.extend_from_slice(&[(x * 255 / w) as u8, (y * 255 / h) as u8, 128, 255]);
        }
    }
    Raster::from_straight(w, h, &data).unwrap()
}

fn wait_for(rx: &Receiver<BreederEvent>, done: impl Fn(&BreederEvent) -> bool) -> Vec<BreederEvent> {
    let deadline = Instant::now() + Duration::from_secs(20);
    let mut seen = Vec::new();
    while Instant::now() < deadline {
        if let Ok(event) = rx.recv_timeout(Duration::from_millis(50)) {
            let stop = done(&event);
            seen.push(event);
            if stop {
                break;
            }
        }
    }
    seen
}

#[test]
fn test_single_opaque_gene_matches_black_target() {
    let settings = BreederSettings { max_alpha: 255, min_alpha: 255, ..Default::default() };
    let (mut breeder, _rx) = Breeder::new(settings).unwrap();
    breeder.set_target_image(black(2, 2)).unwrap();
    breeder.populate().unwrap();
    // an empty genome already renders black
    assert_eq!(breeder.fitness(), Some(0));

    let square = Gene::new(
        vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)],
        Color::rgba(0, 0, 0, 255),
    );
    breeder
        .assign_genome(Genome::from_genes(2, 2, vec![square]).unwrap(), 1, 1)
        .unwrap();
    assert_eq!(breeder.fitness(), Some(0));
    assert_eq!((breeder.generation(), breeder.selected()), (1, 1));
}

#[test]
fn test_run_improves_and_reports_in_order() {
    let settings = BreederSettings { gene_emergence_rate: 4, min_genes: 0, seed: 7, ..Default::default() };
    let (mut breeder, rx) = Breeder::new(settings).unwrap();
    breeder.set_target_image(gradient(24, 24)).unwrap();
    breeder.populate().unwrap();
    let initial = breeder.fitness().unwrap();

    breeder.start(WorkerPriority::Inherit).unwrap();
    let mut events = wait_for(&rx, |e| matches!(e, BreederEvent::Evolved(s) if s.fitness < initial));
    breeder.stop().unwrap();
    events.extend(rx.try_iter());

    let mut last_fitness = initial;
    let mut last_evolved_generation = 0;
    let mut last_progress = 0;
    for event in &events {
        match event {
            BreederEvent::Evolved(s) => {
                assert!(s.fitness <= last_fitness);
                assert!(s.generation > last_evolved_generation);
                assert!(s.selected <= s.generation);
                last_fitness = s.fitness;
                last_evolved_generation = s.generation;
            }
            BreederEvent::Progressed { generation } => {
                assert!(*generation > last_progress);
                last_progress = *generation;
            }
            BreederEvent::Stopped { reason, .. } => assert_eq!(*reason, StopReason::Requested),
        }
    }
    assert!(matches!(events.last(), Some(BreederEvent::Stopped { .. })));
    assert!(breeder.fitness().unwrap() < initial);
    assert!(breeder.is_dirty());
}

#[test]
fn test_save_and_load_through_breeder() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.json");
    let settings = BreederSettings { gene_emergence_rate: 3, min_genes: 0, ..Default::default() };

    let (mut first, _rx) = Breeder::new(settings.clone()).unwrap();
    first.set_target_image(gradient(16, 16)).unwrap();
    first.start(WorkerPriority::Inherit).unwrap();
    let deadline = Instant::now() + Duration::from_secs(20);
    while first.selected() < 5 && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
    }
    first.stop().unwrap();
    first.save_lineage(&path).unwrap();
    assert!(!first.is_dirty());

    let (mut second, _rx2) = Breeder::new(settings).unwrap();
    second.set_target_image(gradient(16, 16)).unwrap();
    second.load_genome(&path).unwrap();
    assert_eq!(second.state(), BreederState::Stopped);
    assert_eq!(second.generation(), first.generation());
    assert_eq!(second.selected(), first.selected());
    assert_eq!(second.fitness(), first.fitness());
    assert_eq!(*second.current_genome().unwrap(), *first.current_genome().unwrap());
    assert!(first.elapsed() > Duration::ZERO);
    let drift = (second.elapsed().as_secs_f64() - first.elapsed().as_secs_f64()).abs();
    assert!(drift < 1e-6, "elapsed {:?} vs {:?}", second.elapsed(), first.elapsed());
}

#[test]
fn test_out_of_bounds_lineage_rejected_without_side_effects() {
    let settings = BreederSettings { min_genes: 0, ..Default::default() };
    let (mut breeder, _rx) = Breeder::new(settings).unwrap();
    breeder.set_target_image(black(4, 4)).unwrap();
    breeder.populate().unwrap();
    let before = breeder.snapshot().unwrap();

    let opaque = Gene::new(vec![(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)], Color::rgba(9, 9, 9, 255));
    let genome = Genome::from_genes(4, 4, vec![opaque]).unwrap();
    assert!(matches!(breeder.assign_genome(genome, 10, 3), Err(BreedError::InvalidState(_))));

    let after = breeder.snapshot().unwrap();
    assert!(std::sync::Arc::ptr_eq(&before, &after));
    assert_eq!(breeder.generation(), 0);
}

#[test]
fn test_failed_load_keeps_lineage() {
    let dir = tempfile::tempdir().unwrap();
    let (mut breeder, _rx) = Breeder::new(BreederSettings::default()).unwrap();
    breeder.set_target_image(black(4, 4)).unwrap();
    breeder.populate().unwrap();
    let before = breeder.snapshot().unwrap();

    let bad = dir.path().join("bad.json");
    std::fs::write(&bad, "not json").unwrap();
    assert!(matches!(breeder.load_genome(&bad), Err(BreedError::Parse(_))));
    assert!(matches!(
        breeder.load_genome(dir.path().join("x.bmp")),
        Err(BreedError::UnsupportedFormat(_))
    ));

    let after = breeder.snapshot().unwrap();
    assert!(std::sync::Arc::ptr_eq(&before, &after));
}

#[test]
fn test_new_target_returns_to_idle() {
    let (mut breeder, _rx) = Breeder::new(BreederSettings::default()).unwrap();
    breeder.set_target_image(black(4, 4)).unwrap();
    breeder.start(WorkerPriority::High).unwrap();
    breeder.set_target_image(black(8, 8)).unwrap();
    assert_eq!(breeder.state(), BreederState::Idle);
    breeder.populate().unwrap();
    assert_eq!(breeder.current_image().unwrap().width(), 8);
}

#[test]
fn test_invalid_settings_rejected() {
    let settings = BreederSettings { point_kill_rate: 1, ..Default::default() };
    assert!(matches!(Breeder::new(settings), Err(BreedError::InvalidConfiguration(_))));
}
