use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use polybreed::{fitness, BreederSettings, CpuRenderer, Evolver, Genome, Raster, RandomSource};
use std::sync::Arc;

fn gradient(w: u32, h: u32) -> Raster {
    let mut data = Vec::with_capacity((w * h * 4) as usize);
    for y in 0..h {
        for x in 0..w {
            data.extend_from_slice(&[(x * 255 / w) as u8, (y * 255 / h) as u8, 90, 255]);
        }
    }
    Raster::from_straight(w, h, &data).unwrap()
}

fn genome(w: u32, h: u32, genes: usize) -> Genome {
    let settings = BreederSettings { gene_emergence_rate: 2, max_genes: genes, ..Default::default() };
    let mut rng = RandomSource::new(1);
    let mut genome = Genome::new_blank(w, h).unwrap();
    while genome.len() < genes {
        genome.mutate(&settings, &mut rng).unwrap();
    }
    genome
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    for genes in [50usize, 200] {
        let g = genome(256, 256, genes);
        group.throughput(Throughput::Elements(genes as u64));
        for aa in [false, true] {
            let renderer = CpuRenderer::new(aa);
            group.bench_with_input(
                BenchmarkId::new(if aa { "aa" } else { "no_aa" }, genes),
                &g,
                |b, g| b.iter(|| renderer.render(black_box(g)).unwrap()),
            );
        }
    }
    group.finish();
}

fn bench_score(c: &mut Criterion) {
    let mut group = c.benchmark_group("score");
    for size in [128u32, 512] {
        let target = gradient(size, size);
        let rendered = CpuRenderer::new(true).render(&genome(size, size, 100)).unwrap();
        group.throughput(Throughput::Bytes((size * size * 4) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| fitness::score(black_box(&rendered), black_box(&target)).unwrap())
        });
    }
    group.finish();
}

fn bench_step(c: &mut Criterion) {
    let settings = Arc::new(BreederSettings::default());
    let target = Arc::new(gradient(128, 128));
    let mut evolver = Evolver::new(settings, target).unwrap();
    c.bench_function("evolver_step_128", |b| b.iter(|| evolver.step().unwrap()));
}

criterion_group!(benches, bench_render, bench_score, bench_step);
criterion_main!(benches);
