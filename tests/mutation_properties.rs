use polybreed::{BreederSettings, Gene, Genome, RandomSource};
use proptest::prelude::*;

fn settings_strategy() -> impl Strategy<Value = BreederSettings> {
    (
        0usize..4,
        0usize..12,
        3usize..6,
        0usize..6,
        0u8..120,
        0u8..135,
        2u32..6,
        proptest::option::of(2u32..6),
    )
        .prop_map(
            |(min_genes, extra_genes, min_points, extra_points, min_alpha, extra_alpha, rate, splice)| {
                BreederSettings {
                    gene_emergence_rate: rate,
                    gene_kill_rate: rate,
                    gene_move_rate: rate,
                    point_emergence_rate: rate,
                    point_kill_rate: rate,
                    point_jitter_rate: rate,
                    color_jitter_rate: rate,
                    min_genes,
                    max_genes: min_genes + extra_genes,
                    min_points_per_gene: min_points,
                    max_points_per_gene: min_points + extra_points,
                    min_alpha,
                    max_alpha: min_alpha + extra_alpha,
                    splice_rate: splice,
                    ..Default::default()
                }
            },
        )
}

fn starting_genome(settings: &BreederSettings, rng: &mut RandomSource) -> Genome {
    let genes = (0..settings.min_genes)
        .map(|_| Gene::random(settings, rng).unwrap())
        .collect();
    Genome::from_genes(32, 24, genes).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_bounds_hold_after_any_number_of_passes(
        settings in settings_strategy(),
        seed in any::<u64>(),
        passes in 1usize..300,
    ) {
        prop_assert!(settings.validate().is_ok());
        let mut rng = RandomSource::new(seed);
        let mut genome = starting_genome(&settings, &mut rng);

        for _ in 0..passes {
            genome.mutate(&settings, &mut rng).unwrap();
            prop_assert!(genome.len() >= settings.min_genes);
            prop_assert!(genome.len() <= settings.max_genes);
            for gene in &genome.genes {
                prop_assert!(gene.vertices.len() >= settings.min_points_per_gene);
                prop_assert!(gene.vertices.len() <= settings.max_points_per_gene);
                prop_assert!(gene.color.a >= settings.min_alpha);
                prop_assert!(gene.color.a <= settings.max_alpha);
                for &(x, y) in &gene.vertices {
                    prop_assert!((0.0..=1.0).contains(&x) && (0.0..=1.0).contains(&y));
                }
            }
        }
    }

    #[test]
    fn test_blank_genome_reaches_bounds_after_first_pass(
        settings in settings_strategy(),
        seed in any::<u64>(),
        passes in 1usize..100,
    ) {
        let mut rng = RandomSource::new(seed);
        let mut genome = Genome::new_blank(32, 24).unwrap();

        for _ in 0..passes {
            genome.mutate(&settings, &mut rng).unwrap();
            prop_assert!(genome.len() >= settings.min_genes);
            prop_assert!(genome.len() <= settings.max_genes);
            for gene in &genome.genes {
                prop_assert!(gene.vertices.len() >= settings.min_points_per_gene);
                prop_assert!(gene.vertices.len() <= settings.max_points_per_gene);
                prop_assert!(gene.color.a >= settings.min_alpha);
                prop_assert!(gene.color.a <= settings.max_alpha);
            }
        }
    }

    #[test]
    fn test_same_seed_same_genome(seed in any::<u64>(), passes in 1usize..150) {
        let settings = BreederSettings {
            gene_emergence_rate: 3,
            min_genes: 0,
            ..Default::default()
        };
        let run = || {
            let mut rng = RandomSource::new(seed);
            let mut genome = Genome::new_blank(16, 16).unwrap();
            for _ in 0..passes {
                genome.mutate(&settings, &mut rng).unwrap();
            }
            genome
        };
        prop_assert_eq!(run(), run());
    }

    #[test]
    fn test_jitter_stays_in_bounds(
        seed in any::<u64>(),
        center in -10.0f64..10.0,
        spread in 0.0f64..5.0,
    ) {
        let mut rng = RandomSource::new(seed);
        for _ in 0..50 {
            let v = rng.jitter_real(center, spread, -1.0, 1.0);
            prop_assert!((-1.0..=1.0).contains(&v));
        }
    }
}
