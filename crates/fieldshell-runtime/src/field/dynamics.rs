//! Per-tick field evolution and the emergence score.
//!
//! | Quantity | Update |
//! |----------|--------|
//! | energy | `energy × (1 − decay_rate)` |
//! | coherence | `× 0.99` above 0.9, `× 1.01` below 0.3 |
//! | entropy | `+ U[−0.01, 0.01]`, clamped to `[0, 1]` |
//! | temperature | `0.5 + 0.5·entropy + U[−0.05, 0.05]`, clamped to `[0.1, 2.0]` |
//!
//! The random source is a parameter so ticks can be replayed from a seed.

use super::{Field, MAX_TEMPERATURE, MIN_TEMPERATURE};
use rand::Rng;

const ENTROPY_STEP: f64 = 0.01;
const TEMPERATURE_JITTER: f64 = 0.05;

/// Evolves one field by one tick.
///
/// Does not touch `version`; callers apply this inside a store mutation.
pub fn evolve<R: Rng + ?Sized>(field: &mut Field, decay_rate: f64, rng: &mut R) {
    field.energy *= 1.0 - decay_rate;

    if field.coherence > 0.9 {
        field.coherence *= 0.99;
    } else if field.coherence < 0.3 {
        field.coherence *= 1.01;
    }

    field.entropy = (field.entropy + rng.gen_range(-ENTROPY_STEP..=ENTROPY_STEP)).clamp(0.0, 1.0);

    let jitter = rng.gen_range(-TEMPERATURE_JITTER..=TEMPERATURE_JITTER);
    field.temperature = (0.5 + 0.5 * field.entropy + jitter).clamp(MIN_TEMPERATURE, MAX_TEMPERATURE);

    field.clamp();
}

/// Weighted combination of coherence, energy, entropy and attractor strength.
#[must_use]
pub fn emergence_score(field: &Field) -> f64 {
    0.4 * field.coherence
        + 0.3 * (field.energy / 10.0).min(1.0)
        + 0.2 * field.entropy
        + 0.1 * field.mean_attractor_strength().min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{Attractor, AttractorType, FieldSeed};
    use fieldshell_types::FieldId;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn field(seed: FieldSeed) -> Field {
        Field::from_seed(FieldId::new(), seed)
    }

    #[test]
    fn energy_decays() {
        let mut f = field(FieldSeed::new().energy(10.0));
        evolve(&mut f, 0.1, &mut StdRng::seed_from_u64(1));
        assert!((f.energy - 9.0).abs() < 1e-9);
    }

    #[test]
    fn coherence_reverts_toward_middle() {
        let mut high = field(FieldSeed::new().coherence(0.95));
        evolve(&mut high, 0.0, &mut StdRng::seed_from_u64(2));
        assert!((high.coherence - 0.95 * 0.99).abs() < 1e-12);

        let mut low = field(FieldSeed::new().coherence(0.2));
        evolve(&mut low, 0.0, &mut StdRng::seed_from_u64(3));
        assert!((low.coherence - 0.2 * 1.01).abs() < 1e-12);

        let mut mid = field(FieldSeed::new().coherence(0.6));
        evolve(&mut mid, 0.0, &mut StdRng::seed_from_u64(4));
        assert!((mid.coherence - 0.6).abs() < 1e-12);
    }

    #[test]
    fn temperature_tracks_entropy() {
        let mut f = field(FieldSeed::new().entropy(0.5));
        evolve(&mut f, 0.0, &mut StdRng::seed_from_u64(5));
        let expected = 0.5 + 0.5 * f.entropy;
        assert!((f.temperature - expected).abs() <= TEMPERATURE_JITTER + 1e-12);
    }

    #[test]
    fn seeded_ticks_replay() {
        let mut a = field(FieldSeed::new());
        let mut b = a.clone();
        let mut rng_a = StdRng::seed_from_u64(42);
        let mut rng_b = StdRng::seed_from_u64(42);
        for _ in 0..10 {
            evolve(&mut a, 0.01, &mut rng_a);
            evolve(&mut b, 0.01, &mut rng_b);
        }
        assert_eq!(a, b);
    }

    #[test]
    fn score_components() {
        let f = field(
            FieldSeed::new()
                .coherence(1.0)
                .energy(20.0)
                .entropy(1.0)
                .attractor(Attractor::new(AttractorType::Point, 3.0)),
        );
        assert!((emergence_score(&f) - 1.0).abs() < 1e-12);

        let f = field(FieldSeed::new().coherence(0.0).energy(0.0).entropy(0.0));
        assert_eq!(emergence_score(&f), 0.0);
    }

    mod proptest_dynamics {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn ticks_preserve_invariants(
                energy in 0.0f64..1000.0,
                coherence in 0.0f64..=1.0,
                entropy in 0.0f64..=1.0,
                temperature in 0.1f64..=2.0,
                decay in 0.0f64..=1.0,
                ticks in 1usize..200,
                seed in any::<u64>(),
            ) {
                let mut f = field(
                    FieldSeed::new()
                        .energy(energy)
                        .coherence(coherence)
                        .entropy(entropy)
                        .temperature(temperature),
                );
                let mut rng = StdRng::seed_from_u64(seed);
                for _ in 0..ticks {
                    evolve(&mut f, decay, &mut rng);
                    prop_assert!(f.energy >= 0.0);
                    prop_assert!((0.0..=1.0).contains(&f.coherence));
                    prop_assert!((0.0..=1.0).contains(&f.entropy));
                    prop_assert!((MIN_TEMPERATURE..=MAX_TEMPERATURE).contains(&f.temperature));
                    let score = emergence_score(&f);
                    prop_assert!((0.0..=1.0 + 1e-12).contains(&score));
                }
            }
        }
    }
}
