use rand::distributions::{Distribution, Uniform};
use rand::Rng;

use crate::config::SphereSpec;

/// Flat position buffer of the particle field.
///
/// Holds `count` scalars, each drawn independently from
/// `Uniform(-scale/2, scale/2)`. The buffer is read as xyz triples, so the
/// field draws `count / 3` points.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleField {
    pub positions: Vec<f32>,
}

impl ParticleField {
    pub fn sample<R: Rng + ?Sized>(count: usize, scale: f32, rng: &mut R) -> Self {
        let half = scale / 2.0;
        let dist = Uniform::new_inclusive(-half, half);
        let positions = (0..count).map(|_| dist.sample(rng)).collect();
        Self { positions }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Number of whole xyz triples in the buffer.
    pub fn point_count(&self) -> usize {
        self.positions.len() / 3
    }
}

/// Index of a geometry owned by the scene graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeometryId(pub usize);

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Sphere(SphereSpec),
    Particles(ParticleField),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn buffer_length_equals_requested_count() {
        let mut rng = SmallRng::seed_from_u64(1);
        let field = ParticleField::sample(15_000, 25.0, &mut rng);
        assert_eq!(field.len(), 15_000);
        assert_eq!(field.point_count(), 5_000);
    }

    #[test]
    fn samples_stay_in_range_and_center_on_zero() {
        let mut rng = SmallRng::seed_from_u64(7);
        let field = ParticleField::sample(60_000, 25.0, &mut rng);
        assert!(field.positions.iter().all(|v| (-12.5..=12.5).contains(v)));

        let mean = field.positions.iter().map(|&v| v as f64).sum::<f64>() / field.len() as f64;
        assert!(mean.abs() < 0.15, "mean = {mean}");

        // Uniform(-a, a) has variance a^2 / 3.
        let var = field.positions.iter().map(|&v| (v as f64 - mean).powi(2)).sum::<f64>()
            / field.len() as f64;
        let expected = 12.5f64.powi(2) / 3.0;
        assert!((var - expected).abs() / expected < 0.05, "var = {var}");
    }

    #[test]
    fn samples_cover_both_halves() {
        let mut rng = SmallRng::seed_from_u64(3);
        let field = ParticleField::sample(1_000, 2.0, &mut rng);
        assert!(field.positions.iter().any(|&v| v < -0.9));
        assert!(field.positions.iter().any(|&v| v > 0.9));
    }

    #[test]
    fn same_seed_same_field() {
        let a = ParticleField::sample(30, 4.0, &mut SmallRng::seed_from_u64(9));
        let b = ParticleField::sample(30, 4.0, &mut SmallRng::seed_from_u64(9));
        assert_eq!(a, b);
    }
}
