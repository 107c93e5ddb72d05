//! Multi-octave Perlin sampling remapped to `[0, 1]`.

use noise::{NoiseFn, Perlin};

/// A seeded Perlin source summed over octaves.
///
/// Each octave doubles the frequency and scales the amplitude by
/// `persistence`. The sum is remapped from `[-1, 1]` to `[0, 1]` and clamped.
#[derive(Clone, Debug)]
pub struct OctaveNoise {
    perlin: Perlin,
}

impl OctaveNoise {
    pub fn new(seed: u32) -> Self {
        Self {
            perlin: Perlin::new(seed),
        }
    }

    /// Samples `octaves` layers at `(x, y)`, returning a value in `[0, 1]`.
    pub fn sample_01(&self, x: f64, y: f64, octaves: u32, persistence: f64) -> f64 {
        let mut total = 0.0;
        let mut frequency = 1.0;
        let mut amplitude = 1.0;

        for _ in 0..octaves {
            total += self.perlin.get([x * frequency, y * frequency]) * amplitude;
            frequency *= 2.0;
            amplitude *= persistence;
        }

        (total * 0.5 + 0.5).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_in_unit_range() {
        let noise = OctaveNoise::new(17);
        for i in 0..200 {
            let x = i as f64 * 0.37;
            let v = noise.sample_01(x, x * 1.7, 4, 0.5);
            assert!((0.0..=1.0).contains(&v), "{v} out of range");
        }
    }

    #[test]
    fn test_deterministic_per_seed() {
        let a = OctaveNoise::new(5);
        let b = OctaveNoise::new(5);
        for i in 0..50 {
            let x = i as f64 * 0.13;
            assert_eq!(a.sample_01(x, -x, 3, 0.5), b.sample_01(x, -x, 3, 0.5));
        }
    }

    #[test]
    fn test_zero_octaves_is_midpoint() {
        let noise = OctaveNoise::new(1);
        assert_eq!(noise.sample_01(3.3, 4.4, 0, 0.5), 0.5);
    }
}
