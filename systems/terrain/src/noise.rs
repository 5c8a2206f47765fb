use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Coherent two-dimensional noise field.
pub trait NoiseSource {
    /// Samples the field at the provided point. Values fall roughly in `[-1, 1]`.
    fn sample(&self, x: f64, z: f64) -> f64;
}

impl<N: NoiseSource + ?Sized> NoiseSource for &N {
    fn sample(&self, x: f64, z: f64) -> f64 {
        (**self).sample(x, z)
    }
}

const GRADIENTS: [(f64, f64); 12] = [
    (1.0, 1.0),
    (-1.0, 1.0),
    (1.0, -1.0),
    (-1.0, -1.0),
    (1.0, 0.0),
    (-1.0, 0.0),
    (1.0, 0.0),
    (-1.0, 0.0),
    (0.0, 1.0),
    (0.0, -1.0),
    (0.0, 1.0),
    (0.0, -1.0),
];

// Skew and unskew factors for the 2D simplex lattice: (sqrt(3) - 1) / 2 and (3 - sqrt(3)) / 6.
const SKEW: f64 = 0.366_025_403_784_438_6;
const UNSKEW: f64 = 0.211_324_865_405_187_1;

/// Seeded 2D simplex noise.
///
/// The permutation table is shuffled by a ChaCha stream seeded from the
/// provided value, so equal seeds always produce equal fields.
#[derive(Clone)]
pub struct SimplexNoise {
    seed: u64,
    permutation: [u8; 512],
}

impl SimplexNoise {
    /// Builds the noise field for the provided seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        let mut table: Vec<u8> = (0..=u8::MAX).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        table.shuffle(&mut rng);

        let mut permutation = [0_u8; 512];
        for (index, slot) in permutation.iter_mut().enumerate() {
            *slot = table[index % table.len()];
        }
        Self { seed, permutation }
    }

    /// Seed the field was built from.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    fn gradient(&self, i: usize, j: usize) -> (f64, f64) {
        let hashed = self.permutation[i + usize::from(self.permutation[j])];
        GRADIENTS[usize::from(hashed) % GRADIENTS.len()]
    }
}

impl std::fmt::Debug for SimplexNoise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimplexNoise")
            .field("seed", &self.seed)
            .finish_non_exhaustive()
    }
}

impl NoiseSource for SimplexNoise {
    fn sample(&self, x: f64, z: f64) -> f64 {
        let skew = (x + z) * SKEW;
        let i = (x + skew).floor();
        let j = (z + skew).floor();
        let unskew = (i + j) * UNSKEW;
        let x0 = x - (i - unskew);
        let z0 = z - (j - unskew);

        let (i1, j1) = if x0 > z0 { (1, 0) } else { (0, 1) };
        let x1 = x0 - f64::from(i1) + UNSKEW;
        let z1 = z0 - f64::from(j1) + UNSKEW;
        let x2 = x0 - 1.0 + 2.0 * UNSKEW;
        let z2 = z0 - 1.0 + 2.0 * UNSKEW;

        let ii = lattice_index(i);
        let jj = lattice_index(j);
        let i1 = i1 as usize;
        let j1 = j1 as usize;

        let corners = [
            (x0, z0, self.gradient(ii, jj)),
            (x1, z1, self.gradient(ii + i1, jj + j1)),
            (x2, z2, self.gradient(ii + 1, jj + 1)),
        ];

        let total: f64 = corners
            .into_iter()
            .map(|(dx, dz, (gx, gz))| {
                let falloff = 0.5 - dx * dx - dz * dz;
                if falloff < 0.0 {
                    0.0
                } else {
                    let squared = falloff * falloff;
                    squared * squared * (gx * dx + gz * dz)
                }
            })
            .sum();

        70.0 * total
    }
}

fn lattice_index(value: f64) -> usize {
    // rem_euclid keeps negative lattice points inside the table.
    (value.rem_euclid(256.0)) as usize & 0xff
}

#[cfg(test)]
mod tests {
    use super::{NoiseSource, SimplexNoise};

    #[test]
    fn equal_seeds_produce_equal_fields() {
        let first = SimplexNoise::new(17);
        let second = SimplexNoise::new(17);
        for step in 0..32 {
            let x = f64::from(step) * 0.37;
            let z = f64::from(step) * -0.61;
            assert_eq!(first.sample(x, z), second.sample(x, z));
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let first = SimplexNoise::new(1);
        let second = SimplexNoise::new(2);
        let differs = (0..64).any(|step| {
            let x = f64::from(step) * 0.29 + 0.1;
            first.sample(x, x * 0.5) != second.sample(x, x * 0.5)
        });
        assert!(differs);
    }

    #[test]
    fn samples_stay_near_unit_range() {
        let noise = SimplexNoise::new(99);
        for x in -20..20 {
            for z in -20..20 {
                let value = noise.sample(f64::from(x) * 0.13, f64::from(z) * 0.17);
                assert!(value.is_finite());
                assert!(value.abs() <= 1.0 + 1e-6, "sample {value} out of range");
            }
        }
    }

    #[test]
    fn lattice_points_are_zero() {
        let noise = SimplexNoise::new(5);
        assert_eq!(noise.sample(0.0, 0.0), 0.0);
    }
}
