//! Coordinate-hashed value noise.
//!
//! Every integer lattice point gets a reproducible value in `[0, 1]` drawn from
//! a [`TileRng`] seeded by the point's coordinates. Lattice values are smoothed
//! against their eight neighbours, bilinearly interpolated between lattice
//! points and summed over octaves so that neighbouring tiles correlate.

use serde::{Deserialize, Serialize};
use tileworld_core::{coord_rng, TileRng};

/// How an octave sum is mapped into `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseShaping {
    /// Raw octave sum, clamped. Sums above 1 saturate.
    Clamp,
    /// Sum divided by the total amplitude, stretched by the factor around
    /// 0.5, then clamped.
    Contrast(f64),
}

impl Default for NoiseShaping {
    fn default() -> Self {
        NoiseShaping::Contrast(3.0)
    }
}

/// Configuration for multi-octave noise generation.
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseConfig {
    /// Number of octaves (layers of detail)
    pub octaves: u32,
    /// Frequency multiplier between octaves
    pub lacunarity: f64,
    /// Amplitude multiplier between octaves (persistence)
    pub persistence: f64,
    /// Base frequency (scale)
    pub frequency: f64,
    /// Mapping of the octave sum into `[0, 1]`
    pub shaping: NoiseShaping,
    /// Seed for deterministic generation
    pub seed: u32,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            octaves: 3,
            lacunarity: 2.0,
            persistence: 0.5,
            frequency: 0.05,
            shaping: NoiseShaping::default(),
            seed: 0,
        }
    }
}

impl NoiseConfig {
    /// Large-scale channel deciding water, tree bands and outcrops.
    pub fn terrain(seed: u32) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Single-octave, higher-frequency channel used to break up the terrain bands.
    pub fn detail(seed: u32) -> Self {
        Self {
            octaves: 1,
            frequency: 0.1,
            seed: seed.wrapping_add(1000),
            ..Self::default()
        }
    }

    pub fn with_shaping(mut self, shaping: NoiseShaping) -> Self {
        self.shaping = shaping;
        self
    }
}

/// Value-noise sampler.
#[derive(Debug, Clone)]
pub struct ValueNoise {
    config: NoiseConfig,
}

impl ValueNoise {
    pub fn new(config: NoiseConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NoiseConfig {
        &self.config
    }

    /// Raw per-cell value in `[0, 1]`.
    pub fn lattice(&self, x: i32, y: i32) -> f64 {
        let mut rng: TileRng = coord_rng(self.config.seed, x, y);
        rng.unit()
    }

    /// Cell value blended with its neighbours: corners weigh 1/16 each,
    /// edge neighbours 1/8 each and the cell itself 1/4.
    pub fn smoothed(&self, x: i32, y: i32) -> f64 {
        let corners = (self.lattice(x - 1, y - 1)
            + self.lattice(x + 1, y - 1)
            + self.lattice(x - 1, y + 1)
            + self.lattice(x + 1, y + 1))
            / 16.0;
        let sides = (self.lattice(x - 1, y)
            + self.lattice(x + 1, y)
            + self.lattice(x, y - 1)
            + self.lattice(x, y + 1))
            / 8.0;
        let center = self.lattice(x, y) / 4.0;
        corners + sides + center
    }

    fn interpolated(&self, x: f64, y: f64) -> f64 {
        let x0 = x.floor();
        let y0 = y.floor();
        let tx = smoothstep(x - x0);
        let ty = smoothstep(y - y0);
        let (ix, iy) = (x0 as i32, y0 as i32);

        let v00 = self.smoothed(ix, iy);
        let v10 = self.smoothed(ix + 1, iy);
        let v01 = self.smoothed(ix, iy + 1);
        let v11 = self.smoothed(ix + 1, iy + 1);

        let top = lerp(v00, v10, tx);
        let bottom = lerp(v01, v11, tx);
        lerp(top, bottom, ty)
    }

    /// Octave sum at a world coordinate, shaped into `[0, 1]`.
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let mut value = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = self.config.frequency;
        let mut max_value = 0.0;

        for _ in 0..self.config.octaves {
            value += self.interpolated(x * frequency, y * frequency) * amplitude;
            max_value += amplitude;

            amplitude *= self.config.persistence;
            frequency *= self.config.lacunarity;
        }

        match self.config.shaping {
            NoiseShaping::Clamp => value.clamp(0.0, 1.0),
            NoiseShaping::Contrast(_) if max_value <= 0.0 => 0.0,
            NoiseShaping::Contrast(factor) => {
                ((value / max_value - 0.5) * factor + 0.5).clamp(0.0, 1.0)
            }
        }
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn smoothstep(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sampling_is_deterministic() {
        let a = ValueNoise::new(NoiseConfig::terrain(12345));
        let b = ValueNoise::new(NoiseConfig::terrain(12345));
        for i in -20..20 {
            let (x, y) = (i as f64 * 7.0, i as f64 * -3.0);
            assert_eq!(a.sample(x, y), b.sample(x, y));
        }
    }

    #[test]
    fn samples_stay_in_unit_range() {
        let noise = ValueNoise::new(NoiseConfig::terrain(99));
        for x in -50..50 {
            for y in -50..50 {
                let v = noise.sample(x as f64, y as f64);
                assert!((0.0..=1.0).contains(&v), "({x}, {y}) -> {v}");
            }
        }
    }

    #[test]
    fn smoothing_weights_sum_to_one() {
        // 4/16 + 4/8 + 1/4 == 1, so smoothing a constant field is the identity.
        let weights: f64 = 4.0 / 16.0 + 4.0 / 8.0 + 1.0 / 4.0;
        assert!((weights - 1.0).abs() < f64::EPSILON);
        let noise = ValueNoise::new(NoiseConfig::terrain(7));
        let v = noise.smoothed(3, 4);
        assert!((0.0..=1.0).contains(&v));
    }

    #[test]
    fn neighbouring_tiles_correlate() {
        let noise = ValueNoise::new(NoiseConfig::terrain(2024));
        let mut neighbour_delta = 0.0;
        let mut far_delta = 0.0;
        for i in 0..200 {
            let x = i as f64 * 13.0;
            let y = i as f64 * 5.0;
            neighbour_delta += (noise.sample(x, y) - noise.sample(x + 1.0, y)).abs();
            far_delta += (noise.sample(x, y) - noise.sample(x + 97.0, y + 61.0)).abs();
        }
        assert!(
            neighbour_delta < far_delta,
            "neighbours {neighbour_delta} vs far {far_delta}"
        );
    }

    #[test]
    fn clamp_keeps_the_raw_sum() {
        // One octave has a total amplitude of 1, so an unstretched contrast
        // and a plain clamp agree everywhere.
        let single = NoiseConfig {
            octaves: 1,
            ..NoiseConfig::terrain(31)
        };
        let clamp = ValueNoise::new(single.clone().with_shaping(NoiseShaping::Clamp));
        let flat = ValueNoise::new(single.with_shaping(NoiseShaping::Contrast(1.0)));
        for i in -30..30 {
            let (x, y) = (i as f64 * 3.0, i as f64 * 11.0);
            assert!((clamp.sample(x, y) - flat.sample(x, y)).abs() < 1e-12);
        }
    }

    #[test]
    fn clamped_octave_sums_skew_high() {
        // Three octaves sum to at most 1.75, so the raw clamp reads brighter
        // on average than the normalized default.
        let raw = ValueNoise::new(NoiseConfig::terrain(8).with_shaping(NoiseShaping::Clamp));
        let normalized = ValueNoise::new(NoiseConfig {
            shaping: NoiseShaping::Contrast(1.0),
            ..NoiseConfig::terrain(8)
        });
        let (mut raw_sum, mut norm_sum) = (0.0, 0.0);
        for x in 0..40 {
            for y in 0..40 {
                raw_sum += raw.sample(x as f64, y as f64);
                norm_sum += normalized.sample(x as f64, y as f64);
            }
        }
        assert!(raw_sum > norm_sum, "raw {raw_sum} vs normalized {norm_sum}");
    }

    #[test]
    fn detail_channel_uses_offset_seed() {
        let terrain = NoiseConfig::terrain(5);
        let detail = NoiseConfig::detail(5);
        assert_ne!(terrain.seed, detail.seed);
        assert_eq!(detail.octaves, 1);
    }
}
