//! Multi-octave fractal noise with per-octave shaping transforms.
//!
//! Samples are taken on a torus embedded in 4D so the result tiles
//! seamlessly on both axes of the wraparound grid.

use serde::{Deserialize, Serialize};
use simdnoise::NoiseBuilder;
use std::f32::consts::TAU;

/// Transform applied to noise samples.
///
/// `pre` runs on each raw octave sample in [-1, 1]; `post` runs on the
/// normalized octave sum. Ridged and billowed terrain fall out of the same
/// fBm loop with different shaping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Shaping {
    /// Pass the sample through untouched.
    Identity,
    /// `1 - |v|`: sharp ridge lines.
    Ridged,
    /// `|v|`: soft rounded lobes.
    Billow,
    /// `v * |v|`: flattens low values, keeps sign.
    Squared,
}

impl Shaping {
    /// Applies the transform to a single sample.
    pub fn apply(self, v: f32) -> f32 {
        match self {
            Shaping::Identity => v,
            Shaping::Ridged => 1.0 - v.abs(),
            Shaping::Billow => v.abs(),
            Shaping::Squared => v * v.abs(),
        }
    }
}

/// Configuration for one fractal noise layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoiseLayer {
    /// Number of octaves (4-8 typical).
    pub octaves: u8,
    /// Base frequency in torus revolutions.
    pub frequency: f32,
    /// Output scale of this layer.
    pub amplitude: f32,
    /// Frequency multiplier per octave (typically 2.0).
    pub lacunarity: f32,
    /// Amplitude decay per octave (0.4-0.6 typical).
    pub persistence: f32,
    /// Transform applied to each raw octave sample.
    pub pre: Shaping,
    /// Transform applied to the normalized octave sum.
    pub post: Shaping,
}

impl Default for NoiseLayer {
    fn default() -> Self {
        Self {
            octaves: 6,
            frequency: 2.0,
            amplitude: 1.0,
            lacunarity: 2.0,
            persistence: 0.5,
            pre: Shaping::Identity,
            post: Shaping::Identity,
        }
    }
}

impl NoiseLayer {
    /// Sharp-crested mountain layer.
    pub fn ridged_mountains() -> Self {
        Self {
            octaves: 5,
            frequency: 1.5,
            amplitude: 1.0,
            persistence: 0.45,
            pre: Shaping::Ridged,
            ..Default::default()
        }
    }

    /// Gentle rolling-hill layer, used as a lower-amplitude second pass.
    pub fn billowed_hills() -> Self {
        Self {
            octaves: 4,
            frequency: 4.0,
            amplitude: 0.35,
            persistence: 0.55,
            pre: Shaping::Billow,
            ..Default::default()
        }
    }
}

/// Samples one noise layer at `(u, v)` in [0, 1) torus coordinates.
///
/// The point is lifted onto a torus in 4D (`cos u, sin u, cos v, sin v`)
/// before sampling, which makes the field periodic in both axes without UV
/// seams. Each octave gets a different seed offset for variation.
pub fn sample_torus_noise(u: f32, v: f32, layer: &NoiseLayer, seed: i32) -> f32 {
    let (su, cu) = (u * TAU).sin_cos();
    let (sv, cv) = (v * TAU).sin_cos();

    let mut total = 0.0f32;
    let mut amplitude = 1.0f32;
    let mut frequency = layer.frequency;
    let mut max_amplitude = 0.0f32;

    for octave in 0..layer.octaves {
        let octave_seed = seed.wrapping_add(octave as i32 * 31337);

        let x = cu * frequency;
        let y = su * frequency;
        let z = cv * frequency;
        let w = sv * frequency;

        let raw = NoiseBuilder::fbm_4d_offset(x, 1, y, 1, z, 1, w, 1)
            .with_seed(octave_seed)
            .with_freq(1.0)
            .with_octaves(1)
            .generate()
            .0[0];

        total += layer.pre.apply(raw) * amplitude;
        max_amplitude += amplitude;
        amplitude *= layer.persistence;
        frequency *= layer.lacunarity;
    }

    layer.post.apply(total / max_amplitude) * layer.amplitude
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noise_reproducibility() {
        let layer = NoiseLayer::default();
        let a = sample_torus_noise(0.31, 0.77, &layer, 12345);
        let b = sample_torus_noise(0.31, 0.77, &layer, 12345);
        assert_eq!(a, b, "Same seed and position should produce same result");
    }

    #[test]
    fn test_noise_tiles_on_both_axes() {
        let layer = NoiseLayer::default();
        for &(u, v) in &[(0.1, 0.2), (0.9, 0.4), (0.5, 0.99)] {
            let base = sample_torus_noise(u, v, &layer, 7);
            let wrapped_u = sample_torus_noise(u + 1.0, v, &layer, 7);
            let wrapped_v = sample_torus_noise(u, v + 1.0, &layer, 7);
            assert!(
                (base - wrapped_u).abs() < 1e-4 && (base - wrapped_v).abs() < 1e-4,
                "Noise should tile at ({}, {}): {} vs {} / {}",
                u,
                v,
                base,
                wrapped_u,
                wrapped_v
            );
        }
    }

    #[test]
    fn test_different_seeds_produce_different_results() {
        let layer = NoiseLayer::default();
        let a = sample_torus_noise(0.25, 0.6, &layer, 1);
        let b = sample_torus_noise(0.25, 0.6, &layer, 2);
        assert_ne!(a, b, "Different seeds should produce different results");
    }

    #[test]
    fn test_shaping_transforms() {
        assert_eq!(Shaping::Identity.apply(-0.5), -0.5);
        assert_eq!(Shaping::Ridged.apply(-0.5), 0.5);
        assert_eq!(Shaping::Billow.apply(-0.5), 0.5);
        assert_eq!(Shaping::Squared.apply(-0.5), -0.25);
    }

    #[test]
    fn test_noise_range() {
        let layer = NoiseLayer::default();
        for i in 0..32 {
            let u = i as f32 / 32.0;
            let v = (i as f32 * 0.37).fract();
            let value = sample_torus_noise(u, v, &layer, 99);
            assert!(
                value.abs() <= 1.5,
                "Noise value {} at ({}, {}) out of expected range",
                value,
                u,
                v
            );
        }
    }
}
