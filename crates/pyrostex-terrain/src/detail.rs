//! Multi-octave fractal Brownian motion (fBm) detail over Perlin noise.
//!
//! Resampled maps are smooth between source pixels. The detail pass adds
//! noise evaluated on the unit direction of every pixel, so the result is
//! seamless across cube faces and identical wherever two maps overlap.

use glam::DVec3;
use noise::{NoiseFn, Perlin};
use pyrostex_config::DetailConfig;
use pyrostex_map::{MapError, SurfaceMap, update_from_fn};
use tracing::debug;

/// Parameters for the fBm detail noise.
#[derive(Clone, Debug, PartialEq)]
pub struct DetailParams {
    /// Noise seed.
    pub seed: u32,
    /// Number of noise octaves to composite.
    pub octaves: u32,
    /// Frequency multiplier between successive octaves.
    pub lacunarity: f64,
    /// Amplitude multiplier between successive octaves.
    pub persistence: f64,
    /// Frequency of the first octave on the unit sphere.
    pub base_frequency: f64,
    /// Amplitude of the first octave.
    pub amplitude: f64,
}

impl Default for DetailParams {
    fn default() -> Self {
        DetailConfig::default().into()
    }
}

impl From<DetailConfig> for DetailParams {
    fn from(config: DetailConfig) -> Self {
        Self {
            seed: config.seed,
            octaves: config.octaves,
            lacunarity: config.lacunarity,
            persistence: config.persistence,
            base_frequency: config.base_frequency,
            amplitude: config.amplitude,
        }
    }
}

/// Evaluates fBm detail at points on the unit sphere.
pub struct DetailSampler {
    noise: Perlin,
    params: DetailParams,
}

impl DetailSampler {
    pub fn new(params: DetailParams) -> Self {
        let noise = Perlin::new(params.seed);
        Self { noise, params }
    }

    /// Sample at a sphere-surface point.
    ///
    /// The result lies in `[-max_amplitude, max_amplitude]`.
    pub fn sample_3d(&self, point: DVec3) -> f64 {
        let mut total = 0.0;
        let mut frequency = self.params.base_frequency;
        let mut amplitude = self.params.amplitude;

        for _ in 0..self.params.octaves {
            let p = point * frequency;
            total += self.noise.get([p.x, p.y, p.z]) * amplitude;

            frequency *= self.params.lacunarity;
            amplitude *= self.params.persistence;
        }

        total
    }

    /// Theoretical maximum absolute value (geometric series sum).
    pub fn max_amplitude(&self) -> f64 {
        let mut sum = 0.0;
        let mut amp = self.params.amplitude;
        for _ in 0..self.params.octaves {
            sum += amp.abs();
            amp *= self.params.persistence;
        }
        sum
    }

    pub fn params(&self) -> &DetailParams {
        &self.params
    }
}

/// Add detail noise to every pixel of `map`.
pub fn apply_detail<M: SurfaceMap>(map: &mut M, sampler: &DetailSampler) -> Result<(), MapError> {
    let (width, height) = map.dimensions();
    debug!(width, height, octaves = sampler.params.octaves, "applying detail noise");
    update_from_fn(map, |dir, current| Ok(current + sampler.sample_3d(dir)))
}
