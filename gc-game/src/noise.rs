//! Noise ladder construction for the gradual reveal
//!
//! Rung 0 is the clean image. Each following rung perturbs the previous rung,
//! so degradation accumulates. The finished ladder is reversed before
//! delivery: noisiest frame first, clean frame last.

use base64::Engine;
use image::{ImageFormat, Rgb, RgbImage};
use rand::distributions::{Distribution, Uniform};
use rand::Rng;
use std::io::Cursor;
use thiserror::Error;

/// Default number of frames per ladder
pub const DEFAULT_RUNG_COUNT: usize = 10;

/// Default per-step perturbation bound (in 8-bit channel units)
pub const DEFAULT_NOISE_INTENSITY: f32 = 50.0;

/// Noise ladder parameter errors
#[derive(Debug, Error, PartialEq)]
pub enum LadderError {
    #[error("Rung count must be at least 1")]
    ZeroRungs,

    #[error("Noise intensity must be finite and non-negative, got {0}")]
    InvalidIntensity(f32),
}

/// Builds noise ladders with a fixed rung count and intensity
#[derive(Debug, Clone, Copy)]
pub struct NoiseLadderBuilder {
    rung_count: usize,
    noise_intensity: f32,
}

impl Default for NoiseLadderBuilder {
    fn default() -> Self {
        Self {
            rung_count: DEFAULT_RUNG_COUNT,
            noise_intensity: DEFAULT_NOISE_INTENSITY,
        }
    }
}

impl NoiseLadderBuilder {
    pub fn new(rung_count: usize, noise_intensity: f32) -> Result<Self, LadderError> {
        if rung_count == 0 {
            return Err(LadderError::ZeroRungs);
        }
        if !noise_intensity.is_finite() || noise_intensity < 0.0 {
            return Err(LadderError::InvalidIntensity(noise_intensity));
        }
        Ok(Self {
            rung_count,
            noise_intensity,
        })
    }

    pub fn rung_count(&self) -> usize {
        self.rung_count
    }

    pub fn noise_intensity(&self) -> f32 {
        self.noise_intensity
    }

    pub fn build<R: Rng + ?Sized>(&self, base: &RgbImage, rng: &mut R) -> NoiseLadder {
        NoiseLadder {
            frames: build_ladder(base, self.rung_count, self.noise_intensity, rng),
        }
    }
}

/// Frames ordered noisiest → clean
#[derive(Debug, Clone)]
pub struct NoiseLadder {
    frames: Vec<RgbImage>,
}

impl NoiseLadder {
    pub fn frames(&self) -> &[RgbImage] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The last frame, identical to the base image
    pub fn clean(&self) -> Option<&RgbImage> {
        self.frames.last()
    }

    /// Encode every frame as a PNG data URL, preserving order
    pub fn to_data_urls(&self) -> Result<Vec<String>, image::ImageError> {
        self.frames.iter().map(png_data_url).collect()
    }
}

/// Build `rung_count` frames from `base`, returned noisiest first
///
/// Each forward step adds independent zero-mean uniform noise in
/// `[-noise_intensity, noise_intensity]` to every channel of the previous
/// frame, then clamps to `[0, 255]`.
pub fn build_ladder<R: Rng + ?Sized>(
    base: &RgbImage,
    rung_count: usize,
    noise_intensity: f32,
    rng: &mut R,
) -> Vec<RgbImage> {
    let mut frames = Vec::with_capacity(rung_count);
    if rung_count == 0 {
        return frames;
    }

    frames.push(base.clone());
    for _ in 1..rung_count {
        let previous = &frames[frames.len() - 1];
        let next = perturb(previous, noise_intensity, rng);
        frames.push(next);
    }

    frames.reverse();
    frames
}

/// Add one step of clamped uniform noise to a copy of `frame`
pub fn perturb<R: Rng + ?Sized>(frame: &RgbImage, noise_intensity: f32, rng: &mut R) -> RgbImage {
    let mut next = frame.clone();
    if !(noise_intensity.is_finite() && noise_intensity > 0.0) {
        return next;
    }

    let noise = Uniform::new_inclusive(-noise_intensity, noise_intensity);
    for channel in next.iter_mut() {
        let value = f32::from(*channel) + noise.sample(rng);
        *channel = value.round().clamp(0.0, 255.0) as u8;
    }
    next
}

/// Solid-colour stand-in used when image synthesis fails
pub fn placeholder_image(width: u32, height: u32, color: [u8; 3]) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb(color))
}

/// Encode an image as `data:image/png;base64,...`
pub fn png_data_url(frame: &RgbImage) -> Result<String, image::ImageError> {
    let mut bytes = Vec::new();
    frame.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
    Ok(format!("data:image/png;base64,{}", encoded))
}
