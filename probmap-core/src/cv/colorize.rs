// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use num_traits::{Float, NumCast};

use crate::error::ProbmapError;
use crate::im::{ChannelOrder, ColorImage, Palette, ProbabilityBuffer, ProbabilityVolume};

/// Index and value of the largest element in a slice
///
/// Ties resolve to the lowest index. A NaN is returned as the maximum at
/// its first position, so a pixel containing NaN never passes a threshold.
///
/// # Examples
///
/// ```
/// use probmap_core::cv::argmax;
///
/// assert_eq!(argmax(&[0.1, 0.7, 0.7]), Some((1, 0.7)));
/// assert_eq!(argmax(&[0.0f32, 0.0]), Some((0, 0.0)));
/// assert_eq!(argmax::<f64>(&[]), None);
/// ```
pub fn argmax<T: Float>(values: &[T]) -> Option<(usize, T)> {
    let mut best: Option<(usize, T)> = None;

    for (idx, &value) in values.iter().enumerate() {
        if value.is_nan() {
            return Some((idx, value));
        }

        match best {
            Some((_, max)) if value <= max => {}
            _ => best = Some((idx, value)),
        }
    }

    best
}

impl<T: Float> ProbabilityBuffer<T> {
    /// Color each pixel by its most probable class
    ///
    /// # Arguments
    ///
    /// * `threshold` - Pixels take their class color only if the class
    ///   probability is strictly greater than this value
    /// * `palette` - One color per channel plus the below-threshold color
    pub fn colorize(&self, threshold: f64, palette: &Palette) -> Result<ColorImage, ProbmapError> {
        if palette.len() != self.channels() {
            return Err(ProbmapError::ChannelMismatch {
                expected: self.channels(),
                actual: palette.len(),
            });
        }

        // Compared in the precision of the volume
        let threshold = <T as NumCast>::from(threshold).ok_or_else(|| {
            ProbmapError::OtherError(format!("Threshold {} is not representable", threshold))
        })?;

        let below = palette.below_threshold();
        let mut buffer = vec![0u8; self.height() * self.width() * 3];

        for (probabilities, pixel) in self.pixels().zip(buffer.chunks_exact_mut(3)) {
            let color = match argmax(probabilities) {
                Some((idx, max)) if max > threshold => palette.channel(idx).unwrap_or(below),
                _ => below,
            };

            pixel.copy_from_slice(&color.0);
        }

        ColorImage::new(self.height(), self.width(), ChannelOrder::Rgb, buffer)
    }
}

impl ProbabilityVolume {
    /// Color each pixel by its most probable class, at either precision
    pub fn colorize(&self, threshold: f64, palette: &Palette) -> Result<ColorImage, ProbmapError> {
        match self {
            ProbabilityVolume::F32(buffer) => buffer.colorize(threshold, palette),
            ProbabilityVolume::F64(buffer) => buffer.colorize(threshold, palette),
        }
    }
}

/// Convert a probability volume into an RGB color image
///
/// # Arguments
///
/// * `volume` - An (H, W, C) probability volume
/// * `threshold` - Strict lower bound on the winning class probability
/// * `palette` - A palette with exactly C channel colors
///
/// # Examples
///
/// ```
/// use probmap_core::cv::colorize;
/// use probmap_core::im::{Color, Palette, ProbabilityVolume};
///
/// let volume = ProbabilityVolume::new_f64(
///     2, 2, 2,
///     vec![0.9, 0.1, 0.4, 0.3, 0.2, 0.8, 0.5, 0.5],
/// ).unwrap();
///
/// let palette = Palette::from_components(&[0, 0, 0], &[vec![255, 0, 0], vec![0, 255, 0]]).unwrap();
/// let image = colorize(&volume, 0.5, &palette).unwrap();
///
/// assert_eq!(image.pixel(0, 0), Some(Color([255, 0, 0])));
/// assert_eq!(image.pixel(1, 0), Some(Color([0, 0, 0])));
/// assert_eq!(image.pixel(0, 1), Some(Color([0, 255, 0])));
/// assert_eq!(image.pixel(1, 1), Some(Color([0, 0, 0])));
/// ```
pub fn colorize(
    volume: &ProbabilityVolume,
    threshold: f64,
    palette: &Palette,
) -> Result<ColorImage, ProbmapError> {
    volume.colorize(threshold, palette)
}
