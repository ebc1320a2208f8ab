// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use std::slice::ChunksExact;

use num_traits::Float;

use crate::error::ProbmapError;
use crate::impl_enum_dispatch;

/// A row-major (height, width, channel) grid of class probabilities.
///
/// The length of the buffer must equal the product of `h` * `w` * `c`
/// and each pixel stores its `c` class probabilities contiguously.
///
/// # Examples
///
/// ```
/// use probmap_core::im::ProbabilityBuffer;
///
/// let buffer = ProbabilityBuffer::new(2, 2, 3, vec![0f32; 12]);
/// assert!(buffer.is_ok());
///
/// let buffer = ProbabilityBuffer::new(2, 2, 3, vec![0f32; 11]);
/// assert!(buffer.is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityBuffer<T> {
    h: usize,       // Height
    w: usize,       // Width
    c: usize,       // Channels
    buffer: Vec<T>, // Probabilities
}

impl<T: Float> ProbabilityBuffer<T> {
    /// Initializes a probability buffer
    ///
    /// # Arguments
    ///
    /// * `height` - Number of pixel rows
    /// * `width` - Number of pixel columns
    /// * `channels` - Number of trained classes
    /// * `buffer` - Row-major probabilities
    pub fn new(
        height: usize,
        width: usize,
        channels: usize,
        buffer: Vec<T>,
    ) -> Result<ProbabilityBuffer<T>, ProbmapError> {
        if channels == 0 {
            return Err(ProbmapError::SchemaMismatch(
                "Probability volumes must have at least one channel".to_string(),
            ));
        }

        if height * width * channels != buffer.len() {
            return Err(ProbmapError::SchemaMismatch(format!(
                "Expected {} probabilities for shape ({}, {}, {}), got {}",
                height * width * channels,
                height,
                width,
                channels,
                buffer.len()
            )));
        }

        Ok(ProbabilityBuffer {
            h: height,
            w: width,
            c: channels,
            buffer,
        })
    }

    pub fn width(&self) -> usize {
        self.w
    }

    pub fn height(&self) -> usize {
        self.h
    }

    pub fn channels(&self) -> usize {
        self.c
    }

    /// Shape of the volume as (height, width, channels)
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.h, self.w, self.c)
    }

    pub fn as_raw(&self) -> &[T] {
        &self.buffer
    }

    /// Iterate over the class probabilities of each pixel in row-major order
    pub fn pixels(&self) -> ChunksExact<'_, T> {
        self.buffer.chunks_exact(self.c)
    }

    /// Class probabilities at a given pixel
    pub fn pixel(&self, x: usize, y: usize) -> Option<&[T]> {
        if x >= self.w || y >= self.h {
            return None;
        }

        let start = (y * self.w + x) * self.c;
        Some(&self.buffer[start..start + self.c])
    }
}

/// A probability volume stored in the precision it was exported with
#[derive(Debug, Clone, PartialEq)]
pub enum ProbabilityVolume {
    F32(ProbabilityBuffer<f32>),
    F64(ProbabilityBuffer<f64>),
}

impl_enum_dispatch!(ProbabilityVolume, F32, F64; width(&self) -> usize);
impl_enum_dispatch!(ProbabilityVolume, F32, F64; height(&self) -> usize);
impl_enum_dispatch!(ProbabilityVolume, F32, F64; channels(&self) -> usize);
impl_enum_dispatch!(ProbabilityVolume, F32, F64; shape(&self) -> (usize, usize, usize));

impl ProbabilityVolume {
    /// Initialize a single precision volume
    ///
    /// # Examples
    ///
    /// ```
    /// use probmap_core::im::ProbabilityVolume;
    ///
    /// let volume = ProbabilityVolume::new_f32(1, 2, 2, vec![0.9, 0.1, 0.4, 0.6]).unwrap();
    /// assert_eq!(volume.shape(), (1, 2, 2));
    /// ```
    pub fn new_f32(
        height: usize,
        width: usize,
        channels: usize,
        buffer: Vec<f32>,
    ) -> Result<ProbabilityVolume, ProbmapError> {
        Ok(ProbabilityVolume::F32(ProbabilityBuffer::new(
            height, width, channels, buffer,
        )?))
    }

    /// Initialize a double precision volume
    pub fn new_f64(
        height: usize,
        width: usize,
        channels: usize,
        buffer: Vec<f64>,
    ) -> Result<ProbabilityVolume, ProbmapError> {
        Ok(ProbabilityVolume::F64(ProbabilityBuffer::new(
            height, width, channels, buffer,
        )?))
    }

    /// Number of pixels in the volume
    pub fn len(&self) -> usize {
        self.height() * self.width()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_buffer_shape() {
        let buffer = ProbabilityBuffer::new(2, 3, 4, vec![0f64; 24]).unwrap();
        assert_eq!(buffer.shape(), (2, 3, 4));
        assert_eq!(buffer.pixels().count(), 6);
    }

    #[test]
    fn test_buffer_rejects_zero_channels() {
        let err = ProbabilityBuffer::<f32>::new(2, 2, 0, vec![]).unwrap_err();
        assert!(matches!(err, ProbmapError::SchemaMismatch(_)));
    }

    #[test]
    fn test_buffer_pixel() {
        let buffer =
            ProbabilityBuffer::new(2, 2, 2, vec![0.9f32, 0.1, 0.4, 0.3, 0.2, 0.8, 0.5, 0.5])
                .unwrap();

        assert_eq!(buffer.pixel(0, 0), Some(&[0.9f32, 0.1][..]));
        assert_eq!(buffer.pixel(1, 0), Some(&[0.4f32, 0.3][..]));
        assert_eq!(buffer.pixel(0, 1), Some(&[0.2f32, 0.8][..]));
        assert_eq!(buffer.pixel(2, 0), None);
    }

    #[test]
    fn test_volume_dispatch() {
        let volume = ProbabilityVolume::new_f64(3, 5, 2, vec![0.0; 30]).unwrap();
        assert_eq!(volume.width(), 5);
        assert_eq!(volume.height(), 3);
        assert_eq!(volume.channels(), 2);
        assert_eq!(volume.len(), 15);
        assert!(!volume.is_empty());
    }
}
