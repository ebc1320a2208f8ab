// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use std::fs::File;
use std::path::Path;

use image::{ImageBuffer, ImageFormat, Rgb};

use crate::constant;
use crate::error::ProbmapError;
use crate::im::Color;

/// Order of the three subpixels of each color image pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOrder {
    Rgb,
    Bgr,
}

/// An 8-bit, 3-channel (height, width, 3) image produced by thresholding
///
/// # Examples
///
/// ```
/// use probmap_core::im::{ChannelOrder, ColorImage};
///
/// let image = ColorImage::new(1, 2, ChannelOrder::Rgb, vec![255, 0, 0, 0, 0, 255]).unwrap();
/// let image = image.into_order(ChannelOrder::Bgr);
///
/// assert_eq!(image.as_raw(), &[0, 0, 255, 255, 0, 0]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorImage {
    h: usize,
    w: usize,
    order: ChannelOrder,
    buffer: Vec<u8>,
}

impl ColorImage {
    pub fn new(
        height: usize,
        width: usize,
        order: ChannelOrder,
        buffer: Vec<u8>,
    ) -> Result<ColorImage, ProbmapError> {
        if height * width * 3 != buffer.len() {
            return Err(ProbmapError::OtherError(format!(
                "Color image buffer of length {} does not match shape ({}, {}, 3)",
                buffer.len(),
                height,
                width
            )));
        }

        Ok(ColorImage {
            h: height,
            w: width,
            order,
            buffer,
        })
    }

    pub fn width(&self) -> usize {
        self.w
    }

    pub fn height(&self) -> usize {
        self.h
    }

    /// Shape of the image as (height, width, 3)
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.h, self.w, 3)
    }

    pub fn order(&self) -> ChannelOrder {
        self.order
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.buffer
    }

    /// Color at a given pixel, always reported in RGB order
    pub fn pixel(&self, x: usize, y: usize) -> Option<Color> {
        if x >= self.w || y >= self.h {
            return None;
        }

        let start = (y * self.w + x) * 3;
        let p = &self.buffer[start..start + 3];

        match self.order {
            ChannelOrder::Rgb => Some(Color([p[0], p[1], p[2]])),
            ChannelOrder::Bgr => Some(Color([p[2], p[1], p[0]])),
        }
    }

    /// Reorder subpixels (e.g. RGB to BGR for encoders expecting BGR input)
    pub fn into_order(mut self, order: ChannelOrder) -> ColorImage {
        if self.order != order {
            self.buffer.chunks_exact_mut(3).for_each(|p| p.swap(0, 2));
            self.order = order;
        }

        self
    }

    /// Save the image using the format implied by the path extension
    ///
    /// The image is first written and synced to a temporary sibling path
    /// and then renamed, so the destination either holds the complete
    /// image or is left untouched.
    ///
    /// # Arguments
    ///
    /// * `path` - Output path with one of the supported output extensions
    ///
    /// ```no_run
    /// use probmap_core::im::{ChannelOrder, ColorImage};
    ///
    /// let image = ColorImage::new(1, 1, ChannelOrder::Rgb, vec![0, 255, 0]).unwrap();
    /// image.save("labels.png").unwrap();
    /// ```
    pub fn save<P: AsRef<Path>>(self, path: P) -> Result<(), ProbmapError> {
        let path = path.as_ref();

        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_lowercase())
            .unwrap_or_default();

        if !constant::SUPPORTED_OUTPUT_FORMATS.contains(&extension.as_str()) {
            return Err(ProbmapError::FormatError(format!(
                "'{}'. Must be one of: {:?}",
                extension,
                constant::SUPPORTED_OUTPUT_FORMATS
            )));
        }

        let format = ImageFormat::from_extension(&extension)
            .ok_or_else(|| ProbmapError::FormatError(format!("'{}'", extension)))?;

        let (width, height) = (self.w as u32, self.h as u32);
        let image_buffer = ImageBuffer::<Rgb<u8>, Vec<u8>>::from_raw(
            width,
            height,
            self.into_order(ChannelOrder::Rgb).into_raw(),
        )
        .ok_or_else(|| ProbmapError::EncodeFailure("Invalid image dimensions".to_string()))?;

        let partial = path.with_extension(format!("{}.{}", extension, constant::PARTIAL_SUFFIX));

        let written = image_buffer
            .save_with_format(&partial, format)
            .map_err(|err| ProbmapError::EncodeFailure(format!("{}: {}", path.display(), err)))
            .and_then(|_| {
                File::open(&partial)
                    .and_then(|file| file.sync_all())
                    .map_err(|err| {
                        ProbmapError::EncodeFailure(format!("{}: {}", path.display(), err))
                    })
            })
            .and_then(|_| {
                std::fs::rename(&partial, path).map_err(|err| {
                    ProbmapError::EncodeFailure(format!("{}: {}", path.display(), err))
                })
            });

        if written.is_err() && partial.exists() {
            let _ = std::fs::remove_file(&partial);
        }

        written
    }
}
