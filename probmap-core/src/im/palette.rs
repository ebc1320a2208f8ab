// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use std::fmt;
use std::str::FromStr;

use crate::error::ProbmapError;

/// An RGB color with 8-bit components
///
/// # Examples
///
/// ```
/// use probmap_core::im::Color;
///
/// let red: Color = "255,0,0".parse().unwrap();
/// assert_eq!(red, Color([255, 0, 0]));
///
/// assert!(Color::from_components("channel_colors[0]", &[255, 0]).is_err());
/// assert!(Color::from_components("channel_colors[0]", &[256, 0, 0]).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color(pub [u8; 3]);

impl Color {
    /// Validate untyped integer components as an RGB color
    ///
    /// # Arguments
    ///
    /// * `field` - Name of the configuration field, reported on failure
    /// * `components` - Exactly 3 integers between 0 and 255
    pub fn from_components(field: &str, components: &[i64]) -> Result<Color, ProbmapError> {
        if components.len() != 3 {
            return Err(ProbmapError::InvalidPalette(format!(
                "{} has {} components but",
                field,
                components.len()
            )));
        }

        let mut rgb = [0u8; 3];
        for (value, component) in rgb.iter_mut().zip(components) {
            *value = u8::try_from(*component).map_err(|_| {
                ProbmapError::InvalidPalette(format!(
                    "{} contains {} but",
                    field, component
                ))
            })?;
        }

        Ok(Color(rgb))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{},{},{}", self.0[0], self.0[1], self.0[2])
    }
}

/// Parses `r,g,b` (whitespace around components is ignored)
impl FromStr for Color {
    type Err = ProbmapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let components = s
            .split(',')
            .map(|c| c.trim().parse::<i64>())
            .collect::<Result<Vec<i64>, _>>()
            .map_err(|_| ProbmapError::InvalidPalette(format!("Color '{}'", s)))?;

        Color::from_components(&format!("Color '{}'", s), &components)
    }
}

/// Colors assigned to thresholded probability maps
///
/// Index 0 of the palette is the color given to pixels whose strongest
/// class does not exceed the threshold. Indices `1..=C` are the colors of
/// channels `0..C`.
///
/// # Examples
///
/// ```
/// use probmap_core::im::{Color, Palette};
///
/// let palette = Palette::new(
///     Color([0, 0, 0]),
///     vec![Color([255, 0, 0]), Color([0, 255, 0])],
/// ).unwrap();
///
/// assert_eq!(palette.len(), 2);
/// assert_eq!(palette.lookup(0), Some(Color([0, 0, 0])));
/// assert_eq!(palette.lookup(2), Some(Color([0, 255, 0])));
/// assert_eq!(palette.lookup(3), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    below_threshold: Color,
    channels: Vec<Color>,
}

impl Palette {
    /// Initialize a palette from typed colors
    ///
    /// # Arguments
    ///
    /// * `below_threshold` - Color of pixels without a conclusive class
    /// * `channels` - One color per class channel (must not be empty)
    pub fn new(below_threshold: Color, channels: Vec<Color>) -> Result<Palette, ProbmapError> {
        if channels.is_empty() {
            return Err(ProbmapError::InvalidPalette(
                "channel_colors is empty. It must contain at least one color and each color"
                    .to_string(),
            ));
        }

        Ok(Palette {
            below_threshold,
            channels,
        })
    }

    /// Initialize a palette from untyped integer sequences
    ///
    /// # Arguments
    ///
    /// * `below_threshold` - 3 integers between 0 and 255
    /// * `channels` - A non-empty list of 3 integers between 0 and 255
    ///
    /// # Examples
    ///
    /// ```
    /// use probmap_core::im::Palette;
    ///
    /// let palette = Palette::from_components(&[0, 0, 0], &[vec![255, 0, 0]]);
    /// assert!(palette.is_ok());
    ///
    /// let palette = Palette::from_components(&[0, 0], &[vec![255, 0, 0]]);
    /// assert!(palette.is_err());
    /// ```
    pub fn from_components(
        below_threshold: &[i64],
        channels: &[Vec<i64>],
    ) -> Result<Palette, ProbmapError> {
        let below_threshold = Color::from_components("below_threshold_color", below_threshold)?;

        let channels = channels
            .iter()
            .enumerate()
            .map(|(idx, color)| Color::from_components(&format!("channel_colors[{}]", idx), color))
            .collect::<Result<Vec<Color>, ProbmapError>>()?;

        Self::new(below_threshold, channels)
    }

    /// Color of pixels whose maximum probability does not exceed the threshold
    pub fn below_threshold(&self) -> Color {
        self.below_threshold
    }

    /// Colors of each class channel
    pub fn channels(&self) -> &[Color] {
        &self.channels
    }

    /// Color of a single class channel
    pub fn channel(&self, idx: usize) -> Option<Color> {
        self.channels.get(idx).copied()
    }

    /// Number of class channels the palette covers
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// A palette always holds at least one channel color
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Index into the full `C + 1` color table
    pub fn lookup(&self, idx: usize) -> Option<Color> {
        match idx {
            0 => Some(self.below_threshold),
            _ => self.channel(idx - 1),
        }
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_color_from_components() {
        assert_eq!(
            Color::from_components("c", &[0, 128, 255]).unwrap(),
            Color([0, 128, 255])
        );

        for invalid in [
            vec![],
            vec![0, 0],
            vec![0, 0, 0, 0],
            vec![-1, 0, 0],
            vec![0, 256, 0],
        ] {
            let err = Color::from_components("below_threshold_color", &invalid).unwrap_err();
            assert!(matches!(err, ProbmapError::InvalidPalette(_)));
            assert!(err.to_string().contains("below_threshold_color"));
        }
    }

    #[test]
    fn test_color_parse() {
        assert_eq!("1, 2, 3".parse::<Color>().unwrap(), Color([1, 2, 3]));
        assert!("1,2".parse::<Color>().is_err());
        assert!("red".parse::<Color>().is_err());
        assert!("0,0,300".parse::<Color>().is_err());
        assert_eq!(Color([4, 5, 6]).to_string(), "4,5,6");
    }

    #[test]
    fn test_palette_names_offending_channel() {
        let err = Palette::from_components(&[0, 0, 0], &[vec![255, 0, 0], vec![255, 0]])
            .unwrap_err();

        assert!(err.to_string().contains("channel_colors[1]"));
    }

    #[test]
    fn test_palette_rejects_empty_channels() {
        let err = Palette::from_components(&[0, 0, 0], &[]).unwrap_err();
        assert!(matches!(err, ProbmapError::InvalidPalette(_)));
        assert!(err.to_string().contains("channel_colors"));
    }

    #[test]
    fn test_palette_lookup() {
        let palette =
            Palette::from_components(&[1, 1, 1], &[vec![255, 0, 0], vec![0, 0, 255]]).unwrap();

        assert_eq!(palette.len(), 2);
        assert!(!palette.is_empty());
        assert_eq!(palette.below_threshold(), Color([1, 1, 1]));
        assert_eq!(palette.lookup(1), Some(Color([255, 0, 0])));
        assert_eq!(palette.lookup(2), Some(Color([0, 0, 255])));
        assert_eq!(palette.channel(2), None);
    }
}
