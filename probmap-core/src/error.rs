// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ProbmapError {
    InvalidPalette(String),
    SourceNotFound(String),
    SchemaMismatch(String),
    ChannelMismatch { expected: usize, actual: usize },
    EncodeFailure(String),
    FormatError(String),
    ConfigError(String),
    DirError(String),
    Cancelled(String),
    OtherError(String),
}

impl ProbmapError {
    /// True for every error raised because the container layout disagrees
    /// with what the colorizer expects (including channel count mismatches)
    pub fn is_schema_mismatch(&self) -> bool {
        matches!(
            self,
            ProbmapError::SchemaMismatch(_) | ProbmapError::ChannelMismatch { .. }
        )
    }
}

impl fmt::Display for ProbmapError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProbmapError::InvalidPalette(message) => {
                write!(
                    f,
                    "[probmap::InvalidPalette] {} must be 3 integers between 0 and 255 (RGB color format).",
                    message
                )
            }
            ProbmapError::SourceNotFound(message) => {
                write!(
                    f,
                    "[probmap::SourceNotFound] File at {} does not exist.",
                    message
                )
            }
            ProbmapError::SchemaMismatch(message) => {
                write!(f, "[probmap::SchemaMismatch] {}.", message)
            }
            ProbmapError::ChannelMismatch { expected, actual } => {
                write!(
                    f,
                    "[probmap::SchemaMismatch] The number of channel colors must equal the number of channels in the data (one color per label in the classifier). Expected {}, got {}.",
                    expected, actual
                )
            }
            ProbmapError::EncodeFailure(message) => {
                write!(
                    f,
                    "[probmap::EncodeFailure] Failed to write image. {}.",
                    message
                )
            }
            ProbmapError::FormatError(message) => {
                write!(
                    f,
                    "[probmap::FormatError] Unsupported output format {}.",
                    message
                )
            }
            ProbmapError::ConfigError(message) => {
                write!(
                    f,
                    "[probmap::ConfigError] Palette configuration could not be loaded. {}.",
                    message
                )
            }
            ProbmapError::DirError(message) => {
                write!(
                    f,
                    "[probmap::DirError] Directory could not be read. {}.",
                    message
                )
            }
            ProbmapError::Cancelled(message) => {
                write!(f, "[probmap::Cancelled] Not processed. {}.", message)
            }
            ProbmapError::OtherError(message) => {
                write!(f, "[probmap::OtherError] Error: {}.", message)
            }
        }
    }
}

impl std::error::Error for ProbmapError {}
