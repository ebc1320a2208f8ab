// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

//! Threshold pixel-classifier probability maps into color-coded images.
//!
//! A probability map is an (H, W, C) volume holding one probability per
//! trained class at each pixel. Every pixel is given the color of its most
//! probable class when that probability is strictly greater than a
//! threshold, and a fallback color otherwise.

pub mod batch;
pub mod config;
pub mod constant;
pub mod cv;
pub mod error;
pub mod im;
pub mod io;
pub mod ut;

pub use batch::{
    BatchOptions, BatchReport, ColorizeOptions, FailurePolicy, color_threshold_probabilities,
    process_single_file, threshold_probabilities, threshold_probabilities_with_cancel,
};
