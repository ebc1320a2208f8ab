// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

// Name of the array holding the (H, W, C) probabilities inside a container
pub const EXPORTED_DATA_KEY: &str = "exported_data";

// Canonical extension of probability map containers (HDF5)
pub const PROBABILITY_MAP_EXTENSION: &str = "h5";

// All probability map formats eligible for directory processing
pub const SUPPORTED_PROBABILITY_FORMATS: [&str; 3] = [PROBABILITY_MAP_EXTENSION, "hdf5", "npz"];

// Image formats that can encode an 8-bit, 3-channel color image
pub const SUPPORTED_OUTPUT_FORMATS: [&str; 10] = [
    "bmp", "jpeg", "jpg", "png", "pnm", "ppm", "qoi", "tga", "tif", "tiff",
];

pub const DEFAULT_OUTPUT_FORMAT: &str = "png";

// Suffix appended to an output path while the image is being written
pub const PARTIAL_SUFFIX: &str = "partial";

// Environment variable providing a default number of worker threads
pub const THREADS_ENV: &str = "PROBMAP_THREADS";
