// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use std::path::Path;

use hdf5::types::{FloatSize, TypeDescriptor};

use crate::constant;
use crate::error::ProbmapError;
use crate::im::ProbabilityVolume;

/// Read the (H, W, C) probability volume stored in an HDF5 file
///
/// # Arguments
///
/// * `path` - Path to a .h5 file holding an `exported_data` dataset
///
/// # Examples
///
/// ```no_run
/// use probmap_core::io::read_probabilities_h5;
/// let volume = read_probabilities_h5("image_Probabilities.h5").unwrap();
/// ```
pub fn read_probabilities_h5<P: AsRef<Path>>(path: P) -> Result<ProbabilityVolume, ProbmapError> {
    let path = path.as_ref();

    if !path.is_file() {
        return Err(ProbmapError::SourceNotFound(path.display().to_string()));
    }

    let file = hdf5::File::open(path).map_err(|err| {
        ProbmapError::SchemaMismatch(format!(
            "Could not open file at {} ({})",
            path.display(),
            err
        ))
    })?;

    let dataset = file.dataset(constant::EXPORTED_DATA_KEY).map_err(|err| {
        ProbmapError::SchemaMismatch(format!(
            "File at {} does not contain '{}' ({})",
            path.display(),
            constant::EXPORTED_DATA_KEY,
            err
        ))
    })?;

    let shape = dataset.shape();

    let (h, w, c) = match shape.as_slice() {
        [h, w, c] => (*h, *w, *c),
        _ => {
            return Err(ProbmapError::SchemaMismatch(format!(
                "Probability maps must have an (H, W, C) shape, got {:?}",
                shape
            )));
        }
    };

    let unreadable = |err: hdf5::Error| {
        ProbmapError::SchemaMismatch(format!(
            "Could not decode '{}' in file at {} ({})",
            constant::EXPORTED_DATA_KEY,
            path.display(),
            err
        ))
    };

    let descriptor = dataset
        .dtype()
        .and_then(|dtype| dtype.to_descriptor())
        .map_err(unreadable)?;

    // Datasets are read back in C (row-major) order
    match descriptor {
        TypeDescriptor::Float(FloatSize::U4) => {
            let data = dataset.read_raw::<f32>().map_err(unreadable)?;
            ProbabilityVolume::new_f32(h, w, c, data)
        }
        TypeDescriptor::Float(FloatSize::U8) => {
            let data = dataset.read_raw::<f64>().map_err(unreadable)?;
            ProbabilityVolume::new_f64(h, w, c, data)
        }
        other => Err(ProbmapError::SchemaMismatch(format!(
            "Probability maps must hold 32 or 64-bit floats, got {:?}",
            other
        ))),
    }
}

/// Write a single named dataset of specified shape to a new HDF5 file
///
/// # Arguments
///
/// * `path` - Path to output .h5 file
/// * `name` - Name of the dataset
/// * `data` - Vector of numeric type in row-major order
/// * `shape` - Shape of the dataset (shape product must equal length of data)
pub fn write_h5_dataset<T, P: AsRef<Path>>(
    path: P,
    name: &str,
    data: &[T],
    shape: &[usize],
) -> Result<(), ProbmapError>
where
    T: hdf5::H5Type,
{
    if shape.iter().product::<usize>() != data.len() {
        return Err(ProbmapError::OtherError(format!(
            "Shape {:?} does not match {} values when saving .h5",
            shape,
            data.len()
        )));
    }

    let file = hdf5::File::create(path.as_ref())
        .map_err(|err| ProbmapError::OtherError(format!("Failed to create .h5 file ({})", err)))?;

    let dataset = file
        .new_dataset::<T>()
        .shape(shape.to_vec())
        .create(name)
        .map_err(|err| {
            ProbmapError::OtherError(format!("Failed to initialize '{}' ({})", name, err))
        })?;

    dataset.write_raw(data).map_err(|err| {
        ProbmapError::OtherError(format!("Failed to write '{}' to .h5 file ({})", name, err))
    })
}

/// Write a probability volume as the `exported_data` dataset of an HDF5 file
///
/// # Examples
///
/// ```no_run
/// use probmap_core::im::ProbabilityVolume;
/// use probmap_core::io::{read_probabilities_h5, write_probabilities_h5};
///
/// let volume = ProbabilityVolume::new_f32(1, 1, 2, vec![0.2, 0.8]).unwrap();
/// write_probabilities_h5("probabilities.h5", &volume).unwrap();
/// assert_eq!(read_probabilities_h5("probabilities.h5").unwrap(), volume);
/// ```
pub fn write_probabilities_h5<P: AsRef<Path>>(
    path: P,
    volume: &ProbabilityVolume,
) -> Result<(), ProbmapError> {
    let (h, w, c) = volume.shape();

    match volume {
        ProbabilityVolume::F32(buffer) => {
            write_h5_dataset(path, constant::EXPORTED_DATA_KEY, buffer.as_raw(), &[h, w, c])
        }
        ProbabilityVolume::F64(buffer) => {
            write_h5_dataset(path, constant::EXPORTED_DATA_KEY, buffer.as_raw(), &[h, w, c])
        }
    }
}
