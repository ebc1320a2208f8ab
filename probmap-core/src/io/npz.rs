// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use std::fs::File;
use std::io;
use std::path::Path;

use npyz::npz::{self, NpzArchive};
use npyz::{DType, Order, TypeChar, WriterBuilder};
use zip::write::ExtendedFileOptions;

use crate::constant;
use crate::error::ProbmapError;
use crate::im::ProbabilityVolume;

/// Read the (H, W, C) probability volume stored in a .npz container
///
/// # Arguments
///
/// * `path` - Path to a .npz archive holding an `exported_data` array
///
/// # Examples
///
/// ```no_run
/// use probmap_core::io::read_probabilities_npz;
/// let volume = read_probabilities_npz("image_Probabilities.npz").unwrap();
/// ```
pub fn read_probabilities_npz<P: AsRef<Path>>(path: P) -> Result<ProbabilityVolume, ProbmapError> {
    let path = path.as_ref();

    if !path.is_file() {
        return Err(ProbmapError::SourceNotFound(path.display().to_string()));
    }

    let mut archive = NpzArchive::open(path).map_err(|err| {
        ProbmapError::SchemaMismatch(format!(
            "Could not open file at {} ({})",
            path.display(),
            err
        ))
    })?;

    let npy = archive
        .by_name(constant::EXPORTED_DATA_KEY)
        .map_err(|err| {
            ProbmapError::SchemaMismatch(format!(
                "Could not read '{}' in file at {} ({})",
                constant::EXPORTED_DATA_KEY,
                path.display(),
                err
            ))
        })?
        .ok_or_else(|| {
            ProbmapError::SchemaMismatch(format!(
                "File at {} does not contain '{}'",
                path.display(),
                constant::EXPORTED_DATA_KEY
            ))
        })?;

    let shape = npy.shape().to_vec();

    let (h, w, c) = match shape.as_slice() {
        [h, w, c] => (*h as usize, *w as usize, *c as usize),
        _ => {
            return Err(ProbmapError::SchemaMismatch(format!(
                "Probability maps must have an (H, W, C) shape, got {:?}",
                shape
            )));
        }
    };

    let order = npy.order();
    let unreadable = |err: io::Error| {
        ProbmapError::SchemaMismatch(format!(
            "Could not decode '{}' in file at {} ({})",
            constant::EXPORTED_DATA_KEY,
            path.display(),
            err
        ))
    };

    match npy.dtype() {
        DType::Plain(x) => match (x.type_char(), x.size_field()) {
            (TypeChar::Float, 4) => {
                let data = npy.into_vec::<f32>().map_err(unreadable)?;
                ProbabilityVolume::new_f32(h, w, c, into_row_major(data, order, h, w, c))
            }
            (TypeChar::Float, 8) => {
                let data = npy.into_vec::<f64>().map_err(unreadable)?;
                ProbabilityVolume::new_f64(h, w, c, into_row_major(data, order, h, w, c))
            }
            _ => Err(ProbmapError::SchemaMismatch(format!(
                "Probability maps must hold 32 or 64-bit floats, got {}",
                x
            ))),
        },
        _ => Err(ProbmapError::SchemaMismatch(
            "Only plain numpy arrays are currently supported".to_string(),
        )),
    }
}

/// Reorder a column-major (Fortran) array into row-major order
fn into_row_major<T: Copy>(data: Vec<T>, order: Order, h: usize, w: usize, c: usize) -> Vec<T> {
    if matches!(order, Order::C) || data.len() != h * w * c {
        return data;
    }

    let mut reordered = Vec::with_capacity(data.len());
    for y in 0..h {
        for x in 0..w {
            for channel in 0..c {
                reordered.push(data[y + h * (x + w * channel)]);
            }
        }
    }

    reordered
}

/// Write a single named array of specified shape to a .npz file
///
/// # Arguments
///
/// * `path` - Path to output .npz file
/// * `name` - Name of the array inside the archive
/// * `data` - Vector of numeric type
/// * `shape` - Shape of the vector (shape product must equal length of data)
pub fn write_npz_array<T, P: AsRef<Path>>(
    path: P,
    name: &str,
    data: Vec<T>,
    shape: Vec<u64>,
) -> Result<(), ProbmapError>
where
    T: npyz::Serialize + npyz::AutoSerialize,
{
    if shape.iter().product::<u64>() != data.len() as u64 {
        return Err(ProbmapError::OtherError(format!(
            "Shape {:?} does not match {} values when saving .npz",
            shape,
            data.len()
        )));
    }

    let file = io::BufWriter::new(
        File::create(path.as_ref())
            .map_err(|_| ProbmapError::OtherError("Failed to create .npz file".to_string()))?,
    );

    let mut zip = zip::ZipWriter::new(file);

    zip.start_file::<_, ExtendedFileOptions>(npz::file_name_from_array_name(name), Default::default())
        .map_err(|_| {
            ProbmapError::OtherError(format!("Failed to initialize zip file for '{}'", name))
        })?;

    let mut writer = npyz::WriteOptions::<T>::new()
        .default_dtype()
        .shape(&shape)
        .writer(&mut zip)
        .begin_nd()
        .map_err(|_| {
            ProbmapError::OtherError(format!("Failed to initialize writer for '{}'", name))
        })?;

    writer
        .extend(data)
        .map_err(|_| ProbmapError::OtherError(format!("Failed to add '{}' to .npz file", name)))?;

    writer
        .finish()
        .map_err(|_| ProbmapError::OtherError(format!("Failed to write '{}' to .npz file", name)))?;

    zip.finish()
        .map_err(|_| ProbmapError::OtherError("Failed to zip .npz file".to_string()))?;

    Ok(())
}

/// Write a probability volume as the `exported_data` array of a .npz file
///
/// # Examples
///
/// ```no_run
/// use probmap_core::im::ProbabilityVolume;
/// use probmap_core::io::{read_probabilities_npz, write_probabilities_npz};
///
/// let volume = ProbabilityVolume::new_f32(1, 1, 2, vec![0.2, 0.8]).unwrap();
/// write_probabilities_npz("probabilities.npz", &volume).unwrap();
/// assert_eq!(read_probabilities_npz("probabilities.npz").unwrap(), volume);
/// ```
pub fn write_probabilities_npz<P: AsRef<Path>>(
    path: P,
    volume: &ProbabilityVolume,
) -> Result<(), ProbmapError> {
    let (h, w, c) = volume.shape();
    let shape = vec![h as u64, w as u64, c as u64];

    match volume {
        ProbabilityVolume::F32(buffer) => write_npz_array(
            path,
            constant::EXPORTED_DATA_KEY,
            buffer.as_raw().to_vec(),
            shape,
        ),
        ProbabilityVolume::F64(buffer) => write_npz_array(
            path,
            constant::EXPORTED_DATA_KEY,
            buffer.as_raw().to_vec(),
            shape,
        ),
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_round_trip_f32() {
        const TEST_NPZ: &str = "TEST_NPZ_ROUND_TRIP_F32.npz";

        let volume = ProbabilityVolume::new_f32(2, 3, 2, (0..12).map(|i| i as f32 / 12.0).collect())
            .unwrap();

        write_probabilities_npz(TEST_NPZ, &volume).unwrap();
        assert_eq!(read_probabilities_npz(TEST_NPZ).unwrap(), volume);

        std::fs::remove_file(TEST_NPZ).unwrap();
    }

    #[test]
    fn test_round_trip_f64() {
        const TEST_NPZ: &str = "TEST_NPZ_ROUND_TRIP_F64.npz";

        let volume = ProbabilityVolume::new_f64(1, 2, 3, vec![0.1, 0.2, 0.7, 0.3, 0.3, 0.4]).unwrap();

        write_probabilities_npz(TEST_NPZ, &volume).unwrap();

        let read = read_probabilities_npz(TEST_NPZ).unwrap();
        assert!(matches!(read, ProbabilityVolume::F64(_)));
        assert_eq!(read, volume);

        std::fs::remove_file(TEST_NPZ).unwrap();
    }

    #[test]
    fn test_missing_source() {
        let err = read_probabilities_npz("TEST_NPZ_DOES_NOT_EXIST.npz").unwrap_err();
        assert!(matches!(err, ProbmapError::SourceNotFound(_)));
    }

    #[test]
    fn test_missing_exported_data() {
        const TEST_NPZ: &str = "TEST_NPZ_MISSING_KEY.npz";

        write_npz_array(TEST_NPZ, "other_data", vec![0.5f32; 12], vec![2, 2, 3]).unwrap();

        let err = read_probabilities_npz(TEST_NPZ).unwrap_err();
        assert!(matches!(err, ProbmapError::SchemaMismatch(_)));
        assert!(err.to_string().contains("exported_data"));

        std::fs::remove_file(TEST_NPZ).unwrap();
    }

    #[test]
    fn test_wrong_rank() {
        const TEST_NPZ: &str = "TEST_NPZ_WRONG_RANK.npz";

        write_npz_array(TEST_NPZ, constant::EXPORTED_DATA_KEY, vec![0.5f32; 4], vec![2, 2])
            .unwrap();

        let err = read_probabilities_npz(TEST_NPZ).unwrap_err();
        assert!(matches!(err, ProbmapError::SchemaMismatch(_)));

        std::fs::remove_file(TEST_NPZ).unwrap();
    }

    #[test]
    fn test_integer_dtype() {
        const TEST_NPZ: &str = "TEST_NPZ_INTEGER.npz";

        write_npz_array(TEST_NPZ, constant::EXPORTED_DATA_KEY, vec![1u8; 8], vec![2, 2, 2])
            .unwrap();

        let err = read_probabilities_npz(TEST_NPZ).unwrap_err();
        assert!(matches!(err, ProbmapError::SchemaMismatch(_)));

        std::fs::remove_file(TEST_NPZ).unwrap();
    }

    #[test]
    fn test_not_an_archive() {
        const TEST_NPZ: &str = "TEST_NPZ_NOT_AN_ARCHIVE.npz";

        std::fs::write(TEST_NPZ, b"not a zip archive").unwrap();

        let err = read_probabilities_npz(TEST_NPZ).unwrap_err();
        assert!(matches!(err, ProbmapError::SchemaMismatch(_)));

        std::fs::remove_file(TEST_NPZ).unwrap();
    }

    #[test]
    fn test_fortran_order() {
        // (h, w, c) = (1, 2, 2) stored column-major
        let data = vec![1, 2, 3, 4];
        assert_eq!(into_row_major(data, Order::Fortran, 1, 2, 2), vec![1, 3, 2, 4]);

        let data = vec![1, 2, 3, 4, 5, 6, 7, 8];
        assert_eq!(
            into_row_major(data, Order::Fortran, 2, 2, 2),
            vec![1, 5, 3, 7, 2, 6, 4, 8]
        );
        assert_eq!(into_row_major(vec![1, 2], Order::C, 1, 1, 2), vec![1, 2]);
    }

    #[test]
    fn test_write_shape_mismatch() {
        let err = write_npz_array("TEST_NPZ_UNUSED.npz", "x", vec![0f32; 3], vec![2, 2]);
        assert!(err.is_err());
        assert!(!Path::new("TEST_NPZ_UNUSED.npz").exists());
    }
}
