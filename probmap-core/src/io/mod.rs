mod h5;
mod npz;

use std::path::Path;

use crate::constant;
use crate::error::ProbmapError;
use crate::im::ProbabilityVolume;

pub use h5::read_probabilities_h5;
pub use h5::write_h5_dataset;
pub use h5::write_probabilities_h5;
pub use npz::read_probabilities_npz;
pub use npz::write_npz_array;
pub use npz::write_probabilities_npz;

/// Read a probability volume, choosing the container by file extension
///
/// HDF5 files (.h5, .hdf5) are the format exported by pixel classifiers.
/// Numpy archives (.npz) holding an `exported_data` array are also read.
pub fn read_probabilities<P: AsRef<Path>>(path: P) -> Result<ProbabilityVolume, ProbmapError> {
    let path = path.as_ref();

    if !path.is_file() {
        return Err(ProbmapError::SourceNotFound(path.display().to_string()));
    }

    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "h5" | "hdf5" => read_probabilities_h5(path),
        "npz" => read_probabilities_npz(path),
        _ => Err(ProbmapError::SchemaMismatch(format!(
            "File at {} is not a probability map container. Must be one of: {:?}",
            path.display(),
            constant::SUPPORTED_PROBABILITY_FORMATS
        ))),
    }
}
