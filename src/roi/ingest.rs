use std::path::Path;

use tracing::{debug, info};

use crate::error::RoiError;
use crate::roi::points::{RoiInput, RoiPoints, RoiSet};
use crate::roi::{npy, table};

/// Recognized file formats, by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoiFileFormat {
    /// Hierarchical table container with `x`, `y`, `z` columns.
    Hdf5,
    /// Flat `(N, 3)` typed array.
    Npy,
}

impl RoiFileFormat {
    pub fn from_path(path: &Path) -> Result<Self, RoiError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "h5" | "hdf5" => Ok(Self::Hdf5),
            "npy" => Ok(Self::Npy),
            _ => Err(RoiError::UnsupportedExtension(extension)),
        }
    }
}

pub fn ingest(input: RoiInput) -> Result<Vec<RoiSet>, RoiError> {
    input.into_sets()
}

/// Reads ROI sets from a file. Sets are named after the file stem, with the
/// group appended for tables nested inside an HDF5 file.
pub fn ingest_file(path: &Path) -> Result<Vec<RoiSet>, RoiError> {
    if !path.is_file() {
        return Err(RoiError::NotFound(path.to_path_buf()));
    }
    let format = RoiFileFormat::from_path(path)?;
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("ROIs")
        .to_string();
    debug!("Reading {:?} file {}", format, path.display());

    let sets = match format {
        RoiFileFormat::Npy => vec![RoiSet::new(stem, npy::read_points(path)?)?],
        RoiFileFormat::Hdf5 => table::read_tables(path)?
            .into_iter()
            .map(|table| {
                let name = match &table.group {
                    Some(group) => format!("{stem}/{group}"),
                    None => stem.clone(),
                };
                RoiSet::new(name, RoiPoints::from_columns(&table.columns)?)
            })
            .collect::<Result<Vec<_>, _>>()?,
    };

    info!(
        "Imported {} ROI set(s) from {}",
        sets.len(),
        path.display()
    );
    Ok(sets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use ndarray_npy::write_npy;
    use std::path::PathBuf;

    #[test]
    fn formats_follow_extension() {
        assert_eq!(
            RoiFileFormat::from_path(Path::new("a/cells.NPY")).unwrap(),
            RoiFileFormat::Npy
        );
        assert_eq!(
            RoiFileFormat::from_path(Path::new("cells.hdf5")).unwrap(),
            RoiFileFormat::Hdf5
        );
        assert!(matches!(
            RoiFileFormat::from_path(Path::new("cells.csv")),
            Err(RoiError::UnsupportedExtension(ext)) if ext == "csv"
        ));
    }

    #[test]
    fn missing_file_is_not_found() {
        let result = ingest_file(&PathBuf::from("/no/such/cells.npy"));
        assert!(matches!(result, Err(RoiError::NotFound(_))));
    }

    #[test]
    fn npy_file_becomes_a_set_named_after_the_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tectum_cells.npy");
        write_npy(&path, &array![[1.0f32, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]]).unwrap();

        let sets = ingest_file(&path).unwrap();
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].name, "tectum_cells");
        assert_eq!(sets[0].points.len(), 3);
        assert_eq!(sets[0].points.ncols(), 3);
    }
}
