use std::io::Cursor;
use std::path::Path;

use ndarray::ArrayD;
use ndarray_npy::{ReadNpyError, ReadNpyExt};

use crate::error::RoiError;
use crate::roi::points::RoiPoints;

/// Reads an `(N, 3)` `.npy` array of any common numeric dtype.
pub fn read_points(path: &Path) -> Result<RoiPoints, RoiError> {
    let bytes = std::fs::read(path).map_err(|e| RoiError::Read {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let (shape, values) = decode(&bytes).map_err(|e| RoiError::Read {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    RoiPoints::from_dyn(&shape, values)
}

fn decode(bytes: &[u8]) -> Result<(Vec<usize>, Vec<f64>), ReadNpyError> {
    macro_rules! try_dtype {
        ($ty:ty) => {
            match ArrayD::<$ty>::read_npy(Cursor::new(bytes)) {
                Ok(array) => {
                    let shape = array.shape().to_vec();
                    return Ok((shape, array.iter().map(|v| *v as f64).collect()));
                }
                Err(ReadNpyError::WrongDescriptor(_)) => {}
                Err(e) => return Err(e),
            }
        };
    }

    try_dtype!(f64);
    try_dtype!(f32);
    try_dtype!(i64);
    try_dtype!(i32);
    try_dtype!(u16);
    try_dtype!(u8);

    ArrayD::<f64>::read_npy(Cursor::new(bytes)).map(|array| {
        let shape = array.shape().to_vec();
        (shape, array.iter().copied().collect())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2, array};
    use ndarray_npy::write_npy;

    #[test]
    fn float_and_integer_arrays_load() {
        let dir = tempfile::tempdir().unwrap();

        let floats = dir.path().join("floats.npy");
        write_npy(&floats, &array![[1.5f64, 2.0, 3.0], [4.0, 5.0, 6.0]]).unwrap();
        let points = read_points(&floats).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points.rows().next(), Some([1.5, 2.0, 3.0]));

        let ints = dir.path().join("ints.npy");
        write_npy(&ints, &array![[10i32, 20, 30]]).unwrap();
        assert_eq!(read_points(&ints).unwrap().rows().next(), Some([10.0, 20.0, 30.0]));
    }

    #[test]
    fn zero_row_array_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.npy");
        write_npy(&path, &Array2::<f32>::zeros((0, 3))).unwrap();
        assert!(read_points(&path).unwrap().is_empty());
    }

    #[test]
    fn wrong_shape_is_rejected() {
        let dir = tempfile::tempdir().unwrap();

        let two_cols = dir.path().join("two.npy");
        write_npy(&two_cols, &Array2::<f64>::zeros((5, 2))).unwrap();
        assert!(matches!(read_points(&two_cols), Err(RoiError::BadShape(_))));

        let flat = dir.path().join("flat.npy");
        write_npy(&flat, &Array1::<f64>::zeros(3)).unwrap();
        assert!(matches!(read_points(&flat), Err(RoiError::BadShape(_))));
    }

    #[test]
    fn garbage_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.npy");
        std::fs::write(&path, b"definitely not numpy").unwrap();
        assert!(matches!(read_points(&path), Err(RoiError::Read { .. })));
    }
}
