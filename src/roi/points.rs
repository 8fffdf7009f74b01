use indexmap::IndexMap;
use ndarray::{Array2, Axis};

use crate::error::RoiError;

/// `N x 3` ROI coordinates in atlas voxel space.
#[derive(Debug, Clone, PartialEq)]
pub struct RoiPoints {
    coords: Array2<f32>,
}

impl RoiPoints {
    pub fn empty() -> Self {
        Self {
            coords: Array2::zeros((0, 3)),
        }
    }

    pub fn from_rows(rows: &[[f32; 3]]) -> Result<Self, RoiError> {
        let flat: Vec<f32> = rows.iter().flatten().copied().collect();
        let coords = Array2::from_shape_vec((rows.len(), 3), flat)
            .map_err(|_| RoiError::BadShape(vec![rows.len(), 3]))?;
        Self::from_array(coords)
    }

    /// Accepts any `(N, 3)` array of finite values.
    pub fn from_array(coords: Array2<f32>) -> Result<Self, RoiError> {
        if coords.ncols() != 3 {
            return Err(RoiError::BadShape(coords.shape().to_vec()));
        }
        if let Some((row, _)) = coords
            .axis_iter(Axis(0))
            .enumerate()
            .find(|(_, row)| row.iter().any(|v| !v.is_finite()))
        {
            return Err(RoiError::NonFinite(row));
        }
        Ok(Self { coords })
    }

    /// Builds points from an arbitrary-rank array, which must be exactly `(N, 3)`.
    pub fn from_dyn(shape: &[usize], values: Vec<f64>) -> Result<Self, RoiError> {
        if shape.len() != 2 || shape[1] != 3 {
            return Err(RoiError::BadShape(shape.to_vec()));
        }
        let values: Vec<f32> = values.into_iter().map(|v| v as f32).collect();
        let coords = Array2::from_shape_vec((shape[0], 3), values)
            .map_err(|_| RoiError::BadShape(shape.to_vec()))?;
        Self::from_array(coords)
    }

    /// Assembles points from named columns; `x`, `y` and `z` must all be present.
    pub fn from_columns(columns: &IndexMap<String, Vec<f64>>) -> Result<Self, RoiError> {
        let (Some(x), Some(y), Some(z)) = (columns.get("x"), columns.get("y"), columns.get("z"))
        else {
            return Err(RoiError::MissingColumns(columns.keys().cloned().collect()));
        };
        if x.len() != y.len() || y.len() != z.len() {
            return Err(RoiError::RaggedColumns(x.len(), y.len(), z.len()));
        }
        let rows: Vec<[f32; 3]> = x
            .iter()
            .zip(y)
            .zip(z)
            .map(|((x, y), z)| [*x as f32, *y as f32, *z as f32])
            .collect();
        Self::from_rows(&rows)
    }

    pub fn len(&self) -> usize {
        self.coords.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ncols(&self) -> usize {
        self.coords.ncols()
    }

    pub fn rows(&self) -> impl Iterator<Item = [f32; 3]> + '_ {
        self.coords
            .axis_iter(Axis(0))
            .map(|row| [row[0], row[1], row[2]])
    }
}

/// A named, colorable collection of ROI points.
#[derive(Debug, Clone, PartialEq)]
pub struct RoiSet {
    pub name: String,
    pub points: RoiPoints,
}

impl RoiSet {
    pub fn new(name: impl Into<String>, points: RoiPoints) -> Result<Self, RoiError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(RoiError::EmptyName);
        }
        Ok(Self { name, points })
    }
}

/// In-memory ROI input: one unnamed array, or several named ones.
#[derive(Debug, Clone, PartialEq)]
pub enum RoiInput {
    Single(RoiPoints),
    Named(IndexMap<String, RoiPoints>),
}

pub const SINGLE_SET_NAME: &str = "ROIs";

impl RoiInput {
    /// Resolves into ROI sets; later duplicates of a name replace earlier ones.
    pub fn into_sets(self) -> Result<Vec<RoiSet>, RoiError> {
        match self {
            RoiInput::Single(points) => Ok(vec![RoiSet::new(SINGLE_SET_NAME, points)?]),
            RoiInput::Named(sets) => sets
                .into_iter()
                .map(|(name, points)| RoiSet::new(name, points))
                .collect(),
        }
    }
}
