pub mod ingest;
pub mod npy;
pub mod points;
pub mod table;

pub use ingest::{RoiFileFormat, ingest, ingest_file};
pub use points::{RoiInput, RoiPoints, RoiSet, SINGLE_SET_NAME};
