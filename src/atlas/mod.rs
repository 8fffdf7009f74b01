pub mod http_source;
pub mod provider;
pub mod regions;
pub mod source;
pub mod synthetic;
pub mod tiff_stack;
pub mod volume;

pub use http_source::HttpAtlasSource;
pub use provider::AtlasProvider;
pub use regions::{RegionCatalog, RegionEntry};
pub use source::{AtlasSource, MarkerCatalog, MarkerEntry};
pub use synthetic::SyntheticAtlasSource;
pub use volume::Volume;
