pub mod camera;
pub mod composer;
pub mod frame;
pub mod palette;
pub mod section;
pub mod state;

pub use camera::{Camera, ORTHO_VIEWS};
pub use composer::{RegionPrimitive, RoiPrimitive, SceneComposer, SectionPoints, VolumePrimitive};
pub use frame::AtlasFrame;
pub use palette::{ColorAssigner, Rgb};
pub use section::SectionAxis;
pub use state::{RoiLayer, SceneState, StateChange, ViewParams};
