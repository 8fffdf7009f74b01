pub mod atlas_app;
pub mod controller;
pub mod options;
pub mod views;

pub use atlas_app::{AtlasApp, atlas_source, run};
pub use controller::{InteractionController, Notice, UiCommand};
pub use options::{RunOptions, RunOptionsBuilder};
