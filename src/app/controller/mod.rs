pub mod commands;
pub mod interaction_controller;

pub use commands::{Notice, NoticeLevel, UiCommand};
pub use interaction_controller::InteractionController;
