pub mod control_panel;
pub mod export_view;
pub mod section_view;
pub mod volume_view;

use crate::app::controller::{InteractionController, UiCommand};
use crate::scene::Rgb;

/// A panel of the viewer. Views read the controller and queue commands; they
/// never mutate the scene themselves.
pub trait View {
    fn draw(
        &mut self,
        ui: &mut egui::Ui,
        controller: &InteractionController,
        commands: &mut Vec<UiCommand>,
    );
}

pub(crate) fn color32(color: Rgb) -> egui::Color32 {
    egui::Color32::from_rgb(color.r(), color.g(), color.b())
}

pub(crate) fn color32_alpha(color: Rgb, alpha: f32) -> egui::Color32 {
    let alpha = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
    egui::Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), alpha)
}
