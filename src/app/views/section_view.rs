use egui::{Color32, Pos2, Rect, Sense, Stroke, TextureHandle, TextureOptions, pos2, vec2};

use crate::app::controller::{InteractionController, UiCommand};
use crate::app::views::{View, color32};
use crate::scene::{SceneComposer, SectionAxis};

/// One orthogonal section with crosshair and in-slice ROI points. Clicking
/// or dragging moves the cursor.
pub struct SectionView {
    axis: SectionAxis,
    texture: Option<TextureHandle>,
    /// Slice index and composer revision the texture was built from.
    texture_key: Option<(usize, u64)>,
}

impl SectionView {
    pub fn new(axis: SectionAxis) -> Self {
        Self {
            axis,
            texture: None,
            texture_key: None,
        }
    }

    fn refresh_texture(&mut self, ctx: &egui::Context, composer: &SceneComposer, index: usize) {
        let key = (index, composer.section_revision());
        if self.texture_key == Some(key) && self.texture.is_some() {
            return;
        }
        let Some(image) = composer.section_image(self.axis, index) else {
            return;
        };
        let size = [image.width() as usize, image.height() as usize];
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, image.as_raw());
        match &mut self.texture {
            Some(texture) => texture.set(color_image, TextureOptions::NEAREST),
            None => {
                self.texture = Some(ctx.load_texture(
                    format!("section_{}", self.axis.label()),
                    color_image,
                    TextureOptions::NEAREST,
                ));
            }
        }
        self.texture_key = Some(key);
    }
}

impl View for SectionView {
    fn draw(
        &mut self,
        ui: &mut egui::Ui,
        controller: &InteractionController,
        commands: &mut Vec<UiCommand>,
    ) {
        let composer = controller.composer();
        let Some(frame) = composer.frame() else {
            ui.label(format!("{}: no marker loaded", self.axis.label()));
            return;
        };
        let shape = frame.shape();
        let slice_axis = self.axis.slice_axis();
        let mut cursor = controller.state().view.cursor;

        ui.horizontal(|ui| {
            ui.label(self.axis.label());
            let last = self.axis.slice_count(shape).saturating_sub(1);
            if ui
                .add(egui::Slider::new(&mut cursor[slice_axis], 0..=last))
                .changed()
            {
                commands.push(UiCommand::SetCursor(cursor));
            }
        });

        let index = cursor[slice_axis];
        self.refresh_texture(ui.ctx(), composer, index);
        let Some(texture) = &self.texture else {
            return;
        };

        let [width, height] = self.axis.image_size(shape);
        let available = ui.available_size();
        let scale = (available.x / width as f32)
            .min(available.y / height as f32)
            .max(0.05);
        let (rect, response) = ui.allocate_exact_size(
            vec2(width as f32 * scale, height as f32 * scale),
            Sense::click_and_drag(),
        );
        let painter = ui.painter_at(rect);
        painter.image(
            texture.id(),
            rect,
            Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0)),
            Color32::WHITE,
        );

        let to_screen = |uv: [f32; 2]| -> Pos2 { rect.min + vec2(uv[0] * scale, uv[1] * scale) };

        let [cu, cv] = self.axis.crosshair(cursor, shape);
        let crosshair = Stroke::new(1.0, Color32::from_rgb(255, 220, 0));
        let center = to_screen([cu, cv]);
        painter.vline(center.x, rect.y_range(), crosshair);
        painter.hline(rect.x_range(), center.y, crosshair);

        let radius = (controller.settings().view.point_size * 0.5).max(1.5);
        for set in composer.section_points(self.axis, index) {
            let color = color32(set.color);
            for point in set.points {
                painter.circle_filled(to_screen(point), radius, color);
            }
        }

        if let Some(pos) = response.interact_pointer_pos() {
            let local = pos - rect.min;
            self.axis
                .apply_image_position([local.x / scale, local.y / scale], shape, &mut cursor);
            if cursor != controller.state().view.cursor {
                commands.push(UiCommand::SetCursor(cursor));
            }
        }
    }
}
