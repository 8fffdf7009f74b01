use egui::epaint::Vertex;
use egui::{Color32, Key, Mesh, Pos2, Sense, Shape, Stroke, TextureHandle, TextureOptions, pos2, vec2};

use crate::app::controller::{InteractionController, UiCommand};
use crate::app::views::{View, color32, color32_alpha};
use crate::scene::{AtlasFrame, Camera, ORTHO_VIEWS, SceneComposer, SectionAxis, ViewParams};

const PAN_STEP: f32 = 4.0;
const ORBIT_STEP: f32 = 1.5;
const FAST: f32 = 5.0;

struct PlaneTexture {
    texture: Option<TextureHandle>,
    key: Option<(usize, u64)>,
}

/// Orthographic 3D view: the three cursor planes, region outlines and ROI
/// clouds. WASD pans, Q/E and R/F orbit, Shift speeds both up.
pub struct VolumeView {
    planes: [PlaneTexture; 3],
    fitted_for: Option<[f32; 3]>,
}

impl Default for VolumeView {
    fn default() -> Self {
        Self::new()
    }
}

impl VolumeView {
    pub fn new() -> Self {
        Self {
            planes: std::array::from_fn(|_| PlaneTexture {
                texture: None,
                key: None,
            }),
            fitted_for: None,
        }
    }

    fn refresh_planes(&mut self, ctx: &egui::Context, composer: &SceneComposer, cursor: [usize; 3]) {
        for (plane, axis) in self.planes.iter_mut().zip(SectionAxis::ALL) {
            let index = cursor[axis.slice_axis()];
            let key = (index, composer.section_revision());
            if plane.key == Some(key) {
                continue;
            }
            let Some(image) = composer.section_image(axis, index) else {
                continue;
            };
            let size = [image.width() as usize, image.height() as usize];
            let color_image = egui::ColorImage::from_rgba_unmultiplied(size, image.as_raw());
            match &mut plane.texture {
                Some(texture) => texture.set(color_image, TextureOptions::LINEAR),
                None => {
                    plane.texture = Some(ctx.load_texture(
                        format!("volume_plane_{}", axis.label()),
                        color_image,
                        TextureOptions::LINEAR,
                    ))
                }
            }
            plane.key = Some(key);
        }
    }

    /// Keyboard and mouse navigation; returns the updated camera.
    fn navigate(&self, ui: &egui::Ui, response: &egui::Response, mut camera: Camera) -> Camera {
        if response.dragged() {
            let delta = response.drag_delta();
            camera.orbit(-delta.x * 0.5, delta.y * 0.5);
        }
        if !response.hovered() {
            return camera;
        }
        ui.input(|input| {
            let speed = if input.modifiers.shift { FAST } else { 1.0 };
            let pan = PAN_STEP * speed;
            let orbit = ORBIT_STEP * speed;
            if input.key_down(Key::W) {
                camera.pan_by(0.0, -pan);
            }
            if input.key_down(Key::S) {
                camera.pan_by(0.0, pan);
            }
            if input.key_down(Key::A) {
                camera.pan_by(-pan, 0.0);
            }
            if input.key_down(Key::D) {
                camera.pan_by(pan, 0.0);
            }
            if input.key_down(Key::Q) {
                camera.orbit(-orbit, 0.0);
            }
            if input.key_down(Key::E) {
                camera.orbit(orbit, 0.0);
            }
            if input.key_down(Key::R) {
                camera.orbit(0.0, orbit);
            }
            if input.key_down(Key::F) {
                camera.orbit(0.0, -orbit);
            }
            let scroll = input.smooth_scroll_delta.y;
            if scroll.abs() > 0.0 {
                camera.zoom *= (1.0 + scroll * 0.0015).clamp(0.8, 1.25);
            }
        });
        camera
    }

    fn draw_plane(
        &self,
        painter: &egui::Painter,
        axis: SectionAxis,
        index: usize,
        frame: &AtlasFrame,
        to_screen: &impl Fn([f32; 3]) -> Pos2,
    ) {
        let Some(texture) = &self.planes[axis as usize].texture else {
            return;
        };
        let shape = frame.shape();
        let [width, height] = axis.image_size(shape);
        let (w, h) = (width as f32, height as f32);
        let plane = index as f32 + 0.5;
        let corners = [([0.0, 0.0], [0.0, 0.0]), ([w, 0.0], [1.0, 0.0]), ([w, h], [1.0, 1.0]), ([0.0, h], [0.0, 1.0])];

        let mut mesh = Mesh::with_texture(texture.id());
        for (image_pos, uv) in corners {
            let voxel = axis.to_voxel(image_pos, plane, shape);
            mesh.vertices.push(Vertex {
                pos: to_screen(frame.to_display(voxel)),
                uv: pos2(uv[0], uv[1]),
                color: Color32::from_white_alpha(220),
            });
        }
        mesh.add_triangle(0, 1, 2);
        mesh.add_triangle(0, 2, 3);
        painter.add(Shape::mesh(mesh));
    }
}

impl View for VolumeView {
    fn draw(
        &mut self,
        ui: &mut egui::Ui,
        controller: &InteractionController,
        commands: &mut Vec<UiCommand>,
    ) {
        let state = controller.state();
        let composer = controller.composer();
        let mut camera = state.view.camera;

        ui.horizontal(|ui| {
            ui.label("3D");
            for (name, _, _) in ORTHO_VIEWS {
                if !ui.small_button(*name).clicked() {
                    continue;
                }
                if let Some(named) = Camera::named(name) {
                    camera = Camera {
                        zoom: camera.zoom,
                        ..named
                    };
                }
            }
            if ui.small_button("Fit").clicked() {
                self.fitted_for = None;
            }
        });

        let Some(frame) = composer.frame() else {
            ui.label("No marker loaded");
            return;
        };

        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        if self.fitted_for != Some(frame.bounds()) {
            camera.fit(frame.bounds(), [rect.width() * 0.9, rect.height() * 0.9]);
            self.fitted_for = Some(frame.bounds());
        }
        camera = self.navigate(ui, &response, camera);
        if camera != state.view.camera {
            commands.push(UiCommand::SetView(ViewParams {
                camera,
                ..state.view
            }));
        }

        let cursor = state.view.cursor;
        self.refresh_planes(ui.ctx(), composer, cursor);

        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, Color32::BLACK);
        let target = frame.center();
        let center = rect.center();
        let to_screen = |p: [f32; 3]| -> Pos2 {
            let [u, v] = camera.project(p, target);
            center + vec2(u, v)
        };

        let [bx, by, bz] = frame.bounds();
        let corners = [
            [0.0, 0.0, 0.0],
            [bx, 0.0, 0.0],
            [bx, by, 0.0],
            [0.0, by, 0.0],
            [0.0, 0.0, bz],
            [bx, 0.0, bz],
            [bx, by, bz],
            [0.0, by, bz],
        ];
        let edge = Stroke::new(1.0, Color32::from_gray(90));
        for (a, b) in [(0, 1), (1, 2), (2, 3), (3, 0), (4, 5), (5, 6), (6, 7), (7, 4), (0, 4), (1, 5), (2, 6), (3, 7)] {
            painter.line_segment([to_screen(corners[a]), to_screen(corners[b])], edge);
        }

        for axis in SectionAxis::ALL {
            self.draw_plane(&painter, axis, cursor[axis.slice_axis()], &frame, &to_screen);
        }

        let region_alpha = controller.settings().view.region_alpha;
        for (_, region) in composer.regions() {
            let color = color32_alpha(region.color, region_alpha);
            for p in &region.outline {
                painter.circle_filled(to_screen(*p), 1.0, color);
            }
        }

        let radius = (controller.settings().view.point_size * 0.5).max(1.0);
        for (_, roi) in composer.rois().filter(|(_, roi)| roi.visible) {
            let color = color32(roi.color);
            for p in &roi.display {
                painter.circle_filled(to_screen(*p), radius, color);
            }
        }

        if response.hovered() {
            ui.ctx().request_repaint();
        }
    }
}
