//! Static figure rendering with tiny-skia.

use image::RgbaImage;
use tiny_skia::{Color, FillRule, LineCap, Paint, PathBuilder, Pixmap, Rect, Stroke, Transform};

use super::{ExportRequest, FigureStyle};
use crate::error::ExportError;
use crate::scene::{AtlasFrame, Camera, Rgb, SceneComposer, SceneState};

/// Maps display-space points onto the pixmap.
struct Viewport {
    camera: Camera,
    target: [f32; 3],
    origin: [f32; 2],
}

impl Viewport {
    fn new(mut camera: Camera, frame: &AtlasFrame, size: [f32; 2]) -> Self {
        camera.fit(frame.bounds(), [size[0] * 0.8, size[1] * 0.8]);
        Self {
            camera,
            target: frame.center(),
            origin: [size[0] / 2.0, size[1] / 2.0],
        }
    }

    fn to_pixel(&self, p: [f32; 3]) -> [f32; 2] {
        let [u, v] = self.camera.project(p, self.target);
        [u + self.origin[0], v + self.origin[1]]
    }
}

fn paint(color: Rgb, alpha: u8) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r(), color.g(), color.b(), alpha);
    paint.anti_alias = true;
    paint
}

fn stroke_line(pixmap: &mut Pixmap, from: [f32; 2], to: [f32; 2], paint: &Paint, width: f32) {
    let mut pb = PathBuilder::new();
    pb.move_to(from[0], from[1]);
    pb.line_to(to[0], to[1]);
    if let Some(path) = pb.finish() {
        let stroke = Stroke {
            width,
            line_cap: LineCap::Round,
            ..Default::default()
        };
        pixmap.stroke_path(&path, paint, &stroke, Transform::identity(), None);
    }
}

fn fill_disc(pixmap: &mut Pixmap, center: [f32; 2], radius: f32, paint: &Paint) {
    if let Some(path) = PathBuilder::from_circle(center[0], center[1], radius) {
        pixmap.fill_path(&path, paint, FillRule::Winding, Transform::identity(), None);
    }
}

/// Edges of the volume's bounding box in display space.
fn box_edges(bounds: [f32; 3]) -> Vec<([f32; 3], [f32; 3])> {
    let [bx, by, bz] = bounds;
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
    let pairs = [
        (0, 1),
        (1, 2),
        (2, 3),
        (3, 0),
        (4, 5),
        (5, 6),
        (6, 7),
        (7, 4),
        (0, 4),
        (1, 5),
        (2, 6),
        (3, 7),
    ];
    pairs
        .iter()
        .map(|&(a, b)| (corners[a], corners[b]))
        .collect()
}

pub(super) fn render_figure(
    state: &SceneState,
    composer: &SceneComposer,
    request: &ExportRequest,
    style: FigureStyle,
) -> Result<RgbaImage, ExportError> {
    let frame = composer.frame().ok_or(ExportError::NoVolume)?;
    let camera = request.projection.camera(state)?;
    let scale = request.scale();
    let [width, height] = request.pixel_size()?;
    let mut pixmap = Pixmap::new(width, height).ok_or(ExportError::InvalidSize(width, height))?;
    pixmap.fill(Color::WHITE);

    let viewport = Viewport::new(camera, &frame, [width as f32, height as f32]);

    let outline = paint(Rgb([180, 180, 180]), 255);
    for (a, b) in box_edges(frame.bounds()) {
        stroke_line(&mut pixmap, viewport.to_pixel(a), viewport.to_pixel(b), &outline, scale);
    }

    let region_alpha = (style.region_alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
    let voxel = (viewport.camera.zoom * 0.5).max(scale * 0.5);
    for (_, region) in composer.regions() {
        let region_paint = paint(region.color, region_alpha);
        for p in &region.outline {
            let [x, y] = viewport.to_pixel(*p);
            if let Some(rect) = Rect::from_xywh(x - voxel, y - voxel, voxel * 2.0, voxel * 2.0) {
                pixmap.fill_rect(rect, &region_paint, Transform::identity(), None);
            }
        }
    }

    // Crosshair through the cursor along each axis.
    let black = paint(Rgb([0, 0, 0]), 255);
    let cursor = state.view.cursor.map(|c| c as f32);
    let bounds = frame.bounds();
    for axis in 0..3 {
        let mut from = cursor;
        let mut to = cursor;
        from[axis] = 0.0;
        to[axis] = bounds[axis];
        stroke_line(
            &mut pixmap,
            viewport.to_pixel(frame.to_display(from)),
            viewport.to_pixel(frame.to_display(to)),
            &black,
            scale,
        );
    }

    let radius = style.point_size * scale * 0.5;
    for (_, roi) in composer.rois().filter(|(_, roi)| roi.visible) {
        let roi_paint = paint(roi.color, 255);
        for p in &roi.display {
            fill_disc(&mut pixmap, viewport.to_pixel(*p), radius, &roi_paint);
        }
    }

    // Scale bar, bottom left.
    let bar = style.scale_bar_voxels * viewport.camera.zoom;
    let margin = 20.0 * scale;
    let y = height as f32 - margin;
    stroke_line(&mut pixmap, [margin, y], [margin + bar, y], &black, 2.0 * scale);
    for x in [margin, margin + bar] {
        stroke_line(&mut pixmap, [x, y - 4.0 * scale], [x, y + 4.0 * scale], &black, scale);
    }

    // Axis triad, bottom right.
    let origin = [width as f32 - 3.0 * margin, height as f32 - 3.0 * margin];
    let length = 40.0 * scale;
    let colors = [Rgb([214, 39, 40]), Rgb([44, 160, 44]), Rgb([31, 119, 180])];
    for (axis, color) in colors.into_iter().enumerate() {
        let mut unit = [0.0; 3];
        unit[axis] = 1.0;
        let [u, v] = viewport.camera.project(unit, [0.0; 3]);
        let [pu, pv] = viewport.camera.project([0.0; 3], [0.0; 3]);
        let (du, dv) = (u - pu, v - pv);
        let norm = viewport.camera.zoom.max(f32::EPSILON);
        let tip = [origin[0] + du / norm * length, origin[1] + dv / norm * length];
        stroke_line(&mut pixmap, origin, tip, &paint(color, 255), 2.0 * scale);
    }

    // Opaque background, so the premultiplied data equals straight RGBA.
    RgbaImage::from_raw(width, height, pixmap.take())
        .ok_or_else(|| ExportError::Write("pixel buffer size mismatch".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::{AtlasProvider, SyntheticAtlasSource};
    use crate::export::{Projection, export_figure};
    use crate::roi::RoiPoints;
    use crate::scene::{RoiLayer, StateChange};
    use std::path::PathBuf;
    use std::sync::Arc;

    const MAGENTA: Rgb = Rgb([255, 0, 255]);

    fn style() -> FigureStyle {
        FigureStyle {
            point_size: 6.0,
            region_alpha: 0.1,
            scale_bar_voxels: 10.0,
        }
    }

    fn request(projection: &str, path: PathBuf) -> ExportRequest {
        ExportRequest {
            projection: Projection::Named(projection.to_string()),
            width: 200,
            height: 120,
            dpi: 100,
            path,
        }
    }

    async fn scene() -> (SceneState, SceneComposer) {
        let provider = AtlasProvider::new(Arc::new(SyntheticAtlasSource::new([20, 40, 10])));
        provider.marker_volume("jf5Tg").await.unwrap();
        provider.region_mask("pretectum").await.unwrap();

        let mut state = SceneState::default();
        state.marker = Some("jf5Tg".into());
        state.regions.insert("pretectum".into(), Rgb([0, 200, 0]));
        state.roi_sets.insert(
            "A".into(),
            RoiLayer {
                points: RoiPoints::from_rows(&[[2.0, 5.0, 5.0]]).unwrap(),
                visible: true,
                color: MAGENTA,
            },
        );

        let mut composer = SceneComposer::new(1);
        for change in [
            StateChange::MarkerLoaded("jf5Tg".into()),
            StateChange::RegionAdded("pretectum".into()),
            StateChange::RoiSetAdded("A".into()),
        ] {
            composer.apply(&change, &state, &provider);
        }
        (state, composer)
    }

    #[tokio::test]
    async fn figure_has_white_background_and_roi_points() {
        let (state, composer) = scene().await;
        let image = render_figure(&state, &composer, &request("xy", PathBuf::new()), style()).unwrap();

        assert_eq!(image.dimensions(), (200, 120));
        assert_eq!(image.get_pixel(0, 0).0, [255, 255, 255, 255]);
        assert!(image.pixels().any(|p| p.0 == [255, 0, 255, 255]));
    }

    #[tokio::test]
    async fn dpi_scales_the_output() {
        let (state, composer) = scene().await;
        let mut request = request("yz", PathBuf::new());
        request.dpi = 200;
        let image = render_figure(&state, &composer, &request, style()).unwrap();
        assert_eq!(image.dimensions(), (400, 240));
    }

    #[test]
    fn empty_scene_has_nothing_to_draw() {
        let result = render_figure(
            &SceneState::default(),
            &SceneComposer::new(1),
            &request("xy", PathBuf::new()),
            style(),
        );
        assert!(matches!(result, Err(ExportError::NoVolume)));
    }

    #[tokio::test]
    async fn oversized_figure_is_refused_before_rendering() {
        let (state, composer) = scene().await;
        let mut request = request("xy", PathBuf::new());
        request.width = 4000;
        request.height = 4000;
        request.dpi = 1200;
        let result = render_figure(&state, &composer, &request, style());
        assert!(matches!(result, Err(ExportError::InvalidSize(48000, 48000))));
    }

    #[tokio::test]
    async fn figure_is_written_as_png() {
        let (state, composer) = scene().await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("figures").join("scene.png");

        let written = export_figure(&state, &composer, &request("-xz", path.clone()), style()).unwrap();
        assert_eq!(written, path);
        let decoded = image::open(&path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (200, 120));
    }
}
