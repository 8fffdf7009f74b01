use image::{Rgba, RgbaImage};

use crate::atlas::Volume;
use crate::scene::palette::{Rgb, color_dodge};

/// The three orthogonal section planes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionAxis {
    Sagittal,
    Coronal,
    Transverse,
}

impl SectionAxis {
    pub const ALL: [SectionAxis; 3] = [
        SectionAxis::Sagittal,
        SectionAxis::Coronal,
        SectionAxis::Transverse,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SectionAxis::Sagittal => "Sagittal",
            SectionAxis::Coronal => "Coronal",
            SectionAxis::Transverse => "Transverse",
        }
    }

    /// Volume axis this section slices through.
    pub fn slice_axis(&self) -> usize {
        match self {
            SectionAxis::Sagittal => 0,
            SectionAxis::Coronal => 2,
            SectionAxis::Transverse => 1,
        }
    }

    /// Volume axes shown horizontally and vertically.
    fn plane_axes(&self) -> (usize, usize) {
        match self {
            SectionAxis::Sagittal => (1, 2),
            SectionAxis::Coronal => (1, 0),
            SectionAxis::Transverse => (0, 2),
        }
    }

    /// Image size in pixels `[width, height]` for a volume of `shape`.
    pub fn image_size(&self, shape: [usize; 3]) -> [usize; 2] {
        let (h, v) = self.plane_axes();
        [shape[h], shape[v]]
    }

    pub fn slice_count(&self, shape: [usize; 3]) -> usize {
        shape[self.slice_axis()]
    }

    /// Voxel coordinate to image coordinate; the vertical axis is flipped.
    pub fn to_image(&self, p: [f32; 3], shape: [usize; 3]) -> [f32; 2] {
        let (h, v) = self.plane_axes();
        [p[h], shape[v] as f32 - p[v]]
    }

    /// Inverse of [`to_image`](Self::to_image) for a point on slice `index`.
    pub fn to_voxel(&self, uv: [f32; 2], index: f32, shape: [usize; 3]) -> [f32; 3] {
        let (h, v) = self.plane_axes();
        let mut p = [0.0; 3];
        p[self.slice_axis()] = index;
        p[h] = uv[0];
        p[v] = shape[v] as f32 - uv[1];
        p
    }

    /// Writes the in-plane coordinates for image position `uv` into `cursor`,
    /// leaving the sliced coordinate untouched.
    pub fn apply_image_position(&self, uv: [f32; 2], shape: [usize; 3], cursor: &mut [usize; 3]) {
        let (h, v) = self.plane_axes();
        let clamp = |value: f32, len: usize| value.max(0.0).min(len.saturating_sub(1) as f32) as usize;
        cursor[h] = clamp(uv[0], shape[h]);
        cursor[v] = clamp(shape[v] as f32 - uv[1], shape[v]);
    }

    /// Image position of the crosshair through `cursor`.
    pub fn crosshair(&self, cursor: [usize; 3], shape: [usize; 3]) -> [f32; 2] {
        self.to_image(
            [cursor[0] as f32, cursor[1] as f32, cursor[2] as f32],
            shape,
        )
    }

    fn voxel_at(&self, index: usize, column: usize, row: usize, shape: [usize; 3]) -> [usize; 3] {
        let (h, v) = self.plane_axes();
        let mut voxel = [0; 3];
        voxel[self.slice_axis()] = index;
        voxel[h] = column;
        voxel[v] = shape[v] - 1 - row;
        voxel
    }
}

/// A region mask to draw on top of a section.
pub struct SectionOverlay<'a> {
    pub mask: &'a Volume,
    pub color: Rgb,
}

/// Marker slice in gray with region masks color-dodged on top.
pub fn compose_section(
    axis: SectionAxis,
    index: usize,
    marker: &Volume,
    overlays: &[SectionOverlay<'_>],
) -> RgbaImage {
    let shape = marker.shape();
    let [width, height] = axis.image_size(shape);
    let index = index.min(axis.slice_count(shape).saturating_sub(1));

    let overlays: Vec<&SectionOverlay<'_>> = overlays
        .iter()
        .filter(|overlay| overlay.mask.shape() == shape)
        .collect();

    RgbaImage::from_fn(width as u32, height as u32, |column, row| {
        let [x, y, z] = axis.voxel_at(index, column as usize, row as usize, shape);
        let gray = marker.get(x, y, z);
        let mut pixel = [gray, gray, gray];
        for overlay in &overlays {
            let strength = overlay.mask.get(x, y, z) as u32;
            if strength == 0 {
                continue;
            }
            for (channel, top) in pixel.iter_mut().zip(overlay.color.0) {
                let scaled = (top as u32 * strength / 255) as u8;
                *channel = color_dodge(*channel, scaled);
            }
        }
        Rgba([pixel[0], pixel[1], pixel[2], 255])
    })
}

/// ROI points lying in slice `index`, in image coordinates.
pub fn section_points(
    axis: SectionAxis,
    index: usize,
    shape: [usize; 3],
    points: impl IntoIterator<Item = [f32; 3]>,
) -> Vec<[f32; 2]> {
    let slice_axis = axis.slice_axis();
    points
        .into_iter()
        .filter(|p| p[slice_axis] >= 0.0 && p[slice_axis].floor() as usize == index)
        .map(|p| axis.to_image(p, shape))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    const SHAPE: [usize; 3] = [4, 6, 8];

    #[test]
    fn image_sizes_follow_plane_axes() {
        assert_eq!(SectionAxis::Sagittal.image_size(SHAPE), [6, 8]);
        assert_eq!(SectionAxis::Coronal.image_size(SHAPE), [6, 4]);
        assert_eq!(SectionAxis::Transverse.image_size(SHAPE), [4, 8]);
    }

    #[test]
    fn points_map_like_the_volume() {
        let p = [1.0, 2.0, 3.0];
        assert_eq!(SectionAxis::Sagittal.to_image(p, SHAPE), [2.0, 5.0]);
        assert_eq!(SectionAxis::Coronal.to_image(p, SHAPE), [2.0, 3.0]);
        assert_eq!(SectionAxis::Transverse.to_image(p, SHAPE), [1.0, 5.0]);

        for axis in SectionAxis::ALL {
            let uv = axis.to_image(p, SHAPE);
            let index = p[axis.slice_axis()];
            assert_eq!(axis.to_voxel(uv, index, SHAPE), p);
        }
    }

    #[test]
    fn only_points_in_the_slice_are_returned() {
        let points = vec![[1.2, 2.0, 3.0], [1.9, 0.0, 0.0], [2.0, 1.0, 1.0]];
        let slice = section_points(SectionAxis::Sagittal, 1, SHAPE, points);
        assert_eq!(slice, vec![[2.0, 5.0], [0.0, 8.0]]);
    }

    #[test]
    fn clicking_moves_the_in_plane_cursor() {
        let mut cursor = [1, 1, 1];
        SectionAxis::Coronal.apply_image_position([5.0, 1.0], SHAPE, &mut cursor);
        assert_eq!(cursor, [3, 5, 1]);

        SectionAxis::Transverse.apply_image_position([100.0, -4.0], SHAPE, &mut cursor);
        assert_eq!(cursor, [3, 5, 7]);
    }

    #[test]
    fn section_pixels_read_the_matching_voxel() {
        let mut data = Array3::<u8>::zeros((4, 6, 8));
        data[[2, 3, 0]] = 200;
        let marker = Volume::new(data);

        let image = compose_section(SectionAxis::Sagittal, 2, &marker, &[]);
        assert_eq!(image.dimensions(), (6, 8));
        // z = 0 is the bottom row.
        assert_eq!(image.get_pixel(3, 7).0, [200, 200, 200, 255]);
        assert_eq!(image.get_pixel(3, 0).0, [0, 0, 0, 255]);
    }

    #[test]
    fn region_overlay_tints_the_section() {
        let marker = Volume::new(Array3::from_elem((4, 6, 8), 100));
        let mut mask = Array3::<u8>::zeros((4, 6, 8));
        mask[[0, 0, 0]] = 255;
        let mask = Volume::new(mask);

        let overlays = [SectionOverlay {
            mask: &mask,
            color: Rgb([255, 0, 0]),
        }];
        let image = compose_section(SectionAxis::Coronal, 0, &marker, &overlays);
        let [width, height] = SectionAxis::Coronal.image_size(SHAPE);
        assert_eq!(image.dimensions(), (width as u32, height as u32));
        assert_eq!(image.get_pixel(0, 3).0, [255, 100, 100, 255]);
        assert_eq!(image.get_pixel(1, 3).0, [100, 100, 100, 255]);
    }
}
