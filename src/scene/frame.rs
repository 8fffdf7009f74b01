/// The one mapping from atlas voxel space to display space. Every primitive
/// (volume, region masks, ROI points) goes through the same frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtlasFrame {
    bounds: [f32; 3],
}

impl AtlasFrame {
    pub fn new(shape: [usize; 3]) -> Self {
        Self {
            bounds: [shape[0] as f32, shape[1] as f32, shape[2] as f32],
        }
    }

    pub fn bounds(&self) -> [f32; 3] {
        self.bounds
    }

    pub fn shape(&self) -> [usize; 3] {
        [
            self.bounds[0] as usize,
            self.bounds[1] as usize,
            self.bounds[2] as usize,
        ]
    }

    pub fn center(&self) -> [f32; 3] {
        [
            self.bounds[0] / 2.0,
            self.bounds[1] / 2.0,
            self.bounds[2] / 2.0,
        ]
    }

    /// Mirrors x so the rostral end faces the viewer's left.
    pub fn to_display(&self, p: [f32; 3]) -> [f32; 3] {
        [self.bounds[0] - p[0], p[1], p[2]]
    }

    pub fn to_display_all(&self, points: impl IntoIterator<Item = [f32; 3]>) -> Vec<[f32; 3]> {
        points.into_iter().map(|p| self.to_display(p)).collect()
    }
}
