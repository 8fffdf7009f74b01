use ndarray::Array3;

/// An 8-bit intensity volume indexed as `[x, y, z]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    data: Array3<u8>,
}

impl Volume {
    pub fn new(data: Array3<u8>) -> Self {
        Self { data }
    }

    /// Builds a volume from TIFF-ordered pages (`z` pages of `height` rows of `width` samples).
    pub fn from_pages(width: usize, height: usize, pages: Vec<Vec<u8>>) -> Option<Self> {
        let depth = pages.len();
        let mut data = Array3::<u8>::zeros((width, height, depth));
        for (z, page) in pages.iter().enumerate() {
            if page.len() != width * height {
                return None;
            }
            for (y, row) in page.chunks_exact(width).enumerate() {
                for (x, value) in row.iter().enumerate() {
                    data[[x, y, z]] = *value;
                }
            }
        }
        Some(Self { data })
    }

    pub fn shape(&self) -> [usize; 3] {
        let (nx, ny, nz) = self.data.dim();
        [nx, ny, nz]
    }

    pub fn get(&self, x: usize, y: usize, z: usize) -> u8 {
        self.data.get([x, y, z]).copied().unwrap_or(0)
    }

    pub fn is_set(&self, x: usize, y: usize, z: usize) -> bool {
        self.get(x, y, z) > 0
    }

    /// Voxels inside the mask that touch the outside along any of the six faces.
    pub fn boundary_voxels(&self, stride: usize) -> Vec<[f32; 3]> {
        let [nx, ny, nz] = self.shape();
        let stride = stride.max(1);
        let mut voxels = Vec::new();
        let mut seen = 0usize;
        for x in 0..nx {
            for y in 0..ny {
                for z in 0..nz {
                    if !self.is_set(x, y, z) || !self.touches_outside(x, y, z) {
                        continue;
                    }
                    if seen % stride == 0 {
                        voxels.push([x as f32, y as f32, z as f32]);
                    }
                    seen += 1;
                }
            }
        }
        voxels
    }

    fn touches_outside(&self, x: usize, y: usize, z: usize) -> bool {
        let [nx, ny, nz] = self.shape();
        if x == 0 || y == 0 || z == 0 || x + 1 == nx || y + 1 == ny || z + 1 == nz {
            return true;
        }
        !(self.is_set(x - 1, y, z)
            && self.is_set(x + 1, y, z)
            && self.is_set(x, y - 1, z)
            && self.is_set(x, y + 1, z)
            && self.is_set(x, y, z - 1)
            && self.is_set(x, y, z + 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_map_to_xyz_order() {
        // 3 wide, 2 high, 2 pages
        let pages = vec![vec![0, 1, 2, 3, 4, 5], vec![6, 7, 8, 9, 10, 11]];
        let volume = Volume::from_pages(3, 2, pages).unwrap();
        assert_eq!(volume.shape(), [3, 2, 2]);
        assert_eq!(volume.get(2, 0, 0), 2);
        assert_eq!(volume.get(0, 1, 0), 3);
        assert_eq!(volume.get(1, 1, 1), 10);
    }

    #[test]
    fn mismatched_page_is_rejected() {
        assert!(Volume::from_pages(3, 2, vec![vec![0; 5]]).is_none());
    }

    #[test]
    fn solid_cube_boundary_excludes_the_core() {
        let volume = Volume::new(Array3::from_elem((5, 5, 5), 1));
        let boundary = volume.boundary_voxels(1);
        assert_eq!(boundary.len(), 125 - 27);
        assert!(!boundary.contains(&[2.0, 2.0, 2.0]));
    }

    #[test]
    fn reads_outside_the_volume_are_zero() {
        let volume = Volume::new(Array3::from_elem((2, 3, 4), 7));
        assert_eq!(volume.get(1, 2, 3), 7);
        assert_eq!(volume.get(2, 0, 0), 0);
        assert!(!volume.is_set(0, 3, 0));
    }
}
