/// Categorical palette: the ten category10 colors followed by glasbey extensions.
pub const CATEGORICAL: &[[u8; 3]] = &[
    [31, 119, 180],
    [255, 127, 14],
    [44, 160, 44],
    [214, 39, 40],
    [148, 103, 189],
    [140, 86, 75],
    [227, 119, 194],
    [127, 127, 127],
    [188, 189, 34],
    [23, 190, 207],
    [174, 199, 232],
    [255, 187, 120],
    [152, 223, 138],
    [255, 152, 150],
    [197, 176, 213],
    [196, 156, 148],
    [247, 182, 210],
    [0, 87, 66],
    [219, 219, 141],
    [158, 218, 229],
    [94, 0, 159],
    [121, 81, 0],
    [0, 52, 255],
    [213, 170, 0],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub fn categorical(index: usize) -> Self {
        Self(CATEGORICAL[index % CATEGORICAL.len()])
    }

    pub fn r(&self) -> u8 {
        self.0[0]
    }

    pub fn g(&self) -> u8 {
        self.0[1]
    }

    pub fn b(&self) -> u8 {
        self.0[2]
    }

    pub fn to_f32(self) -> [f32; 3] {
        [
            self.0[0] as f32 / 255.0,
            self.0[1] as f32 / 255.0,
            self.0[2] as f32 / 255.0,
        ]
    }
}

/// Color-dodge blend of `top` over `base`, per channel.
pub fn color_dodge(base: u8, top: u8) -> u8 {
    if top == 255 {
        return 255;
    }
    let value = (base as u32 * 255) / (255 - top as u32);
    value.min(255) as u8
}

/// Hands out palette slots in arrival order and remembers them by name, so a
/// name keeps its color for the session even after removal and re-adding.
#[derive(Debug, Default, Clone)]
pub struct ColorAssigner {
    assigned: indexmap::IndexMap<String, Rgb>,
}

impl ColorAssigner {
    pub fn color_for(&mut self, name: &str) -> Rgb {
        let next = self.assigned.len();
        *self
            .assigned
            .entry(name.to_string())
            .or_insert_with(|| Rgb::categorical(next))
    }

    pub fn set(&mut self, name: &str, color: Rgb) {
        self.assigned.insert(name.to_string(), color);
    }
}
