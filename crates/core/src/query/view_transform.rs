use crate::shared::constants::{DEFAULT_HALF_HEIGHT, DEFAULT_HALF_WIDTH, DEFAULT_RATIO};

/// Maps model-space coordinates into the host's stage coordinates.
///
/// `x' = half_width - x * scale`, negated when the video is not mirrored.
/// `y' = half_height - y * scale`. Mirroring never affects y.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    pub scale: f64,
    pub mirrored: bool,
    pub half_width: f64,
    pub half_height: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            scale: DEFAULT_RATIO,
            mirrored: true,
            half_width: DEFAULT_HALF_WIDTH,
            half_height: DEFAULT_HALF_HEIGHT,
        }
    }
}

impl ViewTransform {
    pub fn map_x(&self, raw_x: f64) -> f64 {
        let x = self.half_width - raw_x * self.scale;
        if self.mirrored {
            x
        } else {
            -x
        }
    }

    pub fn map_y(&self, raw_y: f64) -> f64 {
        self.half_height - raw_y * self.scale
    }
}
