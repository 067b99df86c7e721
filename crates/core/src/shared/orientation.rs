use image::{imageops, GrayImage};
use serde::{Deserialize, Serialize};

/// How raw sensor pixels must be transformed to match the visual orientation.
///
/// Variants follow the eight EXIF orientations. `LeftMirrored` is what a
/// portrait device sees from a mirrored front camera.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Orientation {
    Up,
    UpMirrored,
    Down,
    DownMirrored,
    LeftMirrored,
    Right,
    RightMirrored,
    Left,
}

impl Orientation {
    pub const ALL: &[Orientation] = &[
        Orientation::Up,
        Orientation::UpMirrored,
        Orientation::Down,
        Orientation::DownMirrored,
        Orientation::LeftMirrored,
        Orientation::Right,
        Orientation::RightMirrored,
        Orientation::Left,
    ];

    /// True when uprighting rotates the image by a quarter turn.
    pub fn swaps_axes(self) -> bool {
        matches!(
            self,
            Orientation::LeftMirrored
                | Orientation::Right
                | Orientation::RightMirrored
                | Orientation::Left
        )
    }

    /// Dimensions of a `width x height` sensor image once uprighted.
    pub fn upright_dimensions(self, width: u32, height: u32) -> (u32, u32) {
        if self.swaps_axes() {
            (height, width)
        } else {
            (width, height)
        }
    }

    /// Returns an upright copy of a sensor-oriented grayscale image.
    pub fn apply_gray(self, image: &GrayImage) -> GrayImage {
        match self {
            Orientation::Up => image.clone(),
            Orientation::UpMirrored => imageops::flip_horizontal(image),
            Orientation::Down => imageops::rotate180(image),
            Orientation::DownMirrored => imageops::flip_vertical(image),
            // transpose
            Orientation::LeftMirrored => imageops::flip_horizontal(&imageops::rotate90(image)),
            Orientation::Right => imageops::rotate90(image),
            // transverse
            Orientation::RightMirrored => imageops::flip_horizontal(&imageops::rotate270(image)),
            Orientation::Left => imageops::rotate270(image),
        }
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Orientation::Up => "up",
            Orientation::UpMirrored => "up-mirrored",
            Orientation::Down => "down",
            Orientation::DownMirrored => "down-mirrored",
            Orientation::LeftMirrored => "left-mirrored",
            Orientation::Right => "right",
            Orientation::RightMirrored => "right-mirrored",
            Orientation::Left => "left",
        };
        write!(f, "{name}")
    }
}
