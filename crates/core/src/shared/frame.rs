use image::GrayImage;
use ndarray::ArrayView3;

use crate::shared::orientation::Orientation;

/// Bytes per pixel of the fixed BGRA capture format.
pub const BGRA_CHANNELS: usize = 4;

/// A captured camera frame: contiguous BGRA bytes in row-major sensor order.
///
/// The orientation tag says how the sensor image maps onto the visual
/// orientation; `index` is the capture sequence number.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    orientation: Orientation,
    index: u64,
}

impl Frame {
    pub fn new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        orientation: Orientation,
        index: u64,
    ) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * BGRA_CHANNELS,
            "data length must equal width * height * 4"
        );
        Self {
            data,
            width,
            height,
            orientation,
            index,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(
            (self.height as usize, self.width as usize, BGRA_CHANNELS),
            &self.data,
        )
        .expect("Frame data length must match dimensions")
    }

    /// BT.601 luma in sensor orientation.
    pub fn to_luma(&self) -> GrayImage {
        let pixels = self.as_ndarray();
        GrayImage::from_fn(self.width, self.height, |x, y| {
            let (row, col) = (y as usize, x as usize);
            let b = f32::from(pixels[[row, col, 0]]);
            let g = f32::from(pixels[[row, col, 1]]);
            let r = f32::from(pixels[[row, col, 2]]);
            image::Luma([(0.299 * r + 0.587 * g + 0.114 * b).round().min(255.0) as u8])
        })
    }

    /// Luma image rotated/mirrored into the frame's visual orientation.
    pub fn upright_luma(&self) -> GrayImage {
        self.orientation.apply_gray(&self.to_luma())
    }
}

/// Converts tightly packed RGBA bytes to BGRA in place.
pub fn rgba_to_bgra(mut data: Vec<u8>) -> Vec<u8> {
    for px in data.chunks_exact_mut(BGRA_CHANNELS) {
        px.swap(0, 2);
    }
    data
}
