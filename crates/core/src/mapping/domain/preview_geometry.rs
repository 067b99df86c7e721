use crate::shared::geometry::{Point, Rect};

/// Layout of the camera preview surface inside the view.
///
/// `view_point` converts a normalized device point (upright frame space,
/// `[0,1]`) into view points. Implementations must be pure.
pub trait PreviewGeometry: Send + Sync {
    fn view_point(&self, device_point: Point) -> Point;

    fn bounds(&self) -> Rect;
}

/// `p' = p * scale + offset`, per axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AffineGeometry {
    pub scale_x: f64,
    pub scale_y: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    pub bounds: Rect,
}

impl AffineGeometry {
    pub fn new(scale: Point, offset: Point, bounds: Rect) -> Self {
        Self {
            scale_x: scale.x,
            scale_y: scale.y,
            offset_x: offset.x,
            offset_y: offset.y,
            bounds,
        }
    }

    /// View bounds equal to normalized space.
    pub fn identity() -> Self {
        Self::new(
            Point::new(1.0, 1.0),
            Point::new(0.0, 0.0),
            Rect::new(0.0, 0.0, 1.0, 1.0),
        )
    }

    /// Stretches normalized space over a `width x height` view.
    pub fn stretched(width: f64, height: f64) -> Self {
        Self::new(
            Point::new(width, height),
            Point::new(0.0, 0.0),
            Rect::new(0.0, 0.0, width, height),
        )
    }
}

impl PreviewGeometry for AffineGeometry {
    fn view_point(&self, device_point: Point) -> Point {
        Point::new(
            device_point.x * self.scale_x + self.offset_x,
            device_point.y * self.scale_y + self.offset_y,
        )
    }

    fn bounds(&self) -> Rect {
        self.bounds
    }
}

/// Preview scaled to fill the view while keeping the frame's aspect ratio,
/// cropping the overflow evenly on both sides.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AspectFillGeometry {
    frame_width: f64,
    frame_height: f64,
    bounds: Rect,
    mirrored: bool,
}

impl AspectFillGeometry {
    /// `frame_width` / `frame_height` are the upright frame dimensions.
    pub fn new(frame_width: u32, frame_height: u32, bounds: Rect, mirrored: bool) -> Self {
        Self {
            frame_width: f64::from(frame_width.max(1)),
            frame_height: f64::from(frame_height.max(1)),
            bounds,
            mirrored,
        }
    }

    /// Displayed size of the frame and its offset inside the view.
    fn layout(&self) -> (f64, f64, f64, f64) {
        let scale = (self.bounds.width / self.frame_width)
            .max(self.bounds.height / self.frame_height);
        let shown_w = self.frame_width * scale;
        let shown_h = self.frame_height * scale;
        let dx = (self.bounds.width - shown_w) / 2.0;
        let dy = (self.bounds.height - shown_h) / 2.0;
        (shown_w, shown_h, dx, dy)
    }
}

impl PreviewGeometry for AspectFillGeometry {
    fn view_point(&self, device_point: Point) -> Point {
        let (shown_w, shown_h, dx, dy) = self.layout();
        let x = if self.mirrored {
            1.0 - device_point.x
        } else {
            device_point.x
        };
        Point::new(
            self.bounds.x + dx + x * shown_w,
            self.bounds.y + dy + device_point.y * shown_h,
        )
    }

    fn bounds(&self) -> Rect {
        self.bounds
    }
}
