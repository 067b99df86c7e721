/// A point in a 2D coordinate space. Units depend on the space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle with a top-left origin.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds a rectangle from an origin and an extent expressed as a point.
    pub fn from_origin_and_extent(origin: Point, extent: Point) -> Self {
        Self::new(origin.x, origin.y, extent.x, extent.y)
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// The size reinterpreted as a point, for APIs that only convert points.
    pub fn size_as_point(&self) -> Point {
        Point::new(self.width, self.height)
    }

    pub fn mid_y(&self) -> f64 {
        self.y + self.height / 2.0
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }
}

/// A detected face box in normalized `[0,1]` frame space.
///
/// Coordinates are relative to the frame's visual (upright) orientation with
/// the origin at the top-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectionRegion(Rect);

impl DetectionRegion {
    pub fn new(rect: Rect) -> Self {
        Self(rect)
    }

    /// Normalizes a pixel-space box against the upright image dimensions.
    pub fn from_pixels(x: f64, y: f64, width: f64, height: f64, image_w: u32, image_h: u32) -> Self {
        let w = f64::from(image_w.max(1));
        let h = f64::from(image_h.max(1));
        Self(Rect::new(x / w, y / h, width / w, height / h))
    }

    pub fn rect(&self) -> Rect {
        self.0
    }
}

/// A detection region expressed in preview-view points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewRegion(Rect);

impl ViewRegion {
    pub fn new(rect: Rect) -> Self {
        Self(rect)
    }

    pub fn rect(&self) -> Rect {
        self.0
    }

    /// The control value fed to the game: `y + height / 2`.
    pub fn vertical_midpoint(&self) -> f64 {
        self.0.mid_y()
    }
}
