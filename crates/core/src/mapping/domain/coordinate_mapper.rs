use crate::mapping::domain::preview_geometry::PreviewGeometry;
use crate::shared::geometry::{DetectionRegion, Rect, ViewRegion};

/// Converts a normalized detection region into view space.
///
/// The origin and the size are each pushed through the geometry's point
/// conversion, the size as if it were a point. For geometries with an offset
/// this is not a plain scale of the size; it must stay this way so boxes line
/// up with the preview layer's own point conversion. No clamping is applied.
pub fn map_region(region: &DetectionRegion, geometry: &dyn PreviewGeometry) -> ViewRegion {
    let rect = region.rect();
    let origin = geometry.view_point(rect.origin());
    let extent = geometry.view_point(rect.size_as_point());
    ViewRegion::new(Rect::from_origin_and_extent(origin, extent))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::domain::preview_geometry::{AffineGeometry, AspectFillGeometry};
    use crate::shared::geometry::Point;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn region(x: f64, y: f64, w: f64, h: f64) -> DetectionRegion {
        DetectionRegion::new(Rect::new(x, y, w, h))
    }

    #[test]
    fn test_identity_mapping_keeps_region() {
        let view = map_region(&region(0.3, 0.4, 0.1, 0.1), &AffineGeometry::identity());

        let r = view.rect();
        assert_relative_eq!(r.x, 0.3);
        assert_relative_eq!(r.y, 0.4);
        assert_relative_eq!(r.width, 0.1);
        assert_relative_eq!(r.height, 0.1);
        assert_relative_eq!(view.vertical_midpoint(), 0.45);
    }

    #[rstest]
    #[case(AffineGeometry::identity())]
    #[case(AffineGeometry::stretched(375.0, 667.0))]
    #[case(AffineGeometry::new(Point::new(2.0, -3.0), Point::new(10.0, 20.0), Rect::new(0.0, 0.0, 2.0, 3.0)))]
    #[case(AffineGeometry::new(Point::new(0.5, 0.5), Point::new(-1.0, 4.0), Rect::new(0.0, 0.0, 1.0, 1.0)))]
    fn test_origin_and_size_go_through_point_conversion(#[case] geometry: AffineGeometry) {
        let samples = [
            region(0.0, 0.0, 1.0, 1.0),
            region(0.3, 0.4, 0.1, 0.1),
            region(0.9, 0.05, 0.2, 0.3),
        ];
        for r in samples {
            let view = map_region(&r, &geometry).rect();
            let origin = geometry.view_point(r.rect().origin());
            let size = geometry.view_point(r.rect().size_as_point());
            assert_relative_eq!(view.x, origin.x);
            assert_relative_eq!(view.y, origin.y);
            assert_relative_eq!(view.width, size.x);
            assert_relative_eq!(view.height, size.y);
        }
    }

    #[test]
    fn test_mapping_is_deterministic() {
        let geometry = AspectFillGeometry::new(720, 1280, Rect::new(0.0, 0.0, 375.0, 667.0), true);
        let r = region(0.25, 0.5, 0.2, 0.15);
        assert_eq!(map_region(&r, &geometry), map_region(&r, &geometry));
    }

    #[test]
    fn test_size_picks_up_offset_like_a_point() {
        let geometry = AffineGeometry::new(
            Point::new(100.0, 100.0),
            Point::new(10.0, 10.0),
            Rect::new(0.0, 0.0, 120.0, 120.0),
        );
        let view = map_region(&region(0.5, 0.5, 0.1, 0.1), &geometry).rect();
        assert_relative_eq!(view.width, 20.0);
        assert_relative_eq!(view.height, 20.0);
    }

    #[test]
    fn test_no_clamping_outside_view() {
        let geometry = AffineGeometry::stretched(100.0, 100.0);
        let view = map_region(&region(0.95, -0.1, 0.2, 0.2), &geometry).rect();
        assert_relative_eq!(view.x, 95.0);
        assert_relative_eq!(view.y, -10.0);
        assert!(view.max_x() > 100.0);
    }
}
