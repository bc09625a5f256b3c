use crate::Point;

fn edge_sign(p1: Point, p2: Point, p3: Point) -> f32 {
    (p1.x - p3.x) * (p2.y - p3.y) - (p2.x - p3.x) * (p1.y - p3.y)
}

/// Same-side test: the point is inside (edges included) unless the three
/// edge cross products contain both a positive and a negative value.
/// Works for either winding order.
pub fn point_in_triangle(pt: Point, v1: Point, v2: Point, v3: Point) -> bool {
    let d1 = edge_sign(pt, v1, v2);
    let d2 = edge_sign(pt, v2, v3);
    let d3 = edge_sign(pt, v3, v1);

    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;

    !(has_neg && has_pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tri() -> (Point, Point, Point) {
        (
            Point::new(50.0, 0.0),
            Point::new(0.0, 100.0),
            Point::new(100.0, 100.0),
        )
    }

    #[test]
    fn test_inside_and_outside() {
        let (a, b, c) = tri();
        assert!(point_in_triangle(Point::new(50.0, 50.0), a, b, c));
        assert!(!point_in_triangle(Point::new(5.0, 10.0), a, b, c));
        assert!(!point_in_triangle(Point::new(50.0, 101.0), a, b, c));
    }

    #[test]
    fn test_edges_and_vertices_count_as_inside() {
        let (a, b, c) = tri();
        assert!(point_in_triangle(a, a, b, c));
        assert!(point_in_triangle(Point::new(50.0, 100.0), a, b, c));
    }

    #[test]
    fn test_winding_order_does_not_matter() {
        let (a, b, c) = tri();
        let p = Point::new(40.0, 80.0);
        assert!(point_in_triangle(p, a, b, c));
        assert!(point_in_triangle(p, a, c, b));
        assert!(point_in_triangle(p, c, b, a));
    }
}
