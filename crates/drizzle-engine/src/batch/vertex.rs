use crate::coords::Rect;

/// Two floats (`x`, `y`) per vertex.
pub const FLOATS_PER_VERTEX: usize = 2;

/// Two triangles per rectangle.
pub const VERTICES_PER_RECT: usize = 6;

pub const FLOATS_PER_RECT: usize = VERTICES_PER_RECT * FLOATS_PER_VERTEX;

/// Writes the six vertices of `rect` into `out[..FLOATS_PER_RECT]`.
///
/// Triangle order: top-left, top-right, bottom-left, then top-right,
/// bottom-right, bottom-left. Extents are used verbatim; a degenerate rect
/// yields a zero-area quad.
#[inline]
pub fn write_rect_vertices(out: &mut [f32], rect: Rect) {
    let x0 = rect.x;
    let y0 = rect.y;
    let x1 = rect.x + rect.width;
    let y1 = rect.y + rect.height;

    out[..FLOATS_PER_RECT].copy_from_slice(&[
        x0, y0, // top-left
        x1, y0, // top-right
        x0, y1, // bottom-left
        x1, y0, // top-right
        x1, y1, // bottom-right
        x0, y1, // bottom-left
    ]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn six_vertices_in_triangle_order() {
        let mut out = [0.0f32; FLOATS_PER_RECT];
        write_rect_vertices(&mut out, Rect::new(3.0, 4.0, 10.0, 20.0));
        assert_eq!(
            out,
            [3.0, 4.0, 13.0, 4.0, 3.0, 24.0, 13.0, 4.0, 13.0, 24.0, 3.0, 24.0]
        );
    }

    #[test]
    fn degenerate_rect_is_zero_area_quad() {
        let mut out = [9.0f32; FLOATS_PER_RECT];
        write_rect_vertices(&mut out, Rect::new(5.0, 5.0, 0.0, 0.0));
        assert!(out.iter().all(|&v| v == 5.0));
    }

    #[test]
    fn negative_extent_is_written_verbatim() {
        let mut out = [0.0f32; FLOATS_PER_RECT];
        write_rect_vertices(&mut out, Rect::new(10.0, 10.0, -4.0, 2.0));
        assert_eq!(&out[..4], &[10.0, 10.0, 6.0, 10.0]);
    }

    #[test]
    fn only_touches_one_rect_worth_of_floats() {
        let mut out = [-1.0f32; FLOATS_PER_RECT + 2];
        write_rect_vertices(&mut out, Rect::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(&out[FLOATS_PER_RECT..], &[-1.0, -1.0]);
    }
}
