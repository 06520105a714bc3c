use crate::braille::BrailleCanvas;

/// Bresenham line between two pixels.
pub fn draw_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (x0, y0);

    loop {
        canvas.set(x, y);
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Filled disc; radius 0 is a single dot.
pub fn draw_disc(canvas: &mut BrailleCanvas, cx: i32, cy: i32, radius: i32) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                canvas.set(cx + dx, cy + dy);
            }
        }
    }
}

/// Marker radius in pixels for a quake of the given magnitude.
pub fn marker_radius(magnitude: Option<f64>) -> i32 {
    match magnitude {
        Some(m) if m >= 8.0 => 2,
        Some(m) if m >= 7.0 => 1,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizontal_line() {
        let mut canvas = BrailleCanvas::new(5, 1);
        draw_line(&mut canvas, 0, 0, 9, 0);
        for col in 0..5 {
            assert_eq!(canvas.glyph(col, 0), Some('⠉'));
        }
    }

    #[test]
    fn test_vertical_line() {
        let mut canvas = BrailleCanvas::new(1, 2);
        draw_line(&mut canvas, 0, 7, 0, 0);
        assert_eq!(canvas.glyph(0, 0), Some('⡇'));
        assert_eq!(canvas.glyph(0, 1), Some('⡇'));
    }

    #[test]
    fn test_disc_sizes() {
        let mut dot = BrailleCanvas::new(4, 2);
        draw_disc(&mut dot, 3, 3, 0);
        assert_eq!(dot.rows().collect::<String>().chars().filter(|&c| c != '\u{2800}').count(), 1);
        assert_eq!(marker_radius(Some(9.1)), 2);
        assert_eq!(marker_radius(Some(7.4)), 1);
        assert_eq!(marker_radius(Some(6.0)), 0);
        assert_eq!(marker_radius(None), 0);
    }
}
