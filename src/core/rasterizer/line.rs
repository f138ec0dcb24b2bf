use crate::core::frame_buffer::FrameBuffer;

/// Bresenham 整数画线，包含两个端点
///
/// 陡峭的线段交换 x/y 轴后按主轴步进。越界像素由 [`FrameBuffer::set`] 忽略，
/// 不做深度测试。返回尝试写入的像素数。
pub fn draw_line(
    frame_buffer: &FrameBuffer,
    mut x0: i32,
    mut y0: i32,
    mut x1: i32,
    mut y1: i32,
    color: u32,
) -> usize {
    let steep = (x0 - x1).abs() < (y0 - y1).abs();
    if steep {
        std::mem::swap(&mut x0, &mut y0);
        std::mem::swap(&mut x1, &mut y1);
    }
    if x0 > x1 {
        std::mem::swap(&mut x0, &mut x1);
        std::mem::swap(&mut y0, &mut y1);
    }

    let dx = x1 - x0;
    let dy = y1 - y0;
    let derror2 = dy.abs() * 2;
    let y_step = if y1 > y0 { 1 } else { -1 };
    let mut error2 = 0;
    let mut y = y0;

    for x in x0..=x1 {
        if steep {
            frame_buffer.set(y, x, color);
        } else {
            frame_buffer.set(x, y, color);
        }
        error2 += derror2;
        if error2 > dx {
            y += y_step;
            error2 -= dx * 2;
        }
    }
    (dx + 1) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(fb: &FrameBuffer) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        for y in 0..fb.height {
            for x in 0..fb.width {
                if fb.get(x, y) != Some(0) {
                    out.push((x, y));
                }
            }
        }
        out
    }

    #[test]
    fn horizontal_line_includes_endpoints() {
        let fb = FrameBuffer::new(8, 4).unwrap();
        assert_eq!(draw_line(&fb, 1, 2, 5, 2, 7), 5);
        assert_eq!(lit(&fb), vec![(1, 2), (2, 2), (3, 2), (4, 2), (5, 2)]);
    }

    #[test]
    fn endpoints_order_does_not_matter() {
        let a = FrameBuffer::new(16, 16).unwrap();
        let b = FrameBuffer::new(16, 16).unwrap();
        draw_line(&a, 2, 3, 13, 9, 1);
        draw_line(&b, 13, 9, 2, 3, 1);
        assert_eq!(lit(&a), lit(&b));
    }

    #[test]
    fn out_of_bounds_pixels_are_skipped() {
        let fb = FrameBuffer::new(4, 4).unwrap();
        draw_line(&fb, -3, 1, 6, 1, 9);
        assert_eq!(lit(&fb), vec![(0, 1), (1, 1), (2, 1), (3, 1)]);
    }
}
