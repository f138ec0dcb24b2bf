use nalgebra::{Point2, Point3, Vector4};

/// 齐次顶点的裁剪测试
///
/// 任一顶点位于相机后方（`w <= 0`）或 NDC 深度超出 `[-1, 1]`（近/远平面之外）
/// 时整个三角形被剔除，不做多边形切分。
pub fn is_clipped(vertices: &[Vector4<f32>]) -> bool {
    vertices.iter().any(|v| {
        if v.w <= 0.0 || !v.w.is_finite() {
            return true;
        }
        let ndc_z = v.z / v.w;
        !(-1.0..=1.0).contains(&ndc_z)
    })
}

/// 屏幕坐标的包围盒与视口没有交集
pub fn outside_viewport(points: &[Point2<f32>], width: usize, height: usize) -> bool {
    let (mut min_x, mut min_y) = (f32::INFINITY, f32::INFINITY);
    let (mut max_x, mut max_y) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    max_x < 0.0 || max_y < 0.0 || min_x >= width as f32 || min_y >= height as f32
}

/// 背面检测：世界空间面法线与"重心指向相机"的方向夹角不小于 90° 时为背面
///
/// 面法线按逆时针绕序 `(p1 - p0) × (p2 - p0)` 计算。
pub fn is_back_facing(world: &[Point3<f32>; 3], eye: &Point3<f32>) -> bool {
    let normal = (world[1] - world[0]).cross(&(world[2] - world[0]));
    let centroid = Point3::from((world[0].coords + world[1].coords + world[2].coords) / 3.0);
    normal.dot(&(eye - centroid)) <= 0.0
}

/// Liang-Barsky 线段裁剪，裁剪到 `[0, width-1] x [0, height-1]`
///
/// 线段完全在视口外时返回 None。
pub fn clip_line_to_viewport(
    p0: Point2<f32>,
    p1: Point2<f32>,
    width: usize,
    height: usize,
) -> Option<(Point2<f32>, Point2<f32>)> {
    if !(p0.x.is_finite() && p0.y.is_finite() && p1.x.is_finite() && p1.y.is_finite()) {
        return None;
    }

    let max_x = width.saturating_sub(1) as f32;
    let max_y = height.saturating_sub(1) as f32;
    let d = p1 - p0;

    let mut t0 = 0.0f32;
    let mut t1 = 1.0f32;
    let checks = [
        (-d.x, p0.x),
        (d.x, max_x - p0.x),
        (-d.y, p0.y),
        (d.y, max_y - p0.y),
    ];

    for (p, q) in checks {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    Some((p0 + d * t0, p0 + d * t1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_behind_camera_is_clipped() {
        let front = Vector4::new(0.0, 0.0, 0.5, 1.0);
        let behind = Vector4::new(0.0, 0.0, 0.5, -1.0);
        assert!(!is_clipped(&[front, front, front]));
        assert!(is_clipped(&[front, behind, front]));
        assert!(is_clipped(&[front, Vector4::new(0.0, 0.0, 0.0, 0.0), front]));
    }

    #[test]
    fn depth_outside_near_far_is_clipped() {
        let front = Vector4::new(0.0, 0.0, 0.5, 1.0);
        let too_far = Vector4::new(0.0, 0.0, 2.5, 2.0);
        let too_near = Vector4::new(0.0, 0.0, -0.3, 0.2);
        assert!(is_clipped(&[front, too_far, front]));
        assert!(is_clipped(&[too_near, front, front]));
    }

    #[test]
    fn winding_decides_facing() {
        let eye = Point3::new(0.0, 0.0, 5.0);
        let ccw = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let cw = [ccw[0], ccw[2], ccw[1]];
        assert!(!is_back_facing(&ccw, &eye));
        assert!(is_back_facing(&cw, &eye));
    }

    #[test]
    fn bbox_outside_viewport() {
        let off = [
            Point2::new(-5.0, 1.0),
            Point2::new(-1.0, 1.0),
            Point2::new(-3.0, 4.0),
        ];
        assert!(outside_viewport(&off, 10, 10));
        let partly = [
            Point2::new(-5.0, 1.0),
            Point2::new(3.0, 1.0),
            Point2::new(-3.0, 4.0),
        ];
        assert!(!outside_viewport(&partly, 10, 10));
    }

    #[test]
    fn line_is_clipped_to_viewport() {
        let (a, b) =
            clip_line_to_viewport(Point2::new(-10.0, 5.0), Point2::new(20.0, 5.0), 10, 10).unwrap();
        assert!((a - Point2::new(0.0, 5.0)).norm() < 1e-4);
        assert!((b - Point2::new(9.0, 5.0)).norm() < 1e-4);
        assert!(
            clip_line_to_viewport(Point2::new(-10.0, -1.0), Point2::new(20.0, -1.0), 10, 10)
                .is_none()
        );
    }
}
