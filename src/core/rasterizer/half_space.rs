//! 增量式半平面（边函数）填充
//!
//! 顶点坐标量化为 24.8 定点数，边函数在整数域内按行、按列增量步进，
//! 不存在浮点误差。共享一条边的两个三角形通过左上规则分配边上的像素，
//! 每个像素恰好被其中一个覆盖。

use super::triangle::{BoundingBox, VertexRenderData, scan_barycentric};
use nalgebra::Vector3;

/// 子像素精度位数
pub const SUBPIXEL_BITS: u32 = 8;
pub const SUBPIXEL_ONE: i64 = 1 << SUBPIXEL_BITS;
const SUBPIXEL_HALF: i64 = SUBPIXEL_ONE / 2;

/// 超出此范围的坐标改用浮点扫描，保证边函数乘积不溢出 i64
const FIXED_COORD_LIMIT: f32 = (1 << 20) as f32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FixedPoint {
    x: i64,
    y: i64,
}

impl FixedPoint {
    fn from_vertex(v: &VertexRenderData) -> Option<Self> {
        let (x, y) = (v.pix.x, v.pix.y);
        if !x.is_finite()
            || !y.is_finite()
            || x.abs() > FIXED_COORD_LIMIT
            || y.abs() > FIXED_COORD_LIMIT
        {
            return None;
        }
        Some(Self {
            x: (x * SUBPIXEL_ONE as f32).round() as i64,
            y: (y * SUBPIXEL_ONE as f32).round() as i64,
        })
    }
}

/// `(b - a) × (p - a)`，p 在 a→b 的"内侧"时为正（屏幕 y 轴向下、面积为正的朝向）
#[inline]
fn edge_function(a: FixedPoint, b: FixedPoint, p: FixedPoint) -> i64 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

/// 左上规则：对面积为正的三角形，上边水平且向右，左边向上（dy < 0）
#[inline]
fn is_top_left(a: FixedPoint, b: FixedPoint) -> bool {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    dy < 0 || (dy == 0 && dx > 0)
}

struct EdgeStepper {
    row: i64,
    step_x: i64,
    step_y: i64,
    bias: i64,
}

impl EdgeStepper {
    fn new(a: FixedPoint, b: FixedPoint, origin: FixedPoint) -> Self {
        Self {
            row: edge_function(a, b, origin),
            step_x: -(b.y - a.y) * SUBPIXEL_ONE,
            step_y: (b.x - a.x) * SUBPIXEL_ONE,
            bias: if is_top_left(a, b) { 0 } else { -1 },
        }
    }
}

/// 半平面填充，回调 `visit(x, y, bary)`，重心坐标按调用者给出的顶点顺序排列
///
/// 返回覆盖的像素数。坐标超出定点范围时退回包围盒扫描。
pub fn scan_half_space<F>(
    vertices: &[VertexRenderData; 3],
    width: usize,
    height: usize,
    mut visit: F,
) -> usize
where
    F: FnMut(usize, usize, &Vector3<f32>),
{
    let fixed = (
        FixedPoint::from_vertex(&vertices[0]),
        FixedPoint::from_vertex(&vertices[1]),
        FixedPoint::from_vertex(&vertices[2]),
    );
    let (Some(p0), Some(p1), Some(p2)) = fixed else {
        return scan_barycentric(vertices, width, height, visit);
    };

    let Some(bbox) = BoundingBox::from_vertices(vertices, width, height) else {
        return 0;
    };

    // 调整为正面积朝向，记录是否交换了 v1/v2
    let mut area = edge_function(p0, p1, p2);
    if area == 0 {
        return 0;
    }
    let swapped = area < 0;
    let (p1, p2) = if swapped { (p2, p1) } else { (p1, p2) };
    area = area.abs();
    let inv_area = 1.0 / area as f64;

    let origin = FixedPoint {
        x: bbox.min_x as i64 * SUBPIXEL_ONE + SUBPIXEL_HALF,
        y: bbox.min_y as i64 * SUBPIXEL_ONE + SUBPIXEL_HALF,
    };
    // e0 对应 v0 的权重（对边 v1→v2），依此类推
    let mut e0 = EdgeStepper::new(p1, p2, origin);
    let mut e1 = EdgeStepper::new(p2, p0, origin);
    let mut e2 = EdgeStepper::new(p0, p1, origin);

    let mut covered = 0;
    for y in bbox.min_y..bbox.max_y {
        let (mut w0, mut w1, mut w2) = (e0.row, e1.row, e2.row);
        for x in bbox.min_x..bbox.max_x {
            if w0 + e0.bias >= 0 && w1 + e1.bias >= 0 && w2 + e2.bias >= 0 {
                let b0 = (w0 as f64 * inv_area) as f32;
                let b1 = (w1 as f64 * inv_area) as f32;
                let b2 = (w2 as f64 * inv_area) as f32;
                let bary = if swapped {
                    Vector3::new(b0, b2, b1)
                } else {
                    Vector3::new(b0, b1, b2)
                };
                covered += 1;
                visit(x, y, &bary);
            }
            w0 += e0.step_x;
            w1 += e1.step_x;
            w2 += e2.step_x;
        }
        e0.row += e0.step_y;
        e1.row += e1.step_y;
        e2.row += e2.step_y;
    }
    covered
}
