use crate::geometry::interpolation::{barycentric_coordinates, is_inside_triangle};
use nalgebra::{Point2, Vector3, Vector4};

/// 光栅化阶段需要的顶点数据
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexRenderData {
    /// 屏幕像素坐标（透视除法之后）
    pub pix: Point2<f32>,
    /// 观察空间距离，即裁剪空间 w，恒为正
    pub depth: f32,
}

impl VertexRenderData {
    pub fn new(x: f32, y: f32, depth: f32) -> Self {
        Self {
            pix: Point2::new(x, y),
            depth,
        }
    }

    /// 由视口变换后的齐次坐标构造，调用前须已通过裁剪测试（`w > 0`）
    #[inline]
    pub fn from_homogeneous(v: &Vector4<f32>) -> Self {
        Self::new(v.x / v.w, v.y / v.w, v.w)
    }
}

/// 屏幕空间包围盒，区间为半开 `[min, max)`，已截断到视口
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub min_x: usize,
    pub min_y: usize,
    pub max_x: usize,
    pub max_y: usize,
}

impl BoundingBox {
    pub fn from_vertices(
        vertices: &[VertexRenderData; 3],
        width: usize,
        height: usize,
    ) -> Option<Self> {
        let v0 = &vertices[0].pix;
        let v1 = &vertices[1].pix;
        let v2 = &vertices[2].pix;

        let min_x = v0.x.min(v1.x).min(v2.x).floor().max(0.0) as usize;
        let min_y = v0.y.min(v1.y).min(v2.y).floor().max(0.0) as usize;
        let max_x = v0.x.max(v1.x).max(v2.x).ceil().clamp(0.0, width as f32) as usize;
        let max_y = v0.y.max(v1.y).max(v2.y).ceil().clamp(0.0, height as f32) as usize;

        if max_x <= min_x || max_y <= min_y {
            None
        } else {
            Some(Self {
                min_x,
                min_y,
                max_x,
                max_y,
            })
        }
    }

    pub fn for_each_pixel<F>(&self, mut callback: F)
    where
        F: FnMut(usize, usize),
    {
        for y in self.min_y..self.max_y {
            for x in self.min_x..self.max_x {
                callback(x, y);
            }
        }
    }
}

/// 包围盒扫描填充
///
/// 对包围盒内每个像素中心求重心坐标，三个权重均非负时回调 `visit(x, y, bary)`。
/// 退化三角形不产生任何覆盖。返回覆盖的像素数。
pub fn scan_barycentric<F>(
    vertices: &[VertexRenderData; 3],
    width: usize,
    height: usize,
    mut visit: F,
) -> usize
where
    F: FnMut(usize, usize, &Vector3<f32>),
{
    let Some(bbox) = BoundingBox::from_vertices(vertices, width, height) else {
        return 0;
    };
    let (v0, v1, v2) = (vertices[0].pix, vertices[1].pix, vertices[2].pix);

    let mut covered = 0;
    bbox.for_each_pixel(|x, y| {
        let center = Point2::new(x as f32 + 0.5, y as f32 + 0.5);
        let Some(bary) = barycentric_coordinates(center, v0, v1, v2) else {
            return;
        };
        if is_inside_triangle(bary) {
            covered += 1;
            visit(x, y, &bary);
        }
    });
    covered
}
