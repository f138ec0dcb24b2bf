use nalgebra::{Point2, Point3, Vector2, Vector3};

const EPSILON: f32 = 1e-5;

/// 计算点 p 相对二维三角形 (v1, v2, v3) 的重心坐标 (alpha, beta, gamma)
///
/// 三角形退化（面积接近 0）时返回 None。alpha 对应 v1，beta 对应 v2，gamma 对应 v3。
pub fn barycentric_coordinates(
    p: Point2<f32>,
    v1: Point2<f32>,
    v2: Point2<f32>,
    v3: Point2<f32>,
) -> Option<Vector3<f32>> {
    let e1 = v2 - v1;
    let e2 = v3 - v1;
    let p_v1 = p - v1;

    // 两倍有向面积
    let total_area_x2 = e1.x * e2.y - e1.y * e2.x;
    if total_area_x2.abs() < EPSILON {
        return None;
    }

    let inv_total_area_x2 = 1.0 / total_area_x2;
    let beta = (p_v1.x * e2.y - p_v1.y * e2.x) * inv_total_area_x2;
    let gamma = (e1.x * p_v1.y - e1.y * p_v1.x) * inv_total_area_x2;
    let alpha = 1.0 - beta - gamma;

    Some(Vector3::new(alpha, beta, gamma))
}

/// 三个权重均非负（允许微小误差）即视为在三角形内
#[inline(always)]
pub fn is_inside_triangle(bary: Vector3<f32>) -> bool {
    bary.x >= -EPSILON && bary.y >= -EPSILON && bary.z >= -EPSILON
}

/// 由屏幕重心坐标求视深度
///
/// 屏幕空间里线性变化的是 `1/w`，先插值倒数再取倒数。
/// 倒数和不为正时返回 `f32::INFINITY`。
#[inline]
pub fn interpolate_depth(bary: &Vector3<f32>, depths: &[f32; 3]) -> f32 {
    let inv = bary.x / depths[0] + bary.y / depths[1] + bary.z / depths[2];
    if inv > 0.0 { 1.0 / inv } else { f32::INFINITY }
}

#[inline]
pub fn interpolate_vec3(bary: &Vector3<f32>, values: &[Vector3<f32>; 3]) -> Vector3<f32> {
    values[0] * bary.x + values[1] * bary.y + values[2] * bary.z
}

#[inline]
pub fn interpolate_point(bary: &Vector3<f32>, points: &[Point3<f32>; 3]) -> Point3<f32> {
    Point3::from(
        points[0].coords * bary.x + points[1].coords * bary.y + points[2].coords * bary.z,
    )
}

/// 插值法线并归一化，插值结果为零向量时返回 None
#[inline]
pub fn interpolate_normal(bary: &Vector3<f32>, normals: &[Vector3<f32>; 3]) -> Option<Vector3<f32>> {
    interpolate_vec3(bary, normals).try_normalize(1e-12)
}

/// 屏幕空间线性插值的 UV（不做透视校正）
#[inline]
pub fn linear_uv(bary: &Vector3<f32>, uvs: &[Vector2<f32>; 3]) -> Vector2<f32> {
    uvs[0] * bary.x + uvs[1] * bary.y + uvs[2] * bary.z
}

/// 透视校正 UV：`Σ bᵢ·uvᵢ/wᵢ ÷ Σ bᵢ/wᵢ`
///
/// `inv_w` 为三个顶点裁剪空间 w 的倒数。分母过小时退回线性插值。
pub fn perspective_correct_uv(
    bary: &Vector3<f32>,
    uvs: &[Vector2<f32>; 3],
    inv_w: &[f32; 3],
) -> Vector2<f32> {
    let weights = Vector3::new(bary.x * inv_w[0], bary.y * inv_w[1], bary.z * inv_w[2]);
    let sum = weights.x + weights.y + weights.z;
    if sum.abs() < EPSILON * EPSILON {
        return linear_uv(bary, uvs);
    }
    (uvs[0] * weights.x + uvs[1] * weights.y + uvs[2] * weights.z) / sum
}
