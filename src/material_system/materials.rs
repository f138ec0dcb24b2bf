use crate::material_system::texture::{SamplingMode, TextureProvider};
use nalgebra::{Point3, Vector2, Vector3};
use std::fmt;
use std::sync::Arc;

/// 材质参数与可选的贴图
#[derive(Clone)]
pub struct Material {
    /// 平面着色时的基础颜色
    pub albedo: Vector3<f32>,
    pub ambient: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
    pub shininess: f32,

    pub diffuse_map: Option<Arc<dyn TextureProvider>>,
    pub normal_map: Option<Arc<dyn TextureProvider>>,
    pub specular_map: Option<Arc<dyn TextureProvider>>,
    pub sampling: SamplingMode,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            albedo: Vector3::new(1.0, 1.0, 1.0),
            ambient: Vector3::new(0.1, 0.1, 0.1),
            diffuse: Vector3::new(0.8, 0.8, 0.8),
            specular: Vector3::new(0.5, 0.5, 0.5),
            shininess: 32.0,
            diffuse_map: None,
            normal_map: None,
            specular_map: None,
            sampling: SamplingMode::Nearest,
        }
    }
}

impl fmt::Debug for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Material")
            .field("albedo", &self.albedo)
            .field("ambient", &self.ambient)
            .field("diffuse", &self.diffuse)
            .field("specular", &self.specular)
            .field("shininess", &self.shininess)
            .field("diffuse_map", &self.diffuse_map.is_some())
            .field("normal_map", &self.normal_map.is_some())
            .field("specular_map", &self.specular_map.is_some())
            .field("sampling", &self.sampling)
            .finish()
    }
}

/// 切线空间计算
pub mod tbn {
    use super::*;

    /// 由三角形的位置与 UV 差计算切线方向
    ///
    /// UV 退化（行列式接近 0）时退回到第一条边的方向。
    pub fn compute_tangent(positions: &[Point3<f32>; 3], uvs: &[Vector2<f32>; 3]) -> Vector3<f32> {
        let edge1 = positions[1] - positions[0];
        let edge2 = positions[2] - positions[0];
        let delta_uv1 = uvs[1] - uvs[0];
        let delta_uv2 = uvs[2] - uvs[0];

        let det = delta_uv1.x * delta_uv2.y - delta_uv2.x * delta_uv1.y;
        if det.abs() < 1e-8 {
            return edge1.try_normalize(1e-12).unwrap_or_else(Vector3::x);
        }

        let r = 1.0 / det;
        let tangent = (edge1 * delta_uv2.y - edge2 * delta_uv1.y) * r;
        tangent.try_normalize(1e-12).unwrap_or_else(Vector3::x)
    }

    /// Gram-Schmidt 正交化后得到 (切线, 副切线)
    pub fn orthonormal_basis(
        tangent: &Vector3<f32>,
        normal: &Vector3<f32>,
    ) -> (Vector3<f32>, Vector3<f32>) {
        let t = (tangent - normal * tangent.dot(normal))
            .try_normalize(1e-12)
            .unwrap_or_else(|| normal.cross(&Vector3::y()).try_normalize(1e-12).unwrap_or_else(Vector3::x));
        let b = normal.cross(&t);
        (t, b)
    }

}
