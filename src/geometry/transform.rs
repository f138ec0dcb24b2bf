use log::warn;
use nalgebra::{Matrix3, Matrix4, Point3, Rotation3, Unit, Vector3};

/// 变换矩阵工厂，提供创建各种变换矩阵的静态方法
pub struct TransformFactory;

impl TransformFactory {
    /// 绕任意轴旋转
    pub fn rotation(axis: &Vector3<f32>, angle_rad: f32) -> Matrix4<f32> {
        let axis_unit = Unit::new_normalize(*axis);
        Matrix4::from(Rotation3::from_axis_angle(&axis_unit, angle_rad))
    }

    pub fn rotation_y(angle_rad: f32) -> Matrix4<f32> {
        Matrix4::from_euler_angles(0.0, angle_rad, 0.0)
    }

    /// 由欧拉角（度）组合的旋转
    pub fn rotation_euler_degrees(rotation: &Vector3<f32>) -> Matrix4<f32> {
        Matrix4::from_euler_angles(
            rotation.x.to_radians(),
            rotation.y.to_radians(),
            rotation.z.to_radians(),
        )
    }

    pub fn translation(translation: &Vector3<f32>) -> Matrix4<f32> {
        Matrix4::new_translation(translation)
    }

    pub fn scaling(scale: f32) -> Matrix4<f32> {
        Matrix4::new_scaling(scale)
    }

    /// 模型矩阵：先缩放、再旋转、最后平移
    pub fn model(position: &Vector3<f32>, rotation_deg: &Vector3<f32>, scale: f32) -> Matrix4<f32> {
        Self::translation(position) * Self::rotation_euler_degrees(rotation_deg) * Self::scaling(scale)
    }

    /// 视图矩阵 (lookAt)
    pub fn view(eye: &Point3<f32>, target: &Point3<f32>, up: &Vector3<f32>) -> Matrix4<f32> {
        Matrix4::look_at_rh(eye, target, &Unit::new_normalize(*up))
    }

    /// 透视投影矩阵
    pub fn perspective(aspect_ratio: f32, fov_y_rad: f32, near: f32, far: f32) -> Matrix4<f32> {
        Matrix4::new_perspective(aspect_ratio, fov_y_rad, near, far)
    }

    /// 视口矩阵：NDC [-1, 1] 映射到像素坐标，y 轴向下，z 保持 NDC 值
    #[rustfmt::skip]
    pub fn viewport(width: f32, height: f32) -> Matrix4<f32> {
        Matrix4::new(
            width / 2.0, 0.0, 0.0, width / 2.0,
            0.0, -height / 2.0, 0.0, height / 2.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }
}

/// 计算法线变换矩阵（逆转置的左上 3x3）
pub fn compute_normal_matrix(model_matrix: &Matrix4<f32>) -> Matrix3<f32> {
    model_matrix.try_inverse().map_or_else(
        || {
            warn!("模型矩阵不可逆，使用单位矩阵代替法线矩阵");
            Matrix3::identity()
        },
        |inv| inv.transpose().fixed_view::<3, 3>(0, 0).into_owned(),
    )
}

/// 变换法线并归一化，零向量保持不变
#[inline]
pub fn transform_normal(normal: &Vector3<f32>, normal_matrix: &Matrix3<f32>) -> Vector3<f32> {
    let transformed = normal_matrix * normal;
    transformed.try_normalize(1e-12).unwrap_or(transformed)
}
