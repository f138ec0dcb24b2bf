use crate::geometry::transform::TransformFactory;
use nalgebra::{Matrix4, Point3, Vector3};
use std::f32::consts::{FRAC_PI_2, PI};

/// 俯仰角离开 ±90° 的余量，避免视线与上方向平行
const PITCH_LIMIT: f32 = FRAC_PI_2 - 0.001;

/// 渲染核心读取相机的最小接口
pub trait CameraProvider: Send + Sync {
    /// 世界坐标 -> 相机坐标
    fn view_matrix(&self) -> Matrix4<f32>;

    /// 相机位置（世界坐标），用于背面剔除与高光
    fn eye(&self) -> Point3<f32>;
}

/// 固定位置的 lookAt 相机
#[derive(Debug, Clone)]
pub struct LookAtCamera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
}

impl LookAtCamera {
    pub fn new(position: Point3<f32>, target: Point3<f32>, up: Vector3<f32>) -> Self {
        Self {
            position,
            target,
            up,
        }
    }
}

impl CameraProvider for LookAtCamera {
    fn view_matrix(&self) -> Matrix4<f32> {
        TransformFactory::view(&self.position, &self.target, &self.up)
    }

    fn eye(&self) -> Point3<f32> {
        self.position
    }
}

/// 围绕中心点旋转的轨道相机
///
/// 位置由偏航角、俯仰角和半径决定：
/// `center + radius * (cos(pitch)·sin(yaw), sin(pitch), cos(pitch)·cos(yaw))`。
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    pub center: Point3<f32>,
    pub up: Vector3<f32>,
    yaw: f32,
    pitch: f32,
    radius: f32,
    min_radius: f32,
    max_radius: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new(Point3::origin(), 10.0)
    }
}

impl OrbitCamera {
    pub fn new(center: Point3<f32>, radius: f32) -> Self {
        Self {
            center,
            up: Vector3::y(),
            yaw: 45f32.to_radians(),
            pitch: 45f32.to_radians(),
            radius,
            min_radius: 1.0,
            max_radius: 100.0,
        }
        .with_radius_limits(1.0, 100.0)
    }

    /// 设置半径范围，当前半径随之截断
    pub fn with_radius_limits(mut self, min_radius: f32, max_radius: f32) -> Self {
        self.min_radius = min_radius.min(max_radius);
        self.max_radius = max_radius.max(min_radius);
        self.radius = self.radius.clamp(self.min_radius, self.max_radius);
        self
    }

    pub fn with_angles(mut self, yaw_deg: f32, pitch_deg: f32) -> Self {
        self.yaw = 0.0;
        self.pitch = 0.0;
        self.rotate(yaw_deg.to_radians(), pitch_deg.to_radians());
        self
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// 偏航角保持在 (-2π, 2π) 内，俯仰角截断到 ±(π/2 - 0.001)
    pub fn rotate(&mut self, yaw_delta: f32, pitch_delta: f32) {
        self.yaw += yaw_delta;
        if self.yaw > 2.0 * PI {
            self.yaw -= 2.0 * PI;
        }
        if self.yaw < -2.0 * PI {
            self.yaw += 2.0 * PI;
        }
        self.pitch = (self.pitch + pitch_delta).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// 调整半径并截断到 [min_radius, max_radius]
    pub fn zoom(&mut self, delta: f32) {
        self.radius = (self.radius + delta).clamp(self.min_radius, self.max_radius);
    }

    /// 在相机的右/上平面内平移观察中心
    pub fn pan(&mut self, dx: f32, dy: f32) {
        let forward = (self.center - self.position())
            .try_normalize(1e-12)
            .unwrap_or(-Vector3::z());
        let right = forward
            .cross(&self.up)
            .try_normalize(1e-12)
            .unwrap_or_else(Vector3::x);
        let up = right.cross(&forward);
        self.center += right * dx + up * dy;
    }

    pub fn position(&self) -> Point3<f32> {
        let offset = Vector3::new(
            self.pitch.cos() * self.yaw.sin(),
            self.pitch.sin(),
            self.pitch.cos() * self.yaw.cos(),
        ) * self.radius;
        self.center + offset
    }
}

impl CameraProvider for OrbitCamera {
    fn view_matrix(&self) -> Matrix4<f32> {
        TransformFactory::view(&self.position(), &self.center, &self.up)
    }

    fn eye(&self) -> Point3<f32> {
        self.position()
    }
}
