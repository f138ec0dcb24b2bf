use crate::core::rasterizer::FillAlgorithm;
use crate::geometry::transform::TransformFactory;
use crate::material_system::color::{Color, color_to_packed};
use crate::material_system::light::{Light, default_lights};
use crate::material_system::materials::Material;
use crate::material_system::shaders::ShadingMode;
use nalgebra::{Matrix4, Point3};

/// 单帧渲染使用的配置
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// 渲染模式
    pub mode: ShadingMode,
    /// 三角形填充算法
    pub fill: FillAlgorithm,

    /// 背景色（打包 ARGB）
    pub background: u32,
    /// 线框颜色（打包 ARGB）
    pub wireframe_color: u32,

    // 投影
    /// 垂直视场角（度）
    pub fov_y_deg: f32,
    pub near: f32,
    pub far: f32,

    /// 模型矩阵（物体坐标 -> 世界坐标）
    pub model_matrix: Matrix4<f32>,

    // 光照与材质
    pub lights: Vec<Light>,
    /// 为 true 时第一个点光源每帧移动到相机位置
    pub camera_light: bool,
    pub material: Material,

    /// 是否启用背面剔除
    pub backface_culling: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            mode: ShadingMode::default(),
            fill: FillAlgorithm::default(),
            background: 0,
            wireframe_color: color_to_packed(&Color::new(1.0, 1.0, 1.0)),
            fov_y_deg: 90.0,
            near: 0.1,
            far: 100.0,
            model_matrix: Matrix4::identity(),
            lights: default_lights(Point3::origin()),
            camera_light: true,
            material: Material::default(),
            backface_culling: true,
        }
    }
}

impl RenderConfig {
    /// 透视投影矩阵，宽高比取自帧缓冲尺寸
    pub fn projection_matrix(&self, width: usize, height: usize) -> Matrix4<f32> {
        let aspect = width as f32 / height.max(1) as f32;
        TransformFactory::perspective(aspect, self.fov_y_deg.to_radians(), self.near, self.far)
    }

    /// 本帧实际使用的光源，跟随相机的光源已移动到 `eye`
    pub fn lights_for_eye(&self, eye: Point3<f32>) -> Vec<Light> {
        let mut lights = self.lights.clone();
        if self.camera_light {
            if let Some(first) = lights.first_mut() {
                *first = first.with_position(eye);
            }
        }
        lights
    }

    pub fn get_mode_description(&self) -> String {
        match self.mode {
            ShadingMode::Wireframe => "线框".to_string(),
            ShadingMode::Flat => "平面着色".to_string(),
            ShadingMode::Phong => "Phong着色".to_string(),
            ShadingMode::Textured => "纹理着色".to_string(),
        }
    }

    // 构建器方法，便于链式配置
    pub fn with_mode(mut self, mode: ShadingMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_fill(mut self, fill: FillAlgorithm) -> Self {
        self.fill = fill;
        self
    }

    pub fn with_background(mut self, background: u32) -> Self {
        self.background = background;
        self
    }

    pub fn with_wireframe_color(mut self, color: u32) -> Self {
        self.wireframe_color = color;
        self
    }

    pub fn with_projection(mut self, fov_y_deg: f32, near: f32, far: f32) -> Self {
        self.fov_y_deg = fov_y_deg;
        self.near = near;
        self.far = far;
        self
    }

    pub fn with_model_matrix(mut self, model_matrix: Matrix4<f32>) -> Self {
        self.model_matrix = model_matrix;
        self
    }

    pub fn with_lights(mut self, lights: Vec<Light>, camera_light: bool) -> Self {
        self.lights = lights;
        self.camera_light = camera_light;
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    pub fn with_backface_culling(mut self, enabled: bool) -> Self {
        self.backface_culling = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_light_follows_eye() {
        let config = RenderConfig::default();
        let eye = Point3::new(3.0, 4.0, 5.0);
        let lights = config.lights_for_eye(eye);
        match lights[0] {
            Light::Point { position, .. } => assert_eq!(position, eye),
            Light::Directional { .. } => panic!("默认第一个光源应为点光源"),
        }
        // 其余光源不动
        match lights[1] {
            Light::Point { position, .. } => assert_eq!(position, Point3::new(2.0, 2.0, 0.0)),
            Light::Directional { .. } => panic!("默认第二个光源应为点光源"),
        }
    }

    #[test]
    fn builders_override_defaults() {
        let config = RenderConfig::default()
            .with_mode(ShadingMode::Phong)
            .with_fill(FillAlgorithm::Barycentric)
            .with_projection(60.0, 0.5, 50.0)
            .with_backface_culling(false);
        assert_eq!(config.mode, ShadingMode::Phong);
        assert_eq!(config.fill, FillAlgorithm::Barycentric);
        assert_eq!((config.fov_y_deg, config.near, config.far), (60.0, 0.5, 50.0));
        assert!(!config.backface_culling);
    }
}
