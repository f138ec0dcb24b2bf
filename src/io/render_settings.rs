use crate::core::depth_buffer::LockStrategy;
use crate::core::rasterizer::FillAlgorithm;
use crate::core::render_config::RenderConfig;
use crate::geometry::camera::OrbitCamera;
use crate::geometry::transform::TransformFactory;
use crate::material_system::color::color_to_packed;
use crate::material_system::light::{Light, default_lights};
use crate::material_system::materials::Material;
use crate::material_system::shaders::ShadingMode;
use crate::material_system::texture::SamplingMode;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// 所有可通过 TOML 配置的参数，分节与配置文件一致
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub files: FileSettings,
    pub render: RenderSection,
    pub camera: CameraSettings,
    pub object: ObjectSettings,
    pub material: MaterialSettings,
    /// `[[light]]` 数组，为空时使用默认三光源
    #[serde(rename = "light", skip_serializing_if = "Vec::is_empty")]
    pub lights: Vec<LightSettings>,
}

/// `[files]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSettings {
    /// 输入 OBJ 文件，缺省时渲染内置立方体
    #[serde(skip_serializing_if = "Option::is_none")]
    pub obj: Option<String>,
    /// 输出文件的基础名称，缺省时使用时间戳
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    pub output_dir: String,
    /// 漫反射贴图，覆盖 MTL 设置
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diffuse_texture: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normal_texture: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specular_texture: Option<String>,
    /// 同时保存深度图
    pub save_depth: bool,
}

/// `[render]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSection {
    pub width: usize,
    pub height: usize,
    /// 工作线程数，0 表示使用可用的 CPU 核数
    pub threads: usize,
    /// wireframe / flat / phong / textured
    pub mode: String,
    /// barycentric / half_space
    pub fill: String,
    pub backface_culling: bool,
    /// per_pixel / striped
    pub lock_strategy: String,
    /// 分段锁数量，仅 striped 时使用
    pub lock_stripes: usize,
    /// 背景色 "r,g,b"
    pub background: String,
    /// 线框颜色 "r,g,b"
    pub wireframe_color: String,
    /// 轨道动画的帧数
    pub frames: usize,
    /// 纹理双线性采样
    pub bilinear: bool,
}

/// `[camera]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// 轨道中心 "x,y,z"
    pub center: String,
    pub radius: f32,
    pub min_radius: f32,
    pub max_radius: f32,
    /// 初始偏航角（度）
    pub yaw: f32,
    /// 初始俯仰角（度）
    pub pitch: f32,
    /// 每帧偏航角增量（度）
    pub orbit_step: f32,
    /// 垂直视场角（度）
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

/// `[object]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectSettings {
    /// 位置 "x,y,z"
    pub position: String,
    /// 欧拉角（度）"x,y,z"
    pub rotation: String,
    pub scale: f32,
}

/// `[material]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialSettings {
    pub albedo: String,
    pub ambient: String,
    pub diffuse: String,
    pub specular: String,
    pub shininess: f32,
}

/// `[[light]]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightSettings {
    /// point / directional
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    pub color: String,
    /// 点光源每帧移动到相机位置（只对第一个光源生效）
    pub follow_camera: bool,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            obj: None,
            output: None,
            output_dir: "output".to_string(),
            diffuse_texture: None,
            normal_texture: None,
            specular_texture: None,
            save_depth: false,
        }
    }
}

impl Default for RenderSection {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            threads: 0,
            mode: ShadingMode::default().to_string(),
            fill: FillAlgorithm::default().to_string(),
            backface_culling: true,
            lock_strategy: "per_pixel".to_string(),
            lock_stripes: 4096,
            background: "0,0,0".to_string(),
            wireframe_color: "1,1,1".to_string(),
            frames: 1,
            bilinear: false,
        }
    }
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            center: "0,0,0".to_string(),
            radius: 10.0,
            min_radius: 1.0,
            max_radius: 100.0,
            yaw: 45.0,
            pitch: 45.0,
            orbit_step: 5.0,
            fov: 90.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl Default for ObjectSettings {
    fn default() -> Self {
        Self {
            position: "0,0,0".to_string(),
            rotation: "0,0,0".to_string(),
            scale: 1.0,
        }
    }
}

impl Default for MaterialSettings {
    fn default() -> Self {
        Self {
            albedo: "1,1,1".to_string(),
            ambient: "0.1,0.1,0.1".to_string(),
            diffuse: "0.8,0.8,0.8".to_string(),
            specular: "0.5,0.5,0.5".to_string(),
            shininess: 32.0,
        }
    }
}

impl Default for LightSettings {
    fn default() -> Self {
        Self {
            kind: "point".to_string(),
            position: Some("0,0,0".to_string()),
            direction: None,
            color: "1,1,1".to_string(),
            follow_camera: false,
        }
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            files: FileSettings::default(),
            render: RenderSection::default(),
            camera: CameraSettings::default(),
            object: ObjectSettings::default(),
            material: MaterialSettings::default(),
            lights: Vec::new(),
        }
    }
}

/// 辅助函数用于解析逗号分隔的浮点数
pub fn parse_vec3(s: &str) -> Result<Vector3<f32>, String> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 3 {
        return Err(format!("\"{}\" 需要3个逗号分隔的值", s));
    }
    let mut values = [0.0f32; 3];
    for (value, part) in values.iter_mut().zip(&parts) {
        *value = part
            .trim()
            .parse::<f32>()
            .map_err(|e| format!("无效数字 '{}': {}", part, e))?;
    }
    Ok(Vector3::new(values[0], values[1], values[2]))
}

pub fn parse_point3(s: &str) -> Result<Point3<f32>, String> {
    parse_vec3(s).map(Point3::from)
}

fn field<T>(name: &str, result: Result<T, String>) -> Result<T, String> {
    result.map_err(|e| format!("错误: {} 格式不正确: {}", name, e))
}

impl RenderSettings {
    pub fn shading_mode(&self) -> Result<ShadingMode, String> {
        self.render.mode.parse()
    }

    pub fn fill_algorithm(&self) -> Result<FillAlgorithm, String> {
        self.render.fill.parse()
    }

    pub fn lock_strategy(&self) -> Result<LockStrategy, String> {
        match self.render.lock_strategy.trim().to_ascii_lowercase().as_str() {
            "per_pixel" | "per-pixel" | "pixel" => Ok(LockStrategy::PerPixel),
            "striped" | "stripes" => Ok(LockStrategy::Striped {
                locks: self.render.lock_stripes.max(1),
            }),
            other => Err(format!(
                "未知的锁策略 \"{other}\"，可选: per_pixel, striped"
            )),
        }
    }

    pub fn sampling_mode(&self) -> SamplingMode {
        if self.render.bilinear {
            SamplingMode::Bilinear
        } else {
            SamplingMode::Nearest
        }
    }

    /// 工作线程数，配置为 0 时取可用并行度
    pub fn thread_count(&self) -> usize {
        if self.render.threads > 0 {
            self.render.threads
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        }
    }

    pub fn orbit_camera(&self) -> Result<OrbitCamera, String> {
        let camera = &self.camera;
        let center = field("camera.center", parse_point3(&camera.center))?;
        Ok(OrbitCamera::new(center, camera.radius)
            .with_radius_limits(camera.min_radius, camera.max_radius)
            .with_angles(camera.yaw, camera.pitch))
    }

    /// 材质参数，贴图由调用者加载后填入
    pub fn base_material(&self) -> Result<Material, String> {
        let m = &self.material;
        Ok(Material {
            albedo: field("material.albedo", parse_vec3(&m.albedo))?,
            ambient: field("material.ambient", parse_vec3(&m.ambient))?,
            diffuse: field("material.diffuse", parse_vec3(&m.diffuse))?,
            specular: field("material.specular", parse_vec3(&m.specular))?,
            shininess: m.shininess,
            sampling: self.sampling_mode(),
            ..Material::default()
        })
    }

    /// 光源列表与"第一个光源是否跟随相机"
    pub fn build_lights(&self) -> Result<(Vec<Light>, bool), String> {
        if self.lights.is_empty() {
            return Ok((default_lights(Point3::origin()), true));
        }

        let mut lights = Vec::with_capacity(self.lights.len());
        for (i, light) in self.lights.iter().enumerate() {
            let color = field(&format!("light[{i}].color"), parse_vec3(&light.color))?;
            let built = match light.kind.trim().to_ascii_lowercase().as_str() {
                "point" => {
                    let position = light.position.as_deref().unwrap_or("0,0,0");
                    Light::point(
                        field(&format!("light[{i}].position"), parse_point3(position))?,
                        color,
                        None,
                    )
                }
                "directional" => {
                    let direction = light.direction.as_deref().unwrap_or("0,-1,-1");
                    Light::directional(
                        field(&format!("light[{i}].direction"), parse_vec3(direction))?,
                        color,
                    )
                }
                other => return Err(format!("错误: light[{i}] 的类型 \"{other}\" 无效")),
            };
            lights.push(built);
        }
        let follow = self.lights[0].follow_camera && self.lights[0].kind.trim() == "point";
        Ok((lights, follow))
    }

    /// 转换为渲染核心使用的配置（不含贴图）
    pub fn to_render_config(&self) -> Result<RenderConfig, String> {
        let object = &self.object;
        let model = TransformFactory::model(
            &field("object.position", parse_vec3(&object.position))?,
            &field("object.rotation", parse_vec3(&object.rotation))?,
            object.scale,
        );
        let (lights, camera_light) = self.build_lights()?;

        Ok(RenderConfig::default()
            .with_mode(self.shading_mode()?)
            .with_fill(self.fill_algorithm()?)
            .with_background(color_to_packed(&field(
                "render.background",
                parse_vec3(&self.render.background),
            )?))
            .with_wireframe_color(color_to_packed(&field(
                "render.wireframe_color",
                parse_vec3(&self.render.wireframe_color),
            )?))
            .with_projection(self.camera.fov, self.camera.near, self.camera.far)
            .with_model_matrix(model)
            .with_lights(lights, camera_light)
            .with_material(self.base_material()?)
            .with_backface_culling(self.render.backface_culling))
    }

    /// 验证渲染参数
    pub fn validate(&self) -> Result<(), String> {
        if self.render.width == 0 || self.render.height == 0 {
            return Err("错误: 图像宽度和高度必须大于0".to_string());
        }
        if let Some(obj_path) = &self.files.obj {
            if !std::path::Path::new(obj_path).exists() {
                return Err(format!("错误: 找不到OBJ文件 '{}'", obj_path));
            }
        }
        if self.files.output_dir.trim().is_empty() {
            return Err("错误: 输出目录不能为空".to_string());
        }
        if !(self.camera.near > 0.0 && self.camera.far > self.camera.near) {
            return Err(format!(
                "错误: 近/远裁剪面无效 (near={}, far={})",
                self.camera.near, self.camera.far
            ));
        }
        if !(self.camera.fov > 0.0 && self.camera.fov < 180.0) {
            return Err(format!("错误: 视场角 {} 超出 (0, 180)", self.camera.fov));
        }
        if self.render.frames == 0 {
            return Err("错误: 帧数必须大于0".to_string());
        }
        self.lock_strategy()?;
        self.orbit_camera()?;
        self.to_render_config()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_vectors() {
        assert_eq!(parse_vec3(" 1, 2.5 ,-3").unwrap(), Vector3::new(1.0, 2.5, -3.0));
        assert!(parse_vec3("1,2").is_err());
        assert!(parse_vec3("1,x,2").is_err());
    }

    #[test]
    fn defaults_are_valid() {
        let settings = RenderSettings::default();
        settings.validate().unwrap();
        let config = settings.to_render_config().unwrap();
        assert_eq!(config.mode, ShadingMode::Flat);
        assert_eq!(config.fill, FillAlgorithm::HalfSpace);
        assert_eq!(config.lights.len(), 3);
        assert!(config.camera_light);
    }

    #[test]
    fn invalid_mode_is_reported() {
        let mut settings = RenderSettings::default();
        settings.render.mode = "pbr".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn striped_locks_use_configured_count() {
        let mut settings = RenderSettings::default();
        settings.render.lock_strategy = "striped".to_string();
        settings.render.lock_stripes = 64;
        assert_eq!(settings.lock_strategy(), Ok(LockStrategy::Striped { locks: 64 }));
    }

    #[test]
    fn explicit_lights_replace_defaults() {
        let mut settings = RenderSettings::default();
        settings.lights = vec![
            LightSettings {
                kind: "directional".to_string(),
                position: None,
                direction: Some("0,-1,0".to_string()),
                color: "1,1,1".to_string(),
                follow_camera: true,
            },
        ];
        let (lights, follow) = settings.build_lights().unwrap();
        assert_eq!(lights.len(), 1);
        assert!(!follow, "定向光不能跟随相机");
    }
}
