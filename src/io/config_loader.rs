use crate::io::render_settings::{LightSettings, RenderSettings};
use std::path::Path;

/// TOML配置管理器 - 统一处理所有配置的读写
pub struct TomlConfigLoader;

impl TomlConfigLoader {
    /// 从TOML文件加载完整配置
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<RenderSettings, String> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| format!("读取配置文件失败: {}", e))?;

        Self::load_from_content(&content)
    }

    /// 从TOML内容字符串加载配置，缺失的字段取默认值
    pub fn load_from_content(content: &str) -> Result<RenderSettings, String> {
        toml::from_str(content).map_err(|e| format!("解析TOML失败: {}", e))
    }

    /// 保存配置到TOML文件
    pub fn save_to_file<P: AsRef<Path>>(settings: &RenderSettings, path: P) -> Result<(), String> {
        let toml_content = Self::settings_to_toml(settings)?;
        std::fs::write(path, toml_content).map_err(|e| format!("写入配置文件失败: {}", e))
    }

    pub fn settings_to_toml(settings: &RenderSettings) -> Result<String, String> {
        toml::to_string_pretty(settings).map_err(|e| format!("序列化TOML失败: {}", e))
    }

    /// 生成示例配置文件：内置立方体，Phong 着色，一个跟随相机的点光源
    pub fn create_example_config<P: AsRef<Path>>(path: P) -> Result<(), String> {
        let mut settings = RenderSettings::default();
        settings.render.mode = "phong".to_string();
        settings.render.frames = 36;
        settings.camera.radius = 4.0;
        settings.lights = vec![
            LightSettings {
                follow_camera: true,
                ..LightSettings::default()
            },
            LightSettings {
                kind: "directional".to_string(),
                position: None,
                direction: Some("-1,-1,-1".to_string()),
                color: "0.3,0.3,0.3".to_string(),
                follow_camera: false,
            },
        ];

        Self::save_to_file(&settings, path).map_err(|e| format!("创建示例配置失败: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let settings = TomlConfigLoader::load_from_content(
            r#"
[render]
width = 320
mode = "textured"

[[light]]
type = "directional"
direction = "0,-1,0"
color = "1,1,1"
"#,
        )
        .unwrap();
        assert_eq!(settings.render.width, 320);
        assert_eq!(settings.render.height, 600);
        assert_eq!(settings.render.mode, "textured");
        assert_eq!(settings.camera.fov, 90.0);
        assert_eq!(settings.lights.len(), 1);
        assert_eq!(settings.lights[0].kind, "directional");
    }

    #[test]
    fn malformed_toml_is_rejected() {
        let err = TomlConfigLoader::load_from_content("[render\nwidth = 1").unwrap_err();
        assert!(err.starts_with("解析TOML失败"));
    }

    #[test]
    fn serialized_settings_load_back() {
        let mut settings = RenderSettings::default();
        settings.files.obj = Some("model.obj".to_string());
        settings.render.fill = "barycentric".to_string();
        settings.lights.push(LightSettings::default());

        let text = TomlConfigLoader::settings_to_toml(&settings).unwrap();
        let loaded = TomlConfigLoader::load_from_content(&text).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn example_config_is_valid() {
        let path = std::env::temp_dir().join(format!("mt_rasterizer_cfg_{}.toml", std::process::id()));
        TomlConfigLoader::create_example_config(&path).unwrap();
        let settings = TomlConfigLoader::load_from_file(&path).unwrap();
        settings.validate().unwrap();
        assert_eq!(settings.render.frames, 36);
        std::fs::remove_file(&path).ok();
    }
}
