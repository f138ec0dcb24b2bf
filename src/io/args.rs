use crate::io::render_settings::RenderSettings;
use clap::Parser;

/// 命令行参数，只有显式给出的选项才会覆盖配置文件
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// TOML 配置文件路径
    #[arg(short, long)]
    pub config: Option<String>,

    /// 生成示例配置文件到该路径后退出
    #[arg(long)]
    pub write_example_config: Option<String>,

    /// 输入OBJ文件的路径，缺省时渲染内置立方体
    #[arg(long)]
    pub obj: Option<String>,

    /// 输出文件的基础名称（例如: "render" -> "render_color.png"）
    #[arg(short, long)]
    pub output: Option<String>,

    /// 输出图像的目录
    #[arg(long)]
    pub output_dir: Option<String>,

    /// 输出图像的宽度
    #[arg(long)]
    pub width: Option<usize>,

    /// 输出图像的高度
    #[arg(long)]
    pub height: Option<usize>,

    /// 工作线程数，0 表示自动
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,

    /// 渲染模式: wireframe, flat, phong, textured
    #[arg(long)]
    pub mode: Option<String>,

    /// 填充算法: barycentric, half_space
    #[arg(long)]
    pub fill: Option<String>,

    /// 深度缓冲锁策略: per_pixel, striped
    #[arg(long)]
    pub lock_strategy: Option<String>,

    /// 轨道动画的帧数
    #[arg(long)]
    pub frames: Option<usize>,

    /// 显式指定漫反射贴图，覆盖MTL设置
    #[arg(long)]
    pub texture: Option<String>,

    /// 禁用背面剔除
    #[arg(long, default_value_t = false)]
    pub no_culling: bool,

    /// 启用渲染和保存深度图
    #[arg(long, default_value_t = false)]
    pub save_depth: bool,

    /// 纹理使用双线性采样
    #[arg(long, default_value_t = false)]
    pub bilinear: bool,
}

impl Args {
    /// 将命令行覆盖项合并到配置中
    pub fn apply_to(&self, settings: &mut RenderSettings) {
        if let Some(obj) = &self.obj {
            settings.files.obj = Some(obj.clone());
        }
        if let Some(output) = &self.output {
            settings.files.output = Some(output.clone());
        }
        if let Some(output_dir) = &self.output_dir {
            settings.files.output_dir = output_dir.clone();
        }
        if let Some(texture) = &self.texture {
            settings.files.diffuse_texture = Some(texture.clone());
        }
        if let Some(width) = self.width {
            settings.render.width = width;
        }
        if let Some(height) = self.height {
            settings.render.height = height;
        }
        if let Some(threads) = self.threads {
            settings.render.threads = threads;
        }
        if let Some(mode) = &self.mode {
            settings.render.mode = mode.clone();
        }
        if let Some(fill) = &self.fill {
            settings.render.fill = fill.clone();
        }
        if let Some(lock_strategy) = &self.lock_strategy {
            settings.render.lock_strategy = lock_strategy.clone();
        }
        if let Some(frames) = self.frames {
            settings.render.frames = frames;
        }
        if self.no_culling {
            settings.render.backface_culling = false;
        }
        if self.save_depth {
            settings.files.save_depth = true;
        }
        if self.bilinear {
            settings.render.bilinear = true;
        }
    }
}
