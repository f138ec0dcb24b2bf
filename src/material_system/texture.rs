use crate::core::error::RenderResult;
use crate::material_system::color::{Color, color_to_packed};
use image::RgbImage;
use log::info;
use std::path::Path;
use std::sync::Arc;

/// 纹理来源的最小接口
///
/// `sample` 为最近邻采样：UV 先截断到 [0, 1]，`v = 0` 对应第一行像素。
/// `sample_bilinear` 在四个相邻像素间双线性插值，边缘同样截断。
pub trait TextureProvider: Send + Sync {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// 按整数坐标读取像素，返回 [0, 1] 范围的颜色
    fn texel(&self, x: u32, y: u32) -> Color;

    /// 按整数坐标读取打包的 ARGB 像素
    fn pixel(&self, x: u32, y: u32) -> u32 {
        color_to_packed(&self.texel(x, y))
    }

    fn sample(&self, u: f32, v: f32) -> Color {
        let (w, h) = (self.width(), self.height());
        let x = ((u.clamp(0.0, 1.0) * w as f32) as u32).min(w - 1);
        let y = ((v.clamp(0.0, 1.0) * h as f32) as u32).min(h - 1);
        self.texel(x, y)
    }

    fn sample_bilinear(&self, u: f32, v: f32) -> Color {
        let (w, h) = (self.width(), self.height());
        let fx = (u.clamp(0.0, 1.0) * w as f32 - 0.5).max(0.0);
        let fy = (v.clamp(0.0, 1.0) * h as f32 - 0.5).max(0.0);
        let x0 = (fx as u32).min(w - 1);
        let y0 = (fy as u32).min(h - 1);
        let x1 = (x0 + 1).min(w - 1);
        let y1 = (y0 + 1).min(h - 1);
        let tx = fx - x0 as f32;
        let ty = fy - y0 as f32;

        let top = self.texel(x0, y0) * (1.0 - tx) + self.texel(x1, y0) * tx;
        let bottom = self.texel(x0, y1) * (1.0 - tx) + self.texel(x1, y1) * tx;
        top * (1.0 - ty) + bottom * ty
    }
}

/// 纹理采样方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SamplingMode {
    #[default]
    Nearest,
    Bilinear,
}

impl SamplingMode {
    #[inline]
    pub fn sample(self, texture: &dyn TextureProvider, u: f32, v: f32) -> Color {
        match self {
            SamplingMode::Nearest => texture.sample(u, v),
            SamplingMode::Bilinear => texture.sample_bilinear(u, v),
        }
    }
}

/// 图像纹理，像素在多个着色器之间共享
#[derive(Debug, Clone)]
pub struct Texture {
    image: Arc<RgbImage>,
    pub width: u32,
    pub height: u32,
}

impl Texture {
    pub fn from_file<P: AsRef<Path>>(path: P) -> RenderResult<Self> {
        let path = path.as_ref();
        let img = image::open(path)?.to_rgb8();
        info!("加载纹理 {:?} ({}x{})", path, img.width(), img.height());
        Ok(Self::from_image(img))
    }

    pub fn from_image(img: RgbImage) -> Self {
        Texture {
            width: img.width(),
            height: img.height(),
            image: Arc::new(img),
        }
    }
}

impl TextureProvider for Texture {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn texel(&self, x: u32, y: u32) -> Color {
        let pixel = self
            .image
            .get_pixel(x.min(self.width - 1), y.min(self.height - 1));
        Color::new(
            pixel[0] as f32 / 255.0,
            pixel[1] as f32 / 255.0,
            pixel[2] as f32 / 255.0,
        )
    }
}
