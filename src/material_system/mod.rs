//! 颜色、光源、纹理、材质与片元着色器

pub mod color;
pub mod light;
pub mod materials;
pub mod shaders;
pub mod texture;
