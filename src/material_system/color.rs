use nalgebra::Vector3;

/// 线性 RGB 颜色，分量通常位于 [0, 1]
pub type Color = Vector3<f32>;

/// 打包为 0xAARRGGBB
#[inline]
pub fn pack_argb(a: u8, r: u8, g: u8, b: u8) -> u32 {
    ((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

/// 解包出 [r, g, b]，忽略 alpha
#[inline]
pub fn unpack_rgb(packed: u32) -> [u8; 3] {
    [
        ((packed >> 16) & 0xFF) as u8,
        ((packed >> 8) & 0xFF) as u8,
        (packed & 0xFF) as u8,
    ]
}

#[inline]
fn channel_to_u8(value: f32) -> u8 {
    (value * 255.0).clamp(0.0, 255.0) as u8
}

/// 将颜色逐通道截断到 [0, 255] 后打包（alpha 为 0，与显示层的约定一致）
#[inline]
pub fn color_to_packed(color: &Color) -> u32 {
    pack_argb(
        0,
        channel_to_u8(color.x),
        channel_to_u8(color.y),
        channel_to_u8(color.z),
    )
}

/// 若任一通道超过 1，则整体按最大通道缩放，保持色相不变
pub fn rescale_to_unit(color: &Color) -> Color {
    let max_channel = color.x.max(color.y).max(color.z);
    if max_channel > 1.0 {
        color / max_channel
    } else {
        *color
    }
}
