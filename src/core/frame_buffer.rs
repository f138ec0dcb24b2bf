use crate::core::error::{RenderError, RenderResult};
use crate::material_system::color::unpack_rgb;
use rayon::prelude::*;
use std::sync::atomic::{AtomicU32, Ordering};

/// 颜色缓冲区，存储打包的 32 位 ARGB 颜色
///
/// 使用原子类型以支持多个光栅化任务并行写入。像素的写入顺序由深度缓冲的
/// 逐像素锁保证，这里只需要 `Relaxed` 存取。
pub struct FrameBuffer {
    pub width: usize,
    pub height: usize,
    color_buffer: Vec<AtomicU32>,
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> RenderResult<Self> {
        let mut frame_buffer = FrameBuffer {
            width: 0,
            height: 0,
            color_buffer: Vec::new(),
        };
        frame_buffer.resize(width, height)?;
        Ok(frame_buffer)
    }

    /// 按新尺寸重新分配，内容清零
    pub fn resize(&mut self, width: usize, height: usize) -> RenderResult<()> {
        let num_pixels = width
            .checked_mul(height)
            .filter(|&p| p > 0)
            .ok_or(RenderError::InvalidSize { width, height })?;

        let mut color_buffer = Vec::new();
        color_buffer
            .try_reserve_exact(num_pixels)
            .map_err(|_| RenderError::Allocation { pixels: num_pixels })?;
        color_buffer.extend((0..num_pixels).map(|_| AtomicU32::new(0)));

        self.color_buffer = color_buffer;
        self.width = width;
        self.height = height;
        Ok(())
    }

    /// 用给定颜色填充整个缓冲区
    pub fn clear(&self, color: u32) {
        self.color_buffer.par_iter().for_each(|pixel| {
            pixel.store(color, Ordering::Relaxed);
        });
    }

    /// 写入像素，越界坐标被忽略（线框模式不做裁剪时依赖这一点）
    #[inline]
    pub fn set(&self, x: i32, y: i32, color: u32) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        self.color_buffer[y as usize * self.width + x as usize].store(color, Ordering::Relaxed);
    }

    /// 无边界检查的写入，调用者保证坐标在范围内
    #[inline]
    pub fn put(&self, x: usize, y: usize, color: u32) {
        self.color_buffer[y * self.width + x].store(color, Ordering::Relaxed);
    }

    pub fn get(&self, x: usize, y: usize) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.color_buffer[y * self.width + x].load(Ordering::Relaxed))
    }

    /// 导出打包的 ARGB 像素，供显示层整体拷贝
    pub fn pixels(&self) -> Vec<u32> {
        self.color_buffer
            .iter()
            .map(|pixel| pixel.load(Ordering::Relaxed))
            .collect()
    }

    /// 获取 RGB8 字节数据，用于保存图像
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        self.color_buffer
            .par_iter()
            .flat_map_iter(|pixel| unpack_rgb(pixel.load(Ordering::Relaxed)))
            .collect()
    }

    /// 统计与背景色不同的像素数
    pub fn count_not_equal(&self, background: u32) -> usize {
        self.color_buffer
            .par_iter()
            .filter(|pixel| pixel.load(Ordering::Relaxed) != background)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_ignores_out_of_range() {
        let fb = FrameBuffer::new(3, 2).unwrap();
        fb.set(-1, 0, 0xFF);
        fb.set(3, 0, 0xFF);
        fb.set(0, 2, 0xFF);
        assert_eq!(fb.count_not_equal(0), 0);
        fb.set(2, 1, 0xFF);
        assert_eq!(fb.get(2, 1), Some(0xFF));
    }

    #[test]
    fn rgb_bytes_follow_argb_layout() {
        let fb = FrameBuffer::new(1, 1).unwrap();
        fb.clear(0x00_11_22_33);
        assert_eq!(fb.to_rgb_bytes(), vec![0x11, 0x22, 0x33]);
    }

    #[test]
    fn resize_resets_contents() {
        let mut fb = FrameBuffer::new(2, 2).unwrap();
        fb.clear(7);
        fb.resize(4, 1).unwrap();
        assert_eq!(fb.pixels(), vec![0; 4]);
    }
}
