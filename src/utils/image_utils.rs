use crate::core::error::RenderResult;
use crate::core::renderer::Renderer;
use image::ColorType;
use log::{info, warn};
use std::path::{Path, PathBuf};

/// 保存RGB图像数据到PNG文件
pub fn save_image<P: AsRef<Path>>(path: P, data: &[u8], width: u32, height: u32) -> RenderResult<()> {
    let path = path.as_ref();
    image::save_buffer(path, data, width, height, ColorType::Rgb8)?;
    info!("图像已保存到 {}", path.display());
    Ok(())
}

/// 将深度缓冲数据归一化到指定的百分位数范围
///
/// 非有限值（未写入的像素）映射为 1.0，即最远。
pub fn normalize_depth(depth_buffer: &[f32], min_percentile: f32, max_percentile: f32) -> Vec<f32> {
    let mut finite_depths: Vec<f32> = depth_buffer
        .iter()
        .copied()
        .filter(|d| d.is_finite())
        .collect();

    let (min_clip, max_clip) = if finite_depths.len() >= 2 {
        finite_depths.sort_unstable_by(f32::total_cmp);
        let last = finite_depths.len() - 1;
        let index = |percentile: f32| {
            ((percentile / 100.0 * last as f32).round() as usize).min(last)
        };
        let mut min_clip = finite_depths[index(min_percentile)];
        let mut max_clip = finite_depths[index(max_percentile)];

        if (max_clip - min_clip).abs() < 1e-6 {
            min_clip = finite_depths[0];
            max_clip = finite_depths[last];
            if (max_clip - min_clip).abs() < 1e-6 {
                max_clip = min_clip + 1.0;
            }
        }
        (min_clip, max_clip)
    } else if let Some(&only) = finite_depths.first() {
        (only, only + 1.0)
    } else {
        warn!("没有有限深度值，使用默认范围 [0.1, 10.0]");
        (0.1, 10.0)
    };

    let range = max_clip - min_clip;
    let inv_range = if range > 1e-6 { 1.0 / range } else { 0.0 };

    depth_buffer
        .iter()
        .map(|&depth| {
            if depth.is_finite() {
                ((depth.clamp(min_clip, max_clip) - min_clip) * inv_range).clamp(0.0, 1.0)
            } else {
                1.0
            }
        })
        .collect()
}

/// 归一化深度转为灰度 RGB，近处亮远处暗
pub fn depth_to_rgb(normalized: &[f32]) -> Vec<u8> {
    normalized
        .iter()
        .flat_map(|&d| {
            let v = ((1.0 - d) * 255.0) as u8;
            [v, v, v]
        })
        .collect()
}

/// 输出文件的基础名称，未指定时使用本地时间戳
pub fn output_basename(base: Option<&str>) -> String {
    match base {
        Some(name) if !name.trim().is_empty() => name.to_string(),
        _ => format!("render_{}", chrono::Local::now().format("%Y%m%d_%H%M%S")),
    }
}

/// 保存当前帧的颜色图（以及可选的深度图），返回写出的文件路径
pub fn save_render_outputs(
    renderer: &Renderer,
    output_dir: &Path,
    basename: &str,
    save_depth: bool,
) -> RenderResult<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)?;
    let (width, height) = (renderer.width() as u32, renderer.height() as u32);
    let mut written = Vec::new();

    let color_path = output_dir.join(format!("{basename}_color.png"));
    save_image(&color_path, &renderer.frame_buffer().to_rgb_bytes(), width, height)?;
    written.push(color_path);

    if save_depth {
        let depth = normalize_depth(&renderer.depth_buffer().to_depth_vec(), 1.0, 99.0);
        let depth_path = output_dir.join(format!("{basename}_depth.png"));
        save_image(&depth_path, &depth_to_rgb(&depth), width, height)?;
        written.push(depth_path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_maps_unwritten_to_far() {
        let depth = [1.0, 2.0, 3.0, f32::INFINITY];
        let normalized = normalize_depth(&depth, 0.0, 100.0);
        assert_eq!(normalized[0], 0.0);
        assert!((normalized[1] - 0.5).abs() < 1e-6);
        assert_eq!(normalized[2], 1.0);
        assert_eq!(normalized[3], 1.0);
    }

    #[test]
    fn normalize_handles_constant_depth() {
        let normalized = normalize_depth(&[4.0, 4.0, 4.0], 1.0, 99.0);
        assert!(normalized.iter().all(|&d| d == 0.0));
    }

    #[test]
    fn depth_image_is_inverted_gray() {
        assert_eq!(depth_to_rgb(&[0.0, 1.0]), vec![255, 255, 255, 0, 0, 0]);
    }

    #[test]
    fn explicit_basename_is_kept() {
        assert_eq!(output_basename(Some("cube")), "cube");
        assert!(output_basename(None).starts_with("render_"));
    }
}
