//! # 三角形光栅化模块
//!
//! 画线、包围盒重心扫描、半平面填充、裁剪与剔除，以及把覆盖结果
//! 经过深度测试写入帧缓冲的像素处理。

pub mod clipping;
pub mod half_space;
pub mod line;
pub mod pixel_processor;
pub mod triangle;

use std::fmt;
use std::str::FromStr;

pub use line::draw_line;
pub use pixel_processor::rasterize_triangle;
pub use triangle::{BoundingBox, VertexRenderData};

/// 三角形填充算法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillAlgorithm {
    /// 包围盒内逐像素求重心坐标
    Barycentric,
    /// 定点边函数增量步进，带左上规则
    #[default]
    HalfSpace,
}

impl FromStr for FillAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "barycentric" | "bbox" => Ok(FillAlgorithm::Barycentric),
            "half_space" | "half-space" | "halfspace" | "edge" => Ok(FillAlgorithm::HalfSpace),
            other => Err(format!(
                "未知的填充算法 \"{other}\"，可选: barycentric, half_space"
            )),
        }
    }
}

impl fmt::Display for FillAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FillAlgorithm::Barycentric => "barycentric",
            FillAlgorithm::HalfSpace => "half_space",
        })
    }
}
