use super::FillAlgorithm;
use super::half_space::scan_half_space;
use super::triangle::{VertexRenderData, scan_barycentric};
use crate::core::depth_buffer::DepthBuffer;
use crate::core::frame_buffer::FrameBuffer;
use crate::geometry::interpolation::interpolate_depth;
use crate::material_system::shaders::FragmentShader;
use nalgebra::Vector3;

/// 三角形光栅化的统计结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TriangleCoverage {
    /// 被三角形覆盖的像素数
    pub covered: usize,
    /// 通过深度测试并写入颜色的像素数
    pub written: usize,
}

/// 光栅化单个三角形
///
/// 覆盖的像素先做无锁深度预检，再着色，最后在逐像素锁内完成
/// 深度比较与颜色写入。调用者须保证三角形已通过裁剪（顶点深度为正）。
pub fn rasterize_triangle<S: FragmentShader + ?Sized>(
    vertices: &[VertexRenderData; 3],
    fill: FillAlgorithm,
    frame_buffer: &FrameBuffer,
    depth_buffer: &DepthBuffer,
    shader: &S,
) -> TriangleCoverage {
    debug_assert_eq!(
        (frame_buffer.width, frame_buffer.height),
        (depth_buffer.width(), depth_buffer.height()),
        "颜色缓冲与深度缓冲尺寸不一致"
    );

    let depths = [vertices[0].depth, vertices[1].depth, vertices[2].depth];
    let mut written = 0;

    let mut shade = |x: usize, y: usize, bary: &Vector3<f32>| {
        let depth = interpolate_depth(bary, &depths);
        if !(depth > 0.0 && depth.is_finite()) || !depth_buffer.could_pass(x, y, depth) {
            return;
        }
        let color = shader.fragment(bary);
        if depth_buffer.test_and_write(x, y, depth, || frame_buffer.put(x, y, color)) {
            written += 1;
        }
    };

    let (width, height) = (frame_buffer.width, frame_buffer.height);
    let covered = match fill {
        FillAlgorithm::Barycentric => scan_barycentric(vertices, width, height, &mut shade),
        FillAlgorithm::HalfSpace => scan_half_space(vertices, width, height, &mut shade),
    };

    TriangleCoverage { covered, written }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::depth_buffer::LockStrategy;

    struct Solid(u32);

    impl FragmentShader for Solid {
        fn fragment(&self, _bary: &Vector3<f32>) -> u32 {
            self.0
        }
    }

    fn triangle(depth: f32) -> [VertexRenderData; 3] {
        [
            VertexRenderData::new(0.0, 0.0, depth),
            VertexRenderData::new(8.0, 0.0, depth),
            VertexRenderData::new(0.0, 8.0, depth),
        ]
    }

    #[test]
    fn nearer_triangle_overwrites_farther_one() {
        let fb = FrameBuffer::new(8, 8).unwrap();
        let db = DepthBuffer::new(8, 8, LockStrategy::PerPixel).unwrap();
        db.clear();

        let far = rasterize_triangle(&triangle(5.0), FillAlgorithm::HalfSpace, &fb, &db, &Solid(1));
        let near = rasterize_triangle(&triangle(2.0), FillAlgorithm::HalfSpace, &fb, &db, &Solid(2));
        let hidden = rasterize_triangle(&triangle(3.0), FillAlgorithm::HalfSpace, &fb, &db, &Solid(3));

        assert_eq!(far.written, far.covered);
        assert_eq!(near.written, near.covered);
        assert_eq!(hidden.written, 0);
        assert_eq!(fb.get(1, 1), Some(2));
        assert!((db.depth_at(1, 1) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn stored_depth_is_perspective_correct() {
        let fb = FrameBuffer::new(8, 8).unwrap();
        let db = DepthBuffer::new(8, 8, LockStrategy::PerPixel).unwrap();
        db.clear();
        let sloped = [
            VertexRenderData::new(0.0, 0.0, 2.0),
            VertexRenderData::new(8.0, 0.0, 8.0),
            VertexRenderData::new(0.0, 8.0, 2.0),
        ];
        rasterize_triangle(&sloped, FillAlgorithm::Barycentric, &fb, &db, &Solid(4));

        // 像素 (1, 1) 中心的重心坐标为 (0.625, 0.1875, 0.1875)
        let expected = 0.625 / 2.0 + 0.1875 / 8.0 + 0.1875 / 2.0;
        assert!((db.reciprocal_at(1, 1) - expected).abs() < 1e-5);
        assert!(db.depth_at(1, 1) < 2.5);
    }

    #[test]
    fn both_fills_agree_away_from_edges() {
        for fill in [FillAlgorithm::Barycentric, FillAlgorithm::HalfSpace] {
            let fb = FrameBuffer::new(8, 8).unwrap();
            let db = DepthBuffer::new(8, 8, LockStrategy::default()).unwrap();
            db.clear();
            rasterize_triangle(&triangle(1.0), fill, &fb, &db, &Solid(9));
            assert_eq!(fb.get(1, 1), Some(9), "{fill}");
            assert_eq!(fb.get(6, 6), Some(0), "{fill}");
        }
    }
}
