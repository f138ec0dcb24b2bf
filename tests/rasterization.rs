use mt_rasterizer::core::depth_buffer::{DepthBuffer, LockStrategy};
use mt_rasterizer::core::frame_buffer::FrameBuffer;
use mt_rasterizer::core::rasterizer::half_space::scan_half_space;
use mt_rasterizer::core::rasterizer::triangle::scan_barycentric;
use mt_rasterizer::core::rasterizer::{
    FillAlgorithm, VertexRenderData, draw_line, rasterize_triangle,
};
use mt_rasterizer::material_system::shaders::FragmentShader;
use nalgebra::Vector3;

struct Solid(u32);

impl FragmentShader for Solid {
    fn fragment(&self, _bary: &Vector3<f32>) -> u32 {
        self.0
    }
}

fn tri(points: [(f32, f32); 3], depth: f32) -> [VertexRenderData; 3] {
    points.map(|(x, y)| VertexRenderData::new(x, y, depth))
}

fn coverage(
    fill: FillAlgorithm,
    verts: &[VertexRenderData; 3],
    width: usize,
    height: usize,
) -> Vec<(usize, usize)> {
    let mut pixels = Vec::new();
    let visit = |x, y, _: &Vector3<f32>| pixels.push((x, y));
    match fill {
        FillAlgorithm::Barycentric => scan_barycentric(verts, width, height, visit),
        FillAlgorithm::HalfSpace => scan_half_space(verts, width, height, visit),
    };
    pixels
}

#[test]
fn right_triangle_coverage_for_both_fills() {
    let verts = tri([(0.0, 0.0), (4.0, 0.0), (0.0, 4.0)], 1.0);
    for fill in [FillAlgorithm::Barycentric, FillAlgorithm::HalfSpace] {
        let pixels = coverage(fill, &verts, 8, 8);
        assert!(pixels.contains(&(1, 1)), "{fill}: (1,1) 应被覆盖");
        assert!(!pixels.contains(&(3, 3)), "{fill}: (3,3) 不应被覆盖");
        assert!(pixels.iter().all(|&(x, y)| x < 4 && y < 4));
    }
}

#[test]
fn fills_agree_away_from_edges() {
    let verts = tri([(1.3, 0.7), (13.9, 4.2), (5.1, 11.6)], 2.0);
    let bary = coverage(FillAlgorithm::Barycentric, &verts, 16, 16);
    let half = coverage(FillAlgorithm::HalfSpace, &verts, 16, 16);
    // 只可能在边界像素上有差异
    let diff = bary.iter().filter(|p| !half.contains(p)).count()
        + half.iter().filter(|p| !bary.contains(p)).count();
    assert!(diff <= 4, "两种填充差异过大: {diff}");
    assert!(half.len() > 40);
}

#[test]
fn shared_diagonal_is_covered_exactly_once() {
    let a = tri([(0.0, 0.0), (8.0, 0.0), (8.0, 8.0)], 1.0);
    let b = tri([(0.0, 0.0), (8.0, 8.0), (0.0, 8.0)], 1.0);
    let mut hits = vec![0u32; 64];
    for verts in [&a, &b] {
        scan_half_space(verts, 8, 8, |x, y, _| hits[y * 8 + x] += 1);
    }
    assert!(hits.iter().all(|&h| h == 1), "覆盖次数: {hits:?}");
}

#[test]
fn nearer_triangle_wins_regardless_of_order() {
    let far = tri([(0.0, 0.0), (8.0, 0.0), (0.0, 8.0)], 5.0);
    let near = tri([(0.0, 0.0), (8.0, 0.0), (0.0, 8.0)], 2.0);

    for order in [[(&far, 1u32), (&near, 2)], [(&near, 2), (&far, 1)]] {
        let frame = FrameBuffer::new(8, 8).unwrap();
        let depth = DepthBuffer::new(8, 8, LockStrategy::PerPixel).unwrap();
        for (verts, color) in order {
            rasterize_triangle(verts, FillAlgorithm::HalfSpace, &frame, &depth, &Solid(color));
        }
        assert_eq!(frame.get(1, 1), Some(2));
        assert!((depth.depth_at(1, 1) - 2.0).abs() < 1e-5);
    }
}

#[test]
fn steep_line_sets_one_pixel_per_row() {
    let frame = FrameBuffer::new(10, 10).unwrap();
    let drawn = draw_line(&frame, 2, 0, 4, 9, 7);
    assert_eq!(drawn, 10);
    for y in 0..10 {
        let lit = (0..10).filter(|&x| frame.get(x, y) == Some(7)).count();
        assert_eq!(lit, 1, "第 {y} 行");
    }
    assert_eq!(frame.get(2, 0), Some(7));
    assert_eq!(frame.get(4, 9), Some(7));
}

#[test]
fn line_is_symmetric_in_endpoint_order() {
    let forward = FrameBuffer::new(12, 12).unwrap();
    let backward = FrameBuffer::new(12, 12).unwrap();
    draw_line(&forward, 1, 2, 10, 7, 1);
    draw_line(&backward, 10, 7, 1, 2, 1);
    assert_eq!(forward.pixels(), backward.pixels());
}

#[test]
fn degenerate_triangle_covers_nothing() {
    let verts = tri([(0.0, 0.0), (4.0, 4.0), (8.0, 8.0)], 1.0);
    for fill in [FillAlgorithm::Barycentric, FillAlgorithm::HalfSpace] {
        assert!(coverage(fill, &verts, 10, 10).is_empty(), "{fill}");
    }
}
