//! # 每帧的流水线任务
//!
//! 一帧分为两波：顶点变换波把网格变换到屏幕空间与世界空间，
//! 光栅化波逐三角形裁剪、剔除、着色并写入缓冲。每个任务只处理
//! 自己的索引区间，两波之间由线程池的 `wait` 隔开。

use crate::core::depth_buffer::DepthBuffer;
use crate::core::frame_buffer::FrameBuffer;
use crate::core::rasterizer::clipping::{
    clip_line_to_viewport, is_back_facing, is_clipped, outside_viewport,
};
use crate::core::rasterizer::{FillAlgorithm, VertexRenderData, draw_line, rasterize_triangle};
use crate::core::thread_pool::{Task, TaskError};
use crate::geometry::transform::{compute_normal_matrix, transform_normal};
use crate::io::mesh::MeshProvider;
use crate::material_system::light::Light;
use crate::material_system::materials::Material;
use crate::material_system::shaders::{ShadingInput, ShadingMode, TriangleShader};
use nalgebra::{Matrix3, Matrix4, Point2, Point3, Vector3, Vector4};
use std::ops::Range;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::Sender;

/// 面积小于该值（平方像素）的三角形视为退化
const DEGENERATE_AREA: f32 = 1e-6;

/// 将 `[0, total)` 均分为 `parts` 段，余数并入最后一段
///
/// 总是返回 `parts` 个区间（`parts` 为 0 时按 1 处理），其中可能有空区间。
pub fn partition(total: usize, parts: usize) -> Vec<Range<usize>> {
    let parts = parts.max(1);
    let chunk = total / parts;
    (0..parts)
        .map(|i| {
            let start = i * chunk;
            let end = if i + 1 == parts { total } else { start + chunk };
            start..end
        })
        .collect()
}

/// 一帧内不变的变换矩阵
#[derive(Debug, Clone, Copy)]
pub struct FrameTransforms {
    /// viewport · P · V · M
    pub screen: Matrix4<f32>,
    /// M
    pub model: Matrix4<f32>,
    /// M 的逆转置
    pub normal: Matrix3<f32>,
}

impl FrameTransforms {
    pub fn new(
        viewport: &Matrix4<f32>,
        projection: &Matrix4<f32>,
        view: &Matrix4<f32>,
        model: &Matrix4<f32>,
    ) -> Self {
        Self {
            screen: viewport * projection * view * model,
            model: *model,
            normal: compute_normal_matrix(model),
        }
    }
}

/// 每帧统计，由各任务原子累加
#[derive(Debug, Default)]
pub struct FrameStats {
    faces_drawn: AtomicUsize,
    faces_clipped: AtomicUsize,
    faces_culled: AtomicUsize,
    faces_degenerate: AtomicUsize,
    fragments_written: AtomicUsize,
}

/// [`FrameStats`] 的只读快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStatsSnapshot {
    pub faces_drawn: usize,
    pub faces_clipped: usize,
    pub faces_culled: usize,
    pub faces_degenerate: usize,
    pub fragments_written: usize,
}

impl FrameStats {
    fn bump(counter: &AtomicUsize, amount: usize) {
        counter.fetch_add(amount, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> FrameStatsSnapshot {
        FrameStatsSnapshot {
            faces_drawn: self.faces_drawn.load(Ordering::Relaxed),
            faces_clipped: self.faces_clipped.load(Ordering::Relaxed),
            faces_culled: self.faces_culled.load(Ordering::Relaxed),
            faces_degenerate: self.faces_degenerate.load(Ordering::Relaxed),
            fragments_written: self.fragments_written.load(Ordering::Relaxed),
        }
    }
}

/// 顶点变换波的输出，下标与网格的顶点/法线数组一致
#[derive(Debug, Clone, Default)]
pub struct TransformedMesh {
    /// 视口变换后的齐次坐标（尚未做透视除法）
    pub screen: Vec<Vector4<f32>>,
    /// 世界坐标
    pub world: Vec<Point3<f32>>,
    /// 世界空间法线
    pub world_normals: Vec<Vector3<f32>>,
}

impl TransformedMesh {
    pub fn new(vertex_count: usize, normal_count: usize) -> Self {
        Self {
            screen: vec![Vector4::zeros(); vertex_count],
            world: vec![Point3::origin(); vertex_count],
            world_normals: vec![Vector3::zeros(); normal_count],
        }
    }

    /// 把一个任务的结果放回对应下标
    pub fn place(&mut self, chunk: TransformChunk) {
        let vertices = chunk.vertices.clone();
        self.screen[vertices.clone()].copy_from_slice(&chunk.screen);
        self.world[vertices].copy_from_slice(&chunk.world);
        self.world_normals[chunk.normals.clone()].copy_from_slice(&chunk.world_normals);
    }
}

/// 单个顶点变换任务的结果
#[derive(Debug, Clone)]
pub struct TransformChunk {
    pub vertices: Range<usize>,
    pub screen: Vec<Vector4<f32>>,
    pub world: Vec<Point3<f32>>,
    pub normals: Range<usize>,
    pub world_normals: Vec<Vector3<f32>>,
}

/// 顶点变换任务：变换一段顶点与一段法线，结果经通道交回控制线程
pub struct VertexTransformTask {
    pub mesh: Arc<dyn MeshProvider>,
    pub transforms: FrameTransforms,
    pub vertices: Range<usize>,
    pub normals: Range<usize>,
    pub sender: Sender<TransformChunk>,
}

impl Task for VertexTransformTask {
    fn name(&self) -> &str {
        "vertex-transform"
    }

    fn run(&mut self) -> Result<(), TaskError> {
        let mesh = &self.mesh;
        let t = &self.transforms;

        let mut screen = Vec::with_capacity(self.vertices.len());
        let mut world = Vec::with_capacity(self.vertices.len());
        for i in self.vertices.clone() {
            let homogeneous = mesh.position(i).to_homogeneous();
            screen.push(t.screen * homogeneous);
            world.push(Point3::from_homogeneous(t.model * homogeneous).unwrap_or_else(Point3::origin));
        }

        let world_normals = self
            .normals
            .clone()
            .map(|i| transform_normal(&mesh.normal(i), &t.normal))
            .collect();

        self.sender
            .send(TransformChunk {
                vertices: self.vertices.clone(),
                screen,
                world,
                normals: self.normals.clone(),
                world_normals,
            })
            .map_err(|_| TaskError::new("变换结果通道已关闭"))
    }
}

/// 光栅化波内所有任务共享的只读上下文
#[derive(Debug, Clone)]
pub struct RasterContext {
    pub mode: ShadingMode,
    pub fill: FillAlgorithm,
    pub eye: Point3<f32>,
    pub lights: Vec<Light>,
    pub material: Material,
    pub backface_culling: bool,
    pub wireframe_color: u32,
}

/// 光栅化任务：对一段三角形做裁剪、剔除、着色与深度测试写入
pub struct RasterizeTask {
    pub mesh: Arc<dyn MeshProvider>,
    pub transformed: Arc<TransformedMesh>,
    pub faces: Range<usize>,
    pub frame_buffer: Arc<FrameBuffer>,
    pub depth_buffer: Arc<DepthBuffer>,
    pub context: Arc<RasterContext>,
    pub stats: Arc<FrameStats>,
}

impl Task for RasterizeTask {
    fn name(&self) -> &str {
        "rasterize"
    }

    fn run(&mut self) -> Result<(), TaskError> {
        let mesh = &self.mesh;
        let transformed = &self.transformed;
        let context = &self.context;
        let stats = &self.stats;
        let (width, height) = (self.frame_buffer.width, self.frame_buffer.height);

        for face_index in self.faces.clone() {
            let face = mesh.face(face_index);
            let clip = face.map(|corner| transformed.screen[corner.vertex]);
            if is_clipped(&clip) {
                FrameStats::bump(&stats.faces_clipped, 1);
                continue;
            }

            let vertices = clip.map(|v| VertexRenderData::from_homogeneous(&v));
            let pixels = vertices.map(|v| v.pix);
            if outside_viewport(&pixels, width, height) {
                FrameStats::bump(&stats.faces_clipped, 1);
                continue;
            }

            let world = face.map(|corner| transformed.world[corner.vertex]);
            if context.backface_culling && is_back_facing(&world, &context.eye) {
                FrameStats::bump(&stats.faces_culled, 1);
                continue;
            }

            let area = (pixels[1] - pixels[0]).perp(&(pixels[2] - pixels[0]));
            if area.abs() < DEGENERATE_AREA {
                FrameStats::bump(&stats.faces_degenerate, 1);
                continue;
            }

            let input = ShadingInput {
                world,
                normals: face.map(|corner| transformed.world_normals[corner.normal]),
                uvs: face.map(|corner| mesh.uv(corner.uv)),
                inv_w: clip.map(|v| 1.0 / v.w),
                eye: context.eye,
                lights: &context.lights,
                material: &context.material,
            };
            let Some(shader) = TriangleShader::for_mode(context.mode, &input) else {
                return Err(TaskError::new(format!(
                    "渲染模式 {} 没有片元着色器",
                    context.mode
                )));
            };

            let coverage = rasterize_triangle(
                &vertices,
                context.fill,
                &self.frame_buffer,
                &self.depth_buffer,
                &shader,
            );
            FrameStats::bump(&stats.faces_drawn, 1);
            FrameStats::bump(&stats.fragments_written, coverage.written);
        }
        Ok(())
    }
}

/// 线框任务：对一段三角形的三条边做视口裁剪后用 Bresenham 绘制，不做深度测试
pub struct WireframeTask {
    pub mesh: Arc<dyn MeshProvider>,
    pub transformed: Arc<TransformedMesh>,
    pub faces: Range<usize>,
    pub frame_buffer: Arc<FrameBuffer>,
    pub context: Arc<RasterContext>,
    pub stats: Arc<FrameStats>,
}

impl Task for WireframeTask {
    fn name(&self) -> &str {
        "wireframe"
    }

    fn run(&mut self) -> Result<(), TaskError> {
        let frame_buffer = &self.frame_buffer;
        let (width, height) = (frame_buffer.width, frame_buffer.height);
        let color = self.context.wireframe_color;

        for face_index in self.faces.clone() {
            let face = self.mesh.face(face_index);
            let clip = face.map(|corner| self.transformed.screen[corner.vertex]);
            if is_clipped(&clip) {
                FrameStats::bump(&self.stats.faces_clipped, 1);
                continue;
            }

            let pixels: [Point2<f32>; 3] = clip.map(|v| VertexRenderData::from_homogeneous(&v).pix);
            let mut written = 0;
            for k in 0..3 {
                let Some((a, b)) = clip_line_to_viewport(pixels[k], pixels[(k + 1) % 3], width, height)
                else {
                    continue;
                };
                written += draw_line(
                    frame_buffer,
                    a.x.round() as i32,
                    a.y.round() as i32,
                    b.x.round() as i32,
                    b.y.round() as i32,
                    color,
                );
            }
            FrameStats::bump(&self.stats.faces_drawn, 1);
            FrameStats::bump(&self.stats.fragments_written, written);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remainder_goes_to_last_range() {
        assert_eq!(partition(10, 3), vec![0..3, 3..6, 6..10]);
        assert_eq!(partition(2, 4), vec![0..0, 0..0, 0..0, 0..2]);
        assert_eq!(partition(0, 2), vec![0..0, 0..0]);
        assert_eq!(partition(5, 0), vec![0..5]);
    }

    #[test]
    fn partition_covers_every_index_once() {
        for total in [0usize, 1, 7, 64, 1001] {
            for parts in 1..9 {
                let ranges = partition(total, parts);
                assert_eq!(ranges.len(), parts);
                let mut next = 0;
                for range in ranges {
                    assert_eq!(range.start, next);
                    next = range.end;
                }
                assert_eq!(next, total);
            }
        }
    }

    #[test]
    fn chunks_land_at_their_indices() {
        let mut mesh = TransformedMesh::new(4, 2);
        mesh.place(TransformChunk {
            vertices: 2..4,
            screen: vec![Vector4::repeat(1.0), Vector4::repeat(2.0)],
            world: vec![Point3::new(1.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0)],
            normals: 1..2,
            world_normals: vec![Vector3::z()],
        });
        assert_eq!(mesh.screen[0], Vector4::zeros());
        assert_eq!(mesh.screen[3], Vector4::repeat(2.0));
        assert_eq!(mesh.world[2], Point3::new(1.0, 0.0, 0.0));
        assert_eq!(mesh.world_normals[1], Vector3::z());
    }
}
