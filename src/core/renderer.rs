use crate::core::depth_buffer::{DepthBuffer, LockStrategy};
use crate::core::error::{RenderError, RenderResult};
use crate::core::frame_buffer::FrameBuffer;
use crate::core::pipeline::{
    FrameStats, FrameStatsSnapshot, FrameTransforms, RasterContext, RasterizeTask,
    TransformedMesh, VertexTransformTask, WireframeTask, partition,
};
use crate::core::render_config::RenderConfig;
use crate::core::thread_pool::{TaskFailure, ThreadPool};
use crate::geometry::camera::CameraProvider;
use crate::geometry::transform::TransformFactory;
use crate::io::mesh::MeshProvider;
use crate::material_system::shaders::ShadingMode;
use log::{debug, error, warn};
use std::sync::Arc;
use std::sync::mpsc;
use std::time::{Duration, Instant};

/// 单帧渲染的结果
#[derive(Debug, Default)]
pub struct FrameReport {
    pub stats: FrameStatsSnapshot,
    pub transform_time: Duration,
    pub raster_time: Duration,
    /// 本帧两波任务中失败的任务
    pub failures: Vec<TaskFailure>,
}

impl FrameReport {
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

/// 帧控制器：持有线程池与两个缓冲，按波次驱动一帧的渲染
///
/// 缓冲只在一波任务执行期间与任务共享，`render` 返回时控制器重新独占它们。
pub struct Renderer {
    pool: ThreadPool,
    frame_buffer: Arc<FrameBuffer>,
    depth_buffer: Arc<DepthBuffer>,
    frame_index: u64,
}

impl Renderer {
    pub fn new(
        width: usize,
        height: usize,
        threads: usize,
        lock_strategy: LockStrategy,
    ) -> RenderResult<Self> {
        let frame_buffer = Arc::new(FrameBuffer::new(width, height)?);
        let depth_buffer = Arc::new(DepthBuffer::new(width, height, lock_strategy)?);
        let pool = ThreadPool::new(threads)?;
        debug!(
            "渲染器创建: {}x{}, {} 个工作线程, 锁策略 {:?}",
            width, height, threads, lock_strategy
        );
        Ok(Self {
            pool,
            frame_buffer,
            depth_buffer,
            frame_index: 0,
        })
    }

    pub fn width(&self) -> usize {
        self.frame_buffer.width
    }

    pub fn height(&self) -> usize {
        self.frame_buffer.height
    }

    pub fn thread_count(&self) -> usize {
        self.pool.thread_count()
    }

    pub fn frame_buffer(&self) -> &FrameBuffer {
        &self.frame_buffer
    }

    pub fn depth_buffer(&self) -> &DepthBuffer {
        &self.depth_buffer
    }

    /// 调整两个缓冲的尺寸，只能在两帧之间调用
    ///
    /// 失败时两个缓冲都保持原尺寸。
    pub fn resize(&mut self, width: usize, height: usize) -> RenderResult<()> {
        if (width, height) == (self.width(), self.height()) {
            return Ok(());
        }
        let frame_buffer = Arc::get_mut(&mut self.frame_buffer).ok_or(RenderError::BuffersInUse)?;
        let depth_buffer = Arc::get_mut(&mut self.depth_buffer).ok_or(RenderError::BuffersInUse)?;
        // 两个缓冲都分配成功后再替换，避免尺寸不一致
        let new_frame = FrameBuffer::new(width, height)?;
        let new_depth = DepthBuffer::new(width, height, depth_buffer.strategy())?;
        *frame_buffer = new_frame;
        *depth_buffer = new_depth;
        debug!("缓冲区调整为 {}x{}", width, height);
        Ok(())
    }

    /// 渲染一帧：清空缓冲，顶点变换波，光栅化波
    pub fn render(
        &mut self,
        mesh: &Arc<dyn MeshProvider>,
        camera: &dyn CameraProvider,
        config: &RenderConfig,
    ) -> RenderResult<FrameReport> {
        self.frame_index += 1;
        let (width, height) = (self.width(), self.height());
        let eye = camera.eye();
        let transforms = FrameTransforms::new(
            &TransformFactory::viewport(width as f32, height as f32),
            &config.projection_matrix(width, height),
            &camera.view_matrix(),
            &config.model_matrix,
        );

        self.frame_buffer.clear(config.background);
        self.depth_buffer.clear();
        self.pool.pause();

        let mut report = FrameReport::default();
        let parts = self.pool.thread_count();

        // 第一波：顶点变换
        let start = Instant::now();
        let (sender, receiver) = mpsc::channel();
        let vertex_ranges = partition(mesh.vertex_count(), parts);
        let normal_ranges = partition(mesh.normal_count(), parts);
        for (vertices, normals) in vertex_ranges.into_iter().zip(normal_ranges) {
            if vertices.is_empty() && normals.is_empty() {
                continue;
            }
            self.pool.submit(VertexTransformTask {
                mesh: Arc::clone(mesh),
                transforms,
                vertices,
                normals,
                sender: sender.clone(),
            });
        }
        drop(sender);
        let wave = self.pool.wait();
        report.failures.extend(wave.failures);

        let mut transformed = TransformedMesh::new(mesh.vertex_count(), mesh.normal_count());
        for chunk in receiver.try_iter() {
            transformed.place(chunk);
        }
        report.transform_time = start.elapsed();

        if !report.failures.is_empty() {
            error!(
                "第 {} 帧顶点变换失败 {} 个任务，跳过光栅化",
                self.frame_index,
                report.failures.len()
            );
            return Ok(report);
        }

        // 第二波：光栅化
        let start = Instant::now();
        let transformed = Arc::new(transformed);
        let stats = Arc::new(FrameStats::default());
        let context = Arc::new(RasterContext {
            mode: config.mode,
            fill: config.fill,
            eye,
            lights: config.lights_for_eye(eye),
            material: config.material.clone(),
            backface_culling: config.backface_culling,
            wireframe_color: config.wireframe_color,
        });

        for faces in partition(mesh.face_count(), parts) {
            if faces.is_empty() {
                continue;
            }
            if config.mode == ShadingMode::Wireframe {
                self.pool.submit(WireframeTask {
                    mesh: Arc::clone(mesh),
                    transformed: Arc::clone(&transformed),
                    faces,
                    frame_buffer: Arc::clone(&self.frame_buffer),
                    context: Arc::clone(&context),
                    stats: Arc::clone(&stats),
                });
            } else {
                self.pool.submit(RasterizeTask {
                    mesh: Arc::clone(mesh),
                    transformed: Arc::clone(&transformed),
                    faces,
                    frame_buffer: Arc::clone(&self.frame_buffer),
                    depth_buffer: Arc::clone(&self.depth_buffer),
                    context: Arc::clone(&context),
                    stats: Arc::clone(&stats),
                });
            }
        }
        let wave = self.pool.wait();
        report.raster_time = start.elapsed();
        report.stats = stats.snapshot();

        if !wave.is_ok() {
            warn!(
                "第 {} 帧光栅化有 {} 个任务失败",
                self.frame_index,
                wave.failures.len()
            );
        }
        report.failures.extend(wave.failures);

        debug!(
            "第 {} 帧: 绘制 {} 个三角形, 裁剪 {}, 背面剔除 {}, 退化 {}, 写入 {} 个片元 (变换 {:?}, 光栅化 {:?})",
            self.frame_index,
            report.stats.faces_drawn,
            report.stats.faces_clipped,
            report.stats.faces_culled,
            report.stats.faces_degenerate,
            report.stats.fragments_written,
            report.transform_time,
            report.raster_time
        );
        Ok(report)
    }
}
