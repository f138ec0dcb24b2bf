//! 多线程 CPU 软件光栅化器
//!
//! 固定大小的线程池按"顶点变换波 / 光栅化波"驱动每一帧，
//! 工作线程共享逐像素加锁的深度缓冲与原子颜色缓冲。

pub mod core;
pub mod geometry;
pub mod io;
pub mod material_system;
pub mod utils;

pub use crate::core::depth_buffer::{DepthBuffer, LockStrategy};
pub use crate::core::error::{RenderError, RenderResult};
pub use crate::core::frame_buffer::FrameBuffer;
pub use crate::core::render_config::RenderConfig;
pub use crate::core::renderer::{FrameReport, Renderer};
pub use crate::core::thread_pool::ThreadPool;
