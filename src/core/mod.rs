pub mod depth_buffer;
pub mod error;
pub mod frame_buffer;
pub mod pipeline;
pub mod rasterizer;
pub mod render_config;
pub mod renderer;
pub mod spin_lock;
pub mod thread_pool;
