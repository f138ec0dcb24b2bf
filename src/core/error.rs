/// 渲染核心统一使用的结果类型
pub type RenderResult<T> = Result<T, RenderError>;

/// 渲染核心的错误分类
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    /// 缓冲区尺寸为零或溢出
    #[error("无效的缓冲区尺寸: {width}x{height}")]
    InvalidSize { width: usize, height: usize },

    /// 缓冲区分配失败（resize 时直接报告给调用者）
    #[error("为 {pixels} 个像素分配缓冲区失败")]
    Allocation { pixels: usize },

    /// 线程池至少需要一个工作线程
    #[error("线程池至少需要一个工作线程")]
    NoWorkers,

    /// 创建工作线程或读写文件失败
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 网格面引用了越界的索引
    #[error("网格面 {face} 的{kind}索引 {index} 越界 (共 {len} 个)")]
    InvalidMesh {
        face: usize,
        kind: &'static str,
        index: usize,
        len: usize,
    },

    /// 缓冲区仍被未结束的任务持有
    #[error("缓冲区仍被未完成的任务共享，无法调整大小")]
    BuffersInUse,

    /// 纹理解码失败
    #[error("纹理加载失败: {0}")]
    Texture(#[from] image::ImageError),

    /// OBJ 解析失败
    #[error("OBJ 加载失败: {0}")]
    Obj(#[from] tobj::LoadError),
}

