use crate::core::error::{RenderError, RenderResult};
use crate::core::spin_lock::SpinLock;
use atomic_float::AtomicF32;
use rayon::prelude::*;
use std::sync::atomic::Ordering;

/// 深度缓冲的锁分配策略
///
/// 逐像素锁没有伪竞争但占用内存；分段锁按像素坐标哈希到固定数量的锁上，
/// 以少量伪竞争换取内存。两者只影响性能，不影响正确性。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockStrategy {
    #[default]
    PerPixel,
    Striped { locks: usize },
}

/// 深度缓冲区
///
/// 存储倒数深度 `1/z`，数值越大表示越近。每个像素的"比较并写入"
/// 在对应的自旋锁下完成，不同像素之间可以完全并发地测试。
pub struct DepthBuffer {
    width: usize,
    height: usize,
    strategy: LockStrategy,
    cells: Vec<AtomicF32>,
    locks: Vec<SpinLock>,
}

fn allocate<T>(len: usize, make: impl Fn() -> T) -> RenderResult<Vec<T>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| RenderError::Allocation { pixels: len })?;
    buffer.extend((0..len).map(|_| make()));
    Ok(buffer)
}

impl DepthBuffer {
    pub fn new(width: usize, height: usize, strategy: LockStrategy) -> RenderResult<Self> {
        let mut buffer = DepthBuffer {
            width: 0,
            height: 0,
            strategy,
            cells: Vec::new(),
            locks: Vec::new(),
        };
        buffer.resize(width, height)?;
        Ok(buffer)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn strategy(&self) -> LockStrategy {
        self.strategy
    }

    pub fn lock_count(&self) -> usize {
        self.locks.len()
    }

    /// 重新分配深度网格与锁表，旧的深度值一律丢弃
    pub fn resize(&mut self, width: usize, height: usize) -> RenderResult<()> {
        let pixels = width
            .checked_mul(height)
            .filter(|&p| p > 0)
            .ok_or(RenderError::InvalidSize { width, height })?;

        let lock_count = match self.strategy {
            LockStrategy::PerPixel => pixels,
            LockStrategy::Striped { locks } => locks.max(1),
        };

        // 全部分配成功后才替换，失败时保持原尺寸
        let cells = allocate(pixels, || AtomicF32::new(f32::NEG_INFINITY))?;
        let locks = allocate(lock_count, SpinLock::new)?;
        self.cells = cells;
        self.locks = locks;
        self.width = width;
        self.height = height;
        Ok(())
    }

    /// 所有像素重置为"无限远"，保证任意像素的第一次写入必然通过
    pub fn clear(&self) {
        self.cells.par_iter().for_each(|cell| {
            cell.store(f32::NEG_INFINITY, Ordering::Relaxed);
        });
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(
            x < self.width && y < self.height,
            "像素 ({x}, {y}) 超出深度缓冲 {}x{}",
            self.width,
            self.height
        );
        y * self.width + x
    }

    #[inline]
    fn lock_for(&self, x: usize, y: usize, index: usize) -> &SpinLock {
        match self.strategy {
            LockStrategy::PerPixel => &self.locks[index],
            LockStrategy::Striped { .. } => {
                let hash = (x.wrapping_mul(73_856_093)) ^ (y.wrapping_mul(19_349_663));
                &self.locks[hash % self.locks.len()]
            }
        }
    }

    /// 深度测试：若 `1/z` 大于已存值则写入并返回 true
    ///
    /// 调用者负责裁剪到缓冲范围内，并保证 `z` 为正的有限值。
    pub fn test_and_set(&self, x: usize, y: usize, z: f32) -> bool {
        self.test_and_write(x, y, z, || {})
    }

    /// 与 [`test_and_set`](Self::test_and_set) 相同，但测试通过时在持锁状态下执行 `write`
    ///
    /// 颜色写入放在锁内，保证最终颜色与最终深度来自同一个片元。
    pub fn test_and_write<F: FnOnce()>(&self, x: usize, y: usize, z: f32, write: F) -> bool {
        debug_assert!(z > 0.0 && z.is_finite(), "深度必须为正的有限值: {z}");
        let index = self.index(x, y);
        let inv_z = 1.0 / z;
        let cell = &self.cells[index];

        let _guard = self.lock_for(x, y, index).lock();
        if inv_z > cell.load(Ordering::Relaxed) {
            cell.store(inv_z, Ordering::Relaxed);
            write();
            true
        } else {
            false
        }
    }

    /// 无锁预检。同一帧内存储值只增不减，预检失败的片元不可能在之后通过
    #[inline]
    pub fn could_pass(&self, x: usize, y: usize, z: f32) -> bool {
        let index = self.index(x, y);
        1.0 / z > self.cells[index].load(Ordering::Relaxed)
    }

    /// 读取存储的倒数深度
    pub fn reciprocal_at(&self, x: usize, y: usize) -> f32 {
        self.cells[self.index(x, y)].load(Ordering::Relaxed)
    }

    /// 读取像素深度，未写入的像素返回 `f32::INFINITY`
    pub fn depth_at(&self, x: usize, y: usize) -> f32 {
        let inv_z = self.reciprocal_at(x, y);
        if inv_z > 0.0 { 1.0 / inv_z } else { f32::INFINITY }
    }

    /// 导出线性深度，供深度图输出使用
    pub fn to_depth_vec(&self) -> Vec<f32> {
        self.cells
            .par_iter()
            .map(|cell| {
                let inv_z = cell.load(Ordering::Relaxed);
                if inv_z > 0.0 { 1.0 / inv_z } else { f32::INFINITY }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_write_always_wins_after_clear() {
        let buffer = DepthBuffer::new(4, 4, LockStrategy::PerPixel).unwrap();
        assert!(buffer.test_and_set(1, 2, 1000.0));
        buffer.clear();
        assert!(buffer.test_and_set(1, 2, 99_999.0));
    }

    #[test]
    fn nearer_passes_and_farther_fails() {
        let buffer = DepthBuffer::new(2, 2, LockStrategy::PerPixel).unwrap();
        assert!(buffer.test_and_set(0, 0, 5.0));
        assert!(!buffer.test_and_set(0, 0, 6.0));
        assert!(!buffer.test_and_set(0, 0, 5.0));
        assert!(buffer.test_and_set(0, 0, 2.0));
        assert!((buffer.depth_at(0, 0) - 2.0).abs() < 1e-6);
        assert_eq!(buffer.depth_at(1, 1), f32::INFINITY);
    }

    #[test]
    fn write_runs_only_on_pass() {
        let buffer = DepthBuffer::new(1, 1, LockStrategy::Striped { locks: 4 }).unwrap();
        let mut writes = 0;
        buffer.test_and_write(0, 0, 3.0, || writes += 1);
        buffer.test_and_write(0, 0, 4.0, || writes += 1);
        assert_eq!(writes, 1);
    }

    #[test]
    fn resize_discards_old_values() {
        let mut buffer = DepthBuffer::new(3, 3, LockStrategy::PerPixel).unwrap();
        buffer.test_and_set(2, 2, 1.0);
        buffer.resize(5, 2).unwrap();
        assert_eq!(buffer.width(), 5);
        assert_eq!(buffer.height(), 2);
        assert_eq!(buffer.lock_count(), 10);
        assert!(buffer.to_depth_vec().iter().all(|d| d.is_infinite()));
    }

    #[test]
    fn failed_lock_allocation_keeps_old_state() {
        let mut buffer = DepthBuffer {
            width: 2,
            height: 2,
            strategy: LockStrategy::Striped { locks: usize::MAX },
            cells: allocate(4, || AtomicF32::new(f32::NEG_INFINITY)).unwrap(),
            locks: allocate(1, SpinLock::new).unwrap(),
        };
        buffer.test_and_set(1, 1, 2.0);

        // 深度网格可以分配，锁表不能
        assert!(matches!(
            buffer.resize(3, 3),
            Err(RenderError::Allocation { .. })
        ));
        assert_eq!((buffer.width(), buffer.height()), (2, 2));
        assert_eq!(buffer.to_depth_vec().len(), 4);
        assert_eq!(buffer.lock_count(), 1);
        assert!((buffer.depth_at(1, 1) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn oversized_resize_is_an_allocation_error() {
        let mut buffer = DepthBuffer::new(3, 2, LockStrategy::PerPixel).unwrap();
        assert!(matches!(
            buffer.resize(1 << 31, 1 << 31),
            Err(RenderError::Allocation { .. })
        ));
        assert_eq!((buffer.width(), buffer.height()), (3, 2));
        assert!(buffer.test_and_set(2, 1, 1.0));
    }

    #[test]
    fn striped_strategy_keeps_fixed_lock_count() {
        let mut buffer = DepthBuffer::new(64, 64, LockStrategy::Striped { locks: 16 }).unwrap();
        assert_eq!(buffer.lock_count(), 16);
        buffer.resize(128, 128).unwrap();
        assert_eq!(buffer.lock_count(), 16);
    }

    #[test]
    fn zero_size_is_rejected() {
        assert!(matches!(
            DepthBuffer::new(0, 10, LockStrategy::PerPixel),
            Err(RenderError::InvalidSize { .. })
        ));
    }

    #[test]
    fn could_pass_matches_test_outcome() {
        let buffer = DepthBuffer::new(1, 1, LockStrategy::PerPixel).unwrap();
        buffer.test_and_set(0, 0, 4.0);
        assert!(buffer.could_pass(0, 0, 3.0));
        assert!(!buffer.could_pass(0, 0, 4.5));
    }
}
