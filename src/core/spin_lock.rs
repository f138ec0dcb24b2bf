use std::sync::atomic::{AtomicBool, Ordering};

/// 观察到锁被占用时，每轮忙等的迭代次数
pub const SPIN_LOOP_COUNT: usize = 2400;

/// 轻量自旋锁，用于极短的临界区（单像素的深度比较与写入）
///
/// 竞争时不让出调度器，而是在有限次数的忙等循环后重试。
/// `Clone` 与 `Default` 总是得到一个未加锁的新实例，深度缓冲重新分配时依赖这一点。
#[derive(Debug, Default)]
pub struct SpinLock {
    locked: AtomicBool,
}

/// [`SpinLock::lock`] 返回的守卫，离开作用域时释放锁
pub struct SpinLockGuard<'a> {
    lock: &'a SpinLock,
}

impl SpinLock {
    pub const fn new() -> Self {
        Self {
            locked: AtomicBool::new(false),
        }
    }

    /// 阻塞直到获得独占所有权
    pub fn acquire(&self) {
        loop {
            if self
                .locked
                .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
                .is_ok()
            {
                return;
            }

            while self.locked.load(Ordering::Relaxed) {
                for _ in 0..SPIN_LOOP_COUNT {
                    std::hint::spin_loop();
                }
            }
        }
    }

    /// 立即返回，成功获得锁时为 true
    pub fn try_acquire(&self) -> bool {
        self.locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    /// 释放锁。只能由当前持有者调用
    pub fn release(&self) {
        self.locked.store(false, Ordering::Release);
    }

    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }

    /// 获取锁并返回 RAII 守卫
    pub fn lock(&self) -> SpinLockGuard<'_> {
        self.acquire();
        SpinLockGuard { lock: self }
    }
}

impl Clone for SpinLock {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl Drop for SpinLockGuard<'_> {
    fn drop(&mut self) {
        self.lock.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn try_acquire_fails_while_held() {
        let lock = SpinLock::new();
        assert!(lock.try_acquire());
        assert!(!lock.try_acquire());
        lock.release();
        assert!(lock.try_acquire());
    }

    #[test]
    fn clone_of_locked_lock_is_unlocked() {
        let lock = SpinLock::new();
        lock.acquire();
        let copy = lock.clone();
        assert!(lock.is_locked());
        assert!(!copy.is_locked());
        assert!(copy.try_acquire());
    }

    #[test]
    fn guard_releases_on_drop() {
        let lock = SpinLock::new();
        {
            let _guard = lock.lock();
            assert!(lock.is_locked());
        }
        assert!(!lock.is_locked());
    }

    #[test]
    fn serializes_non_atomic_read_modify_write() {
        use std::sync::atomic::AtomicUsize;

        let lock = Arc::new(SpinLock::new());
        let counter = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let lock = Arc::clone(&lock);
                let counter = Arc::clone(&counter);
                thread::spawn(move || {
                    for _ in 0..2_000 {
                        let _guard = lock.lock();
                        // 拆开的读-改-写，只有在锁保护下才不会丢失更新
                        let value = counter.load(Ordering::Relaxed);
                        counter.store(value + 1, Ordering::Relaxed);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(counter.load(Ordering::Relaxed), 16_000);
    }
}
