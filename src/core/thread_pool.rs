//! # 固定大小的工作线程池
//!
//! N 个常驻线程共享一个 FIFO 任务队列。线程池在"暂停"（只接收提交，不出队）
//! 与"运行"（出队执行）两种状态之间切换。控制线程提交一波任务后调用
//! [`ThreadPool::wait`]，该调用返回时本波所有任务及其写入都已完成，
//! 下一波任务可以安全地读取这些结果。

use crate::core::error::{RenderError, RenderResult};
use log::{debug, warn};
use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

/// 单调递增的任务编号，从 1 开始
pub type TaskId = u64;

/// 任务生命周期
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Awaiting,
    Completed,
}

/// 任务执行失败时返回的错误
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct TaskError {
    message: String,
}

impl TaskError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// 线程池执行的工作单元
///
/// 同一波内的任务之间没有顺序保证，必须只操作互不相交的索引区间。
/// 任务内部不得再提交任务或调用 `wait`，否则会与单波屏障死锁。
pub trait Task: Send {
    /// 用于日志与失败报告的名称
    fn name(&self) -> &str;

    fn run(&mut self) -> Result<(), TaskError>;
}

/// 一个失败任务的记录
#[derive(Debug, Clone)]
pub struct TaskFailure {
    pub id: TaskId,
    pub task: String,
    pub message: String,
}

/// 一波任务的汇总结果
#[derive(Debug, Default)]
pub struct WaveReport {
    pub completed: u64,
    pub failures: Vec<TaskFailure>,
}

impl WaveReport {
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

struct QueuedTask {
    id: TaskId,
    status: TaskStatus,
    task: Box<dyn Task>,
}

struct PoolState {
    queue: VecDeque<QueuedTask>,
    paused: bool,
    stopped: bool,
    last_task_id: TaskId,
    completed_task_count: TaskId,
    failures: Vec<TaskFailure>,
}

impl PoolState {
    fn run_allowed(&self) -> bool {
        !self.paused && !self.queue.is_empty()
    }

    fn is_completed(&self) -> bool {
        self.completed_task_count == self.last_task_id
    }
}

struct Shared {
    state: Mutex<PoolState>,
    tasks_access: Condvar,
    wait_access: Condvar,
}

impl Shared {
    // 任务在锁外执行且 panic 已被捕获，中毒的锁里的状态依然一致
    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct ThreadPool {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
    wave_start: TaskId,
}

impl ThreadPool {
    /// 创建线程池，初始状态为暂停
    pub fn new(thread_count: usize) -> RenderResult<Self> {
        if thread_count == 0 {
            return Err(RenderError::NoWorkers);
        }

        let shared = Arc::new(Shared {
            state: Mutex::new(PoolState {
                queue: VecDeque::new(),
                paused: true,
                stopped: false,
                last_task_id: 0,
                completed_task_count: 0,
                failures: Vec::new(),
            }),
            tasks_access: Condvar::new(),
            wait_access: Condvar::new(),
        });

        let mut pool = ThreadPool {
            shared,
            workers: Vec::with_capacity(thread_count),
            wave_start: 0,
        };

        for index in 0..thread_count {
            let shared = Arc::clone(&pool.shared);
            // 失败时 pool 被丢弃，Drop 会回收已经启动的线程
            let handle = thread::Builder::new()
                .name(format!("raster-worker-{index}"))
                .spawn(move || worker_loop(shared, index))?;
            pool.workers.push(handle);
        }

        debug!("线程池已启动，{} 个工作线程", thread_count);
        Ok(pool)
    }

    pub fn thread_count(&self) -> usize {
        self.workers.len()
    }

    pub fn is_paused(&self) -> bool {
        self.shared.lock().paused
    }

    /// 队列中尚未被取走的任务数
    pub fn pending(&self) -> usize {
        self.shared.lock().queue.len()
    }

    /// 提交任务并返回编号，唤醒一个等待中的线程
    pub fn submit<T: Task + 'static>(&mut self, task: T) -> TaskId {
        let mut state = self.shared.lock();
        state.last_task_id += 1;
        let id = state.last_task_id;
        state.queue.push_back(QueuedTask {
            id,
            status: TaskStatus::Awaiting,
            task: Box::new(task),
        });
        drop(state);

        self.shared.tasks_access.notify_one();
        id
    }

    /// 清除暂停标志并唤醒所有线程
    pub fn resume(&self) {
        let mut state = self.shared.lock();
        if state.paused {
            state.paused = false;
            drop(state);
            self.shared.tasks_access.notify_all();
        }
    }

    /// 设置暂停标志。正在执行的任务会跑完，但不会再取下一个
    pub fn pause(&self) {
        self.shared.lock().paused = true;
    }

    /// 波次屏障：恢复运行，阻塞直到所有已提交任务完成，然后重新暂停
    pub fn wait(&mut self) -> WaveReport {
        let mut state = self.shared.lock();
        state.paused = false;
        self.shared.tasks_access.notify_all();

        let mut state = self
            .shared
            .wait_access
            .wait_while(state, |s| !s.is_completed())
            .unwrap_or_else(PoisonError::into_inner);

        state.paused = true;
        let failures = std::mem::take(&mut state.failures);
        let last = state.last_task_id;
        drop(state);

        let report = WaveReport {
            completed: last - self.wave_start,
            failures,
        };
        self.wave_start = last;
        report
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        let abandoned = {
            let mut state = self.shared.lock();
            state.stopped = true;
            state.queue.len()
        };
        self.shared.tasks_access.notify_all();

        if abandoned > 0 {
            debug!("线程池关闭，放弃 {} 个未执行的任务", abandoned);
        }

        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                warn!("工作线程异常退出");
            }
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "任务发生了未知类型的 panic".to_string()
    }
}

fn worker_loop(shared: Arc<Shared>, index: usize) {
    loop {
        let mut job = {
            let state = shared.lock();
            let mut state = shared
                .tasks_access
                .wait_while(state, |s| !s.stopped && !s.run_allowed())
                .unwrap_or_else(PoisonError::into_inner);

            if state.stopped {
                break;
            }
            match state.queue.pop_front() {
                Some(job) => job,
                None => continue,
            }
        };

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| job.task.run()));
        job.status = TaskStatus::Completed;

        let failure = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(error)) => Some(error.to_string()),
            Err(payload) => Some(panic_message(payload)),
        }
        .map(|message| TaskFailure {
            id: job.id,
            task: job.task.name().to_string(),
            message,
        });

        debug_assert_eq!(job.status, TaskStatus::Completed);
        // 先释放任务持有的共享缓冲，再计入完成数，控制线程在 wait 之后即可独占缓冲
        drop(job);

        {
            let mut state = shared.lock();
            state.completed_task_count += 1;
            if let Some(failure) = failure {
                warn!(
                    "工作线程 {} 执行任务 #{} ({}) 失败: {}",
                    index, failure.id, failure.task, failure.message
                );
                state.failures.push(failure);
            }
        }
        shared.wait_access.notify_all();
    }

    debug!("工作线程 {} 退出", index);
}
