//! # 信号量（Semaphore）同步原语模块
//!
//! ## Overview
//! 本模块实现了设施中的 **计数型信号量（Counting Semaphore）**，
//! 由一个整数计数器与一个 FIFO 等待队列组成，支持 `down / up` 语义。
//!
//! 本模块只负责单个信号量内部状态的迁移，
//! 真正的挂起与唤醒由注册表在释放所有锁之后交给调度器完成。
//!
//! ## Assumptions
//! - 调用者已经通过注册表解析出该信号量，并在整个调用期间持有注册表锁
//!
//! ## Safety
//! - 所有对内部状态的访问均被每个信号量自己的自旋锁保护
//! - 临界区内只可能再获取内核对象堆的锁，不会调用调度器
//!
//! ## Invariants
//! - `count` 表示“可用资源数 − 等待任务数”
//! - `count < 0` 当且仅当存在等待任务，且等待队列长度等于 `-count`
//!
//! ## Behavior
//! - `down`：
//!   - 有资源时直接获取
//!   - 否则先分配等待记录，成功后才扣减计数并入队
//! - `up`：
//!   - 释放资源，并在必要时把队首等待者标记为已获取
//! - `drain`：
//!   - 把所有等待者标记为已关闭并清空队列

use super::wait::{WaitRecord, WaitState};
use crate::error::{SysError, SysResult};
use crate::mm::{HeapBlock, KernelHeap};
use crate::task::TaskRef;
use alloc::collections::VecDeque;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::alloc::Layout;
use spin::Mutex;

/// 信号量类型
pub struct Semaphore {
    id: usize,
    /// 内部状态，由每个信号量独立的自旋锁保护
    inner: Mutex<SemaphoreInner>,
    _block: HeapBlock,
}

/// 信号量的内部状态
///
/// ## Fields
/// - `count`：
///   - 当前可用资源计数
///   - 允许为负数，用于表示等待任务数量
/// - `wait_queue`：
///   - 等待该信号量的任务记录（FIFO）
pub struct SemaphoreInner {
    count: isize,
    wait_queue: VecDeque<Arc<WaitRecord>>,
}

impl SemaphoreInner {
    fn check_invariant(&self) {
        debug_assert_eq!(
            self.wait_queue.len() as isize,
            (-self.count).max(0),
            "semaphore count and wait queue out of sync"
        );
    }
}

/// 某一时刻信号量状态的快照
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SemStat {
    pub id: usize,
    pub value: isize,
    pub waiters: usize,
}

impl Semaphore {
    /// 创建一个新的信号量
    ///
    /// ## Invariants
    /// - 初始状态下：
    ///   - `count == res_count`
    ///   - 等待队列为空
    pub fn new(id: usize, res_count: isize, block: HeapBlock) -> Self {
        debug_assert!(res_count >= 0);
        Self {
            id,
            inner: Mutex::new(SemaphoreInner {
                count: res_count,
                wait_queue: VecDeque::new(),
            }),
            _block: block,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// 当前计数，负值表示等待任务数
    pub fn count(&self) -> isize {
        self.inner.lock().count
    }

    pub fn waiters(&self) -> usize {
        self.inner.lock().wait_queue.len()
    }

    pub fn stat(&self) -> SemStat {
        let inner = self.inner.lock();
        SemStat {
            id: self.id,
            value: inner.count,
            waiters: inner.wait_queue.len(),
        }
    }

    /// 执行 P 操作（down）的状态迁移部分
    ///
    /// ## Returns
    /// - `Ok(None)`：已获取资源，无需阻塞
    /// - `Ok(Some(record))`：已入队，调用者需阻塞直到记录状态改变
    /// - `Err(OutOfMemory)`：等待记录分配失败，计数保持不变
    pub fn down(
        &self,
        task: TaskRef,
        heap: &Arc<KernelHeap>,
    ) -> SysResult<Option<Arc<WaitRecord>>> {
        let mut inner = self.inner.lock();
        if inner.count > 0 {
            inner.count -= 1;
            inner.check_invariant();
            return Ok(None);
        }
        let block = heap.alloc(Layout::new::<WaitRecord>())?;
        inner
            .wait_queue
            .try_reserve(1)
            .map_err(|_| SysError::OutOfMemory)?;
        let record = Arc::new(WaitRecord::new(task, block));
        inner.count -= 1;
        inner.wait_queue.push_back(Arc::clone(&record));
        inner.check_invariant();
        Ok(Some(record))
    }

    /// 执行 V 操作（up）的状态迁移部分
    ///
    /// ## Returns
    /// - 被选中的队首任务，由调用者在释放锁后唤醒
    pub fn up(&self) -> Option<TaskRef> {
        let mut inner = self.inner.lock();
        inner.count += 1;
        let woken = if inner.count <= 0 {
            inner
                .wait_queue
                .pop_front()
                .map(|record| record.complete(WaitState::Granted))
        } else {
            None
        };
        inner.check_invariant();
        woken
    }

    /// 关闭前清空等待队列，返回所有需要唤醒的任务（按入队顺序）
    pub fn drain(&self) -> Vec<TaskRef> {
        let mut inner = self.inner.lock();
        let woken = inner
            .wait_queue
            .drain(..)
            .map(|record| record.complete(WaitState::Closed))
            .collect();
        inner.count = inner.count.max(0);
        inner.check_invariant();
        woken
    }
}
