//! # 信号量注册表
//!
//! ## Overview
//! 注册表是系统中所有存活信号量的唯一拥有者，负责：
//! - 按 ID 查找信号量（共享读锁）
//! - 创建与销毁信号量（独占写锁）
//! - 在解析句柄之后驱动 `down / up / close` 的完整流程
//!
//! ## Assumptions
//! - 任意数量的调用者可在任意处理器上并发进入
//! - 调度器在锁外被调用，唤醒先于阻塞到达时不会丢失
//!
//! ## Safety
//! - 加锁顺序固定为：注册表锁 → 信号量锁 → 堆锁，任何路径都不会逆序获取
//! - 持有任何锁时都不会挂起或唤醒任务
//! - 信号量引用只在注册表读锁的作用域内借出，关闭操作因此无法与之并发
//!
//! ## Invariants
//! - `next_id` 只在写锁内递增，ID 单调增长且永不复用
//! - 每个 ID 在表中至多出现一次
//!
//! ## Behavior
//! - `close` 采用“带错误唤醒”策略：关闭时仍在等待的任务被唤醒，
//!   其 `down` 返回 `SysError::Closed`

use super::semaphore::{SemStat, Semaphore};
use super::wait::WaitState;
use crate::config::FIRST_SEM_ID;
use crate::error::{SysError, SysResult};
use crate::mm::KernelHeap;
use crate::task::Scheduler;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::alloc::Layout;
use spin::RwLock;

struct SemTable {
    sems: Vec<Semaphore>,
    next_id: usize,
}

impl SemTable {
    fn find(&self, id: usize) -> Option<&Semaphore> {
        self.sems.iter().find(|sem| sem.id() == id)
    }
}

/// 全局可寻址的信号量集合
pub struct SemRegistry {
    table: RwLock<SemTable>,
    scheduler: Arc<dyn Scheduler>,
    heap: Arc<KernelHeap>,
}

impl SemRegistry {
    pub fn new(scheduler: Arc<dyn Scheduler>, heap: Arc<KernelHeap>) -> Self {
        Self {
            table: RwLock::new(SemTable {
                sems: Vec::new(),
                next_id: FIRST_SEM_ID,
            }),
            scheduler,
            heap,
        }
    }

    /// 在读锁保护下查找信号量并对其执行 `f`
    ///
    /// ## Returns
    /// - `Some(f(sem))`：找到对应信号量
    /// - `None`：ID 从未分配或已被关闭
    pub fn lookup<R>(&self, id: usize, f: impl FnOnce(&Semaphore) -> R) -> Option<R> {
        let table = self.table.read();
        let sem = table.find(id)?;
        log::trace!("sem {}: resolved", id);
        Some(f(sem))
    }

    /// 创建一个初始值为 `value` 的信号量
    ///
    /// ## Behavior
    /// - 在获取写锁之前从内核对象堆申请内存
    /// - 在写锁内分配 ID 并插入表中
    ///
    /// ## Returns
    /// - 新信号量的 ID
    /// - `InvalidArgument`：`value < 0`
    /// - `OutOfMemory`：内核对象堆或 ID 空间耗尽
    pub fn create(&self, value: isize) -> SysResult<usize> {
        if value < 0 {
            return Err(SysError::InvalidArgument);
        }
        let block = self.heap.alloc(Layout::new::<Semaphore>())?;
        let mut table = self.table.write();
        let id = table.next_id;
        // 返回给用户的 ID 必须能以非负 isize 表示
        if id > isize::MAX as usize {
            return Err(SysError::OutOfMemory);
        }
        table
            .sems
            .try_reserve(1)
            .map_err(|_| SysError::OutOfMemory)?;
        table.next_id += 1;
        table.sems.push(Semaphore::new(id, value, block));
        log::debug!("sem {}: created with value {}", id, value);
        Ok(id)
    }

    /// 从表中摘除信号量，所有权交还给调用者
    pub fn destroy(&self, id: usize) -> Option<Semaphore> {
        let mut table = self.table.write();
        let pos = table.sems.iter().position(|sem| sem.id() == id)?;
        Some(table.sems.swap_remove(pos))
    }

    /// P 操作
    ///
    /// ## Behavior
    /// - 资源充足时立即返回
    /// - 否则当前任务入队并阻塞，直到被 `up` 选中或信号量被关闭
    ///
    /// ## Returns
    /// - `Ok(())`：获得一个资源
    /// - `InvalidArgument`：ID 无效
    /// - `NoTask`：ID 有效但没有当前任务
    /// - `OutOfMemory`：等待记录分配失败，信号量状态不变
    /// - `Closed`：等待期间信号量被关闭
    pub fn down(&self, id: usize) -> SysResult<()> {
        let Some(task) = self.scheduler.current_task() else {
            // 无效 ID 优先于缺少当前任务
            return Err(match self.lookup(id, |_| ()) {
                Some(()) => SysError::NoTask,
                None => SysError::InvalidArgument,
            });
        };
        let record = self
            .lookup(id, |sem| sem.down(task, &self.heap))
            .ok_or(SysError::InvalidArgument)??;
        let Some(record) = record else {
            log::debug!("sem {}: down acquired", id);
            return Ok(());
        };
        log::debug!("sem {}: task {} blocked", id, record.task().tid());
        loop {
            match record.state() {
                // 虚假唤醒或信号打断都只是重新挂起
                WaitState::Waiting => self.scheduler.block_current_and_run_next(),
                WaitState::Granted => return Ok(()),
                WaitState::Closed => return Err(SysError::Closed),
            }
        }
    }

    /// V 操作，从不阻塞
    pub fn up(&self, id: usize) -> SysResult<()> {
        let woken = self
            .lookup(id, Semaphore::up)
            .ok_or(SysError::InvalidArgument)?;
        match woken {
            Some(task) => {
                log::debug!("sem {}: up wakes task {}", id, task.tid());
                self.scheduler.wakeup_task(task);
            }
            None => log::debug!("sem {}: up", id),
        }
        Ok(())
    }

    /// 关闭信号量
    ///
    /// ## Behavior
    /// - 从表中摘除信号量，此后该 ID 不可再解析
    /// - 仍在等待的任务按入队顺序被唤醒，并观察到 `Closed`
    /// - 信号量及其等待记录占用的内存随之归还
    pub fn close(&self, id: usize) -> SysResult<()> {
        let sem = self.destroy(id).ok_or(SysError::InvalidArgument)?;
        let woken = sem.drain();
        drop(sem);
        if !woken.is_empty() {
            log::warn!("sem {}: closed with {} waiters", id, woken.len());
        } else {
            log::debug!("sem {}: closed", id);
        }
        for task in woken {
            self.scheduler.wakeup_task(task);
        }
        Ok(())
    }

    pub fn stat(&self, id: usize) -> SysResult<SemStat> {
        self.lookup(id, Semaphore::stat)
            .ok_or(SysError::InvalidArgument)
    }

    pub fn len(&self) -> usize {
        self.table.read().sems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Task, TaskRef};
    use std::boxed::Box;

    struct Dummy;

    impl Task for Dummy {
        fn tid(&self) -> usize {
            0
        }
    }

    /// 只服务于不会阻塞的路径
    struct NeverBlocks;

    impl Scheduler for NeverBlocks {
        fn current_task(&self) -> Option<TaskRef> {
            Some(Arc::new(Dummy))
        }

        fn block_current_and_run_next(&self) {
            panic!("unexpected block");
        }

        fn wakeup_task(&self, _task: TaskRef) {}
    }

    struct NoCurrentTask;

    impl Scheduler for NoCurrentTask {
        fn current_task(&self) -> Option<TaskRef> {
            None
        }

        fn block_current_and_run_next(&self) {
            panic!("unexpected block");
        }

        fn wakeup_task(&self, _task: TaskRef) {}
    }

    #[repr(align(4096))]
    struct Arena([u8; 4096]);

    fn arena_heap() -> Arc<KernelHeap> {
        let arena = Box::leak(Box::new(Arena([0; 4096])));
        Arc::new(KernelHeap::with_region(&mut arena.0))
    }

    fn registry() -> SemRegistry {
        SemRegistry::new(Arc::new(NeverBlocks), arena_heap())
    }

    #[test]
    fn ids_are_monotonic_and_never_reused() {
        let reg = registry();
        let a = reg.create(1).unwrap();
        let b = reg.create(1).unwrap();
        reg.close(a).unwrap();
        let c = reg.create(1).unwrap();
        assert_eq!((a, b, c), (FIRST_SEM_ID, FIRST_SEM_ID + 1, FIRST_SEM_ID + 2));
    }

    #[test]
    fn negative_initial_value_creates_nothing() {
        let reg = registry();
        assert_eq!(reg.create(-1), Err(SysError::InvalidArgument));
        assert!(reg.is_empty());
        assert_eq!(reg.create(0), Ok(FIRST_SEM_ID));
    }

    #[test]
    fn lookup_and_destroy() {
        let reg = registry();
        let id = reg.create(3).unwrap();
        assert_eq!(reg.lookup(id, |sem| sem.id()), Some(id));
        assert!(reg.lookup(id + 1, |_| ()).is_none());
        assert!(reg.destroy(id).is_some());
        assert!(reg.destroy(id).is_none());
        assert!(reg.lookup(id, |_| ()).is_none());
    }

    #[test]
    fn unknown_ids_are_invalid() {
        let reg = registry();
        assert_eq!(reg.down(42), Err(SysError::InvalidArgument));
        assert_eq!(reg.up(42), Err(SysError::InvalidArgument));
        assert_eq!(reg.close(42), Err(SysError::InvalidArgument));
        assert_eq!(reg.stat(42), Err(SysError::InvalidArgument));
    }

    #[test]
    fn invalid_id_takes_precedence_over_missing_task() {
        let reg = SemRegistry::new(Arc::new(NoCurrentTask), arena_heap());
        assert_eq!(reg.down(5), Err(SysError::InvalidArgument));
        let id = reg.create(0).unwrap();
        assert_eq!(reg.down(id), Err(SysError::NoTask));
        assert_eq!(reg.stat(id).unwrap().value, 0);
    }

    #[test]
    fn closing_releases_heap_memory() {
        let reg = registry();
        let ids: Vec<_> = (0..4).map(|_| reg.create(0).unwrap()).collect();
        assert!(reg.heap.allocated() > 0);
        for id in ids {
            reg.close(id).unwrap();
        }
        assert_eq!(reg.heap.allocated(), 0);
    }

    #[test]
    fn exhausted_heap_fails_creation() {
        let reg = SemRegistry::new(Arc::new(NeverBlocks), Arc::new(KernelHeap::empty()));
        assert_eq!(reg.create(1), Err(SysError::OutOfMemory));
        assert!(reg.is_empty());
    }

    #[test]
    fn non_blocking_downs_and_ups_track_value() {
        let reg = registry();
        let id = reg.create(2).unwrap();
        reg.down(id).unwrap();
        reg.down(id).unwrap();
        assert_eq!(reg.stat(id).unwrap().value, 0);
        for _ in 0..3 {
            reg.up(id).unwrap();
        }
        assert_eq!(
            reg.stat(id).unwrap(),
            SemStat { id, value: 3, waiters: 0 }
        );
    }
}
