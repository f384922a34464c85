//! # 任务与调度器接口模块
//!
//! ## Overview
//! 信号量设施本身不实现调度，只通过本模块定义的接口与宿主调度器协作：
//! - `Task`：不透明的可运行实体（进程 / 线程）
//! - `Scheduler`：提供“当前任务”、“阻塞当前任务”和“唤醒任务”三种能力
//!
//! ## Assumptions
//! - 宿主保证 `wakeup_task` 先于对应的 `block_current_and_run_next` 到达时，
//!   唤醒不会丢失（阻塞调用立即返回）
//! - `block_current_and_run_next` 允许虚假返回，调用者需自行重新检查条件
//!
//! ## Safety
//! - 设施在调用任一调度接口时都不持有任何自旋锁

use alloc::sync::Arc;

/// 可被调度器挂起与恢复的实体
pub trait Task: Send + Sync {
    /// 仅用于日志的任务编号
    fn tid(&self) -> usize;
}

/// 对任务的共享引用
pub type TaskRef = Arc<dyn Task>;

/// 宿主调度器
pub trait Scheduler: Send + Sync {
    /// 返回当前正在执行的任务
    fn current_task(&self) -> Option<TaskRef>;

    /// 以可中断状态挂起当前任务并切换到下一个任务
    fn block_current_and_run_next(&self);

    /// 把任务重新放回就绪队列
    fn wakeup_task(&self, task: TaskRef);
}
