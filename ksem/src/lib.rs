//! # 内核全局计数信号量设施（ksem）
//!
//! ## Overview
//! 本 crate 以内核组件的形式提供一组 **全局可寻址的计数型信号量**，
//! 用户态通过整数句柄完成创建、P 操作（down）、V 操作（up）与关闭（close），
//! 等待者严格按 FIFO 顺序被唤醒。
//!
//! 模块划分：
//! - `sync`：信号量本体、等待记录与全局注册表
//! - `syscall`：系统调用分发与 `sys_semaphore_*` 入口
//! - `task`：宿主调度器与任务身份的抽象接口
//! - `mm`：内核对象堆（可能分配失败的分配器）
//! - `console`：日志输出
//!
//! ## Assumptions
//! - 宿主内核负责真正的任务挂起与恢复，并通过 [`init`] 注入调度器
//! - 多个处理器上的多个进程可能并发调用任意入口
//!
//! ## Invariants
//! - 加锁顺序固定为：注册表锁 → 信号量锁 → 堆锁
//! - 持有任何一把锁时都不会调用调度器

#![cfg_attr(not(test), no_std)]

extern crate alloc;

#[macro_use]
pub mod console;
pub mod config;
pub mod error;
pub mod mm;
pub mod sync;
pub mod syscall;
pub mod task;

use alloc::sync::Arc;

pub use error::{SysError, SysResult};
pub use sync::{SemRegistry, SemStat};
pub use task::{Scheduler, Task, TaskRef};

/// 初始化信号量设施
///
/// ## Behavior
/// - 初始化全局内核对象堆
/// - 以给定调度器构建全局信号量注册表
///
/// 重复调用不会替换已安装的调度器。
/// 本函数不安装控制台，宿主需自行调用 [`console::init`]，否则日志不会输出。
///
/// 全局堆的容量为 `KERNEL_HEAP_SIZE`，宿主可通过 `KernelHeap::add_region`
/// 向 [`mm::KERNEL_HEAP`] 追加内存。
pub fn init(scheduler: Arc<dyn Scheduler>) {
    mm::init_heap();
    sync::init_registry(scheduler, mm::KERNEL_HEAP.clone());
    log::info!("ksem: semaphore facility initialized");
}
