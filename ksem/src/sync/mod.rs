//! # 同步原语模块（sync）
//!
//! ## Overview
//! 本模块是信号量设施的核心，分为三层：
//! - `wait`：等待记录及其状态
//! - `semaphore`：单个计数信号量的状态迁移
//! - `registry`：全局注册表，负责句柄解析与 `create / down / up / close`
//!
//! ## Invariants
//! - 被加入等待队列的任务在状态改变前一定不会从 `down` 返回
//! - 在阻塞当前任务前，信号量内部状态必然已经更新

mod registry;
mod semaphore;
mod wait;

use crate::error::{SysError, SysResult};
use crate::mm::KernelHeap;
use crate::task::Scheduler;
use alloc::sync::Arc;
use spin::Once;

pub use registry::SemRegistry;
pub use semaphore::{SemStat, Semaphore};
pub use wait::{WaitRecord, WaitState};

static SEM_REGISTRY: Once<SemRegistry> = Once::new();

/// 安装全局注册表，只有第一次调用生效
pub fn init_registry(scheduler: Arc<dyn Scheduler>, heap: Arc<KernelHeap>) {
    SEM_REGISTRY.call_once(|| SemRegistry::new(scheduler, heap));
}

/// 全局注册表；设施尚未初始化时返回 `NoSys`
pub fn registry() -> SysResult<&'static SemRegistry> {
    SEM_REGISTRY.get().ok_or(SysError::NoSys)
}
