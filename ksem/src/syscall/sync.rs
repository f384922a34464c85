//! # 信号量系统调用模块
//!
//! ## Overview
//! 本模块实现了一组面向用户进程的信号量系统调用：
//! - `sys_semaphore_create`：创建信号量
//! - `sys_semaphore_down` / `sys_semaphore_up`：P/V 操作
//! - `sys_semaphore_close`：关闭信号量
//!
//! 与进程私有资源表不同，这里的信号量存放在 **全局注册表** 中，
//! 任何进程只要持有 ID 即可访问，不存在所有权或访问控制。
//!
//! ## Assumptions
//! - `current_task()` 在系统调用上下文中始终有效
//! - 全局注册表已由 `ksem::init` 安装
//!
//! ## Safety
//! - 阻塞类调用（`down`）在挂起前已释放所有内核锁
//!
//! ## Behavior
//! - 成功时返回 `0` 或新信号量 ID
//! - 失败时返回负 errno，见 `SysError`

use crate::error::{SysError, SysResult};
use crate::sync::registry;

fn ret(res: SysResult<isize>) -> isize {
    res.unwrap_or_else(SysError::errno)
}

/// 创建一个信号量
///
/// ## Parameters
/// - `value`：信号量初始资源数量，必须非负
///
/// ## Returns
/// - 信号量在全局注册表中的 ID
pub fn sys_semaphore_create(value: isize) -> isize {
    ret(registry().and_then(|reg| reg.create(value).map(|id| id as isize)))
}

/// 对信号量执行 P 操作（down）
///
/// ## Behavior
/// - 若资源不足，当前任务将被阻塞，直到被唤醒才返回
pub fn sys_semaphore_down(sem_id: usize) -> isize {
    ret(registry().and_then(|reg| reg.down(sem_id)).map(|()| 0isize))
}

/// 对信号量执行 V 操作（up）
pub fn sys_semaphore_up(sem_id: usize) -> isize {
    ret(registry().and_then(|reg| reg.up(sem_id)).map(|()| 0isize))
}

/// 关闭信号量，唤醒所有仍在等待的任务
pub fn sys_semaphore_close(sem_id: usize) -> isize {
    ret(registry().and_then(|reg| reg.close(sem_id)).map(|()| 0isize))
}
