//! # 错误码模块
//!
//! ## Overview
//! 统一描述信号量设施向调用者报告的所有失败情形。
//! 每个变体的判别值即对应的 Linux errno，系统调用层返回其相反数。
//!
//! ## Behavior
//! - 内核侧：`SysError::errno` 生成系统调用返回值
//! - 用户侧：`decode_ret` 将返回值还原为 `SysResult`

use num_enum::{IntoPrimitive, TryFromPrimitive};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, IntoPrimitive, TryFromPrimitive)]
#[repr(isize)]
pub enum SysError {
    /// 当前上下文中没有可挂起的任务（ESRCH）
    #[error("no current task")]
    NoTask = 3,
    /// 内核对象堆耗尽（ENOMEM）
    #[error("out of memory")]
    OutOfMemory = 12,
    /// 非法的信号量 ID 或初始值（EINVAL）
    #[error("invalid argument")]
    InvalidArgument = 22,
    /// 未知系统调用，或设施尚未初始化（ENOSYS）
    #[error("function not implemented")]
    NoSys = 38,
    /// 等待期间信号量被关闭（EIDRM）
    #[error("semaphore closed while waiting")]
    Closed = 43,
}

pub type SysResult<T> = Result<T, SysError>;

impl SysError {
    /// 作为系统调用返回值使用的负 errno
    pub fn errno(self) -> isize {
        -isize::from(self)
    }
}

/// 将系统调用返回值还原为 `SysResult`
///
/// ## Returns
/// - 非负值：`Ok(value)`
/// - 负值：对应的 `SysError`，无法识别的 errno 视为 `InvalidArgument`
pub fn decode_ret(ret: isize) -> SysResult<usize> {
    if ret >= 0 {
        return Ok(ret as usize);
    }
    Err(ret
        .checked_neg()
        .and_then(|errno| SysError::try_from(errno).ok())
        .unwrap_or(SysError::InvalidArgument))
}
