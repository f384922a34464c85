//! 系统调用入口
//!
//! 宿主的陷入处理程序把系统调用号与前三个参数寄存器交给 [`syscall`]。

mod sync;

pub use self::sync::{
    sys_semaphore_close, sys_semaphore_create, sys_semaphore_down, sys_semaphore_up,
};

use crate::error::SysError;
use num_enum::{IntoPrimitive, TryFromPrimitive};

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(usize)]
pub enum SyscallId {
    SemCreate = 441,
    SemDown = 442,
    SemUp = 443,
    SemClose = 444,
}

pub fn syscall(syscall_id: usize, args: [usize; 3]) -> isize {
    let Ok(id) = SyscallId::try_from(syscall_id) else {
        log::warn!("unsupported syscall_id: {}", syscall_id);
        return SysError::NoSys.errno();
    };
    log::trace!("syscall {:?} args {:?}", id, args);
    match id {
        // 寄存器中的值按有符号数解释，负数会被拒绝
        SyscallId::SemCreate => sys_semaphore_create(args[0] as isize),
        SyscallId::SemDown => sys_semaphore_down(args[0]),
        SyscallId::SemUp => sys_semaphore_up(args[0]),
        SyscallId::SemClose => sys_semaphore_close(args[0]),
    }
}
