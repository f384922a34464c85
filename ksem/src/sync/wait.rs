//! # 等待记录
//!
//! ## Overview
//! 每次 `down` 需要阻塞时创建一个 `WaitRecord`，
//! 由信号量的等待队列与阻塞中的调用者共同持有。
//! 唤醒方先写入结果状态再唤醒任务，被唤醒方依据状态决定返回值。
//!
//! ## Invariants
//! - 状态只会从 `Waiting` 迁移到 `Granted` 或 `Closed`，且只迁移一次
//! - 迁移总是在持有所属信号量的锁时完成

use crate::mm::HeapBlock;
use crate::task::TaskRef;
use core::sync::atomic::{AtomicU8, Ordering};
use num_enum::{IntoPrimitive, TryFromPrimitive};

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum WaitState {
    /// 仍在等待队列中
    Waiting,
    /// 被 `up` 选中，获得了一个资源
    Granted,
    /// 信号量在等待期间被关闭
    Closed,
}

pub struct WaitRecord {
    task: TaskRef,
    state: AtomicU8,
    _block: HeapBlock,
}

impl WaitRecord {
    pub fn new(task: TaskRef, block: HeapBlock) -> Self {
        Self {
            task,
            state: AtomicU8::new(WaitState::Waiting.into()),
            _block: block,
        }
    }

    pub fn task(&self) -> &TaskRef {
        &self.task
    }

    pub fn state(&self) -> WaitState {
        // 只有本模块写入该字段
        WaitState::try_from(self.state.load(Ordering::Acquire)).unwrap_or(WaitState::Closed)
    }

    /// 结束等待，返回需要唤醒的任务
    pub(super) fn complete(&self, state: WaitState) -> TaskRef {
        debug_assert_ne!(state, WaitState::Waiting);
        self.state.store(state.into(), Ordering::Release);
        self.task.clone()
    }
}
