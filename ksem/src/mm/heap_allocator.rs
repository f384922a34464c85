//! # 内核对象堆
//!
//! ## Overview
//! 信号量与等待记录都从这里申请一块内存作为其内核对象的“账面”占用。
//! 与全局分配器不同，这里的分配 **可能失败**，失败时向调用者报告 `OutOfMemory`。
//!
//! ## Safety
//! - 交给堆管理的内存区域在堆的整个生命周期内必须有效且不被他人使用
//! - `HeapBlock` 独占其内存块，只在 drop 时归还，从不解引用
//!
//! ## Invariants
//! - 每个存活的 `HeapBlock` 恰好对应堆中一次成功的分配

use crate::config::{HEAP_ORDER, KERNEL_HEAP_SIZE};
use crate::error::{SysError, SysResult};
use alloc::sync::Arc;
use buddy_system_allocator::LockedHeap;
use core::alloc::Layout;
use core::ptr::{addr_of_mut, NonNull};
use lazy_static::lazy_static;
use spin::Once;

/// 基于伙伴系统的内核对象堆
pub struct KernelHeap {
    inner: LockedHeap<HEAP_ORDER>,
}

impl KernelHeap {
    /// 创建一个没有任何可用内存的堆，所有分配都会失败
    pub fn empty() -> Self {
        Self {
            inner: LockedHeap::empty(),
        }
    }

    /// 以一段静态内存区域创建堆
    pub fn with_region(region: &'static mut [u8]) -> Self {
        let heap = Self::empty();
        // SAFETY: 区域为 'static 且被独占借用，此后只归本堆管理
        unsafe { heap.add_region(region.as_mut_ptr() as usize, region.len()) };
        heap
    }

    /// 向堆中追加一段内存
    ///
    /// ## Safety
    /// - `[start, start + size)` 必须在堆的整个生命周期内有效
    /// - 该区域不得再被其他任何代码使用
    pub unsafe fn add_region(&self, start: usize, size: usize) {
        if size == 0 {
            return;
        }
        unsafe { self.inner.lock().add_to_heap(start, start + size) };
    }

    /// 申请一块满足 `layout` 的内存
    ///
    /// ## Returns
    /// - `Ok(HeapBlock)`：成功，drop 时自动归还
    /// - `Err(SysError::OutOfMemory)`：堆已耗尽
    pub fn alloc(self: &Arc<Self>, layout: Layout) -> SysResult<HeapBlock> {
        let ptr = self
            .inner
            .lock()
            .alloc(layout)
            .map_err(|_| SysError::OutOfMemory)?;
        Ok(HeapBlock {
            ptr,
            layout,
            heap: Arc::clone(self),
        })
    }

    /// 当前已分配出去的字节数（按伙伴块大小计）
    pub fn allocated(&self) -> usize {
        self.inner.lock().stats_alloc_actual()
    }

    /// 堆管理的总字节数
    pub fn total(&self) -> usize {
        self.inner.lock().stats_total_bytes()
    }
}

/// 从 [`KernelHeap`] 申请到的一块内存
pub struct HeapBlock {
    ptr: NonNull<u8>,
    layout: Layout,
    heap: Arc<KernelHeap>,
}

// SAFETY: HeapBlock 从不解引用 ptr，只在 drop 时把它交还给带锁的堆
unsafe impl Send for HeapBlock {}
unsafe impl Sync for HeapBlock {}

impl Drop for HeapBlock {
    fn drop(&mut self) {
        self.heap.inner.lock().dealloc(self.ptr, self.layout);
    }
}

static mut HEAP_SPACE: [u8; KERNEL_HEAP_SIZE] = [0; KERNEL_HEAP_SIZE];

lazy_static! {
    /// 全局内核对象堆
    pub static ref KERNEL_HEAP: Arc<KernelHeap> = Arc::new(KernelHeap::empty());
}

/// 把静态堆空间交给全局内核对象堆，只生效一次
pub fn init_heap() {
    static INIT: Once<()> = Once::new();
    INIT.call_once(|| unsafe {
        KERNEL_HEAP.add_region(addr_of_mut!(HEAP_SPACE) as usize, KERNEL_HEAP_SIZE);
    });
}
