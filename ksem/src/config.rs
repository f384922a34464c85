//! 编译期配置常量

pub const PAGE_SIZE: usize = 0x1000; // 4KB

/// 全局内核对象堆的大小（字节）
pub const KERNEL_HEAP_SIZE: usize = PAGE_SIZE * 0x4000; // 16MB

/// 内核对象堆使用的伙伴分配器阶数
pub const HEAP_ORDER: usize = 32;

/// 第一个分配出去的信号量 ID
pub const FIRST_SEM_ID: usize = 0;
