mod heap_allocator;

pub use heap_allocator::{init_heap, HeapBlock, KernelHeap, KERNEL_HEAP};
