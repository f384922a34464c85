#![allow(dead_code)]

use ksem::mm::KernelHeap;
use ksem::{Scheduler, SemRegistry, Task, TaskRef};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, Thread};
use std::time::{Duration, Instant};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

static NEXT_TID: AtomicUsize = AtomicUsize::new(1);

thread_local! {
    static TID: usize = NEXT_TID.fetch_add(1, Ordering::Relaxed);
}

pub fn current_tid() -> usize {
    TID.with(|tid| *tid)
}

struct ThreadTask {
    tid: usize,
}

impl Task for ThreadTask {
    fn tid(&self) -> usize {
        self.tid
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Block(usize),
    Wakeup(usize),
}

/// Every OS thread is a task; blocking parks the thread.
#[derive(Default)]
pub struct ThreadScheduler {
    threads: Mutex<HashMap<usize, Thread>>,
    events: Mutex<Vec<Event>>,
}

impl ThreadScheduler {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn wakeups(&self) -> Vec<usize> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Wakeup(tid) => Some(tid),
                Event::Block(_) => None,
            })
            .collect()
    }

    pub fn blocked(&self, tid: usize) -> bool {
        self.events().contains(&Event::Block(tid))
    }
}

impl Scheduler for ThreadScheduler {
    fn current_task(&self) -> Option<TaskRef> {
        let tid = current_tid();
        self.threads.lock().unwrap().insert(tid, thread::current());
        Some(Arc::new(ThreadTask { tid }))
    }

    fn block_current_and_run_next(&self) {
        self.events.lock().unwrap().push(Event::Block(current_tid()));
        thread::park();
    }

    fn wakeup_task(&self, task: TaskRef) {
        let tid = task.tid();
        self.events.lock().unwrap().push(Event::Wakeup(tid));
        if let Some(thread) = self.threads.lock().unwrap().get(&tid) {
            thread.unpark();
        }
    }
}

pub fn heap(size: usize) -> Arc<KernelHeap> {
    let region = Box::leak(vec![0u8; size].into_boxed_slice());
    Arc::new(KernelHeap::with_region(region))
}

pub fn setup() -> (Arc<ThreadScheduler>, Arc<SemRegistry>) {
    init_logging();
    let scheduler = Arc::new(ThreadScheduler::default());
    let registry = SemRegistry::new(scheduler.clone(), heap(1 << 16));
    (scheduler, Arc::new(registry))
}

/// Polls `cond` until it holds, panicking after five seconds.
pub fn wait_until(what: &str, mut cond: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {}", what);
        thread::sleep(Duration::from_millis(1));
    }
}

pub fn waiters(registry: &SemRegistry, id: usize) -> usize {
    registry.stat(id).unwrap().waiters
}
