//! Host introspection seams.
//!
//! The reporter never reads the wall clock or the process table directly; it
//! goes through [`Clock`] and [`HostProbe`] so tests can freeze both.

pub mod alloc;
pub mod clock;
pub mod process;

pub use alloc::{heap_stats, CountingAllocator};
pub use clock::{Clock, ManualClock, SystemClock};
pub use process::SysinfoProbe;

/// Allocator-level heap accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapStats {
    /// Bytes currently allocated.
    pub live_bytes: u64,
    /// High-water mark of `live_bytes`.
    pub peak_bytes: u64,
}

/// Accumulated CPU time of the process.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CpuTimes {
    pub user_seconds: f64,
    pub system_seconds: f64,
}

/// One sample of process facts. `None` means the host could not answer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessFacts {
    pub pid: u32,
    pub resident_bytes: Option<u64>,
    pub virtual_bytes: Option<u64>,
    pub heap: Option<HeapStats>,
    pub cpu: Option<CpuTimes>,
}

/// Read-only, non-blocking process introspection.
pub trait HostProbe: Send + Sync {
    fn sample(&self) -> ProcessFacts;
}

/// Probe returning a fixed answer.
#[derive(Debug, Clone, Default)]
pub struct StaticProbe {
    facts: ProcessFacts,
}

impl StaticProbe {
    pub fn new(facts: ProcessFacts) -> Self {
        Self { facts }
    }

    /// A probe whose every query is unavailable.
    pub fn unavailable(pid: u32) -> Self {
        Self::new(ProcessFacts { pid, ..ProcessFacts::default() })
    }
}

impl HostProbe for StaticProbe {
    fn sample(&self) -> ProcessFacts {
        self.facts.clone()
    }
}
