//! Process probe backed by `sysinfo` (memory) and `getrusage` (CPU time).
//!
//! Each call builds a fresh `System` and refreshes only the current pid, so
//! the probe holds no shared mutable state and needs no lock.

use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

use super::{alloc, CpuTimes, HostProbe, ProcessFacts};

#[derive(Debug, Clone)]
pub struct SysinfoProbe {
    pid: Option<Pid>,
}

impl SysinfoProbe {
    pub fn new() -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                tracing::warn!(error = %e, "current pid unavailable; memory facts will be sentinels");
                None
            }
        };
        Self { pid }
    }

    fn memory(&self) -> (Option<u64>, Option<u64>) {
        let Some(pid) = self.pid else {
            return (None, None);
        };
        let mut system = System::new();
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::new().with_memory(),
        );
        match system.process(pid) {
            Some(p) => (Some(p.memory()), Some(p.virtual_memory())),
            None => (None, None),
        }
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl HostProbe for SysinfoProbe {
    fn sample(&self) -> ProcessFacts {
        let (resident_bytes, virtual_bytes) = self.memory();
        ProcessFacts {
            pid: std::process::id(),
            resident_bytes,
            virtual_bytes,
            heap: alloc::heap_stats(),
            cpu: cpu_times(),
        }
    }
}

#[cfg(unix)]
fn cpu_times() -> Option<CpuTimes> {
    let mut usage = std::mem::MaybeUninit::<libc::rusage>::zeroed();
    // SAFETY: `usage` is a valid, writable rusage; getrusage only writes into it.
    let rc = unsafe { libc::getrusage(libc::RUSAGE_SELF, usage.as_mut_ptr()) };
    if rc != 0 {
        return None;
    }
    // SAFETY: getrusage returned 0, so the struct is initialized.
    let usage = unsafe { usage.assume_init() };
    Some(CpuTimes {
        user_seconds: timeval_secs(usage.ru_utime),
        system_seconds: timeval_secs(usage.ru_stime),
    })
}

#[cfg(unix)]
fn timeval_secs(tv: libc::timeval) -> f64 {
    tv.tv_sec as f64 + tv.tv_usec as f64 / 1_000_000.0
}

#[cfg(not(unix))]
fn cpu_times() -> Option<CpuTimes> {
    None
}
