//! Lightweight per-request metrics: wall time and resident memory.

use std::time::Duration;

use sysinfo::System;

/// Resident set size of this process in MiB, as reported by the OS.
/// Returns 0.0 when the process cannot be inspected.
pub fn resident_memory_mb() -> f64 {
    let mut system = System::new();
    system.refresh_processes(sysinfo::ProcessesToUpdate::All, true);

    let pid = sysinfo::Pid::from_u32(std::process::id());
    system
        .process(pid)
        .map(|process| process.memory() as f64 / 1024.0 / 1024.0)
        .unwrap_or(0.0)
}

/// Duration in milliseconds, rounded to 2 decimals.
pub fn elapsed_ms(duration: Duration) -> f64 {
    (duration.as_secs_f64() * 1000.0 * 100.0).round() / 100.0
}
