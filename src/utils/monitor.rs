use std::time::{Duration, Instant};

#[cfg(feature = "cli")]
use std::sync::Mutex;
#[cfg(feature = "cli")]
use sysinfo::{Pid, System};

/// Wall time spent in one pipeline phase.
#[derive(Debug, Clone)]
pub struct PhaseTiming {
    pub phase: String,
    pub elapsed: Duration,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Copy)]
pub struct ProcessSample {
    pub cpu_usage: f32,
    pub memory_mb: u64,
}

#[cfg(feature = "cli")]
struct MonitorState {
    system: System,
    peak_memory_mb: u64,
    phases: Vec<PhaseTiming>,
    phase_started: Instant,
}

/// Samples this process between pipeline phases when enabled.
#[cfg(feature = "cli")]
pub struct PhaseMonitor {
    pid: Option<Pid>,
    state: Mutex<MonitorState>,
    started: Instant,
    enabled: bool,
}

#[cfg(feature = "cli")]
impl PhaseMonitor {
    pub fn new(enabled: bool) -> Self {
        let mut system = System::new();
        let pid = if enabled {
            system.refresh_all();
            sysinfo::get_current_pid().ok()
        } else {
            None
        };

        let now = Instant::now();
        Self {
            pid,
            state: Mutex::new(MonitorState {
                system,
                peak_memory_mb: 0,
                phases: Vec::new(),
                phase_started: now,
            }),
            started: now,
            enabled,
        }
    }

    fn sample(state: &mut MonitorState, pid: Pid) -> Option<ProcessSample> {
        state.system.refresh_all();
        let process = state.system.process(pid)?;
        let memory_mb = process.memory() / 1024 / 1024;
        if memory_mb > state.peak_memory_mb {
            state.peak_memory_mb = memory_mb;
        }
        Some(ProcessSample {
            cpu_usage: process.cpu_usage(),
            memory_mb,
        })
    }

    /// Closes the running phase and logs its duration with a process sample.
    pub fn finish_phase(&self, phase: &str) {
        if !self.enabled {
            return;
        }
        let Ok(mut state) = self.state.lock() else {
            return;
        };

        let elapsed = state.phase_started.elapsed();
        state.phases.push(PhaseTiming {
            phase: phase.to_string(),
            elapsed,
        });
        state.phase_started = Instant::now();

        match self.pid.and_then(|pid| Self::sample(&mut state, pid)) {
            Some(sample) => tracing::info!(
                "📊 {} took {:?} - CPU: {:.1}%, Memory: {}MB",
                phase,
                elapsed,
                sample.cpu_usage,
                sample.memory_mb
            ),
            None => tracing::info!("📊 {} took {:?}", phase, elapsed),
        }
    }

    pub fn phases(&self) -> Vec<PhaseTiming> {
        self.state
            .lock()
            .map(|state| state.phases.clone())
            .unwrap_or_default()
    }

    pub fn log_final_stats(&self) {
        if !self.enabled {
            return;
        }
        let peak = self.state.lock().map(|s| s.peak_memory_mb).unwrap_or(0);
        tracing::info!(
            "📊 Run finished in {:?}, peak memory {}MB",
            self.started.elapsed(),
            peak
        );
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

#[cfg(not(feature = "cli"))]
pub struct PhaseMonitor;

#[cfg(not(feature = "cli"))]
impl PhaseMonitor {
    pub fn new(_enabled: bool) -> Self {
        Self
    }

    pub fn finish_phase(&self, _phase: &str) {}

    pub fn phases(&self) -> Vec<PhaseTiming> {
        Vec::new()
    }

    pub fn log_final_stats(&self) {}

    pub fn is_enabled(&self) -> bool {
        false
    }
}

impl Default for PhaseMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}
