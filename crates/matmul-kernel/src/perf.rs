//! Optional performance instrumentation around the dispatch step.

use core::time::Duration;

/// Values read back from a [`PerfCounters`] source. Sources fill in only the
/// events they can measure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PerfSample {
    pub cycles: Option<u64>,
    pub instructions: Option<u64>,
    pub elapsed: Option<Duration>,
}

impl PerfSample {
    /// Cycles per instruction, when both counters are available.
    pub fn cpi(&self) -> Option<f64> {
        match (self.cycles, self.instructions) {
            (Some(cycles), Some(instr)) if instr > 0 => Some(cycles as f64 / instr as f64),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cycles.is_none() && self.instructions.is_none() && self.elapsed.is_none()
    }
}

pub trait PerfCounters {
    fn reset(&mut self);
    fn start(&mut self);
    fn stop(&mut self);
    fn read(&self) -> PerfSample;
}

/// Counter source that measures nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCounters;

impl PerfCounters for NoCounters {
    fn reset(&mut self) {}
    fn start(&mut self) {}
    fn stop(&mut self) {}

    fn read(&self) -> PerfSample {
        PerfSample::default()
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "std")] {
        use std::time::Instant;

        /// Wall-clock elapsed time between `start` and `stop`.
        #[derive(Debug, Clone, Copy, Default)]
        pub struct WallClock {
            started: Option<Instant>,
            elapsed: Option<Duration>,
        }

        impl PerfCounters for WallClock {
            fn reset(&mut self) {
                *self = Self::default();
            }

            fn start(&mut self) {
                self.started = Some(Instant::now());
            }

            fn stop(&mut self) {
                if let Some(started) = self.started.take() {
                    let run = started.elapsed();
                    self.elapsed = Some(self.elapsed.unwrap_or_default() + run);
                }
            }

            fn read(&self) -> PerfSample {
                PerfSample {
                    elapsed: self.elapsed,
                    ..PerfSample::default()
                }
            }
        }
    }
}
