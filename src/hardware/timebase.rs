//! Host timebase backed by the OS clock (std only).

use std::thread;
use std::time::{Duration, Instant};

use embedded_hal::delay::DelayNs;

use super::Timebase;

/// Monotonic clock plus `thread::sleep` delays.
#[derive(Debug, Clone, Copy)]
pub struct StdTimebase {
    origin: Instant,
}

impl StdTimebase {
    /// Start a clock at the current instant.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for StdTimebase {
    fn default() -> Self {
        Self::new()
    }
}

impl DelayNs for StdTimebase {
    fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(ns as u64));
    }
}

impl Timebase for StdTimebase {
    fn now_us(&mut self) -> u64 {
        self.origin.elapsed().as_micros() as u64
    }

    fn sleep_ns(&mut self, ns: u64) {
        thread::sleep(Duration::from_nanos(ns));
    }
}
