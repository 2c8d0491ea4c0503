//! The seam between the sampler and the operating system.

use crate::cpu::CpuClock;
use crate::error::{ReadError, SampleError};
use crate::record::Status;

/// How a source reports CPU usage for a process.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CpuReading {
    /// Raw clock values; the sampler's tracker derives the percent.
    Clock(CpuClock),
    /// A percent already computed by the source.
    Percent(f64),
}

/// Everything read for one process, before CPU percent and smoothing.
#[derive(Debug, Clone, PartialEq)]
pub struct RawProcess {
    pub pid: u32,
    pub name: String,
    pub exe: String,
    pub cmdline: String,
    pub username: String,
    pub num_fds: u64,
    pub num_threads: u64,
    pub cpu_time_user: f64,
    pub cpu_time_system: f64,
    pub rss: u64,
    pub vms: u64,
    pub status: Status,
    pub cpu: CpuReading,
}

/// A process table that can be listed and inspected one pid at a time.
pub trait ProcessSource: Send {
    /// Lists the pids currently visible, in the source's native order.
    fn pids(&mut self) -> Result<Vec<u32>, SampleError>;

    /// Reads every attribute of `pid`. Any failing attribute fails the read.
    fn read(&mut self, pid: u32) -> Result<RawProcess, ReadError>;
}

impl<S: ProcessSource + ?Sized> ProcessSource for Box<S> {
    fn pids(&mut self) -> Result<Vec<u32>, SampleError> {
        (**self).pids()
    }

    fn read(&mut self, pid: u32) -> Result<RawProcess, ReadError> {
        (**self).read(pid)
    }
}
