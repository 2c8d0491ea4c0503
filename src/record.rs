//! Per-process snapshot records and the status vocabulary.
//!
//! Field declaration order of [`ProcessRecord`] is alphabetical so the JSON
//! written by `/data` has sorted keys.

use serde::{Deserialize, Serialize};

/// Closed vocabulary of process states reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Running,
    Sleeping,
    DiskSleep,
    Stopped,
    TracingStop,
    Zombie,
    Dead,
    Waking,
    Idle,
    Locked,
    Waiting,
    Unknown,
}

impl Status {
    /// Maps the single-letter state from `/proc/<pid>/stat`.
    ///
    /// Letters outside the table map to [`Status::Unknown`].
    pub fn from_proc_state(state: char) -> Self {
        match state {
            'R' => Status::Running,
            'S' => Status::Sleeping,
            'D' => Status::DiskSleep,
            'T' => Status::Stopped,
            't' => Status::TracingStop,
            'Z' => Status::Zombie,
            'X' | 'x' => Status::Dead,
            'W' => Status::Waking,
            'I' => Status::Idle,
            _ => Status::Unknown,
        }
    }

    /// Parses the kebab-case name used on the wire. Unrecognized names map to
    /// [`Status::Unknown`].
    pub fn from_name(name: &str) -> Self {
        match name {
            "running" => Status::Running,
            "sleeping" => Status::Sleeping,
            "disk-sleep" => Status::DiskSleep,
            "stopped" => Status::Stopped,
            "tracing-stop" => Status::TracingStop,
            "zombie" => Status::Zombie,
            "dead" => Status::Dead,
            "waking" => Status::Waking,
            "idle" => Status::Idle,
            "locked" => Status::Locked,
            "waiting" => Status::Waiting,
            _ => Status::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Running => "running",
            Status::Sleeping => "sleeping",
            Status::DiskSleep => "disk-sleep",
            Status::Stopped => "stopped",
            Status::TracingStop => "tracing-stop",
            Status::Zombie => "zombie",
            Status::Dead => "dead",
            Status::Waking => "waking",
            Status::Idle => "idle",
            Status::Locked => "locked",
            Status::Waiting => "waiting",
            Status::Unknown => "unknown",
        }
    }
}

/// One process's snapshot at sample time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessRecord {
    pub cmdline: String,
    pub cpu_percent: f64,
    /// Smoothed CPU percent.
    pub cpu_percent_slow: f64,
    pub cpu_time_system: f64,
    pub cpu_time_user: f64,
    pub exe: String,
    pub name: String,
    pub num_fds: u64,
    pub num_threads: u64,
    pub pid: u32,
    pub rss: u64,
    pub status: Status,
    pub username: String,
    pub vms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proc_state_table() {
        assert_eq!(Status::from_proc_state('R'), Status::Running);
        assert_eq!(Status::from_proc_state('S'), Status::Sleeping);
        assert_eq!(Status::from_proc_state('D'), Status::DiskSleep);
        assert_eq!(Status::from_proc_state('T'), Status::Stopped);
        assert_eq!(Status::from_proc_state('t'), Status::TracingStop);
        assert_eq!(Status::from_proc_state('Z'), Status::Zombie);
        assert_eq!(Status::from_proc_state('X'), Status::Dead);
        assert_eq!(Status::from_proc_state('x'), Status::Dead);
        assert_eq!(Status::from_proc_state('W'), Status::Waking);
        assert_eq!(Status::from_proc_state('I'), Status::Idle);
    }

    #[test]
    fn test_unmapped_states_are_unknown() {
        for c in ['K', 'P', '?', ' '] {
            assert_eq!(Status::from_proc_state(c), Status::Unknown);
        }
        assert_eq!(Status::from_name("wake-kill"), Status::Unknown);
    }

    #[test]
    fn test_status_serializes_kebab_case() {
        let json = serde_json::to_string(&Status::DiskSleep).unwrap();
        assert_eq!(json, "\"disk-sleep\"");
        let json = serde_json::to_string(&Status::TracingStop).unwrap();
        assert_eq!(json, "\"tracing-stop\"");
        let json = serde_json::to_string(&Status::Unknown).unwrap();
        assert_eq!(json, "\"unknown\"");
    }

    #[test]
    fn test_name_round_trips_through_as_str() {
        let all = [
            Status::Running,
            Status::Sleeping,
            Status::DiskSleep,
            Status::Stopped,
            Status::TracingStop,
            Status::Zombie,
            Status::Dead,
            Status::Waking,
            Status::Idle,
            Status::Locked,
            Status::Waiting,
            Status::Unknown,
        ];
        for s in all {
            assert_eq!(Status::from_name(s.as_str()), s);
        }
    }
}
