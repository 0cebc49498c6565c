//! OS process lookup.

use std::collections::HashMap;

use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind};

use crate::discovery::args::parse_args;

/// A running target process and its command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessHandle {
    pub pid: u32,
    pub name: String,
    pub args: Vec<String>,
}

impl ProcessHandle {
    /// `--key=value` arguments of the process.
    pub fn parsed_args(&self) -> HashMap<String, String> {
        parse_args(&self.args)
    }
}

/// Finds the target process.
pub trait ProcessLocator: Send + Sync {
    /// Return the target process if it is currently running.
    fn locate(&self) -> Option<ProcessHandle>;
}

/// Scans the OS process table for one of the configured executable names.
#[derive(Debug, Clone)]
pub struct SystemLocator {
    names: Vec<String>,
}

impl SystemLocator {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }
}

impl ProcessLocator for SystemLocator {
    fn locate(&self) -> Option<ProcessHandle> {
        let mut system = System::new();
        system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing().with_cmd(UpdateKind::Always),
        );

        // Earlier names in the list win over later ones.
        self.names.iter().find_map(|wanted| {
            system
                .processes()
                .values()
                .find(|process| process.name().to_string_lossy() == wanted.as_str())
                .map(|process| ProcessHandle {
                    pid: process.pid().as_u32(),
                    name: wanted.clone(),
                    args: process
                        .cmd()
                        .iter()
                        .map(|arg| arg.to_string_lossy().into_owned())
                        .collect(),
                })
        })
    }
}

/// Always reports the same process (or none). Used when the caller already
/// knows the port and token, and in tests.
#[derive(Debug, Clone, Default)]
pub struct StaticLocator(Option<ProcessHandle>);

impl StaticLocator {
    pub fn new(process: Option<ProcessHandle>) -> Self {
        Self(process)
    }

    /// A fake process whose command line carries `port` and `token`.
    pub fn from_credentials(port: u16, token: &str) -> Self {
        Self(Some(ProcessHandle {
            pid: 0,
            name: "static".to_string(),
            args: vec![
                format!("--app-port={}", port),
                format!("--remoting-auth-token={}", token),
            ],
        }))
    }
}

impl ProcessLocator for StaticLocator {
    fn locate(&self) -> Option<ProcessHandle> {
        self.0.clone()
    }
}
