use std::sync::{Arc, Mutex};

use kapo::watch::{ProcessInfo, ProcessProbe};

/// In-memory process table shared between a test and its watcher.
#[derive(Clone, Default)]
pub struct FakeProbe {
    table: Arc<Mutex<Vec<ProcessInfo>>>,
}

impl FakeProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a live process.
    pub fn start(&self, pid: u32, name: &str, cmd: &[&str]) {
        self.table.lock().unwrap().push(ProcessInfo {
            pid,
            name: name.to_string(),
            exe: Some(format!("/usr/bin/{name}").into()),
            cmd: cmd.iter().map(|s| s.to_string()).collect(),
        });
    }

    /// Remove a process, as if it exited.
    pub fn stop(&self, pid: u32) {
        self.table.lock().unwrap().retain(|p| p.pid != pid);
    }
}

impl ProcessProbe for FakeProbe {
    fn is_alive(&mut self, pid: u32) -> bool {
        self.table.lock().unwrap().iter().any(|p| p.pid == pid)
    }

    fn describe(&mut self, pid: u32) -> Option<ProcessInfo> {
        self.table.lock().unwrap().iter().find(|p| p.pid == pid).cloned()
    }

    fn processes(&mut self) -> Vec<ProcessInfo> {
        self.table.lock().unwrap().clone()
    }
}
