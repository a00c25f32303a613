// src/watch/probe.rs

use std::path::PathBuf;

use sysinfo::{Pid, Process, ProcessRefreshKind, ProcessStatus, ProcessesToUpdate, System, UpdateKind};

/// What the watcher knows about a live process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub pid: u32,
    /// Short process name as reported by the OS.
    pub name: String,
    pub exe: Option<PathBuf>,
    /// Full argv, including argv[0].
    pub cmd: Vec<String>,
}

impl ProcessInfo {
    /// Best available executable path for status records.
    pub fn command(&self) -> String {
        match &self.exe {
            Some(exe) => exe.display().to_string(),
            None => self.cmd.first().cloned().unwrap_or_else(|| self.name.clone()),
        }
    }

    /// Arguments after argv[0].
    pub fn arguments(&self) -> Vec<String> {
        self.cmd.iter().skip(1).cloned().collect()
    }
}

/// Read-only access to the process table.
///
/// Zombies count as dead: they have exited and only wait to be reaped.
pub trait ProcessProbe: Send {
    fn is_alive(&mut self, pid: u32) -> bool;

    /// Details for `pid`, or `None` if it is gone (or a zombie).
    fn describe(&mut self, pid: u32) -> Option<ProcessInfo>;

    /// Every live process except kapo itself.
    fn processes(&mut self) -> Vec<ProcessInfo>;
}

/// [`ProcessProbe`] backed by the real OS process table.
pub struct SystemProbe {
    system: System,
    own_pid: u32,
}

impl std::fmt::Debug for SystemProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemProbe")
            .field("own_pid", &self.own_pid)
            .finish_non_exhaustive()
    }
}

impl Default for SystemProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemProbe {
    pub fn new() -> Self {
        Self {
            system: System::new(),
            own_pid: std::process::id(),
        }
    }

    fn refresh(&mut self, which: ProcessesToUpdate<'_>) {
        let kind = ProcessRefreshKind::new()
            .with_cmd(UpdateKind::OnlyIfNotSet)
            .with_exe(UpdateKind::OnlyIfNotSet);
        self.system.refresh_processes_specifics(which, true, kind);
    }
}

impl ProcessProbe for SystemProbe {
    #[cfg(unix)]
    fn is_alive(&mut self, pid: u32) -> bool {
        use nix::errno::Errno;
        use nix::sys::signal::kill;

        let Ok(raw) = i32::try_from(pid) else {
            return false;
        };
        if raw <= 0 {
            return false;
        }

        // Signal 0 only checks existence. EPERM means it exists but belongs
        // to someone else.
        match kill(nix::unistd::Pid::from_raw(raw), None) {
            Ok(()) | Err(Errno::EPERM) => {}
            Err(_) => return false,
        }

        self.refresh(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));
        match self.system.process(Pid::from_u32(pid)) {
            Some(process) => process.status() != ProcessStatus::Zombie,
            // Not visible to sysinfo but answered kill(2).
            None => true,
        }
    }

    #[cfg(not(unix))]
    fn is_alive(&mut self, pid: u32) -> bool {
        self.describe(pid).is_some()
    }

    fn describe(&mut self, pid: u32) -> Option<ProcessInfo> {
        let sys_pid = Pid::from_u32(pid);
        self.refresh(ProcessesToUpdate::Some(&[sys_pid]));
        self.system
            .process(sys_pid)
            .filter(|p| p.status() != ProcessStatus::Zombie)
            .map(to_info)
    }

    fn processes(&mut self) -> Vec<ProcessInfo> {
        self.refresh(ProcessesToUpdate::All);
        let own_pid = self.own_pid;
        let mut found: Vec<ProcessInfo> = self
            .system
            .processes()
            .values()
            .filter(|p| p.pid().as_u32() != own_pid && p.status() != ProcessStatus::Zombie)
            .map(to_info)
            .collect();
        found.sort_by_key(|p| p.pid);
        found
    }
}

fn to_info(process: &Process) -> ProcessInfo {
    ProcessInfo {
        pid: process.pid().as_u32(),
        name: process.name().to_string_lossy().into_owned(),
        exe: process.exe().map(|p| p.to_path_buf()),
        cmd: process
            .cmd()
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect(),
    }
}
