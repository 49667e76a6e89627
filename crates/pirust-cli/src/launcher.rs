//! Worker process management for multi-process runs.

use std::process::{Child, ChildStdout, Command, Stdio};

use anyhow::{bail, Context, Result};
use pirust_core::PiConfig;
use tracing::debug;

/// Hidden flag that turns an invocation into a worker rank.
pub const WORKER_RANK_FLAG: &str = "--worker-rank";

/// The non-root ranks of a run, as child processes of the root.
///
/// Children still running when the group is dropped are killed and reaped,
/// so a failing root never leaves workers behind.
pub struct WorkerGroup {
    children: Vec<Child>,
}

impl WorkerGroup {
    /// Spawns ranks `1..config.procs` as copies of the current executable.
    ///
    /// Each worker's stdout is piped back to the root; stderr is inherited so
    /// worker logs reach the terminal.
    pub fn spawn(config: &PiConfig) -> Result<Self> {
        let exe = std::env::current_exe().context("cannot locate the pirust executable")?;
        let mut group = Self {
            children: Vec::with_capacity(config.procs.saturating_sub(1)),
        };

        for rank in 1..config.procs {
            let child = Command::new(&exe)
                .arg(config.digits.to_string())
                .args(["--algorithm", config.algorithm.name()])
                .arg("--procs")
                .arg(config.procs.to_string())
                .arg("--threads")
                .arg(config.threads.to_string())
                .arg(WORKER_RANK_FLAG)
                .arg(rank.to_string())
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::inherit())
                .spawn()
                .with_context(|| format!("failed to spawn worker rank {rank}"))?;
            debug!(rank, pid = child.id(), "worker spawned");
            group.children.push(child);
        }
        Ok(group)
    }

    /// Takes the stdout pipe of every worker, in rank order.
    pub fn take_outputs(&mut self) -> Result<Vec<ChildStdout>> {
        self.children
            .iter_mut()
            .enumerate()
            .map(|(i, child)| {
                child
                    .stdout
                    .take()
                    .with_context(|| format!("stdout of worker rank {} already taken", i + 1))
            })
            .collect()
    }

    /// Waits for every worker and checks that all of them succeeded.
    pub fn wait(mut self) -> Result<()> {
        for (i, child) in self.children.iter_mut().enumerate() {
            let rank = i + 1;
            let status = child
                .wait()
                .with_context(|| format!("failed to wait for worker rank {rank}"))?;
            if !status.success() {
                bail!("worker rank {rank} exited with {status}");
            }
        }
        self.children.clear();
        Ok(())
    }
}

impl Drop for WorkerGroup {
    fn drop(&mut self) {
        for child in &mut self.children {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}
