use std::collections::VecDeque;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::errors::SupervisorError;

const MAX_LOG_LINES: usize = 1000;
const SPAWN_SETTLE: Duration = Duration::from_millis(100);
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(100);
const STOP_TIMEOUT: Duration = Duration::from_secs(10);
const STOP_FORCE_KILL_SETTLE: Duration = Duration::from_millis(500);
const RESTART_DELAY: Duration = Duration::from_millis(500);
const CLEANUP_KILL_TIMEOUT: Duration = Duration::from_secs(5);

/// Static launch parameters for one worker instance.
#[derive(Debug, Clone)]
pub struct WorkerArgs {
    pub host: String,
    pub port: u16,
    pub work_dir: PathBuf,
    pub log_level: String,
    pub binary_path: PathBuf,
}

impl WorkerArgs {
    fn to_cli_args(&self) -> Vec<String> {
        vec![
            "--host".to_string(),
            self.host.clone(),
            "--port".to_string(),
            self.port.to_string(),
            "--work-dir".to_string(),
            self.work_dir.display().to_string(),
            "--log-level".to_string(),
            self.log_level.clone(),
            "--enable-websocket".to_string(),
            "true".to_string(),
            "--enable-grpc".to_string(),
            "false".to_string(),
            "--enable-http".to_string(),
            "false".to_string(),
        ]
    }
}

/// Lifecycle status of a supervised worker process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerStatus {
    NotStarted,
    Running,
    Exited,
}

impl WorkerStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Running => "running",
            Self::Exited => "exited",
        }
    }
}

struct RunningProcess {
    child: Child,
    log_task: tokio::task::JoinHandle<()>,
}

/// Supervises one child worker process identified by `worker-{port}`.
pub struct Worker {
    args: WorkerArgs,
    id: String,
    running: Mutex<Option<RunningProcess>>,
    logs: Arc<Mutex<VecDeque<String>>>,
}

impl Worker {
    pub fn new(args: WorkerArgs) -> Self {
        let id = format!("worker-{}", args.port);
        Self {
            args,
            id,
            running: Mutex::new(None),
            logs: Arc::new(Mutex::new(VecDeque::with_capacity(MAX_LOG_LINES))),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Spawns the binary; refuses if already running. Returns once the
    /// process has been observed alive for a brief settle window.
    pub async fn start(&self) -> Result<(), SupervisorError> {
        let mut slot = self.running.lock().await;
        if let Some(running) = slot.as_mut() {
            if is_alive(&mut running.child) {
                return Err(SupervisorError::AlreadyRunning);
            }
        }

        if !self.args.binary_path.exists() {
            return Err(SupervisorError::BinaryMissing(
                self.args.binary_path.display().to_string(),
            ));
        }

        tracing::debug!(id = %self.id, port = self.args.port, "starting worker");

        let mut command = Command::new(&self.args.binary_path);
        command
            .args(self.args.to_cli_args())
            .current_dir(&self.args.work_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(false);

        let mut child = command
            .spawn()
            .map_err(|err| SupervisorError::Spawn(err.to_string()))?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let logs = Arc::clone(&self.logs);
        let log_task = tokio::spawn(collect_logs(stdout, stderr, logs));

        tokio::time::sleep(SPAWN_SETTLE).await;

        *slot = Some(RunningProcess { child, log_task });
        tracing::debug!(id = %self.id, "worker started");
        Ok(())
    }

    /// Sends a graceful signal, polls for exit, escalates to a kill after the
    /// stop timeout. Tolerates the process having already exited.
    pub async fn stop(&self) -> Result<(), SupervisorError> {
        let mut slot = self.running.lock().await;
        let running = slot.as_mut().ok_or(SupervisorError::NotRunning)?;
        if !is_alive(&mut running.child) {
            *slot = None;
            return Err(SupervisorError::NotRunning);
        }

        tracing::debug!(id = %self.id, "stopping worker");
        send_graceful_signal(&running.child);

        let deadline = Instant::now() + STOP_TIMEOUT;
        loop {
            if !is_alive(&mut running.child) {
                tracing::debug!(id = %self.id, "worker stopped");
                finish(slot.take()).await;
                return Ok(());
            }
            if Instant::now() >= deadline {
                break;
            }
            tokio::time::sleep(STOP_POLL_INTERVAL).await;
        }

        tracing::warn!(id = %self.id, "worker stop timeout, forcing kill");
        let _ = running.child.start_kill();
        tokio::time::sleep(STOP_FORCE_KILL_SETTLE).await;
        for _ in 0..10 {
            if !is_alive(&mut running.child) {
                break;
            }
            tokio::time::sleep(STOP_POLL_INTERVAL).await;
        }
        finish(slot.take()).await;
        Err(SupervisorError::StopTimeout)
    }

    /// Stops (if running), drops the entry, waits, then starts fresh.
    pub async fn restart(&self) -> Result<(), SupervisorError> {
        if self.is_running().await {
            match self.stop().await {
                Ok(()) | Err(SupervisorError::StopTimeout) => {}
                Err(err) => return Err(err),
            }
        }
        tokio::time::sleep(RESTART_DELAY).await;
        self.start().await
    }

    pub async fn status(&self) -> WorkerStatus {
        let mut slot = self.running.lock().await;
        match slot.as_mut() {
            None => WorkerStatus::NotStarted,
            Some(running) => {
                if is_alive(&mut running.child) {
                    WorkerStatus::Running
                } else {
                    WorkerStatus::Exited
                }
            }
        }
    }

    pub async fn is_running(&self) -> bool {
        self.status().await == WorkerStatus::Running
    }

    pub async fn logs(&self) -> Vec<String> {
        self.logs.lock().await.iter().cloned().collect()
    }

    /// Idempotent full teardown: graceful stop, escalate to kill after 5s,
    /// drain the log collector.
    pub async fn cleanup(&self) -> Result<(), SupervisorError> {
        let mut slot = self.running.lock().await;
        let Some(running) = slot.as_mut() else {
            return Ok(());
        };

        if is_alive(&mut running.child) {
            send_graceful_signal(&running.child);
            let deadline = Instant::now() + CLEANUP_KILL_TIMEOUT;
            loop {
                if !is_alive(&mut running.child) {
                    break;
                }
                if Instant::now() >= deadline {
                    tracing::warn!(id = %self.id, "cleanup kill escalation");
                    let _ = running.child.start_kill();
                    break;
                }
                tokio::time::sleep(STOP_POLL_INTERVAL).await;
            }
        }

        finish(slot.take()).await;
        Ok(())
    }
}

async fn finish(running: Option<RunningProcess>) {
    if let Some(mut running) = running {
        let _ = running.child.wait().await;
        running.log_task.abort();
        let _ = running.log_task.await;
    }
}

fn is_alive(child: &mut Child) -> bool {
    matches!(child.try_wait(), Ok(None))
}

#[cfg(unix)]
fn send_graceful_signal(child: &Child) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let Some(pid) = child.id() else { return };
    let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
}

#[cfg(not(unix))]
fn send_graceful_signal(_child: &Child) {}

async fn collect_logs(
    stdout: Option<tokio::process::ChildStdout>,
    stderr: Option<tokio::process::ChildStderr>,
    logs: Arc<Mutex<VecDeque<String>>>,
) {
    let mut stdout_lines = stdout.map(|s| BufReader::new(s).lines());
    let mut stderr_lines = stderr.map(|s| BufReader::new(s).lines());

    loop {
        let stdout_next = async {
            match stdout_lines.as_mut() {
                Some(lines) => lines.next_line().await,
                None => std::future::pending().await,
            }
        };
        let stderr_next = async {
            match stderr_lines.as_mut() {
                Some(lines) => lines.next_line().await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            line = stdout_next => match line {
                Ok(Some(text)) => push_log(&logs, "INFO", &text).await,
                _ => stdout_lines = None,
            },
            line = stderr_next => match line {
                Ok(Some(text)) => push_log(&logs, "ERROR", &text).await,
                _ => stderr_lines = None,
            },
        }

        if stdout_lines.is_none() && stderr_lines.is_none() {
            break;
        }
    }
}

async fn push_log(logs: &Mutex<VecDeque<String>>, level: &str, text: &str) {
    let mut guard = logs.lock().await;
    guard.push_back(format!("[{level}] {text}"));
    while guard.len() > MAX_LOG_LINES {
        guard.pop_front();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_args(binary_path: PathBuf) -> WorkerArgs {
        WorkerArgs {
            host: "127.0.0.1".to_string(),
            port: 18988,
            work_dir: std::env::temp_dir(),
            log_level: "warning".to_string(),
            binary_path,
        }
    }

    #[tokio::test]
    async fn start_fails_when_binary_missing() {
        let worker = Worker::new(test_args(PathBuf::from("/nonexistent/mtrancore")));
        let err = worker.start().await.unwrap_err();
        assert!(matches!(err, SupervisorError::BinaryMissing(_)));
    }

    #[tokio::test]
    async fn stop_fails_when_never_started() {
        let worker = Worker::new(test_args(PathBuf::from("/nonexistent/mtrancore")));
        let err = worker.stop().await.unwrap_err();
        assert!(matches!(err, SupervisorError::NotRunning));
    }

    #[tokio::test]
    async fn status_reports_not_started_before_spawn() {
        let worker = Worker::new(test_args(PathBuf::from("/nonexistent/mtrancore")));
        assert_eq!(worker.status().await, WorkerStatus::NotStarted);
        assert!(!worker.is_running().await);
    }

    #[tokio::test]
    async fn cleanup_is_a_noop_when_never_started() {
        let worker = Worker::new(test_args(PathBuf::from("/nonexistent/mtrancore")));
        worker.cleanup().await.expect("cleanup ok");
    }

    #[tokio::test]
    async fn start_and_stop_a_real_short_lived_process() {
        let binary = PathBuf::from("/bin/sleep");
        if !binary.exists() {
            return;
        }
        let mut args = test_args(binary);
        args.port = 18989;
        let worker = Worker::new(args);
        // /bin/sleep ignores our CLI flags but runs long enough to observe.
        worker.start().await.expect("start");
        assert!(worker.is_running().await);
        worker.cleanup().await.expect("cleanup");
        assert!(!worker.is_running().await);
    }
}
