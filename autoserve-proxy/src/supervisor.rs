//! Reverse-proxy process supervisor.
//!
//! Lifecycle: `Starting → Running → Stopping → Stopped`, with `Failed`
//! reachable from `Starting` and `Running`. Every exit path releases the
//! child process and the rendered config file, including dropping the
//! supervisor mid-`start`.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, Command};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};

use crate::config::{ProxyConfig, ADMIN_HOST};
use crate::error::{ProxyError, ProxyResult};
use crate::probe::ReadinessProbe;

/// Placeholder replaced by the rendered config path in [`SupervisorOptions::args`]
pub const CONFIG_PLACEHOLDER: &str = "{config}";

/// Captured stderr is truncated to its last this-many bytes
const STDERR_LIMIT: usize = 16 * 1024;

/// How long to wait for the stderr reader after the child is gone
const STDERR_DRAIN_TIMEOUT: Duration = Duration::from_millis(500);

/// Supervised process state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProcessState {
    Starting,
    Running,
    Stopping,
    Stopped,
    Failed,
}

/// Supervisor settings, built once by the caller
#[derive(Debug, Clone)]
pub struct SupervisorOptions {
    /// Proxy binary
    pub program: String,
    /// Argument template; [`CONFIG_PLACEHOLDER`] becomes the config path
    pub args: Vec<String>,
    /// Where rendered configs are written
    pub config_dir: PathBuf,
    pub readiness: ReadinessProbe,
    /// Bound on the wait for the readiness signal
    pub startup_timeout: Duration,
    /// Delay between readiness checks
    pub poll_interval: Duration,
    /// Time between SIGTERM and SIGKILL on stop
    pub grace_period: Duration,
}

impl Default for SupervisorOptions {
    fn default() -> Self {
        Self {
            program: "caddy".to_string(),
            args: ["run", "--config", CONFIG_PLACEHOLDER, "--adapter", "caddyfile"]
                .into_iter()
                .map(String::from)
                .collect(),
            config_dir: std::env::temp_dir().join("autoserve"),
            readiness: ReadinessProbe::default(),
            startup_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(100),
            grace_period: Duration::from_secs(5),
        }
    }
}

/// Why the readiness wait ended without a readiness signal
enum StartupFailure {
    Exited(Option<i32>),
    TimedOut,
    Wait(std::io::Error),
}

/// Owns one proxy process from spawn to reap.
#[derive(Debug)]
pub struct ProxySupervisor {
    options: SupervisorOptions,
    client: reqwest::Client,
    state: ProcessState,
    child: Option<Child>,
    config_path: Option<PathBuf>,
    admin_address: Option<String>,
    stderr: Arc<Mutex<String>>,
    stderr_task: Option<JoinHandle<()>>,
}

impl ProxySupervisor {
    pub fn new(options: SupervisorOptions) -> ProxyResult<Self> {
        let client = reqwest::Client::builder()
            .no_proxy()
            .build()
            .map_err(|e| ProxyError::InvalidConfig(format!("probe client: {e}")))?;

        Ok(Self {
            options,
            client,
            state: ProcessState::Stopped,
            child: None,
            config_path: None,
            admin_address: None,
            stderr: Arc::new(Mutex::new(String::new())),
            stderr_task: None,
        })
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    /// OS pid while the child has not been reaped
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(Child::id)
    }

    /// Rendered config file, present only while a child is supervised
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Admin endpoint rendered into the most recent config
    pub fn admin_address(&self) -> Option<&str> {
        self.admin_address.as_deref()
    }

    /// Stderr captured so far
    pub async fn stderr_output(&self) -> String {
        self.stderr.lock().await.clone()
    }

    /// Renders `config`, spawns the proxy and waits for readiness.
    ///
    /// On failure the child is killed and reaped and the config file removed
    /// before the error is returned; the state is then `Failed`.
    pub async fn start(&mut self, config: &ProxyConfig) -> ProxyResult<()> {
        if matches!(
            self.state,
            ProcessState::Starting | ProcessState::Running | ProcessState::Stopping
        ) {
            return Err(ProxyError::InvalidConfig(format!(
                "proxy already supervised (state {:?})",
                self.state
            )));
        }

        let admin = reserve_admin_address().map_err(|e| ProxyError::Spawn {
            program: self.options.program.clone(),
            reason: format!("no loopback port for the admin endpoint: {e}"),
        })?;
        let rendered = config.render_caddyfile(&admin)?;
        self.admin_address = Some(admin.clone());
        self.state = ProcessState::Starting;
        self.stderr.lock().await.clear();

        let path = match self.write_config(&rendered).await {
            Ok(path) => path,
            Err(e) => {
                self.state = ProcessState::Failed;
                return Err(e);
            }
        };
        self.config_path = Some(path.clone());

        let args: Vec<String> = self
            .options
            .args
            .iter()
            .map(|arg| arg.replace(CONFIG_PLACEHOLDER, &path.to_string_lossy()))
            .collect();
        debug!("[proxy] Spawning {} {}", self.options.program, args.join(" "));

        let spawned = Command::new(&self.options.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();
        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                self.remove_config().await;
                self.state = ProcessState::Failed;
                return Err(ProxyError::Spawn {
                    program: self.options.program.clone(),
                    reason: e.to_string(),
                });
            }
        };

        if let Some(stderr) = child.stderr.take() {
            self.stderr_task = Some(tokio::spawn(drain_stderr(stderr, self.stderr.clone())));
        }
        info!(
            "[proxy] Started {} (pid {:?}) for {}",
            self.options.program,
            child.id(),
            config.domain
        );
        self.child = Some(child);

        match self.wait_ready(&admin).await {
            Ok(()) => {
                self.state = ProcessState::Running;
                info!("[proxy] Ready: {}", config.domain);
                Ok(())
            }
            Err(failure) => Err(self.fail_startup(failure).await),
        }
    }

    /// Graceful stop: SIGTERM, then SIGKILL after the grace period.
    ///
    /// Idempotent. A supervisor that already `Failed` stays `Failed`.
    pub async fn stop(&mut self) -> ProxyResult<()> {
        let Some(mut child) = self.child.take() else {
            self.remove_config().await;
            if self.state != ProcessState::Failed {
                self.state = ProcessState::Stopped;
            }
            return Ok(());
        };

        self.state = ProcessState::Stopping;
        let signalled = match child.id() {
            Some(pid) => terminate(pid),
            None => Ok(()),
        };
        if let Err(e) = &signalled {
            warn!("[proxy] {e}, escalating to kill");
        }

        let graceful = signalled.is_ok()
            && matches!(
                timeout(self.options.grace_period, child.wait()).await,
                Ok(Ok(_))
            );
        let result = if graceful {
            debug!("[proxy] Exited after SIGTERM");
            Ok(())
        } else {
            warn!(
                "[proxy] Still running after {:?}, sending SIGKILL",
                self.options.grace_period
            );
            child
                .kill()
                .await
                .map_err(|e| ProxyError::Signal(format!("failed to kill proxy: {e}")))
        };

        self.finish_stderr().await;
        self.remove_config().await;
        self.state = ProcessState::Stopped;
        info!("[proxy] Stopped");
        result
    }

    /// Resolves when a running proxy exits on its own; the state becomes `Failed`.
    ///
    /// Pending forever when no child is supervised.
    pub async fn wait_exit(&mut self) -> ProxyError {
        let Some(child) = self.child.as_mut() else {
            return std::future::pending().await;
        };
        let waited = child.wait().await;
        self.child = None;
        let stderr = self.finish_stderr().await;
        self.remove_config().await;
        self.state = ProcessState::Failed;

        match waited {
            Ok(status) => {
                error!("[proxy] Exited unexpectedly: {status}");
                ProxyError::ProcessExited {
                    exit_code: status.code(),
                    stderr,
                }
            }
            Err(e) => ProxyError::Signal(format!("failed to wait for proxy: {e}")),
        }
    }

    /// Starts the proxy, keeps it up until `shutdown` resolves, then stops it.
    ///
    /// `shutdown` is watched from the first moment: resolving it while the
    /// proxy is still starting abandons the start and goes through `stop`.
    /// An unexpected proxy exit ends the run early with `ProcessExited`.
    pub async fn run_until<F>(&mut self, config: &ProxyConfig, shutdown: F) -> ProxyResult<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let cancelled = tokio::select! {
            started = self.start(config) => {
                started?;
                false
            }
            () = &mut shutdown => true,
        };
        if cancelled {
            warn!("[proxy] Shutdown requested during startup");
            return self.stop().await;
        }

        let outcome = tokio::select! {
            () = &mut shutdown => Ok(()),
            err = self.wait_exit() => Err(err),
        };
        let stopped = self.stop().await;
        outcome.and(stopped)
    }

    async fn write_config(&self, rendered: &str) -> ProxyResult<PathBuf> {
        let dir = &self.options.config_dir;
        let path = dir.join(format!("autoserve-{}.caddyfile", uuid::Uuid::new_v4()));
        let write_err = |e: std::io::Error| ProxyError::ConfigWrite {
            path: path.display().to_string(),
            reason: e.to_string(),
        };

        tokio::fs::create_dir_all(dir).await.map_err(write_err)?;
        tokio::fs::write(&path, rendered).await.map_err(write_err)?;
        debug!("[proxy] Wrote config {}", path.display());
        Ok(path)
    }

    async fn remove_config(&mut self) {
        if let Some(path) = self.config_path.take() {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => debug!("[proxy] Removed config {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("[proxy] Failed to remove {}: {e}", path.display()),
            }
        }
    }

    async fn wait_ready(&mut self, admin: &str) -> Result<(), StartupFailure> {
        let deadline = Instant::now() + self.options.startup_timeout;
        loop {
            if let Some(child) = self.child.as_mut() {
                match child.try_wait() {
                    Ok(Some(status)) => return Err(StartupFailure::Exited(status.code())),
                    Ok(None) => {}
                    Err(e) => return Err(StartupFailure::Wait(e)),
                }
            }
            if Instant::now() >= deadline {
                return Err(StartupFailure::TimedOut);
            }
            if self.options.readiness.check(&self.client, admin).await {
                return Ok(());
            }
            sleep(
                self.options
                    .poll_interval
                    .min(deadline.saturating_duration_since(Instant::now())),
            )
            .await;
        }
    }

    async fn fail_startup(&mut self, failure: StartupFailure) -> ProxyError {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill().await {
                debug!("[proxy] Kill after failed start: {e}");
            }
        }
        let stderr = self.finish_stderr().await;
        self.remove_config().await;
        self.state = ProcessState::Failed;

        let err = match failure {
            StartupFailure::Exited(exit_code) => ProxyError::ProcessExited { exit_code, stderr },
            StartupFailure::TimedOut => {
                ProxyError::startup_timeout(self.options.startup_timeout, stderr)
            }
            StartupFailure::Wait(e) => {
                ProxyError::Signal(format!("failed to poll proxy status: {e}"))
            }
        };
        error!("[proxy] Startup failed: {err}");
        err
    }

    /// Waits briefly for the stderr reader, then returns what it captured.
    async fn finish_stderr(&mut self) -> String {
        if let Some(mut task) = self.stderr_task.take() {
            if timeout(STDERR_DRAIN_TIMEOUT, &mut task).await.is_err() {
                task.abort();
            }
        }
        self.stderr.lock().await.trim_end().to_string()
    }
}

impl Drop for ProxySupervisor {
    fn drop(&mut self) {
        if let Some(child) = self.child.as_mut() {
            let _ = child.start_kill();
        }
        if let Some(task) = &self.stderr_task {
            task.abort();
        }
        if let Some(path) = &self.config_path {
            let _ = std::fs::remove_file(path);
        }
    }
}

/// Loopback address nothing listens on right now, for this start's admin API
fn reserve_admin_address() -> std::io::Result<String> {
    let listener = std::net::TcpListener::bind((ADMIN_HOST, 0))?;
    Ok(listener.local_addr()?.to_string())
}

fn terminate(pid: u32) -> ProxyResult<()> {
    let raw = i32::try_from(pid).map_err(|_| ProxyError::Signal(format!("pid {pid} out of range")))?;
    match kill(Pid::from_raw(raw), Signal::SIGTERM) {
        // 已经退出
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(e) => Err(ProxyError::Signal(format!("SIGTERM to {pid} failed: {e}"))),
    }
}

async fn drain_stderr(stderr: ChildStderr, buffer: Arc<Mutex<String>>) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        debug!("[caddy] {line}");
        let mut buf = buffer.lock().await;
        buf.push_str(&line);
        buf.push('\n');
        if buf.len() > STDERR_LIMIT {
            let mut cut = buf.len() - STDERR_LIMIT;
            while !buf.is_char_boundary(cut) {
                cut += 1;
            }
            buf.drain(..cut);
        }
    }
}
