//! 统一错误类型定义

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// 代理监管错误类型
///
/// Startup failures are only reported after the child has been killed and
/// reaped and its config file removed.
#[derive(Error, Debug, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum ProxyError {
    /// 配置无效（渲染前校验）
    #[error("Invalid proxy config: {0}")]
    InvalidConfig(String),

    /// 配置文件写入失败
    #[error("Failed to write proxy config {path}: {reason}")]
    ConfigWrite { path: String, reason: String },

    /// 进程无法启动
    #[error("Failed to spawn '{program}': {reason}")]
    Spawn { program: String, reason: String },

    /// 超时未就绪
    #[error("Proxy not ready after {}ms{}", timeout_ms, stderr_suffix(stderr))]
    StartupTimeout { timeout_ms: u64, stderr: String },

    /// 启动期间进程退出
    #[error("Proxy exited during startup ({}){}", exit_label(*exit_code), stderr_suffix(stderr))]
    ProcessExited { exit_code: Option<i32>, stderr: String },

    /// 发送信号或等待进程失败
    #[error("Signal error: {0}")]
    Signal(String),
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

fn exit_label(code: Option<i32>) -> String {
    code.map_or_else(|| "killed by signal".to_string(), |c| format!("exit code {c}"))
}

impl ProxyError {
    pub(crate) fn startup_timeout(timeout: Duration, stderr: String) -> Self {
        Self::StartupTimeout {
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            stderr,
        }
    }

    /// Error kind name as shown to the user
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidConfig(_) => "ValidationError",
            Self::ConfigWrite { .. } => "ConfigWriteError",
            Self::Spawn { .. } => "SpawnError",
            Self::StartupTimeout { .. } => "StartupTimeoutError",
            Self::ProcessExited { .. } => "ProcessExitedError",
            Self::Signal(_) => "SignalError",
        }
    }

    /// Captured proxy stderr, when the error carries any
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::StartupTimeout { stderr, .. } | Self::ProcessExited { stderr, .. } => {
                Some(stderr.as_str())
            }
            _ => None,
        }
    }
}

/// 代理 Result 类型别名
pub type ProxyResult<T> = std::result::Result<T, ProxyError>;
