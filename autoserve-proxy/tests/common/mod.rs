//! 共享测试工具和辅助函数

#![allow(dead_code)]

use std::path::Path;
use std::time::Duration;

use autoserve_proxy::{ProxyConfig, ReadinessProbe, SslMode, SupervisorOptions};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// 断言 `Result` 为 `Ok`，并解包返回内部值（失败则直接让测试失败）。
#[macro_export]
macro_rules! require_ok {
    ($expr:expr $(,)?) => {{
        let res = $expr;
        assert!(res.is_ok(), "expected Ok(..), got {res:?}");
        let Ok(val) = res else {
            return;
        };
        val
    }};
}

/// 断言 `Option` 为 `Some`，并解包返回内部值。
#[macro_export]
macro_rules! require_some {
    ($expr:expr $(,)?) => {{
        let opt = $expr;
        assert!(opt.is_some(), "expected Some(..), got None");
        let Some(val) = opt else {
            return;
        };
        val
    }};
}

/// 断言 `Result` 为 `Err`，并解包返回错误值。
#[macro_export]
macro_rules! require_err {
    ($expr:expr $(,)?) => {{
        let res = $expr;
        assert!(res.is_err(), "expected Err(..), got Ok");
        let Err(err) = res else {
            return;
        };
        err
    }};
}

pub fn site_config() -> ProxyConfig {
    ProxyConfig::new(8000, "x.example.com", SslMode::Flexible)
}

/// 用 `sh -c <script>` 代替 caddy；脚本里 `$1` 是配置文件路径
pub fn shell_options(config_dir: &Path, script: &str, readiness: ReadinessProbe) -> SupervisorOptions {
    SupervisorOptions {
        program: "sh".to_string(),
        args: vec![
            "-c".to_string(),
            script.to_string(),
            "sh".to_string(),
            autoserve_proxy::CONFIG_PLACEHOLDER.to_string(),
        ],
        config_dir: config_dir.to_path_buf(),
        readiness,
        startup_timeout: Duration::from_millis(500),
        poll_interval: Duration::from_millis(20),
        grace_period: Duration::from_millis(300),
    }
}

/// 一个真实监听的端口，作为 TCP 就绪信号
pub async fn ready_listener() -> (TcpListener, ReadinessProbe) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap_or_else(|e| panic!("bind: {e}"));
    let addr = listener
        .local_addr()
        .unwrap_or_else(|e| panic!("local_addr: {e}"))
        .to_string();
    (listener, ReadinessProbe::Tcp { addr })
}

/// 一个确定没有监听者的端口
pub fn closed_probe() -> ReadinessProbe {
    let listener =
        std::net::TcpListener::bind("127.0.0.1:0").unwrap_or_else(|e| panic!("bind: {e}"));
    let addr = listener
        .local_addr()
        .unwrap_or_else(|e| panic!("local_addr: {e}"))
        .to_string();
    drop(listener);
    ReadinessProbe::Tcp { addr }
}

/// 配置目录中剩余的文件数
pub fn leftover_files(dir: &Path) -> usize {
    std::fs::read_dir(dir).map_or(0, Iterator::count)
}

/// pid 是否仍存活（僵尸进程视为已退出）
pub fn is_alive(pid: u32) -> bool {
    let Ok(stat) = std::fs::read_to_string(format!("/proc/{pid}/stat")) else {
        return false;
    };
    // 格式: "pid (comm) S ..."
    stat.rsplit_once(')')
        .and_then(|(_, rest)| rest.split_whitespace().next())
        .is_some_and(|state| state != "Z" && state != "X")
}

/// 脚本写下的 `$$`
pub fn read_pid(path: &Path) -> Option<u32> {
    std::fs::read_to_string(path).ok()?.trim().parse().ok()
}

/// 在 `addr` 上对任何请求回 200；端口已被别人占用时返回 `None`
pub async fn http_responder(addr: &str) -> Option<JoinHandle<()>> {
    let listener = TcpListener::bind(addr).await.ok()?;
    Some(tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let mut request = [0u8; 1024];
            let _ = stream.read(&mut request).await;
            let _ = stream
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\n{}")
                .await;
        }
    }))
}
