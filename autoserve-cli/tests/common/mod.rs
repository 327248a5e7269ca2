//! 共享测试工具和辅助函数

#![allow(dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::process::{Child, Command};
use wiremock::MockServer;

pub const ZONE_ID: &str = "023e105f4ecef8ad9ca31a8372d0c353";
pub const BASE_DOMAIN: &str = "example.com";

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

/// 记录接口路径
pub fn records_path() -> String {
    format!("/zones/{ZONE_ID}/dns_records")
}

/// 指向 mock registrar 的 `autoserve` 命令（不继承真实凭据）
pub fn autoserve(server: &MockServer) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_autoserve"));
    cmd.env_remove("CLOUDFLARE_EMAIL")
        .env_remove("CLOUDFLARE_API_KEY")
        .env_remove("RUST_LOG")
        .env("CLOUDFLARE_API_TOKEN", "test_token_12345")
        .env("CLOUDFLARE_ZONE_ID", ZONE_ID)
        .env("BASE_DOMAIN", BASE_DOMAIN)
        .env("CLOUDFLARE_API_BASE", server.uri())
        .kill_on_drop(true);
    cmd
}

/// 没有任何 registrar 配置的 `autoserve` 命令
pub fn autoserve_offline() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_autoserve"));
    for var in [
        "CLOUDFLARE_EMAIL",
        "CLOUDFLARE_API_KEY",
        "CLOUDFLARE_API_TOKEN",
        "CLOUDFLARE_ZONE_ID",
        "BASE_DOMAIN",
        "CLOUDFLARE_API_BASE",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd.kill_on_drop(true);
    cmd
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Cloudflare 成功响应信封
pub fn cf_ok(result: Value) -> Value {
    json!({ "success": true, "errors": [], "messages": [], "result": result })
}

/// Cloudflare 分页成功响应信封
pub fn cf_page(result: Value) -> Value {
    json!({
        "success": true,
        "errors": [],
        "messages": [],
        "result": result,
        "result_info": { "page": 1, "per_page": 100, "total_pages": 1 }
    })
}

/// Cloudflare 失败响应信封
pub fn cf_error(code: i64, message: &str) -> Value {
    json!({
        "success": false,
        "errors": [{ "code": code, "message": message }],
        "messages": [],
        "result": null
    })
}

/// 一条 A 记录的 JSON
pub fn a_record(id: &str, name: &str, content: &str, comment: Option<&str>) -> Value {
    json!({
        "id": id,
        "type": "A",
        "name": name,
        "content": content,
        "proxied": true,
        "ttl": 1,
        "comment": comment,
        "created_on": "2024-01-01T05:20:00.12345Z",
        "modified_on": "2024-01-01T05:20:00.12345Z"
    })
}

/// 当前空闲的本地端口
pub fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .and_then(|l| l.local_addr())
        .map(|addr| addr.port())
        .unwrap_or_else(|e| panic!("free port: {e}"))
}

/// 写一个可执行的 sh 脚本，代替 caddy
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap_or_else(|e| panic!("write: {e}"));
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .unwrap_or_else(|e| panic!("chmod: {e}"));
    path
}

/// 等脚本写下 `$$`
pub async fn wait_for_pid(path: &Path, limit: Duration) -> Option<u32> {
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if let Some(pid) = std::fs::read_to_string(path)
            .ok()
            .and_then(|s| s.trim().parse().ok())
        {
            return Some(pid);
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    None
}

/// 读输出直到出现包含 `needle` 的行，返回读到的所有行
pub async fn read_until_line<R>(reader: &mut R, needle: &str, limit: Duration) -> Option<Vec<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut seen = Vec::new();
    let scan = async {
        let mut line = String::new();
        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) | Err(_) => return false,
                Ok(_) => {
                    seen.push(line.trim_end().to_string());
                    if line.contains(needle) {
                        return true;
                    }
                }
            }
        }
    };
    let found = matches!(tokio::time::timeout(limit, scan).await, Ok(true));
    found.then_some(seen)
}

/// 向子进程发送 SIGTERM
pub fn sigterm(child: &Child) {
    let pid = child
        .id()
        .and_then(|id| i32::try_from(id).ok())
        .unwrap_or_else(|| panic!("child already reaped"));
    kill(Pid::from_raw(pid), Signal::SIGTERM).unwrap_or_else(|e| panic!("SIGTERM: {e}"));
}

/// pid 是否仍存活（僵尸进程视为已退出）
pub fn is_alive(pid: u32) -> bool {
    let Ok(stat) = std::fs::read_to_string(format!("/proc/{pid}/stat")) else {
        return false;
    };
    stat.rsplit_once(')')
        .and_then(|(_, rest)| rest.split_whitespace().next())
        .is_some_and(|state| state != "Z" && state != "X")
}
