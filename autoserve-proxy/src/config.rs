//! Proxy configuration and Caddyfile rendering.

use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ProxyError, ProxyResult};

/// Host of the per-start admin endpoint; the port is picked at start
pub const ADMIN_HOST: &str = "127.0.0.1";

/// Trust mode between the registrar's edge and this origin
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SslMode {
    /// Edge terminates TLS, origin speaks plain HTTP
    #[default]
    Flexible,
    /// Origin presents a certificate, any certificate
    Full,
    /// Origin presents a publicly trusted certificate
    Strict,
}

impl SslMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Flexible => "flexible",
            Self::Full => "full",
            Self::Strict => "strict",
        }
    }
}

impl fmt::Display for SslMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SslMode {
    type Err = ProxyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flexible" => Ok(Self::Flexible),
            "full" => Ok(Self::Full),
            "strict" => Ok(Self::Strict),
            other => Err(ProxyError::InvalidConfig(format!(
                "unknown SSL mode '{other}' (expected flexible, full or strict)"
            ))),
        }
    }
}

/// Everything the proxy needs for one invocation.
///
/// Rendered once into a Caddyfile and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Local upstream port
    pub target_port: u16,
    /// Public site address
    pub domain: String,
    pub ssl_mode: SslMode,
    /// Response headers added by the proxy
    #[serde(default)]
    pub extra_headers: BTreeMap<String, String>,
    /// Access log file; `None` logs to stderr
    #[serde(default)]
    pub log_path: Option<PathBuf>,
}

impl ProxyConfig {
    pub fn new(target_port: u16, domain: impl Into<String>, ssl_mode: SslMode) -> Self {
        Self {
            target_port,
            domain: domain.into(),
            ssl_mode,
            extra_headers: BTreeMap::new(),
            log_path: None,
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    /// 校验配置，拒绝会破坏 Caddyfile 语法的输入
    pub fn validate(&self) -> ProxyResult<()> {
        if self.target_port == 0 {
            return Err(ProxyError::InvalidConfig(
                "target port must be non-zero".to_string(),
            ));
        }

        let domain = self.domain.trim();
        if domain.is_empty() {
            return Err(ProxyError::InvalidConfig("domain is required".to_string()));
        }
        if !domain
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '*'))
        {
            return Err(ProxyError::InvalidConfig(format!(
                "domain '{domain}' contains invalid characters"
            )));
        }

        for (name, value) in &self.extra_headers {
            if name.is_empty()
                || !name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
            {
                return Err(ProxyError::InvalidConfig(format!(
                    "invalid header name '{name}'"
                )));
            }
            if value.chars().any(|c| c.is_control() || c == '"') {
                return Err(ProxyError::InvalidConfig(format!(
                    "header '{name}' has an invalid value"
                )));
            }
        }

        if let Some(path) = &self.log_path {
            let text = path.to_string_lossy();
            if text.is_empty() || text.chars().any(|c| c.is_whitespace() || matches!(c, '{' | '}')) {
                return Err(ProxyError::InvalidConfig(format!(
                    "log path '{text}' cannot be used in a Caddyfile"
                )));
            }
        }
        Ok(())
    }

    /// Site address for the configured SSL mode.
    ///
    /// Flexible serves plain HTTP; the other modes let Caddy terminate TLS.
    fn site_address(&self) -> String {
        let domain = self.domain.trim().to_ascii_lowercase();
        match self.ssl_mode {
            SslMode::Flexible => format!("http://{domain}"),
            SslMode::Full | SslMode::Strict => domain,
        }
    }

    /// 渲染 Caddyfile，`admin_address` 是本次启动独占的 admin 端点
    pub fn render_caddyfile(&self, admin_address: &str) -> ProxyResult<String> {
        self.validate()?;

        let mut out = String::new();
        // 全局选项：admin 端点供就绪探测，metrics 供外部抓取
        let _ = writeln!(out, "{{");
        let _ = writeln!(out, "\tadmin {admin_address}");
        let _ = writeln!(out, "\tservers {{");
        let _ = writeln!(out, "\t\tmetrics");
        let _ = writeln!(out, "\t}}");
        let _ = writeln!(out, "}}");
        let _ = writeln!(out);

        let _ = writeln!(out, "{} {{", self.site_address());
        if self.ssl_mode == SslMode::Full {
            // 自签证书即可满足 Full 模式
            let _ = writeln!(out, "\ttls internal");
        }
        let _ = writeln!(out, "\treverse_proxy localhost:{}", self.target_port);
        for (name, value) in &self.extra_headers {
            let _ = writeln!(out, "\theader {name} \"{value}\"");
        }
        let _ = writeln!(out, "\tlog {{");
        match &self.log_path {
            Some(path) => {
                let _ = writeln!(out, "\t\toutput file {}", path.display());
            }
            None => {
                let _ = writeln!(out, "\t\toutput stderr");
            }
        }
        let _ = writeln!(out, "\t}}");
        let _ = writeln!(out, "}}");

        Ok(out)
    }
}
