//! 共享测试工具和辅助函数

#![allow(dead_code)]

use std::env;

use autoserve_provider::{CloudflareAuth, CloudflareProvider};
use serde_json::{Value, json};
use wiremock::MockServer;

pub const ZONE_ID: &str = "023e105f4ecef8ad9ca31a8372d0c353";
pub const BASE_DOMAIN: &str = "example.com";
pub const TOKEN: &str = "test_token_12345";

/// 跳过测试的宏（当环境变量缺失时）
#[macro_export]
macro_rules! skip_if_no_credentials {
    ($($var:expr),+) => {
        $(
            if std::env::var($var).is_err() {
                eprintln!("跳过测试: 缺少环境变量 {}", $var);
                return;
            }
        )+
    };
}

/// 断言 `Option` 为 `Some`，并解包返回内部值（失败则直接让测试失败）。
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

/// 指向 mock server 的 provider
pub fn mock_provider(server: &MockServer) -> Option<CloudflareProvider> {
    CloudflareProvider::new(
        CloudflareAuth::ApiToken(TOKEN.to_string()),
        ZONE_ID,
        BASE_DOMAIN,
    )
    .ok()
    .map(|p| p.with_base_url(server.uri()))
}

/// 记录接口路径
pub fn records_path() -> String {
    format!("/zones/{ZONE_ID}/dns_records")
}

/// Cloudflare 成功响应信封
pub fn cf_ok(result: Value) -> Value {
    json!({ "success": true, "errors": [], "messages": [], "result": result })
}

/// Cloudflare 分页成功响应信封
pub fn cf_page(result: Value, page: u32, total_pages: u32) -> Value {
    json!({
        "success": true,
        "errors": [],
        "messages": [],
        "result": result,
        "result_info": { "page": page, "per_page": 100, "total_pages": total_pages }
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

/// 生成唯一的测试记录标签
pub fn generate_test_label() -> String {
    let uuid = uuid::Uuid::new_v4();
    format!("test-{}", &uuid.to_string()[..8])
}

/// 真实环境测试上下文
pub struct LiveContext {
    pub provider: CloudflareProvider,
    pub base_domain: String,
}

impl LiveContext {
    pub fn from_env() -> Option<Self> {
        let token = env::var("CLOUDFLARE_API_TOKEN").ok()?;
        let zone_id = env::var("CLOUDFLARE_ZONE_ID").ok()?;
        let base_domain = env::var("BASE_DOMAIN").ok()?;
        let provider =
            CloudflareProvider::new(CloudflareAuth::ApiToken(token), zone_id, &base_domain).ok()?;
        Some(Self {
            provider,
            base_domain,
        })
    }
}
