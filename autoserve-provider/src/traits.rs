use async_trait::async_trait;

use crate::error::{ProviderError, Result};
use crate::types::{DnsRecord, NewDnsRecord, RecordFilter, RegistrarCapabilities, Zone};

/// 原始 API 错误（内部使用）
#[derive(Debug, Clone)]
pub(crate) struct RawApiError {
    /// 错误码（各 Provider 格式不同）
    pub code: Option<String>,
    /// 原始错误消息
    pub message: String,
    /// HTTP status of the response that carried the error.
    pub http_status: Option<u16>,
}

impl RawApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            http_status: None,
        }
    }

    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
            http_status: None,
        }
    }

    #[must_use]
    pub fn status(mut self, http_status: u16) -> Self {
        self.http_status = Some(http_status);
        self
    }
}

/// 错误上下文信息（内部使用）
/// 用于在映射错误时提供额外信息
#[derive(Debug, Clone, Default)]
pub(crate) struct ErrorContext {
    /// 记录名称（用于 `RecordExists` 等错误）
    pub record_name: Option<String>,
    /// 记录 ID（用于 `RecordNotFound` 等错误）
    pub record_id: Option<String>,
    /// Zone identifier (for `ZoneNotFound`).
    pub zone: Option<String>,
}

impl ErrorContext {
    pub fn record_name(name: impl Into<String>) -> Self {
        Self {
            record_name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn record_id(id: impl Into<String>) -> Self {
        Self {
            record_id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn zone(zone: impl Into<String>) -> Self {
        Self {
            zone: Some(zone.into()),
            ..Self::default()
        }
    }
}

/// Provider 错误映射 Trait（内部使用）
/// 各 Provider 实现此 trait 以将原始 API 错误映射到统一错误类型
pub(crate) trait ProviderErrorMapper {
    /// 返回 Provider 标识符
    fn provider_name(&self) -> &'static str;

    /// 将原始 API 错误映射到统一错误类型
    fn map_error(&self, raw: RawApiError, context: ErrorContext) -> ProviderError;

    /// 快捷方法：解析错误
    fn parse_error(&self, detail: impl ToString) -> ProviderError {
        ProviderError::ParseError {
            provider: self.provider_name().to_string(),
            detail: detail.to_string(),
        }
    }

    /// 快捷方法：参数错误
    fn invalid_parameter(&self, param: &str, detail: impl ToString) -> ProviderError {
        ProviderError::InvalidParameter {
            provider: self.provider_name().to_string(),
            param: param.to_string(),
            detail: detail.to_string(),
        }
    }

    /// 快捷方法：未知错误（fallback）
    fn unknown_error(&self, raw: RawApiError) -> ProviderError {
        ProviderError::Unknown {
            provider: self.provider_name().to_string(),
            raw_code: raw.code,
            raw_message: raw.message,
        }
    }
}

/// Registrar client contract.
///
/// Implementations are stateless with respect to records: every call goes to
/// the registrar, and nothing is cached between calls. Inputs are validated
/// before any network request is made. Implementations never retry; the
/// caller owns retry policy.
#[async_trait]
pub trait DnsRegistrar: Send + Sync {
    /// Registrar identifier, used in error messages and logs.
    fn id(&self) -> &'static str;

    /// Base domain every managed record must live under.
    fn base_domain(&self) -> &str;

    /// Feature flags the caller uses to pick ownership and ordering policies.
    fn capabilities(&self) -> RegistrarCapabilities;

    /// Look up the configured zone.
    async fn lookup_zone(&self) -> Result<Zone>;

    /// List every record in the zone that matches `filter`, walking all pages.
    async fn list_records(&self, filter: &RecordFilter) -> Result<Vec<DnsRecord>>;

    /// Fetch a single record by id.
    async fn get_record(&self, record_id: &str) -> Result<DnsRecord>;

    /// Create a record. Fails with [`ProviderError::RecordExists`] when the name is taken.
    async fn create_record(&self, record: &NewDnsRecord) -> Result<DnsRecord>;

    /// Delete a record by id. Fails with [`ProviderError::RecordNotFound`] for unknown ids.
    async fn delete_record(&self, record_id: &str) -> Result<()>;
}
