//! Cloudflare error mapping

use crate::error::ProviderError;
use crate::traits::{ErrorContext, ProviderErrorMapper, RawApiError};

use super::CloudflareProvider;

/// Cloudflare error code mapping
/// Reference: <https://api.cloudflare.com/#getting-started-responses>
impl ProviderErrorMapper for CloudflareProvider {
    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }

    fn map_error(&self, raw: RawApiError, context: ErrorContext) -> ProviderError {
        // 冲突判定优先：状态码或错误码任一命中即视为记录已存在
        if self.conflicts.matches(raw.http_status, raw.code.as_deref()) {
            return ProviderError::RecordExists {
                provider: self.provider_name().to_string(),
                record_name: context
                    .record_name
                    .unwrap_or_else(|| "<unknown>".to_string()),
                raw_message: Some(raw.message),
            };
        }

        match raw.code.as_deref() {
            // Authentication error
            // 6003: Invalid request headers
            // 6103: Invalid format for X-Auth-Key header
            // 6111: Invalid format for Authorization header
            // 9103: Unknown X-Auth-Key or X-Auth-Email
            // 9109: Unauthorized to access requested resource / Max auth failures reached
            // 10000: Authentication error
            Some("6003" | "6103" | "6111" | "9103" | "9109" | "10000") => {
                ProviderError::InvalidCredentials {
                    provider: self.provider_name().to_string(),
                    raw_message: Some(raw.message),
                }
            }

            // Invalid parameter
            // 1004: DNS Validation Error
            // 9000: Invalid or missing name
            // 9005: Content for A record is invalid. Must be a valid IPv4 address
            // 9006: Content for AAAA record is invalid. Must be a valid IPv6 address
            // 9021: Invalid TTL. Must be between 120 and 2147483647 seconds or 1 for automatic
            // 9041: This DNS record cannot be proxied
            Some(code @ ("1004" | "9000" | "9005" | "9006" | "9021" | "9041")) => {
                let param = match code {
                    "9000" => "name",
                    "9005" | "9006" => "content",
                    "9021" => "ttl",
                    "9041" => "proxied",
                    // "1004" is a general validation error.
                    _ => "general",
                };
                ProviderError::InvalidParameter {
                    provider: self.provider_name().to_string(),
                    param: param.to_string(),
                    detail: raw.message,
                }
            }

            // Record does not exist
            // 81044: Record does not exist
            Some("81044") => self.record_not_found(raw, context),

            // Quota exceeded
            // 81045: The record quota has been exceeded
            Some("81045") => ProviderError::QuotaExceeded {
                provider: self.provider_name().to_string(),
                raw_message: Some(raw.message),
            },

            // Zone does not exist
            // 1001: Invalid zone identifier
            // 7000: No route for that URI
            // 7003: Could not route to /path. perhaps your object identifier is invalid?
            Some("1001" | "7000" | "7003") => self.zone_not_found(raw, context),

            // 错误码未知时按 HTTP 状态码兜底
            _ => match raw.http_status {
                Some(401) => ProviderError::InvalidCredentials {
                    provider: self.provider_name().to_string(),
                    raw_message: Some(raw.message),
                },
                Some(403) => ProviderError::PermissionDenied {
                    provider: self.provider_name().to_string(),
                    raw_message: Some(raw.message),
                },
                Some(404) if context.record_id.is_some() => self.record_not_found(raw, context),
                Some(404) => self.zone_not_found(raw, context),
                _ => self.unknown_error(raw),
            },
        }
    }
}

impl CloudflareProvider {
    fn record_not_found(&self, raw: RawApiError, context: ErrorContext) -> ProviderError {
        ProviderError::RecordNotFound {
            provider: self.provider_name().to_string(),
            record_id: context.record_id.unwrap_or_else(|| "<unknown>".to_string()),
            raw_message: Some(raw.message),
        }
    }

    fn zone_not_found(&self, raw: RawApiError, context: ErrorContext) -> ProviderError {
        ProviderError::ZoneNotFound {
            provider: self.provider_name().to_string(),
            zone: context.zone.unwrap_or_else(|| self.zone_id.clone()),
            raw_message: Some(raw.message),
        }
    }
}
