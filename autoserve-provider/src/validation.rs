//! Client-side input validation.
//!
//! Every check here runs before a request is sent, so malformed input never
//! costs a round trip or shows up in registrar audit logs.

use std::net::IpAddr;

use crate::error::{ProviderError, Result};
use crate::providers::common::normalize_domain_name;
use crate::types::{DnsRecordType, NewDnsRecord};

/// Longest record or zone id the registrar issues.
pub const MAX_ID_LEN: usize = 32;
/// Smallest explicit TTL accepted (seconds).
pub const MIN_TTL: u32 = 60;
/// Largest explicit TTL accepted (seconds).
pub const MAX_TTL: u32 = 86_400;
/// Longest single DNS label (RFC 1035).
pub const MAX_LABEL_LEN: usize = 63;
/// Longest fully qualified name (RFC 1035).
pub const MAX_NAME_LEN: usize = 253;

fn invalid(provider: &str, param: &str, detail: impl Into<String>) -> ProviderError {
    ProviderError::InvalidParameter {
        provider: provider.to_string(),
        param: param.to_string(),
        detail: detail.into(),
    }
}

/// Checks that `name` is non-empty and lies strictly under `base_domain`.
pub fn validate_name(name: &str, base_domain: &str, provider: &str) -> Result<()> {
    let name = normalize_domain_name(name);
    let base = normalize_domain_name(base_domain);
    if name.is_empty() {
        return Err(invalid(provider, "name", "name cannot be empty"));
    }
    let Some(label) = name.strip_suffix(&format!(".{base}")) else {
        return Err(invalid(
            provider,
            "name",
            format!("'{name}' is not under base domain '{base}'"),
        ));
    };
    if label.is_empty() || label.split('.').any(str::is_empty) {
        return Err(invalid(provider, "name", format!("'{name}' has an empty label")));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(invalid(
            provider,
            "name",
            format!("'{name}' is longer than {MAX_NAME_LEN} characters"),
        ));
    }
    if let Some(long) = label.split('.').find(|l| l.len() > MAX_LABEL_LEN) {
        return Err(invalid(
            provider,
            "name",
            format!("label '{long}' is longer than {MAX_LABEL_LEN} characters"),
        ));
    }
    Ok(())
}

/// Checks that `content` parses as the address family `record_type` requires.
pub fn validate_content(record_type: DnsRecordType, content: &str, provider: &str) -> Result<()> {
    if content.trim().is_empty() {
        return Err(invalid(provider, "content", "content cannot be empty"));
    }
    match record_type {
        DnsRecordType::A => match content.parse::<IpAddr>() {
            Ok(IpAddr::V4(_)) => Ok(()),
            _ => Err(invalid(
                provider,
                "content",
                format!("'{content}' is not a valid IPv4 address"),
            )),
        },
        DnsRecordType::Aaaa => match content.parse::<IpAddr>() {
            Ok(IpAddr::V6(_)) => Ok(()),
            _ => Err(invalid(
                provider,
                "content",
                format!("'{content}' is not a valid IPv6 address"),
            )),
        },
        DnsRecordType::Cname => Ok(()),
    }
}

/// TTL must be `1` (automatic) or within `60..=86400`.
pub fn validate_ttl(ttl: u32, provider: &str) -> Result<()> {
    if ttl == NewDnsRecord::AUTO_TTL || (MIN_TTL..=MAX_TTL).contains(&ttl) {
        Ok(())
    } else {
        Err(invalid(
            provider,
            "ttl",
            format!("ttl must be 1 (automatic) or between {MIN_TTL} and {MAX_TTL} seconds, got {ttl}"),
        ))
    }
}

/// Record ids are opaque but never empty and never longer than [`MAX_ID_LEN`].
pub fn validate_record_id(record_id: &str, provider: &str) -> Result<()> {
    if record_id.trim().is_empty() {
        return Err(invalid(provider, "record_id", "record id cannot be empty"));
    }
    if record_id.len() > MAX_ID_LEN {
        return Err(invalid(
            provider,
            "record_id",
            format!("record id must not exceed {MAX_ID_LEN} characters"),
        ));
    }
    if !record_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(invalid(
            provider,
            "record_id",
            format!("record id '{record_id}' contains invalid characters"),
        ));
    }
    Ok(())
}

/// Runs every check that applies to a record about to be created.
pub fn validate_new_record(record: &NewDnsRecord, base_domain: &str, provider: &str) -> Result<()> {
    validate_name(&record.name, base_domain, provider)?;
    validate_content(record.record_type, &record.content, provider)?;
    validate_ttl(record.ttl, provider)
}
