//! DNS record related type definitions

use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use autoserve_provider::{DnsRecord, NewDnsRecord};

use crate::allocator::DEFAULT_LENGTH;

/// Request for [`DnsService::create_record`](crate::services::DnsService::create_record)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecordRequest {
    /// User-supplied label; `None` allocates a random one
    pub subdomain: Option<String>,
    /// Address to publish; `None` resolves one
    pub ip: Option<IpAddr>,
    /// Length of an allocated label
    pub length: usize,
    pub proxied: bool,
    /// `1` means automatic
    pub ttl: u32,
    /// Ask public detection endpoints before falling back to the local address
    pub prefer_public: bool,
    /// Extra human-readable text for the record comment
    pub comment: Option<String>,
}

impl Default for CreateRecordRequest {
    fn default() -> Self {
        Self {
            subdomain: None,
            ip: None,
            length: DEFAULT_LENGTH,
            proxied: true,
            ttl: NewDnsRecord::AUTO_TTL,
            prefer_public: true,
            comment: None,
        }
    }
}

/// A registrar record plus its ownership classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedRecord {
    #[serde(flatten)]
    pub record: DnsRecord,
    pub owned_by_tool: bool,
}

/// Result of a create call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOutcome {
    #[serde(flatten)]
    pub managed: ManagedRecord,
    /// Registrar attempts spent on name conflicts before this one succeeded
    pub conflicts: u32,
    /// Returned from the session cache without calling the registrar
    pub reused: bool,
}

/// Result of a delete call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutcome {
    /// The record as it was just before deletion
    pub record: DnsRecord,
    pub owned_by_tool: bool,
}

/// One failed delete during cleanup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupFailure {
    pub record_id: String,
    pub name: String,
    pub kind: String,
    pub reason: String,
}

/// Result of deleting every tool-owned record
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupReport {
    pub deleted: Vec<DnsRecord>,
    pub failures: Vec<CleanupFailure>,
}

impl CleanupReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
