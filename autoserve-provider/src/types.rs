use serde::{Deserialize, Serialize};

// ============ Record Types ============

/// DNS record types this tool creates and recognizes.
///
/// Serialized as uppercase strings (`"A"`, `"AAAA"`, `"CNAME"`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DnsRecordType {
    /// IPv4 address record.
    #[default]
    A,
    /// IPv6 address record.
    Aaaa,
    /// Canonical name (alias) record.
    Cname,
}

impl DnsRecordType {
    /// Wire representation used by registrar APIs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::Aaaa => "AAAA",
            Self::Cname => "CNAME",
        }
    }

    /// Picks `A` or `AAAA` for an address.
    #[must_use]
    pub const fn for_ip(ip: &std::net::IpAddr) -> Self {
        match ip {
            std::net::IpAddr::V4(_) => Self::A,
            std::net::IpAddr::V6(_) => Self::Aaaa,
        }
    }
}

impl std::fmt::Display for DnsRecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============ Records ============

/// A DNS record as stored by the registrar.
///
/// The registrar is the only source of truth: every field here is read back
/// from the API, including the `comment` used for ownership tagging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DnsRecord {
    /// Registrar-assigned record identifier.
    pub id: String,
    /// Fully-qualified record name (e.g., `"demo.example.com"`).
    pub name: String,
    /// Record type.
    pub record_type: DnsRecordType,
    /// IP address or CNAME target.
    pub content: String,
    /// Whether traffic is proxied by the registrar's edge.
    pub proxied: bool,
    /// Time to live in seconds (`1` means automatic).
    pub ttl: u32,
    /// Free-form metadata stored alongside the record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    /// When the record was created, if known.
    #[serde(with = "crate::utils::datetime")]
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,

    /// When the record was last updated, if known.
    #[serde(with = "crate::utils::datetime")]
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// A record that has not been created yet (no registrar id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDnsRecord {
    /// Fully-qualified record name.
    pub name: String,
    /// Record type.
    pub record_type: DnsRecordType,
    /// IP address or CNAME target.
    pub content: String,
    /// Whether traffic is proxied by the registrar's edge.
    pub proxied: bool,
    /// Time to live in seconds (`1` means automatic).
    pub ttl: u32,
    /// Free-form metadata stored alongside the record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl NewDnsRecord {
    /// Automatic TTL sentinel understood by Cloudflare.
    pub const AUTO_TTL: u32 = 1;

    /// Builds an address record, choosing `A` or `AAAA` from the address family.
    #[must_use]
    pub fn address(name: impl Into<String>, ip: std::net::IpAddr, proxied: bool, ttl: u32) -> Self {
        Self {
            name: name.into(),
            record_type: DnsRecordType::for_ip(&ip),
            content: ip.to_string(),
            proxied,
            ttl,
            comment: None,
        }
    }
}

/// Filter applied by [`list_records`](crate::DnsRegistrar::list_records).
///
/// All fields are optional; the default lists every record in the zone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordFilter {
    /// Exact fully-qualified name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Record type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_type: Option<DnsRecordType>,
}

impl RecordFilter {
    /// Filter matching one exact name.
    #[must_use]
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            record_type: None,
        }
    }
}

// ============ Zones ============

/// A DNS zone at the registrar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    /// Registrar zone identifier.
    pub id: String,
    /// Zone apex (e.g., `"example.com"`).
    pub name: String,
    /// Raw registrar status (`"active"`, `"pending"`, ...).
    pub status: String,
}

// ============ Capabilities ============

/// What a registrar supports, used by higher layers to pick policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrarCapabilities {
    /// Records carry a free-form comment field that round-trips through the API.
    pub supports_comments: bool,
    /// Listing returns records in a stable, documented order.
    pub ordered_listing: bool,
}
