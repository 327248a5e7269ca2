//! Ownership tagging
//!
//! A record is tool-owned when the registrar's own copy says so. Two policies
//! exist, picked from the registrar's capabilities:
//!
//! - [`OwnershipPolicy::Comment`]: the record comment carries
//!   [`IDENTITY_MARKER`]. Records whose comment starts with [`LEGACY_PREFIX`]
//!   (written by older releases) also count as owned.
//! - [`OwnershipPolicy::NamingConvention`]: the first label of the name starts
//!   with a reserved prefix. Used only for registrars without a comment field.

use autoserve_provider::{DnsRecord, NewDnsRecord, RegistrarCapabilities};
use serde::{Deserialize, Serialize};

use crate::allocator::MAX_LABEL_LEN;
use crate::error::{CoreError, CoreResult};

/// Human-readable part of the comment on tool-owned records
pub const DEFAULT_COMMENT: &str = "Auto-generated subdomain for file server";
/// Prefix recognized on comments written before the identity marker existed
pub const LEGACY_PREFIX: &str = "Auto-generated subdomain";
/// Machine-readable identity appended to every tool-owned comment
pub const IDENTITY_MARKER: &str = "[managed-by=autoserve]";
/// Reserved first-label prefix for the naming-convention fallback
pub const DEFAULT_LABEL_PREFIX: &str = "as-";

/// Read access to the fields ownership is decided on
pub trait OwnershipFields {
    fn record_name(&self) -> &str;
    fn record_comment(&self) -> Option<&str>;
}

impl OwnershipFields for DnsRecord {
    fn record_name(&self) -> &str {
        &self.name
    }

    fn record_comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }
}

impl OwnershipFields for NewDnsRecord {
    fn record_name(&self) -> &str {
        &self.name
    }

    fn record_comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }
}

/// How tool-owned records are marked and recognized
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OwnershipPolicy {
    /// Marker stored in the record comment
    Comment { comment: String },
    /// Reserved prefix on the first label of the record name
    NamingConvention { prefix: String },
}

impl Default for OwnershipPolicy {
    fn default() -> Self {
        Self::Comment {
            comment: DEFAULT_COMMENT.to_string(),
        }
    }
}

impl OwnershipPolicy {
    /// Comment policy when the registrar stores comments, naming fallback otherwise.
    #[must_use]
    pub fn for_capabilities(capabilities: RegistrarCapabilities) -> Self {
        if capabilities.supports_comments {
            Self::default()
        } else {
            Self::NamingConvention {
                prefix: DEFAULT_LABEL_PREFIX.to_string(),
            }
        }
    }

    /// Marks `record` as tool-owned. Name, content and type are never touched.
    #[must_use]
    pub fn tag(&self, mut record: NewDnsRecord) -> NewDnsRecord {
        if let Self::Comment { comment } = self {
            let text = record
                .comment
                .take()
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| comment.clone());
            record.comment = Some(if text.contains(IDENTITY_MARKER) {
                text
            } else {
                format!("{text} {IDENTITY_MARKER}")
            });
        }
        record
    }

    /// Whether the registrar-side data marks this record as tool-owned.
    pub fn is_owned(&self, record: &impl OwnershipFields) -> bool {
        match self {
            Self::Comment { .. } => record.record_comment().is_some_and(|c| {
                c.contains(IDENTITY_MARKER) || c.trim_start().starts_with(LEGACY_PREFIX)
            }),
            Self::NamingConvention { prefix } => record
                .record_name()
                .split('.')
                .next()
                .is_some_and(|label| label.starts_with(prefix.as_str())),
        }
    }

    /// Turns an allocated or user-supplied label into the label to publish.
    ///
    /// Under the naming convention, generated labels get the prefix prepended
    /// and user labels must already carry it, so `is_owned(tag(r))` holds for
    /// every record this policy produces.
    /// The prefixed label must still fit in [`MAX_LABEL_LEN`].
    pub fn prepare_label(&self, label: &str, generated: bool) -> CoreResult<String> {
        match self {
            Self::Comment { .. } => Ok(label.to_string()),
            Self::NamingConvention { prefix } if generated => {
                if prefix.len() + label.len() > MAX_LABEL_LEN {
                    return Err(CoreError::Validation(format!(
                        "subdomain length {} plus prefix '{prefix}' exceeds {MAX_LABEL_LEN} characters",
                        label.len()
                    )));
                }
                Ok(format!("{prefix}{label}"))
            }
            Self::NamingConvention { prefix } if label.starts_with(prefix.as_str()) => {
                Ok(label.to_string())
            }
            Self::NamingConvention { prefix } => Err(CoreError::Validation(format!(
                "subdomain '{label}' must start with '{prefix}' on registrars without record comments"
            ))),
        }
    }
}
