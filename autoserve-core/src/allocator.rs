//! Subdomain label allocation.

use std::collections::HashSet;

use rand::Rng;

use crate::error::{CoreError, CoreResult};

/// Lowercase letters and digits with the look-alikes `0 o 1 l i` removed
pub const UNAMBIGUOUS_CHARSET: &[u8] = b"abcdefghjkmnpqrstuvwxyz23456789";
/// Default generated label length
pub const DEFAULT_LENGTH: usize = 8;
/// DNS label length limit
pub const MAX_LABEL_LEN: usize = 63;

const MAX_DRAWS: usize = 1000;

/// Generates random labels, never handing out the same one twice
#[derive(Debug, Default)]
pub struct SubdomainAllocator {
    issued: HashSet<String>,
}

impl SubdomainAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a fresh label of exactly `length` characters from
    /// [`UNAMBIGUOUS_CHARSET`].
    pub fn generate(&mut self, length: usize) -> CoreResult<String> {
        if length == 0 || length > MAX_LABEL_LEN {
            return Err(CoreError::Validation(format!(
                "subdomain length must be between 1 and {MAX_LABEL_LEN}, got {length}"
            )));
        }

        let mut rng = rand::rng();
        for _ in 0..MAX_DRAWS {
            let label: String = (0..length)
                .map(|_| char::from(UNAMBIGUOUS_CHARSET[rng.random_range(0..UNAMBIGUOUS_CHARSET.len())]))
                .collect();
            if self.issued.insert(label.clone()) {
                return Ok(label);
            }
        }

        // 仅在极短长度且已发放大部分组合时出现
        Err(CoreError::Validation(format!(
            "no unused subdomain of length {length} left"
        )))
    }

    /// Number of labels handed out so far.
    #[must_use]
    pub fn issued(&self) -> usize {
        self.issued.len()
    }
}

/// Normalizes and checks a user-supplied label (RFC 1123 hostname label).
pub fn validate_label(label: &str) -> CoreResult<String> {
    let label = label.trim().to_ascii_lowercase();
    if label.is_empty() || label.len() > MAX_LABEL_LEN {
        return Err(CoreError::Validation(format!(
            "subdomain must be 1 to {MAX_LABEL_LEN} characters"
        )));
    }
    if !label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
        return Err(CoreError::Validation(format!(
            "subdomain '{label}' may only contain letters, digits and '-'"
        )));
    }
    if label.starts_with('-') || label.ends_with('-') {
        return Err(CoreError::Validation(format!(
            "subdomain '{label}' must not start or end with '-'"
        )));
    }
    Ok(label)
}
