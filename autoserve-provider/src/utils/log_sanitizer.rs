//! Log sanitization utilities
//!
//! Keeps API keys out of logs and stops large registrar responses from
//! flooding debug output.

/// Maximum number of bytes of a response body included in log output.
const TRUNCATE_LIMIT: usize = 256;

/// Number of leading characters kept visible when masking a secret.
const VISIBLE_SECRET_PREFIX: usize = 4;

fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        s.len()
    } else {
        let mut i = index;
        while i > 0 && !s.is_char_boundary(i) {
            i -= 1;
        }
        i
    }
}

/// Truncate a string for safe logging.
///
/// Strings within the limit are returned unchanged; longer ones are cut on a
/// character boundary and suffixed with the original length.
pub fn truncate_for_log(s: &str) -> String {
    if s.len() <= TRUNCATE_LIMIT {
        s.to_string()
    } else {
        format!(
            "{}... [truncated, total {} bytes]",
            &s[..floor_char_boundary(s, TRUNCATE_LIMIT)],
            s.len()
        )
    }
}

/// Mask a credential, keeping only a short prefix for identification.
///
/// Short secrets are masked entirely.
pub fn mask_secret(secret: &str) -> String {
    let visible: String = secret.chars().take(VISIBLE_SECRET_PREFIX).collect();
    if secret.chars().count() <= VISIBLE_SECRET_PREFIX * 2 {
        "****".to_string()
    } else {
        format!("{visible}****")
    }
}
