//! Error signatures.
//!
//! A signature fingerprints a class of errors: the tool name plus the first
//! 100 characters of the error text, hashed. Long errors that only differ
//! after character 100 share a signature and are grouped as one pattern.

use sha2::{Digest, Sha256};

/// Characters of error text that contribute to a signature.
pub const SIGNATURE_TEXT_CHARS: usize = 100;

/// Hex characters kept from the digest.
pub const SIGNATURE_LEN: usize = 16;

/// Compute the 16-hex-character signature of a tool error.
///
/// SHA-256 over `"{tool}:{first 100 chars of error}"`, hex encoded and cut
/// to 16 characters.
#[must_use]
pub fn calculate_error_signature(tool_name: &str, error_text: &str) -> String {
    let truncated: String = error_text.chars().take(SIGNATURE_TEXT_CHARS).collect();
    let digest = Sha256::digest(format!("{tool_name}:{truncated}").as_bytes());
    let mut signature = hex::encode(digest);
    signature.truncate(SIGNATURE_LEN);
    signature
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_shape() {
        let sig = calculate_error_signature("Bash", "command not found: xyz");
        assert_eq!(sig.len(), SIGNATURE_LEN);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_known_digest_prefix() {
        let expected = hex::encode(Sha256::digest(b"Bash:"));
        assert_eq!(calculate_error_signature("Bash", ""), expected[..16]);
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(
            calculate_error_signature("Bash", "permission denied"),
            calculate_error_signature("Bash", "permission denied")
        );
    }

    #[test]
    fn test_tool_sensitive() {
        assert_ne!(
            calculate_error_signature("Bash", "file not found"),
            calculate_error_signature("Read", "file not found")
        );
    }

    #[test]
    fn test_error_sensitive() {
        assert_ne!(
            calculate_error_signature("Bash", "file not found"),
            calculate_error_signature("Bash", "permission denied")
        );
    }

    #[test]
    fn test_truncation_groups_long_errors() {
        let prefix = "x".repeat(100);
        let a = format!("{prefix} first tail");
        let b = format!("{prefix} second tail");

        assert_eq!(calculate_error_signature("Bash", &a), calculate_error_signature("Bash", &b));
        assert_eq!(calculate_error_signature("Bash", &a), calculate_error_signature("Bash", &prefix));
    }

    #[test]
    fn test_truncation_counts_characters() {
        let prefix = "é".repeat(100);
        let long = format!("{prefix}tail");
        assert_eq!(
            calculate_error_signature("Edit", &long),
            calculate_error_signature("Edit", &prefix)
        );
    }
}
