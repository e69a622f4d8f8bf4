//! Invite code generation and normalization

use rand::Rng;

use crate::validation::INVITE_CODE_LEN;

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generate a random 6-character uppercase alphanumeric code
///
/// Uniqueness is the caller's concern; the store rejects duplicates.
pub fn generate() -> String {
    let mut rng = rand::thread_rng();
    (0..INVITE_CODE_LEN)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

/// Canonical form used for lookup (codes are case-insensitive)
pub fn normalize(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Whether `code` is already in canonical form
pub fn is_well_formed(code: &str) -> bool {
    code.len() == INVITE_CODE_LEN && code.bytes().all(|b| CHARSET.contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_codes_are_well_formed() {
        for _ in 0..500 {
            let code = generate();
            assert_eq!(code.len(), 6);
            assert!(is_well_formed(&code), "bad code {}", code);
        }
    }

    #[test]
    fn test_normalize_uppercases() {
        assert_eq!(normalize("ab12cd"), "AB12CD");
        assert_eq!(normalize(" Ab12cD "), "AB12CD");
    }

    #[test]
    fn test_lowercase_is_not_canonical() {
        assert!(!is_well_formed("ab12cd"));
        assert!(is_well_formed("AB12CD"));
        assert!(!is_well_formed("AB-2CD"));
    }
}
