use sha2::{Digest, Sha256};

/// SHA-256 over the canonical preimage, as 64 lowercase hex characters.
///
/// The preimage is the five fields concatenated with no delimiters, numbers
/// in plain base-10. Changing this breaks every stored chain.
pub fn calculate_hash(
    index: u64,
    timestamp: i64,
    data: &str,
    nonce: u64,
    previous_hash: &str,
) -> String {
    let preimage = format!("{index}{timestamp}{data}{nonce}{previous_hash}");
    let mut hasher = Sha256::new();
    hasher.update(preimage.as_bytes());
    hex::encode(hasher.finalize())
}

/// True when the first `difficulty` characters of `hash` are all `'0'`.
pub fn meets_difficulty(hash: &str, difficulty: u32) -> bool {
    let d = difficulty as usize;
    hash.len() >= d && hash.as_bytes()[..d].iter().all(|&b| b == b'0')
}

/// The `"000…"` prefix a hash must start with at the given difficulty.
pub fn target_prefix(difficulty: u32) -> String {
    "0".repeat(difficulty as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic_lowercase_hex() {
        let a = calculate_hash(1, 1_700_000_000_000, "hello", 42, "abc");
        let b = calculate_hash(1, 1_700_000_000_000, "hello", 42, "abc");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn preimage_is_plain_concatenation() {
        let mut hasher = Sha256::new();
        hasher.update(b"01700000000000Genesis Block00");
        let expected = hex::encode(hasher.finalize());
        assert_eq!(
            calculate_hash(0, 1_700_000_000_000, "Genesis Block", 0, "0"),
            expected
        );
    }

    #[test]
    fn every_field_changes_the_digest() {
        let base = calculate_hash(3, 1000, "data", 7, "prev");
        assert_ne!(base, calculate_hash(4, 1000, "data", 7, "prev"));
        assert_ne!(base, calculate_hash(3, 1001, "data", 7, "prev"));
        assert_ne!(base, calculate_hash(3, 1000, "date", 7, "prev"));
        assert_ne!(base, calculate_hash(3, 1000, "data", 8, "prev"));
        assert_ne!(base, calculate_hash(3, 1000, "data", 7, "prew"));
    }

    #[test]
    fn difficulty_predicate() {
        assert!(meets_difficulty("00ab", 2));
        assert!(meets_difficulty("000b", 2));
        assert!(!meets_difficulty("0a0b", 2));
        assert!(meets_difficulty("abcd", 0));
        assert!(!meets_difficulty("00", 3));
        assert_eq!(target_prefix(4), "0000");
    }
}
