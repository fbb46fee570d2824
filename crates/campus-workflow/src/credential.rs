//! One-time credential generation.
//!
//! Credentials are drawn from `rand::rng()`, a ChaCha-based CSPRNG
//! seeded from the operating system. The alphabet leaves out the
//! look-alike characters `0`, `O`, `1`, `l` and `I`.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::config::MIN_TEMPORARY_CREDENTIAL_LENGTH;

const UPPER: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ";
const LOWER: &[u8] = b"abcdefghjkmnpqrstuvwxyz";
const DIGITS: &[u8] = b"23456789";
const SYMBOLS: &[u8] = b"!@#$%";

/// Generate a temporary credential of at least 12 characters containing
/// an upper-case letter, a lower-case letter, a digit and a symbol.
pub fn generate_temporary_credential(length: usize) -> String {
    let length = length.max(MIN_TEMPORARY_CREDENTIAL_LENGTH);
    let alphabet: Vec<u8> = [UPPER, LOWER, DIGITS, SYMBOLS].concat();
    let mut rng = rand::rng();

    let mut chars: Vec<u8> = [UPPER, LOWER, DIGITS, SYMBOLS]
        .iter()
        .map(|class| class[rng.random_range(0..class.len())])
        .collect();
    while chars.len() < length {
        chars.push(alphabet[rng.random_range(0..alphabet.len())]);
    }
    chars.shuffle(&mut rng);

    chars.into_iter().map(char::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_shorter_than_minimum() {
        assert_eq!(generate_temporary_credential(0).len(), 12);
        assert_eq!(generate_temporary_credential(16).len(), 16);
    }

    #[test]
    fn contains_every_character_class() {
        for _ in 0..50 {
            let credential = generate_temporary_credential(12);
            assert!(credential.bytes().any(|b| UPPER.contains(&b)));
            assert!(credential.bytes().any(|b| LOWER.contains(&b)));
            assert!(credential.bytes().any(|b| DIGITS.contains(&b)));
            assert!(credential.bytes().any(|b| SYMBOLS.contains(&b)));
        }
    }

    #[test]
    fn avoids_ambiguous_characters() {
        for _ in 0..50 {
            let credential = generate_temporary_credential(32);
            assert!(!credential.contains(['0', 'O', '1', 'l', 'I']));
        }
    }

    #[test]
    fn successive_credentials_differ() {
        assert_ne!(
            generate_temporary_credential(12),
            generate_temporary_credential(12)
        );
    }
}
