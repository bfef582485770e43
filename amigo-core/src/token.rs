//! Access token minting.

use ring::rand::{SecureRandom, SystemRandom};

/// Number of random bytes behind each token.
pub const TOKEN_BYTES: usize = 32;

/// Mint a URL-safe, unpadded base64 token from the system CSPRNG.
pub fn mint_access_token(rng: &SystemRandom) -> Result<String, ring::error::Unspecified> {
    let mut bytes = [0u8; TOKEN_BYTES];
    rng.fill(&mut bytes)?;
    Ok(fast32::base64::RFC4648_URL_NOPAD.encode(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_tokens_are_url_safe_and_distinct() {
        let rng = SystemRandom::new();
        let tokens: HashSet<String> = (0..100).map(|_| mint_access_token(&rng).unwrap()).collect();
        assert_eq!(tokens.len(), 100);
        for token in &tokens {
            // 32 bytes -> 43 base64 characters without padding.
            assert_eq!(token.len(), 43);
            assert!(
                token
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            );
        }
    }
}
