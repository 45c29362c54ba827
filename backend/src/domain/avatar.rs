//! Default avatar derived from the account email.

use sha2::{Digest, Sha256};

use super::EmailAddress;

const GRAVATAR_BASE: &str = "https://www.gravatar.com/avatar/";

/// Gravatar URL for `email`, falling back to a generated identicon.
///
/// Gravatar hashes the trimmed, lower-cased address with SHA-256.
///
/// # Examples
/// ```
/// use contacts_backend::domain::{EmailAddress, gravatar_url};
///
/// let email = EmailAddress::new("Ada@Example.com").unwrap();
/// assert!(gravatar_url(&email).starts_with("https://www.gravatar.com/avatar/"));
/// ```
#[must_use]
pub fn gravatar_url(email: &EmailAddress) -> String {
    let normalized = email.as_str().trim().to_lowercase();
    let digest = Sha256::digest(normalized.as_bytes());
    format!("{GRAVATAR_BASE}{}?d=identicon", hex::encode(digest))
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;

    #[test]
    fn hash_ignores_case() {
        let lower = EmailAddress::new("ada@example.com").expect("email");
        let mixed = EmailAddress::new("ADA@Example.COM").expect("email");
        assert_eq!(gravatar_url(&lower), gravatar_url(&mixed));
    }

    #[test]
    fn url_embeds_sha256_hex_digest() {
        let email = EmailAddress::new("ada@example.com").expect("email");
        let url = gravatar_url(&email);
        let digest = url
            .trim_start_matches(GRAVATAR_BASE)
            .trim_end_matches("?d=identicon");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
