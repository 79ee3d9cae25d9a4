use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand_core::{OsRng, RngCore};

use super::error::LedgerError;

/// Bytes of entropy per nonce unless configured otherwise.
pub const DEFAULT_NONCE_LEN: usize = 10;

/// An opaque single-use credential bound to one account.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Nonce(String);

impl Nonce {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Nonce {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Nonce {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Nonce {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Nonces are credentials, keep them out of debug output.
impl fmt::Debug for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Nonce(..)")
    }
}

#[cfg(test)]
impl From<&str> for Nonce {
    fn from(value: &str) -> Self {
        Nonce(value.to_owned())
    }
}

/// Produces URL-safe random nonces of a fixed entropy length.
#[derive(Debug, Clone, Copy)]
pub struct NonceGenerator {
    len: usize,
    #[cfg(test)]
    offline: bool,
}

impl Default for NonceGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_NONCE_LEN)
    }
}

impl NonceGenerator {
    pub fn new(len: usize) -> Self {
        Self {
            len,
            #[cfg(test)]
            offline: false,
        }
    }

    /// A generator whose entropy source always fails.
    #[cfg(test)]
    pub(crate) fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    /// Generate a nonce from the operating system's entropy source.
    pub fn generate(&self) -> Result<Nonce, LedgerError> {
        #[cfg(test)]
        if self.offline {
            return self.generate_with(&mut OfflineRng);
        }
        self.generate_with(&mut OsRng)
    }

    /// Generate a nonce from the given entropy source.
    pub fn generate_with<R: RngCore + ?Sized>(&self, rng: &mut R) -> Result<Nonce, LedgerError> {
        let mut bytes = vec![0u8; self.len];
        rng.try_fill_bytes(&mut bytes)?;
        Ok(Nonce(URL_SAFE_NO_PAD.encode(bytes)))
    }
}

/// An entropy source that always fails.
#[cfg(test)]
struct OfflineRng;

#[cfg(test)]
impl RngCore for OfflineRng {
    fn next_u32(&mut self) -> u32 {
        unreachable!("only try_fill_bytes is used")
    }

    fn next_u64(&mut self) -> u64 {
        unreachable!("only try_fill_bytes is used")
    }

    fn fill_bytes(&mut self, _dest: &mut [u8]) {
        unreachable!("only try_fill_bytes is used")
    }

    fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand_core::Error> {
        Err(rand_core::Error::new("entropy source offline"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_default_nonce_is_url_safe() {
        let nonce = NonceGenerator::default().generate().unwrap();

        // 10 bytes -> 14 base64 chars without padding
        assert_eq!(nonce.as_str().len(), 14);
        assert!(nonce
            .as_str()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_length_follows_config() {
        let nonce = NonceGenerator::new(32).generate().unwrap();
        assert_eq!(URL_SAFE_NO_PAD.decode(nonce.as_str()).unwrap().len(), 32);
    }

    #[test]
    fn test_nonces_do_not_repeat() {
        let generator = NonceGenerator::default();
        let nonces: HashSet<_> = (0..1000).map(|_| generator.generate().unwrap()).collect();
        assert_eq!(nonces.len(), 1000);
    }

    #[test]
    fn test_broken_entropy_source_is_reported() {
        let err = NonceGenerator::default()
            .generate_with(&mut OfflineRng)
            .unwrap_err();
        assert!(matches!(err, LedgerError::EntropyUnavailable(_)));
    }

    #[test]
    fn test_offline_generator_fails() {
        assert!(matches!(
            NonceGenerator::offline().generate(),
            Err(LedgerError::EntropyUnavailable(_))
        ));
    }

    #[test]
    fn test_debug_hides_value() {
        let nonce = Nonce::from("secret");
        assert_eq!(format!("{nonce:?}"), "Nonce(..)");
        assert_eq!(nonce.to_string(), "secret");
    }
}
