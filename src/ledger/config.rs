use super::error::ConfigError;
use super::nonce::DEFAULT_NONCE_LEN;

/// Tunables for a [`Ledger`](super::Ledger).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Bytes of entropy behind every issued nonce
    pub nonce_len: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            nonce_len: DEFAULT_NONCE_LEN,
        }
    }
}

impl LedgerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.nonce_len == 0 {
            return Err(ConfigError::ZeroNonceLength);
        }
        Ok(())
    }
}
