use rand::RngExt;

use crate::error::{RegistryError, RegistryResult};

/// Character set for short codes (0-9, A-Z, a-z)
pub const ALPHABET: &[u8; 62] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Produces candidate short codes.
///
/// Generators do not touch storage; uniqueness is the caller's problem.
pub trait CodeGenerator: Send + Sync + 'static {
    fn generate(&self) -> String;
}

/// Uniform random codes of a fixed length over [`ALPHABET`]
#[derive(Debug, Clone)]
pub struct RandomCodeGenerator {
    length: usize,
}

impl RandomCodeGenerator {
    pub fn new(length: usize) -> Self {
        Self { length }
    }
}

impl Default for RandomCodeGenerator {
    fn default() -> Self {
        Self::new(6)
    }
}

impl CodeGenerator for RandomCodeGenerator {
    fn generate(&self) -> String {
        let mut rng = rand::rng();
        (0..self.length)
            .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
            .collect()
    }
}

/// Check a caller-supplied code against the length bounds and alphabet
pub fn validate_custom_code(code: &str, min_len: usize, max_len: usize) -> RegistryResult<()> {
    let len = code.chars().count();
    if len < min_len || len > max_len {
        return Err(RegistryError::InvalidShortcodeFormat(format!(
            "'{code}' must be {min_len}-{max_len} characters long"
        )));
    }

    if !code.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(RegistryError::InvalidShortcodeFormat(format!(
            "'{code}' may only contain letters and digits"
        )));
    }

    Ok(())
}
