// SecretMasker: replaces registered credential values in strings destined
// for log output. Tokens and client secrets are registered at startup and
// any upstream error body is masked before it is logged.

use parking_lot::RwLock;
use std::sync::Arc;

const MASK: &str = "***";

/// Thread-safe store of secret values with string masking.
#[derive(Debug, Clone, Default)]
pub struct SecretMasker {
    secrets: Arc<RwLock<Vec<String>>>,
}

impl SecretMasker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a secret. Blank values are ignored.
    pub fn add(&self, secret: &str) {
        let trimmed = secret.trim();
        if trimmed.is_empty() {
            return;
        }
        let mut secrets = self.secrets.write();
        if !secrets.iter().any(|s| s == trimmed) {
            secrets.push(trimmed.to_string());
            // Longest first so a secret that contains another is masked whole.
            secrets.sort_by_key(|s| std::cmp::Reverse(s.len()));
        }
    }

    /// Replace every registered secret in `input` with `***`.
    pub fn mask(&self, input: &str) -> String {
        let secrets = self.secrets.read();
        let mut output = input.to_string();
        for secret in secrets.iter() {
            if output.contains(secret.as_str()) {
                output = output.replace(secret.as_str(), MASK);
            }
        }
        output
    }
}
