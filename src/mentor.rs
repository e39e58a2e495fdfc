//! Shared-password gate for mentor read access.

use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Granted,
    Denied,
    /// Nothing was typed; callers show no error for this.
    NoInput,
}

impl GateDecision {
    pub fn is_granted(&self) -> bool {
        matches!(self, GateDecision::Granted)
    }
}

#[derive(Clone)]
pub struct MentorGate {
    secret: Option<[u8; 32]>,
}

impl std::fmt::Debug for MentorGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MentorGate")
            .field("configured", &self.secret.is_some())
            .finish()
    }
}

fn sha256(input: &str) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(input.as_bytes()));
    out
}

impl MentorGate {
    /// A gate that never grants.
    pub fn disabled() -> Self {
        Self { secret: None }
    }

    pub fn from_password(password: &str) -> Self {
        Self {
            secret: Some(sha256(password)),
        }
    }

    /// Build from a 64-character SHA-256 hex digest of the password.
    pub fn from_sha256_hex(digest_hex: &str) -> anyhow::Result<Self> {
        let bytes = hex::decode(digest_hex.trim())
            .map_err(|e| anyhow::anyhow!("mentor password digest is not hex: {e}"))?;
        let secret: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
            anyhow::anyhow!(
                "mentor password digest must be 32 bytes, got {}",
                b.len()
            )
        })?;
        Ok(Self {
            secret: Some(secret),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    pub fn check(&self, input: &str) -> GateDecision {
        if input.is_empty() {
            return GateDecision::NoInput;
        }
        let Some(secret) = self.secret else {
            return GateDecision::Denied;
        };
        let given = sha256(input);
        let diff = secret
            .iter()
            .zip(given.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b));
        if diff == 0 {
            GateDecision::Granted
        } else {
            GateDecision::Denied
        }
    }
}
