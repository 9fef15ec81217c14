use sha2::{Digest, Sha256};
use std::fmt;

use crate::error::Result;
use crate::models::ClusterSnapshot;

/// Content hash of a snapshot. Equal fingerprints mean nothing worth broadcasting changed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// SHA-256 over the canonical JSON form. Struct fields serialize in declaration
/// order and label maps are `BTreeMap`s, so the bytes depend only on content.
pub fn fingerprint(snapshot: &ClusterSnapshot) -> Result<Fingerprint> {
    let canonical = serde_json::to_vec(snapshot)?;
    let digest = Sha256::digest(&canonical);
    let hex = digest.iter().map(|b| format!("{:02x}", b)).collect::<String>();
    Ok(Fingerprint(hex))
}
