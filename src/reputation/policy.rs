//! Verification policy knobs

use serde::{Deserialize, Serialize};

/// Governance-configurable thresholds for the verification state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationPolicy {
    /// Upvote count at which a pending route becomes verified
    pub verify_threshold: u64,
}

impl Default for VerificationPolicy {
    fn default() -> Self {
        Self { verify_threshold: 10 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_threshold_is_ten() {
        assert_eq!(VerificationPolicy::default().verify_threshold, 10);
    }
}
