//! Quorum rules for airline admission and oracle status agreement
//!
//! Both rules are pure functions of counts observed at call time; nothing
//! here caches a regime, so crossing a threshold mid-sequence changes the
//! behaviour of the very next call.

use serde::{Deserialize, Serialize};

/// How a registration call is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionRegime {
    /// Bootstrap: any funded airline admits directly
    Direct,
    /// Registration needs votes from half the registered airlines
    Consensus,
}

/// Multi-party airline admission rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionQuorum {
    bootstrap_size: usize,
}

impl AdmissionQuorum {
    pub fn new(bootstrap_size: usize) -> Self {
        Self { bootstrap_size }
    }

    pub fn bootstrap_size(&self) -> usize {
        self.bootstrap_size
    }

    pub fn regime(&self, registered: usize) -> AdmissionRegime {
        if registered < self.bootstrap_size {
            AdmissionRegime::Direct
        } else {
            AdmissionRegime::Consensus
        }
    }

    /// `votes * 2 >= registered`
    pub fn is_reached(&self, votes: usize, registered: usize) -> bool {
        votes.saturating_mul(2) >= registered
    }

    /// Smallest vote count that satisfies [`AdmissionQuorum::is_reached`]
    pub fn required_votes(&self, registered: usize) -> usize {
        registered.div_ceil(2)
    }
}

/// Oracle response agreement rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseQuorum {
    threshold: usize,
}

impl ResponseQuorum {
    pub fn new(threshold: usize) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn is_reached(&self, agreeing: usize) -> bool {
        agreeing >= self.threshold
    }
}
