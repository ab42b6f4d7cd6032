//! Replay tracking.
//!
//! A nonce may be accepted once per (avatar, operator scope, signer). The
//! registry is owned by the caller and shared across a scan, so a scan can
//! start with a fresh one or carry one forward.

use std::collections::HashSet;

use alloy_primitives::Address;
use dashmap::DashMap;

/// The scope a nonce is unique within.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReplayScope {
    pub avatar: Address,
    pub operator: String,
    pub signer: Address,
}

impl ReplayScope {
    pub fn new(avatar: Address, operator: impl Into<String>, signer: Address) -> Self {
        Self {
            avatar,
            operator: operator.into(),
            signer,
        }
    }
}

/// Nonces seen so far, per scope.
#[derive(Debug, Default)]
pub struct NonceRegistry {
    seen: DashMap<ReplayScope, HashSet<String>>,
}

impl NonceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a nonce. Returns `false` if it was already seen in scope.
    pub fn check_and_record(&self, scope: &ReplayScope, nonce: &str) -> bool {
        if let Some(mut nonces) = self.seen.get_mut(scope) {
            return nonces.insert(nonce.to_owned());
        }
        self.seen
            .entry(scope.clone())
            .or_default()
            .insert(nonce.to_owned())
    }

    /// Whether a nonce was already seen in scope.
    pub fn contains(&self, scope: &ReplayScope, nonce: &str) -> bool {
        self.seen
            .get(scope)
            .map_or(false, |nonces| nonces.contains(nonce))
    }

    /// Forget every scope of one (avatar, operator) pair.
    pub fn clear(&self, avatar: &Address, operator: &str) {
        self.seen
            .retain(|scope, _| !(scope.avatar == *avatar && scope.operator == operator));
    }

    /// Total recorded nonces.
    pub fn len(&self) -> usize {
        self.seen.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
