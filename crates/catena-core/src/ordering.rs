//! The canonical total order over links.
//!
//! `signed_at` descending, then position within chunk descending, then owner
//! ascending, then identity hash ascending. The order is total, so a sort by
//! [`OrderKey`] gives the same output regardless of input arrival order.

use std::cmp::Ordering;

use alloy_primitives::{Address, B256};

/// Sort key for a link in an aggregated view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OrderKey {
    pub signed_at: i64,
    pub position: usize,
    pub owner: Address,
    pub identity: B256,
}

impl OrderKey {
    pub fn new(signed_at: i64, position: usize, owner: Address, identity: B256) -> Self {
        Self {
            signed_at,
            position,
            owner,
            identity,
        }
    }
}

impl Ord for OrderKey {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .signed_at
            .cmp(&self.signed_at)
            .then_with(|| other.position.cmp(&self.position))
            .then_with(|| self.owner.cmp(&other.owner))
            .then_with(|| self.identity.cmp(&other.identity))
    }
}

impl PartialOrd for OrderKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
