//! Holder aggregation
//!
//! `HolderRegistry` folds raw (tokenId, owner) pairs into per-holder data.
//! Upserts take `&mut self`, so "get or create, then append" is a single
//! critical section; strategies fold results on one task after each batch.
//!
//! Invariants kept by every mutation:
//! - `token_count == token_ids.len()` for each holder
//! - a token id belongs to at most one holder
//! - holders always own at least one token

use alloy_primitives::U256;
use std::collections::{BTreeMap, HashMap};

use crate::models::types::{HolderData, TransferEvent};
use crate::utils::decoder::normalize_address;

/// Zero address as a registry key (mint source / burn sink)
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// address -> HolderData
#[derive(Debug, Clone, Default)]
pub struct HolderRegistry {
    holders: HashMap<String, HolderData>,
    /// token id -> owner key
    owners: HashMap<String, String>,
}

impl HolderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `owner` holds `token_id`.
    ///
    /// Returns `false` if the pair was already recorded. A token recorded
    /// under another holder moves to `owner`.
    pub fn upsert(&mut self, owner: &str, token_id: &str) -> bool {
        let owner = normalize_address(owner);

        if let Some(previous) = self.owners.get(token_id) {
            if *previous == owner {
                return false;
            }
            let previous = previous.clone();
            self.detach(&previous, token_id);
        }

        self.owners.insert(token_id.to_string(), owner.clone());
        let holder = self
            .holders
            .entry(owner.clone())
            .or_insert_with(|| HolderData::new(owner));
        holder.token_ids.push(token_id.to_string());
        holder.token_count = holder.token_ids.len();
        true
    }

    fn detach(&mut self, owner: &str, token_id: &str) {
        let emptied = match self.holders.get_mut(owner) {
            Some(holder) => {
                holder.token_ids.retain(|id| id != token_id);
                holder.token_count = holder.token_ids.len();
                holder.token_ids.is_empty()
            }
            None => false,
        };
        if emptied {
            self.holders.remove(owner);
        }
    }

    pub fn get(&self, address: &str) -> Option<&HolderData> {
        self.holders.get(&normalize_address(address))
    }

    /// Current owner of a token, if recorded
    pub fn owner_of(&self, token_id: &str) -> Option<&str> {
        self.owners.get(token_id).map(String::as_str)
    }

    /// Number of unique holders
    pub fn len(&self) -> usize {
        self.holders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holders.is_empty()
    }

    /// Number of tokens across all holders
    pub fn total_tokens(&self) -> usize {
        self.owners.len()
    }

    pub fn holders(&self) -> impl Iterator<Item = &HolderData> {
        self.holders.values()
    }

    /// Holders ordered by token count (desc), then address
    pub fn sorted_holders(&self) -> Vec<&HolderData> {
        let mut holders: Vec<&HolderData> = self.holders.values().collect();
        holders.sort_by(|a, b| {
            b.token_count
                .cmp(&a.token_count)
                .then_with(|| a.address.cmp(&b.address))
        });
        holders
    }

    pub fn into_holders(self) -> HashMap<String, HolderData> {
        self.holders
    }
}

/// token id -> current owner, replayed from Transfer logs (last write wins)
#[derive(Debug, Clone, Default)]
pub struct TokenOwnerMap {
    owners: BTreeMap<U256, String>,
    applied: usize,
}

impl TokenOwnerMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one transfer; callers feed events in ascending (block, log) order
    pub fn apply(&mut self, event: &TransferEvent) {
        self.owners.insert(event.token_id, normalize_address(&event.to));
        self.applied += 1;
    }

    pub fn apply_all<'a>(&mut self, events: impl IntoIterator<Item = &'a TransferEvent>) {
        for event in events {
            self.apply(event);
        }
    }

    pub fn owner_of(&self, token_id: U256) -> Option<&str> {
        self.owners.get(&token_id).map(String::as_str)
    }

    /// Tokens tracked, burned ones included
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// Events applied so far
    pub fn events_applied(&self) -> usize {
        self.applied
    }

    /// Group by owner. Burned tokens (owner = zero address) are dropped;
    /// token ids land in ascending numeric order.
    pub fn into_registry(self) -> HolderRegistry {
        let mut registry = HolderRegistry::new();
        for (token_id, owner) in self.owners {
            if owner == ZERO_ADDRESS {
                continue;
            }
            registry.upsert(&owner, &token_id.to_string());
        }
        registry
    }
}
