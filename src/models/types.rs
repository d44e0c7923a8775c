//! Type definitions for the holder scanner

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One holder and the tokens it currently owns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolderData {
    /// Lowercase 0x-prefixed address
    pub address: String,
    /// Always equal to `token_ids.len()`
    pub token_count: usize,
    /// Decimal token ids in discovery order
    pub token_ids: Vec<String>,
}

impl HolderData {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            token_count: 0,
            token_ids: Vec::new(),
        }
    }
}

/// Inclusive block range for log queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRange {
    pub from_block: u64,
    pub to_block: u64,
}

impl BlockRange {
    pub fn new(from_block: u64, to_block: u64) -> Self {
        Self {
            from_block,
            to_block,
        }
    }

    /// Number of blocks covered
    pub fn len(&self) -> u64 {
        if self.is_empty() {
            return 0;
        }
        self.to_block - self.from_block + 1
    }

    pub fn is_empty(&self) -> bool {
        self.to_block < self.from_block
    }

    /// Bisect into two halves; `None` for a single block
    pub fn split(&self) -> Option<(BlockRange, BlockRange)> {
        if self.is_empty() || self.from_block == self.to_block {
            return None;
        }
        let mid = self.from_block + (self.to_block - self.from_block) / 2;
        Some((
            BlockRange::new(self.from_block, mid),
            BlockRange::new(mid + 1, self.to_block),
        ))
    }

    /// Consecutive ascending sub-ranges of at most `size` blocks
    pub fn chunks(&self, size: u64) -> Vec<BlockRange> {
        let size = size.max(1);
        let mut chunks = Vec::new();
        if self.is_empty() {
            return chunks;
        }
        let mut start = self.from_block;
        loop {
            let end = start.saturating_add(size - 1).min(self.to_block);
            chunks.push(BlockRange::new(start, end));
            if end >= self.to_block {
                break;
            }
            start = end + 1;
        }
        chunks
    }
}

impl fmt::Display for BlockRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.from_block, self.to_block)
    }
}

/// Decoded ERC-721 Transfer(from, to, tokenId) log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferEvent {
    pub block_number: u64,
    pub log_index: u64,
    /// Lowercase 0x-prefixed address
    pub from: String,
    /// Lowercase 0x-prefixed address
    pub to: String,
    pub token_id: U256,
}

/// Progress update pushed to the reporter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressState {
    /// 0..=100
    pub percent: u8,
    pub message: String,
}

/// Holder discovery strategies, in fallback order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyKind {
    /// totalSupply + tokenByIndex + ownerOf
    Enumeration,
    /// ownerOf over a bounded id range
    TokenRange,
    /// Replay of Transfer logs
    TransferEvents,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Enumeration => "enumeration",
            StrategyKind::TokenRange => "token_range",
            StrategyKind::TransferEvents => "transfer_events",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StrategyKind::Enumeration => "ERC-721 Enumerable",
            StrategyKind::TokenRange => "Token ID range probe",
            StrategyKind::TransferEvents => "Transfer event scan",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Collection metadata (best effort)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub address: String,
    pub name: String,
    pub symbol: String,
}

/// Success summary of a scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSummary {
    pub collection: CollectionInfo,
    pub total_holders: usize,
    pub total_tokens: usize,
    pub strategies_attempted: Vec<StrategyKind>,
    pub strategy_used: StrategyKind,
    pub elapsed_ms: u64,
}

impl ScanSummary {
    /// Attempted strategies in order, e.g. "ERC-721 Enumerable → Token ID range probe"
    pub fn attempted_labels(&self) -> String {
        let attempted: Vec<&str> = self.strategies_attempted.iter().map(|s| s.label()).collect();
        attempted.join(" → ")
    }

    /// One-line summary for display
    pub fn summary(&self) -> String {
        format!(
            "✅ {} ({}) | Holders: {} | Tokens: {} | Strategy: {} | Tried: [{}] | {}ms",
            self.collection.name,
            self.collection.symbol,
            self.total_holders,
            self.total_tokens,
            self.strategy_used,
            self.attempted_labels(),
            self.elapsed_ms
        )
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_range_chunks() {
        let chunks = BlockRange::new(100, 12_099).chunks(5000);
        assert_eq!(
            chunks,
            vec![
                BlockRange::new(100, 5099),
                BlockRange::new(5100, 10_099),
                BlockRange::new(10_100, 12_099),
            ]
        );
        assert_eq!(chunks.iter().map(|c| c.len()).sum::<u64>(), 12_000);
    }

    #[test]
    fn test_block_range_split() {
        let (lo, hi) = BlockRange::new(0, 9).split().unwrap();
        assert_eq!(lo, BlockRange::new(0, 4));
        assert_eq!(hi, BlockRange::new(5, 9));

        let (lo, hi) = BlockRange::new(10, 12).split().unwrap();
        assert_eq!(lo.len() + hi.len(), 3);
        assert_eq!(lo.to_block + 1, hi.from_block);

        assert!(BlockRange::new(7, 7).split().is_none());
    }

    #[test]
    fn test_single_block_chunk() {
        assert_eq!(BlockRange::new(5, 5).chunks(5000), vec![BlockRange::new(5, 5)]);
        assert!(BlockRange::new(6, 5).chunks(10).is_empty());
    }

    #[test]
    fn test_scan_summary_text() {
        let summary = ScanSummary {
            collection: CollectionInfo {
                address: "0xabc".to_string(),
                name: "Punks".to_string(),
                symbol: "PNK".to_string(),
            },
            total_holders: 2,
            total_tokens: 5,
            strategies_attempted: vec![StrategyKind::Enumeration, StrategyKind::TokenRange],
            strategy_used: StrategyKind::TokenRange,
            elapsed_ms: 12,
        };
        let text = summary.summary();
        assert!(text.contains("Holders: 2"));
        assert!(text.contains("ERC-721 Enumerable → Token ID range probe"));
        assert!(summary.to_json().contains("\"TokenRange\""));
    }
}
