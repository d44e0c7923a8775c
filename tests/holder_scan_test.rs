//! End-to-end tests for the holder scanner against an in-memory collection

use alloy_primitives::{Address, U256};
use ruster_holders::core::{enumerate_holders, probe_enumeration, scan_transfer_events};
use ruster_holders::utils::decoder::address_key;
use ruster_holders::{
    AppError, AppResult, BlockRange, ErrorCode, HolderRegistry, HolderScanner, NftContract,
    RequestExecutor, ScanConfig, StrategyKind, TransferEvent,
};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::time::Duration;

const ZERO: &str = "0x0000000000000000000000000000000000000000";

fn holder(byte: u8) -> Address {
    Address::repeat_byte(byte)
}

fn key(byte: u8) -> String {
    address_key(&holder(byte))
}

/// In-memory ERC-721 with switchable capabilities
#[derive(Default)]
struct MockCollection {
    enumerable: bool,
    supply: u64,
    /// token id -> owner
    owners: BTreeMap<u64, Address>,
    head: u64,
    events: Vec<TransferEvent>,
    /// Log queries spanning more blocks than this fail as oversized
    max_log_span: Option<u64>,
    /// Delay salt for ownerOf, 0 = no delay
    jitter_seed: u64,
    no_metadata: bool,
    /// tokenByIndex(i) times out for this index
    failing_index: Option<u64>,
    /// Log queries covering this block fail with a node error
    failing_block: Option<u64>,

    owner_calls: Cell<usize>,
    index_calls: Cell<usize>,
    log_queries: RefCell<Vec<BlockRange>>,
}

impl MockCollection {
    fn owned(ids: impl IntoIterator<Item = u64>, owner: impl Fn(u64) -> Address) -> Self {
        Self {
            owners: ids.into_iter().map(|id| (id, owner(id))).collect(),
            ..Default::default()
        }
    }
}

impl NftContract for MockCollection {
    fn address(&self) -> String {
        key(0xcc)
    }

    async fn name(&self) -> AppResult<String> {
        if self.no_metadata {
            return Err(AppError::reverted("name() not implemented"));
        }
        Ok("Mock Apes".to_string())
    }

    async fn symbol(&self) -> AppResult<String> {
        if self.no_metadata {
            return Err(AppError::reverted("symbol() not implemented"));
        }
        Ok("MOCK".to_string())
    }

    async fn total_supply(&self) -> AppResult<U256> {
        if !self.enumerable {
            return Err(AppError::reverted("totalSupply() not implemented"));
        }
        Ok(U256::from(self.supply))
    }

    async fn token_by_index(&self, index: U256) -> AppResult<U256> {
        self.index_calls.set(self.index_calls.get() + 1);
        if !self.enumerable {
            return Err(AppError::reverted("tokenByIndex() not implemented"));
        }
        let index = u64::try_from(index).map_err(|_| AppError::reverted("index out of range"))?;
        if self.failing_index == Some(index) {
            return Err(AppError::rpc_timeout("request timed out"));
        }
        self.owners
            .keys()
            .nth(index as usize)
            .map(|id| U256::from(*id))
            .ok_or_else(|| AppError::reverted("index out of range"))
    }

    async fn owner_of(&self, token_id: U256) -> AppResult<Address> {
        self.owner_calls.set(self.owner_calls.get() + 1);
        let id = u64::try_from(token_id).map_err(|_| AppError::reverted("nonexistent token"))?;
        if self.jitter_seed > 0 {
            let ms = (id.wrapping_mul(7919) ^ self.jitter_seed) % 17;
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
        self.owners
            .get(&id)
            .copied()
            .ok_or_else(|| AppError::reverted("nonexistent token"))
    }

    async fn block_number(&self) -> AppResult<u64> {
        Ok(self.head)
    }

    async fn transfer_logs(&self, range: BlockRange) -> AppResult<Vec<TransferEvent>> {
        self.log_queries.borrow_mut().push(range);
        if let Some(block) = self.failing_block {
            if block >= range.from_block && block <= range.to_block {
                return Err(AppError::new(ErrorCode::RpcError, "RPC error: internal error (code: -32603)"));
            }
        }
        if let Some(span) = self.max_log_span {
            if range.len() > span {
                return Err(AppError::query_too_large("response size exceeded"));
            }
        }
        Ok(self
            .events
            .iter()
            .filter(|e| e.block_number >= range.from_block && e.block_number <= range.to_block)
            .cloned()
            .collect())
    }
}

fn transfer(block: u64, from: &str, to: &str, id: u64) -> TransferEvent {
    TransferEvent {
        block_number: block,
        log_index: 0,
        from: from.to_string(),
        to: to.to_string(),
        token_id: U256::from(id),
    }
}

fn fast_config() -> ScanConfig {
    ScanConfig {
        initial_backoff_ms: 1,
        ..Default::default()
    }
}

fn ids(range: std::ops::Range<u64>) -> Vec<String> {
    range.map(|id| id.to_string()).collect()
}

fn assert_registry_invariants(registry: &HolderRegistry) {
    let mut seen = HashSet::new();
    for h in registry.holders() {
        assert_eq!(h.token_count, h.token_ids.len(), "count mismatch for {}", h.address);
        assert!(h.token_count >= 1);
        for id in &h.token_ids {
            assert!(seen.insert(id.clone()), "token {} held twice", id);
        }
    }
    assert_eq!(seen.len(), registry.total_tokens());
}

#[tokio::test]
async fn test_enumerable_collection_single_holder() {
    let mut mock = MockCollection::owned(0..300, |_| holder(0xaa));
    mock.enumerable = true;
    mock.supply = 300;

    let scanner = HolderScanner::new(mock, fast_config(), |_: u8, _: &str| {});
    let outcome = scanner.run().await.unwrap();

    assert_eq!(outcome.registry.len(), 1);
    let x = outcome.registry.get(&key(0xaa)).unwrap();
    assert_eq!(x.token_count, 300);
    assert_eq!(x.token_ids, ids(0..300));

    assert_eq!(outcome.summary.strategy_used, StrategyKind::Enumeration);
    assert_eq!(outcome.summary.strategies_attempted, vec![StrategyKind::Enumeration]);
    assert_eq!(outcome.summary.collection.symbol, "MOCK");
    assert_registry_invariants(&outcome.registry);
}

#[tokio::test]
async fn test_range_probe_stops_after_sparse_batch() {
    let mock = MockCollection::owned(0..200, |id| holder(if id % 2 == 0 { 0xaa } else { 0xbb }));

    let scanner = HolderScanner::new(mock, fast_config(), |_: u8, _: &str| {});
    let outcome = scanner.run().await.unwrap();

    // batch 0 is full, batches 1-3 are empty but exempt, batch 4 stops the scan
    assert_eq!(scanner.contract().owner_calls.get(), 1000);
    assert_eq!(outcome.registry.total_tokens(), 200);
    assert_eq!(outcome.registry.get(&key(0xaa)).unwrap().token_count, 100);
    assert_eq!(outcome.registry.get(&key(0xbb)).unwrap().token_count, 100);

    let found: BTreeSet<u64> = outcome
        .registry
        .holders()
        .flat_map(|h| h.token_ids.iter().map(|id| id.parse::<u64>().unwrap()))
        .collect();
    assert_eq!(found, (0..200).collect());
    assert_eq!(outcome.summary.strategy_used, StrategyKind::TokenRange);
    assert_registry_invariants(&outcome.registry);
}

#[tokio::test]
async fn test_enumeration_never_runs_when_probe_fails() {
    let mock = MockCollection::owned(0..10, |_| holder(0xaa));

    let scanner = HolderScanner::new(mock, fast_config(), |_: u8, _: &str| {});
    let outcome = scanner.run().await.unwrap();

    assert_eq!(scanner.contract().index_calls.get(), 0);
    assert_eq!(outcome.summary.strategies_attempted, vec![StrategyKind::TokenRange]);
}

#[tokio::test]
async fn test_zero_supply_falls_through_to_range_probe() {
    let mut mock = MockCollection::owned(0..50, |_| holder(0xdd));
    mock.enumerable = true;
    mock.supply = 0;

    let config = fast_config();
    let executor = RequestExecutor::from_config(&config);
    assert!(probe_enumeration(&mock, &executor).await.is_supported());

    let err = enumerate_holders(&mock, &executor, &config, &|_: u8, _: &str| {})
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::NoTokens);
    assert_eq!(err.message, "no tokens in collection");

    let scanner = HolderScanner::new(mock, config, |_: u8, _: &str| {});
    let outcome = scanner.run().await.unwrap();
    assert_eq!(
        outcome.summary.strategies_attempted,
        vec![StrategyKind::Enumeration, StrategyKind::TokenRange]
    );
    assert_eq!(outcome.registry.get(&key(0xdd)).unwrap().token_ids, ids(0..50));
}

#[tokio::test]
async fn test_final_progress_lists_attempted_strategies() {
    let mut mock = MockCollection::owned(0..50, |_| holder(0xdd));
    mock.enumerable = true;
    mock.supply = 0;

    let progress = RefCell::new(Vec::new());
    let reporter = |p: u8, m: &str| progress.borrow_mut().push((p, m.to_string()));
    let scanner = HolderScanner::new(mock, fast_config(), reporter);
    scanner.run().await.unwrap();

    let progress = progress.borrow();
    let (percent, message) = progress.last().unwrap();
    assert_eq!(*percent, 100);
    assert!(message.contains("50 tokens"));
    assert!(message.contains("tried: ERC-721 Enumerable → Token ID range probe"));
}

#[tokio::test]
async fn test_enumeration_skips_failed_index() {
    let mut mock = MockCollection::owned(0..120, |_| holder(0xaa));
    mock.enumerable = true;
    mock.supply = 120;
    mock.failing_index = Some(7);

    let config = fast_config();
    let executor = RequestExecutor::from_config(&config);
    let progress = RefCell::new(Vec::new());
    let reporter = |p: u8, m: &str| progress.borrow_mut().push((p, m.to_string()));

    let registry = enumerate_holders(&mock, &executor, &config, &reporter).await.unwrap();

    let x = registry.get(&key(0xaa)).unwrap();
    assert_eq!(x.token_count, 119);
    assert!(!x.token_ids.contains(&"7".to_string()));
    assert!(x.token_ids.contains(&"119".to_string()));
    assert_registry_invariants(&registry);

    // index 7 is tried max_retries times, the other 119 once
    assert_eq!(mock.index_calls.get(), 119 + 3);
    assert!(progress.borrow().iter().any(|(p, m)| *p == 100 && m.starts_with("Enumerated 120/120")));
}

#[tokio::test]
async fn test_implausible_supply_is_rejected() {
    let mut mock = MockCollection::owned(0..10, |_| holder(0xaa));
    mock.enumerable = true;
    mock.supply = u64::MAX;

    let config = fast_config();
    let executor = RequestExecutor::from_config(&config);
    let err = enumerate_holders(&mock, &executor, &config, &|_: u8, _: &str| {})
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::StrategyEmpty);
    assert_eq!(mock.index_calls.get(), 0);

    let scanner = HolderScanner::new(mock, config, |_: u8, _: &str| {});
    let outcome = scanner.run().await.unwrap();
    assert_eq!(outcome.summary.strategy_used, StrategyKind::TokenRange);
    assert_eq!(outcome.registry.total_tokens(), 10);
}

#[tokio::test]
async fn test_event_scan_replays_transfers_with_bisection() {
    let a = key(0xaa);
    let b = key(0xbb);
    let c = key(0xcc);

    let mut mock = MockCollection {
        head: 20_000,
        max_log_span: Some(1_000),
        ..Default::default()
    };
    mock.events = vec![
        transfer(100, ZERO, &a, 1),
        transfer(150, ZERO, &a, 2),
        transfer(6_000, &a, &b, 1),
        transfer(7_000, ZERO, &b, 3),
        transfer(12_000, &b, &c, 1),
        transfer(15_000, &b, ZERO, 3),
    ];

    let config = ScanConfig {
        range_max_tokens: 400,
        event_lookback_blocks: None,
        ..fast_config()
    };
    let scanner = HolderScanner::new(mock, config, |_: u8, _: &str| {});
    let outcome = scanner.run().await.unwrap();

    assert_eq!(
        outcome.summary.strategies_attempted,
        vec![StrategyKind::TokenRange, StrategyKind::TransferEvents]
    );
    assert_eq!(outcome.registry.len(), 2);
    assert_eq!(outcome.registry.get(&c).unwrap().token_ids, vec!["1".to_string()]);
    assert_eq!(outcome.registry.get(&a).unwrap().token_ids, vec!["2".to_string()]);
    assert!(outcome.registry.get(&b).is_none());
    assert_eq!(outcome.registry.owner_of("3"), None);
    assert_registry_invariants(&outcome.registry);

    let queries = scanner.contract().log_queries.borrow();
    assert!(queries.iter().any(|r| r.len() > 1_000), "oversized chunk was attempted");
    assert!(queries.len() > 5, "chunks were bisected");
}

#[tokio::test]
async fn test_bisection_stops_at_floor() {
    let mock = MockCollection {
        head: 9_999,
        max_log_span: Some(10),
        events: vec![transfer(500, ZERO, &key(0xaa), 1)],
        ..Default::default()
    };
    let config = ScanConfig {
        event_lookback_blocks: None,
        ..fast_config()
    };
    let executor = RequestExecutor::from_config(&config);

    let err = scan_transfer_events(&mock, &executor, &config, &|_: u8, _: &str| {})
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::StrategyEmpty);

    // each 5000-block chunk halves down to 39/40-block ranges: 1 + 2 + ... + 128 queries
    let queries = mock.log_queries.borrow();
    assert_eq!(queries.len(), 2 * 255);
    assert!(queries.iter().all(|r| r.len() >= 39));
}

#[tokio::test]
async fn test_failed_chunk_is_skipped() {
    let mock = MockCollection {
        head: 14_999,
        failing_block: Some(7_000),
        events: vec![
            transfer(100, ZERO, &key(0xaa), 1),
            transfer(7_000, ZERO, &key(0xbb), 2),
            transfer(12_000, ZERO, &key(0xdd), 3),
        ],
        ..Default::default()
    };
    let config = ScanConfig {
        event_lookback_blocks: None,
        ..fast_config()
    };
    let executor = RequestExecutor::from_config(&config);

    let registry = scan_transfer_events(&mock, &executor, &config, &|_: u8, _: &str| {})
        .await
        .unwrap();

    assert_eq!(registry.len(), 2);
    assert_eq!(registry.owner_of("1"), Some(key(0xaa).as_str()));
    assert_eq!(registry.owner_of("3"), Some(key(0xdd).as_str()));
    assert_eq!(registry.owner_of("2"), None);

    // the middle chunk is retried, never bisected
    let queries = mock.log_queries.borrow();
    let middle: Vec<&BlockRange> = queries.iter().filter(|r| r.from_block == 5_000).collect();
    assert_eq!(middle.len(), 3);
    assert!(middle.iter().all(|r| r.to_block == 9_999));
    assert_eq!(queries.len(), 2 + 3);
}

#[tokio::test]
async fn test_event_scan_respects_lookback_window() {
    let mut mock = MockCollection {
        head: 100_000,
        ..Default::default()
    };
    mock.events = vec![
        transfer(10_000, ZERO, &key(0xaa), 1),
        transfer(90_000, ZERO, &key(0xbb), 2),
    ];

    let config = ScanConfig {
        range_max_tokens: 200,
        ..fast_config()
    };
    let scanner = HolderScanner::new(mock, config, |_: u8, _: &str| {});
    let outcome = scanner.run().await.unwrap();

    // token 1 was last moved before the 50k-block window
    assert_eq!(outcome.registry.len(), 1);
    assert_eq!(outcome.registry.owner_of("2"), Some(key(0xbb).as_str()));
    assert_eq!(scanner.contract().log_queries.borrow().len(), 10);
}

#[tokio::test]
async fn test_all_strategies_failing_is_terminal() {
    let mock = MockCollection {
        head: 10_000,
        no_metadata: true,
        ..Default::default()
    };

    let progress = RefCell::new(Vec::new());
    let reporter = |p: u8, m: &str| progress.borrow_mut().push((p, m.to_string()));
    let scanner = HolderScanner::new(mock, fast_config(), reporter);
    let err = scanner.run().await.unwrap_err();

    assert_eq!(err.code, ErrorCode::StrategiesExhausted);
    assert!(err.message.contains("standard ERC-721"));
    assert!(err.message.contains("rate-limiting"));
    assert!(progress.borrow().iter().all(|(p, _)| *p <= 100));
}

#[tokio::test]
async fn test_progress_ends_with_summary() {
    let mut mock = MockCollection::owned(0..120, |_| holder(0xaa));
    mock.enumerable = true;
    mock.supply = 120;
    mock.no_metadata = true;

    let progress = RefCell::new(Vec::new());
    let reporter = |p: u8, m: &str| progress.borrow_mut().push((p, m.to_string()));
    let scanner = HolderScanner::new(mock, fast_config(), reporter);
    let outcome = scanner.run().await.unwrap();

    assert_eq!(outcome.summary.collection.name, "Unknown Collection");
    assert_eq!(outcome.summary.collection.symbol, "UNKNOWN");

    let progress = progress.borrow();
    let (last_percent, last_message) = progress.last().unwrap();
    assert_eq!(*last_percent, 100);
    assert!(last_message.contains("1 holders"));
    assert!(last_message.contains("120 tokens"));
    assert!(last_message.contains("tried: ERC-721 Enumerable"));
    // one report per 50-index batch: 42%, 83%, 100%
    assert!(progress.iter().any(|(p, m)| *p == 42 && m.starts_with("Enumerated 50/120")));
}

#[tokio::test(start_paused = true)]
async fn test_enumeration_is_order_independent() {
    let owner = |id: u64| holder([0xa1, 0xb2, 0xc3][(id % 3) as usize]);
    let config = fast_config();
    let executor = RequestExecutor::from_config(&config);

    let mut runs = Vec::new();
    for seed in [0u64, 5, 11] {
        let mut mock = MockCollection::owned((0..150).map(|i| i * 2), owner);
        mock.enumerable = true;
        mock.supply = 150;
        mock.jitter_seed = seed;

        let registry = enumerate_holders(&mock, &executor, &config, &|_: u8, _: &str| {})
            .await
            .unwrap();
        assert_registry_invariants(&registry);

        let content: BTreeMap<String, BTreeSet<String>> = registry
            .into_holders()
            .into_iter()
            .map(|(addr, h)| (addr, h.token_ids.into_iter().collect()))
            .collect();
        runs.push(content);
    }

    assert_eq!(runs[0].len(), 3);
    assert_eq!(runs[0], runs[1]);
    assert_eq!(runs[1], runs[2]);
}
