//! Ruster Holders - ERC-721 holder discovery CLI
//!
//! Usage: `ruster_holders <contract_address> [export_dir]`
//!
//! The RPC endpoint and tuning knobs come from the environment, see
//! `ScanConfig::from_env`. Log verbosity follows `RUST_LOG` (default `info`).

use ruster_holders::utils::constants::{APP_NAME, APP_VERSION};
use ruster_holders::utils::decoder::parse_address;
use ruster_holders::{
    AppError, HolderExporter, HolderScanner, RpcNftContract, RpcProvider, ScanConfig,
    TracingReporter,
};

use eyre::Result;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    println!("\n    🧾 {} v{} - ERC-721 holder discovery\n", APP_NAME, APP_VERSION);

    let mut args = std::env::args().skip(1);
    let Some(raw_address) = args.next() else {
        eprintln!("Usage: ruster_holders <contract_address> [export_dir]");
        eprintln!("   RPC endpoint: $HOLDERS_RPC_URL (or $ETH_HTTP_URL)");
        std::process::exit(2);
    };

    let address = parse_address(&raw_address)
        .ok_or_else(|| AppError::invalid_address(format!("'{}' is not a valid address", raw_address)))?;

    let mut config = ScanConfig::from_env()?;
    if let Some(dir) = args.next() {
        config.export_dir = PathBuf::from(dir);
    }

    let provider = RpcProvider::new(config.rpc_url.clone(), config.request_timeout)?;
    println!("🌐 RPC: {}", provider.masked_url());

    let export_dir = config.export_dir.clone();
    let contract = RpcNftContract::new(provider, address);
    let scanner = HolderScanner::new(contract, config, TracingReporter);

    let outcome = tokio::select! {
        result = scanner.run() => match result {
            Ok(outcome) => outcome,
            Err(e) => {
                eprintln!("❌ {}", e);
                return Err(e.into());
            }
        },
        _ = tokio::signal::ctrl_c() => {
            println!("\n\n🛑 Scan interrupted");
            return Ok(());
        }
    };

    let summary = &outcome.summary;
    println!("\n📊 {} ({})", summary.collection.name, summary.collection.symbol);
    println!("   Holders:    {}", summary.total_holders);
    println!("   Tokens:     {}", summary.total_tokens);
    println!("   Strategy:   {}", summary.strategy_used);
    println!("   Tried:      {}", summary.attempted_labels());
    println!("   Elapsed:    {}ms", summary.elapsed_ms);

    println!("\n🏆 Top holders:");
    for holder in outcome.registry.sorted_holders().into_iter().take(10) {
        println!("   {}  {}", holder.address, holder.token_count);
    }

    println!("\n📈 Exporting holders...");
    match HolderExporter::new(export_dir).export(&outcome.registry, summary) {
        Ok(files) => {
            println!("   ✅ Summary CSV:  {}", files.summary_csv.display());
            println!("   ✅ Detailed CSV: {}", files.detailed_csv.display());
            println!("   ✅ JSON:         {}", files.summary_json.display());
        }
        Err(e) => println!("   ❌ Export failed: {}", e),
    }

    Ok(())
}
