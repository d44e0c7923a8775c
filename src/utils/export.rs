//! Holder export
//!
//! Writes a scan result to disk:
//! - `<symbol>_holders_<ts>.csv`: `address,token_count`
//! - `<symbol>_holders_detailed_<ts>.csv`: `address,token_count,token_ids`
//! - `<symbol>_scan_<ts>.json`: the `ScanSummary`
//!
//! Rows are ordered by token count (desc), then address.

use chrono::Utc;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::core::aggregator::HolderRegistry;
use crate::models::errors::AppResult;
use crate::models::types::{HolderData, ScanSummary};

/// Paths of the files written by one export
#[derive(Debug, Clone)]
pub struct ExportedFiles {
    pub summary_csv: PathBuf,
    pub detailed_csv: PathBuf,
    pub summary_json: PathBuf,
}

pub struct HolderExporter {
    export_dir: PathBuf,
}

impl HolderExporter {
    pub fn new(export_dir: impl Into<PathBuf>) -> Self {
        Self {
            export_dir: export_dir.into(),
        }
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    pub fn export(&self, registry: &HolderRegistry, summary: &ScanSummary) -> AppResult<ExportedFiles> {
        fs::create_dir_all(&self.export_dir)?;

        let stem = file_stem(&summary.collection.symbol);
        let ts = Utc::now().format("%Y%m%d_%H%M%S");
        let holders = registry.sorted_holders();

        let summary_csv = self.export_dir.join(format!("{}_holders_{}.csv", stem, ts));
        write_lines(&summary_csv, SUMMARY_HEADER, holders.iter().map(|h| summary_row(h)))?;

        let detailed_csv = self
            .export_dir
            .join(format!("{}_holders_detailed_{}.csv", stem, ts));
        write_lines(&detailed_csv, DETAILED_HEADER, holders.iter().map(|h| detailed_row(h)))?;

        let summary_json = self.export_dir.join(format!("{}_scan_{}.json", stem, ts));
        fs::write(&summary_json, serde_json::to_string_pretty(summary)?)?;

        info!(
            "💾 Exported {} holders to {}",
            holders.len(),
            self.export_dir.display()
        );

        Ok(ExportedFiles {
            summary_csv,
            detailed_csv,
            summary_json,
        })
    }
}

pub const SUMMARY_HEADER: &str = "address,token_count";
pub const DETAILED_HEADER: &str = "address,token_count,token_ids";

pub fn summary_row(holder: &HolderData) -> String {
    format!("{},{}", holder.address, holder.token_count)
}

/// Token ids are joined with commas and quoted as one field
pub fn detailed_row(holder: &HolderData) -> String {
    format!(
        "{},{},\"{}\"",
        holder.address,
        holder.token_count,
        holder.token_ids.join(",").replace('"', "\"\"")
    )
}

fn write_lines(path: &Path, header: &str, rows: impl Iterator<Item = String>) -> AppResult<()> {
    let mut file = BufWriter::new(File::create(path)?);
    writeln!(file, "{}", header)?;
    for row in rows {
        writeln!(file, "{}", row)?;
    }
    file.flush()?;
    Ok(())
}

/// Symbol reduced to something safe for a file name
fn file_stem(symbol: &str) -> String {
    let stem: String = symbol
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if stem.is_empty() {
        "collection".to_string()
    } else {
        stem.to_lowercase()
    }
}
