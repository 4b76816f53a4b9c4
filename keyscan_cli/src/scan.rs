//! Key scanning
//!
//! Reads newline-delimited keys, keeps those matching the configured glob
//! patterns and reports one progress increment per scanned key.

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use keyscan_core::ProgressWriter;
use log::{debug, trace};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::{Duration, Instant};

/// Glob filter applied to every scanned key
#[derive(Debug, Clone)]
pub struct KeyMatcher {
    set: Option<GlobSet>,
}

impl KeyMatcher {
    /// Build a matcher; an empty pattern list matches every key
    pub fn new(patterns: &[String]) -> Result<Self> {
        if patterns.is_empty() {
            return Ok(Self { set: None });
        }

        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern).with_context(|| format!("Invalid key pattern '{pattern}'"))?;
            builder.add(glob);
        }
        let set = builder.build().context("Failed to compile key patterns")?;
        Ok(Self { set: Some(set) })
    }

    pub fn matches(&self, key: &str) -> bool {
        self.set.as_ref().is_none_or(|set| set.is_match(key))
    }
}

/// Outcome of a completed scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub scanned: u64,
    pub matched: Vec<String>,
    pub elapsed: Duration,
}

/// Count the keys in a file ahead of a scan, skipping blank lines
pub fn count_keys(path: &Path) -> Result<u64> {
    let file = File::open(path).with_context(|| format!("Failed to open key file {}", path.display()))?;
    let mut count = 0;
    for line in BufReader::new(file).lines() {
        let line = line.with_context(|| format!("Failed to read key file {}", path.display()))?;
        if !line.trim().is_empty() {
            count += 1;
        }
    }
    debug!("Counted {count} keys in {}", path.display());
    Ok(count)
}

/// Scan keys from `reader`, reporting progress against `total`
///
/// `total` is zero when the number of keys is not known up front. The
/// progress writer is stopped whether or not the scan succeeds.
pub async fn scan_keys<R, P>(
    reader: R,
    total: u64,
    matcher: &KeyMatcher,
    delay: Duration,
    progress: &mut P,
) -> Result<ScanSummary>
where
    R: BufRead,
    P: ProgressWriter + ?Sized,
{
    progress.start(total);
    let result = scan_lines(reader, matcher, delay, &*progress).await;
    progress.stop().await;
    result
}

async fn scan_lines<R, P>(
    reader: R,
    matcher: &KeyMatcher,
    delay: Duration,
    progress: &P,
) -> Result<ScanSummary>
where
    R: BufRead,
    P: ProgressWriter + ?Sized,
{
    let start = Instant::now();
    let mut summary = ScanSummary::default();

    for line in reader.lines() {
        let line = line.context("Failed to read key")?;
        let key = line.trim();
        if key.is_empty() {
            continue;
        }

        summary.scanned += 1;
        if matcher.matches(key) {
            trace!("Matched key {key}");
            summary.matched.push(key.to_string());
        }
        progress.increment();

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    summary.elapsed = start.elapsed();
    debug!(
        "Scanned {} keys, {} matched in {:?}",
        summary.scanned,
        summary.matched.len(),
        summary.elapsed
    );
    Ok(summary)
}
