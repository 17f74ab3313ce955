//! Result cache for the integration run.
//!
//! `.integration-cache.json` maps spec path to content hash, outcome, and
//! test time; an entry is stale when the file hash changed or the TTL
//! elapsed.

use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const CACHE_FILE: &str = ".integration-cache.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheEntry {
    pub content_hash: String,
    pub passed: bool,
    /// Unix seconds of the last test.
    pub tested_at: u64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct IntegrationCache {
    entries: HashMap<String, CacheEntry>,
}

pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl IntegrationCache {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read cache {path:?}"))?;
        serde_json::from_str(&text).with_context(|| format!("failed to parse cache {path:?}"))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text).with_context(|| format!("failed to write cache {path:?}"))
    }

    /// Whether the spec needs (re-)testing: unseen, changed, failed last
    /// time, or aged out.
    pub fn needs_test(&self, spec_path: &str, hash: &str, ttl: Duration) -> bool {
        match self.entries.get(spec_path) {
            Some(entry) => {
                entry.content_hash != hash
                    || !entry.passed
                    || now_secs().saturating_sub(entry.tested_at) > ttl.as_secs()
            }
            None => true,
        }
    }

    pub fn record(&mut self, spec_path: &str, hash: &str, passed: bool) {
        self.entries.insert(
            spec_path.to_string(),
            CacheEntry {
                content_hash: hash.to_string(),
                passed,
                tested_at: now_secs(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
