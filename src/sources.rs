//! Corpus document sources.
//!
//! The index is built from two feeds:
//! - a **static knowledge file** (curated university text, one file on disk)
//! - an optional **administrative feed** of structured records, read either
//!   from a directory of JSON files or from an HTTP endpoint.
//!
//! [`DocumentSource`] abstracts both feeds so the index builder and tests
//! don't care where documents come from. [`ConfiguredSource`] is the
//! production implementation driven by `[corpus]` configuration.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::warn;
use walkdir::WalkDir;

use crate::config::{Config, CorpusConfig};
use crate::models::{Document, SourceKind};

/// Title used for every chunk of the static knowledge file.
pub const STATIC_TITLE: &str = "LPU Knowledge Base";

/// Trait for corpus document feeds.
///
/// Fetching is part of the trait so tests can substitute deterministic
/// in-memory sources for file and network access.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Fetch the raw static knowledge text.
    async fn fetch_static(&self) -> Result<String>;

    /// Fetch administrative records, newest first, at most `limit`.
    async fn fetch_administrative(&self, limit: usize) -> Result<Vec<Document>>;
}

/// An administrative record as published by the admin tooling.
///
/// Field names follow the feed's JSON convention (`textContent`,
/// `createdAt`), so the struct renames rather than the call sites.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminRecord {
    pub title: Option<String>,
    #[serde(default)]
    pub text_content: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub category: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl AdminRecord {
    /// Convert a feed record into a corpus document.
    ///
    /// `fallback_title` covers records without a title (for file feeds,
    /// the file stem).
    pub fn into_document(self, fallback_title: &str) -> Document {
        Document {
            source: SourceKind::Administrative,
            title: self.title.unwrap_or_else(|| fallback_title.to_string()),
            text: self.text_content,
            keywords: self.keywords,
            category: self.category,
            created_at: self.created_at,
        }
    }
}

/// Production document source driven by `[corpus]` configuration.
pub struct ConfiguredSource {
    corpus: CorpusConfig,
}

impl ConfiguredSource {
    pub fn new(config: &Config) -> Self {
        Self {
            corpus: config.corpus.clone(),
        }
    }
}

#[async_trait]
impl DocumentSource for ConfiguredSource {
    async fn fetch_static(&self) -> Result<String> {
        let path = &self.corpus.static_path;
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read static corpus: {}", path.display()))
    }

    async fn fetch_administrative(&self, limit: usize) -> Result<Vec<Document>> {
        let mut docs = match self.corpus.admin_provider.as_str() {
            "disabled" => Vec::new(),
            "fs" => {
                let dir = self
                    .corpus
                    .admin_dir
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("corpus.admin_dir required"))?;
                read_admin_dir(dir)?
            }
            "http" => {
                let url = self
                    .corpus
                    .admin_url
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("corpus.admin_url required"))?;
                fetch_admin_http(url, self.corpus.admin_timeout_secs).await?
            }
            other => bail!("Unknown admin provider: {}", other),
        };

        // Newest records first; undated records sort last.
        docs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        docs.truncate(limit);
        Ok(docs)
    }
}

/// Read administrative records from a directory of `.json` files.
///
/// Files that fail to parse are skipped with a warning so one bad record
/// can't block the rest of the feed.
fn read_admin_dir(dir: &Path) -> Result<Vec<Document>> {
    if !dir.is_dir() {
        bail!("Admin directory not found: {}", dir.display());
    }

    let mut docs = Vec::new();

    for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                warn!("Skipping unreadable admin record {}: {}", path.display(), e);
                continue;
            }
        };

        let record: AdminRecord = match serde_json::from_str(&content) {
            Ok(r) => r,
            Err(e) => {
                warn!("Skipping unparsable admin record {}: {}", path.display(), e);
                continue;
            }
        };

        let fallback = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Administrative record");

        docs.push(record.into_document(fallback));
    }

    Ok(docs)
}

/// Fetch administrative records from an HTTP endpoint returning a JSON array.
async fn fetch_admin_http(url: &str, timeout_secs: u64) -> Result<Vec<Document>> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?;

    let records: Vec<AdminRecord> = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to fetch admin feed: {}", url))?
        .error_for_status()
        .with_context(|| format!("Admin feed returned error status: {}", url))?
        .json()
        .await
        .context("Failed to parse admin feed response")?;

    Ok(records
        .into_iter()
        .map(|r| r.into_document("Administrative record"))
        .collect())
}
