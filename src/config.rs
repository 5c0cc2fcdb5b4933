use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorpusConfig {
    /// Path of the static knowledge file.
    #[serde(default = "default_static_path")]
    pub static_path: PathBuf,
    /// Where administrative records come from: `disabled`, `fs`, or `http`.
    #[serde(default = "default_provider")]
    pub admin_provider: String,
    /// Directory of JSON records for the `fs` provider.
    #[serde(default)]
    pub admin_dir: Option<PathBuf>,
    /// Endpoint returning a JSON array of records for the `http` provider.
    #[serde(default)]
    pub admin_url: Option<String>,
    /// Most-recent record count fetched per refresh.
    #[serde(default = "default_admin_limit")]
    pub admin_limit: usize,
    #[serde(default = "default_timeout_secs")]
    pub admin_timeout_secs: u64,
    /// Words per chunk window.
    #[serde(default = "default_chunk_words")]
    pub chunk_words: usize,
    /// Index refresh policy: `startup` or `interval`.
    #[serde(default = "default_refresh")]
    pub refresh: String,
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            static_path: default_static_path(),
            admin_provider: default_provider(),
            admin_dir: None,
            admin_url: None,
            admin_limit: default_admin_limit(),
            admin_timeout_secs: default_timeout_secs(),
            chunk_words: default_chunk_words(),
            refresh: default_refresh(),
            refresh_interval_secs: default_refresh_interval_secs(),
        }
    }
}

fn default_static_path() -> PathBuf {
    PathBuf::from("lpu_knowledge.txt")
}
fn default_admin_limit() -> usize {
    50
}
fn default_chunk_words() -> usize {
    380
}
fn default_refresh() -> String {
    "startup".to_string()
}
fn default_refresh_interval_secs() -> u64 {
    900
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Minimum cosine similarity a chunk must reach to be returned.
    #[serde(default = "default_threshold")]
    pub threshold: f32,
    /// What a strict-mode question falls back to when retrieval is empty:
    /// `static` (the raw knowledge file) or `decline`.
    #[serde(default = "default_strict_fallback")]
    pub strict_fallback: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            threshold: default_threshold(),
            strict_fallback: default_strict_fallback(),
        }
    }
}

fn default_top_k() -> usize {
    5
}
fn default_threshold() -> f32 {
    0.35
}
fn default_strict_fallback() -> String {
    "static".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    /// Override the provider's base URL (e.g. for a proxy).
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_embed_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            url: None,
            batch_size: default_batch_size(),
            max_retries: default_embed_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_embed_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_gen_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            url: None,
            max_retries: default_gen_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_gen_retries() -> u32 {
    2
}

#[derive(Debug, Deserialize, Clone)]
pub struct MemoryConfig {
    /// Turns retained per session (oldest dropped first).
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
        }
    }
}

fn default_max_turns() -> usize {
    6
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

impl GenerationConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate corpus
    if config.corpus.chunk_words == 0 {
        anyhow::bail!("corpus.chunk_words must be > 0");
    }
    if config.corpus.admin_limit == 0 {
        anyhow::bail!("corpus.admin_limit must be >= 1");
    }
    match config.corpus.admin_provider.as_str() {
        "disabled" => {}
        "fs" => {
            if config.corpus.admin_dir.is_none() {
                anyhow::bail!("corpus.admin_dir must be set when admin_provider is 'fs'");
            }
        }
        "http" => {
            if config.corpus.admin_url.is_none() {
                anyhow::bail!("corpus.admin_url must be set when admin_provider is 'http'");
            }
        }
        other => anyhow::bail!(
            "Unknown admin provider: '{}'. Must be disabled, fs, or http.",
            other
        ),
    }
    match config.corpus.refresh.as_str() {
        "startup" | "interval" => {}
        other => anyhow::bail!(
            "Unknown refresh policy: '{}'. Must be startup or interval.",
            other
        ),
    }
    if config.corpus.refresh == "interval" && config.corpus.refresh_interval_secs == 0 {
        anyhow::bail!("corpus.refresh_interval_secs must be > 0 for interval refresh");
    }

    // Validate retrieval
    if config.retrieval.top_k < 1 {
        anyhow::bail!("retrieval.top_k must be >= 1");
    }
    if !(0.0..=1.0).contains(&config.retrieval.threshold) {
        anyhow::bail!("retrieval.threshold must be in [0.0, 1.0]");
    }
    match config.retrieval.strict_fallback.as_str() {
        "static" | "decline" => {}
        other => anyhow::bail!(
            "Unknown strict fallback: '{}'. Must be static or decline.",
            other
        ),
    }

    // Validate memory
    if config.memory.max_turns < 2 {
        anyhow::bail!("memory.max_turns must be >= 2");
    }

    // Validate embedding
    if config.embedding.is_enabled() && config.embedding.model.is_none() {
        anyhow::bail!(
            "embedding.model must be specified when provider is '{}'",
            config.embedding.provider
        );
    }
    match config.embedding.provider.as_str() {
        "disabled" | "gemini" | "openai" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be disabled, gemini, or openai.",
            other
        ),
    }

    // Validate generation
    if config.generation.is_enabled() && config.generation.model.is_none() {
        anyhow::bail!(
            "generation.model must be specified when provider is '{}'",
            config.generation.provider
        );
    }
    match config.generation.provider.as_str() {
        "disabled" | "gemini" | "openai" => {}
        other => anyhow::bail!(
            "Unknown generation provider: '{}'. Must be disabled, gemini, or openai.",
            other
        ),
    }

    Ok(config)
}
