//! # verto-sewa
//!
//! Retrieval-augmented campus assistant for Lovely Professional University.
//!
//! The assistant answers over two corpora: a curated static knowledge file
//! and a feed of administrative records. Incoming messages are classified
//! into intents; fixed intents (greetings, time, date, attribution) answer
//! instantly, university questions run semantic retrieval and generate
//! under strict grounding with citations, everything else generates under
//! an open policy. Sessions keep a short bounded memory for tone and
//! continuity.
//!
//! ## Pipeline
//!
//! ```text
//! message -> reject blank -> welcome once -> classify
//!   fixed intents -------------------------------> canned reply
//!   domain question -> embed -> search index -> strict prompt -> generate
//!   identity/general ------------------------->  open prompt  -> generate
//! ```
//!
//! The index is rebuilt from the sources on a schedule or on demand and
//! swapped in atomically. Provider failures never surface to the user:
//! every path degrades to a fixed reply.
//!
//! ## Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use verto_sewa::chat::ChatService;
//! use verto_sewa::config::Config;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let service = Arc::new(ChatService::from_config(Config::default())?);
//! service.refresh().await;
//! let reply = service.handle("session-1", "When are hostel fees due?").await;
//! println!("{}", reply);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration with defaults and validation |
//! | [`models`] | Core data types: documents, chunks, turns |
//! | [`chunk`] | Word-window text chunking |
//! | [`sources`] | Static file and administrative record feeds |
//! | [`embedding`] | Embedding providers and vector similarity |
//! | [`generate`] | Answer generation providers |
//! | [`index`] | Corpus index, search, atomic refresh |
//! | [`classify`] | Intent rule table |
//! | [`replies`] | Fixed replies and time/date formatting |
//! | [`memory`] | Bounded per-session conversation memory |
//! | [`assemble`] | Context blocks, citations, prompt construction |
//! | [`chat`] | The orchestrator tying it all together |
//! | [`server`] | HTTP API |

pub mod assemble;
pub mod chat;
pub mod chunk;
pub mod classify;
pub mod config;
pub mod embedding;
pub mod generate;
pub mod index;
pub mod memory;
pub mod models;
pub mod replies;
pub mod server;
pub mod sources;
