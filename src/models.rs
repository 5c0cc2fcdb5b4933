//! Core data models used throughout VertoSewa.
//!
//! These types represent the documents, chunks, and conversation turns that
//! flow through the retrieval and routing pipeline.

use chrono::{DateTime, Utc};
use std::fmt;

/// Where a piece of corpus text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// The bundled reference document (the knowledge file).
    Static,
    /// A record published to the administrative content collection.
    Administrative,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Static => write!(f, "Static"),
            SourceKind::Administrative => write!(f, "Administrative"),
        }
    }
}

/// A raw document fetched from a document source, before chunking.
#[derive(Debug, Clone)]
pub struct Document {
    pub source: SourceKind,
    pub title: String,
    pub text: String,
    pub keywords: Vec<String>,
    pub category: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// A bounded window of document text carrying its embedding vector.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub source: SourceKind,
    pub title: String,
    pub text: String,
    pub embedding: Vec<f32>,
}

/// A chunk matched against a query, with its similarity score in [0, 1].
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub score: f32,
    pub source: SourceKind,
    pub title: String,
    pub text: String,
}

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One turn of a session's conversation history.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    /// Create a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}
