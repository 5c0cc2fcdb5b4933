//! The chat orchestrator.
//!
//! [`ChatService`] owns the shared state (index handle, session store) and
//! the injected collaborators (document source, embedder, generator), and
//! drives a message through the full pipeline:
//!
//! 1. Reject blank input.
//! 2. New session → one-time welcome, nothing else.
//! 3. Classify.
//! 4. Fixed-reply intents short-circuit; identity, domain, and general
//!    questions flow through assembly and generation, domain questions
//!    via retrieval first.
//!
//! `handle` never returns an error. Every collaborator failure is logged
//! and degraded to a fixed reply, so the HTTP boundary and the CLI always
//! have something well-formed to say.

use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use tracing::warn;

use crate::assemble::{assemble_context, build_prompt, transcript, AssembledContext, GroundingMode};
use crate::classify::{classify, Intent};
use crate::config::Config;
use crate::embedding::{create_embedder, embed_query, Embedder};
use crate::generate::{create_generator, Generator};
use crate::index::{build_index, CorpusIndex, IndexHandle};
use crate::memory::SessionStore;
use crate::models::Turn;
use crate::replies::{
    date_reply, time_reply, DEVELOPER_ATTRIBUTION, EMPTY_REJECTION, GENERATION_APOLOGY,
    GREETING_REPLY, STRICT_DECLINE, WELCOME,
};
use crate::sources::{ConfiguredSource, DocumentSource};

/// Orchestrates classification, retrieval, grounding, and memory for
/// every conversation.
pub struct ChatService {
    config: Arc<Config>,
    source: Arc<dyn DocumentSource>,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    index: IndexHandle,
    sessions: SessionStore,
}

impl ChatService {
    /// Assemble a service from explicit collaborators.
    ///
    /// The index starts empty; call [`ChatService::refresh`] to build it.
    pub fn new(
        config: Arc<Config>,
        source: Arc<dyn DocumentSource>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        let sessions = SessionStore::new(config.memory.max_turns);
        Self {
            config,
            source,
            embedder,
            generator,
            index: IndexHandle::empty(),
            sessions,
        }
    }

    /// Assemble a service with providers resolved from configuration.
    ///
    /// # Errors
    ///
    /// Fails when an enabled provider is misconfigured (unknown name,
    /// missing model, missing API key in the environment).
    pub fn from_config(config: Config) -> Result<Self> {
        let embedder = create_embedder(&config.embedding)?;
        let generator = create_generator(&config.generation)?;
        let source = Arc::new(ConfiguredSource::new(&config));
        Ok(Self::new(Arc::new(config), source, embedder, generator))
    }

    /// Rebuild the corpus index and swap it in atomically.
    ///
    /// Never fails: fetch and embedding errors shrink the new index
    /// instead of aborting. Returns the fresh snapshot.
    pub async fn refresh(&self) -> Arc<CorpusIndex> {
        let index = build_index(self.source.as_ref(), self.embedder.as_ref(), &self.config).await;
        self.index.replace(index).await
    }

    /// Register a session id. On first sight, records the welcome as an
    /// assistant turn and returns `true`.
    pub fn begin_session(&self, session_id: &str) -> bool {
        let new = self.sessions.observe(session_id);
        if new {
            self.sessions.append(session_id, Turn::assistant(WELCOME));
        }
        new
    }

    /// Produce a reply for one message. Never errors; failures degrade
    /// to fixed replies.
    pub async fn handle(&self, session_id: &str, message: &str) -> String {
        let message = message.trim();
        if message.is_empty() {
            return EMPTY_REJECTION.to_string();
        }

        if self.begin_session(session_id) {
            return WELCOME.to_string();
        }

        match classify(message) {
            Intent::Greeting => GREETING_REPLY.to_string(),
            Intent::TimeQuery(zone) => time_reply(Utc::now(), zone),
            Intent::DateQuery => date_reply(Utc::now()),
            Intent::DeveloperIdentity => DEVELOPER_ATTRIBUTION.to_string(),
            Intent::IdentityQuery(person) => {
                let assembled = AssembledContext {
                    context_block: person.bio.to_string(),
                    citations: Vec::new(),
                };
                self.generate_reply(session_id, message, GroundingMode::Open, assembled)
                    .await
            }
            Intent::DomainQuery => self.answer_domain(session_id, message).await,
            Intent::GeneralQuery => {
                self.generate_reply(
                    session_id,
                    message,
                    GroundingMode::Open,
                    AssembledContext::default(),
                )
                .await
            }
        }
    }

    /// Answer a domain question: retrieve, then generate under strict
    /// grounding. Empty retrieval falls back per the configured tier.
    async fn answer_domain(&self, session_id: &str, message: &str) -> String {
        let index = self.index.snapshot().await;
        let retrieval = &self.config.retrieval;

        let query_vec = match embed_query(self.embedder.as_ref(), message).await {
            Ok(v) => v,
            Err(e) => {
                warn!("Query embedding failed, retrieval skipped: {:#}", e);
                Vec::new()
            }
        };

        let hits = if query_vec.is_empty() {
            Vec::new()
        } else {
            index.search(&query_vec, retrieval.top_k, retrieval.threshold)
        };

        if !hits.is_empty() {
            let assembled = assemble_context(&hits);
            return self
                .generate_reply(session_id, message, GroundingMode::Strict, assembled)
                .await;
        }

        // Empty retrieval: the static tier grounds on the raw corpus text,
        // the decline tier answers without calling generation at all.
        if retrieval.strict_fallback == "static" && !index.static_text().is_empty() {
            let assembled = AssembledContext {
                context_block: index.static_text().to_string(),
                citations: Vec::new(),
            };
            return self
                .generate_reply(session_id, message, GroundingMode::Strict, assembled)
                .await;
        }

        STRICT_DECLINE.to_string()
    }

    /// Run generation and manage memory and citations around it.
    ///
    /// The transcript is taken before this exchange is appended, so the
    /// prompt sees only prior turns. Memory records the pre-citation
    /// reply; citations are a presentation concern.
    async fn generate_reply(
        &self,
        session_id: &str,
        message: &str,
        mode: GroundingMode,
        assembled: AssembledContext,
    ) -> String {
        let history = self.sessions.history(session_id);
        let conversation = transcript(&history);
        let prompt = build_prompt(mode, &assembled.context_block, &conversation, message);

        match self.generator.generate(&prompt).await {
            Ok(answer) => {
                self.sessions.append(session_id, Turn::user(message));
                self.sessions.append(session_id, Turn::assistant(answer.clone()));

                if assembled.citations.is_empty() {
                    answer
                } else {
                    format!("{}\n\nSources: {}", answer, assembled.citations.join(", "))
                }
            }
            Err(e) => {
                warn!("Generation failed: {:#}", e);
                GENERATION_APOLOGY.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Document, SourceKind};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FakeSource {
        static_text: String,
        docs: Vec<Document>,
    }

    #[async_trait]
    impl DocumentSource for FakeSource {
        async fn fetch_static(&self) -> Result<String> {
            Ok(self.static_text.clone())
        }

        async fn fetch_administrative(&self, limit: usize) -> Result<Vec<Document>> {
            let mut docs = self.docs.clone();
            docs.truncate(limit);
            Ok(docs)
        }
    }

    /// Maps texts onto three fixed directions so similarity is exact:
    /// "hostel" and "exam" texts match their own axis, everything else
    /// embeds to the zero vector and scores 0 against any query.
    struct KeywordEmbedder;

    #[async_trait]
    impl Embedder for KeywordEmbedder {
        fn model_name(&self) -> &str {
            "keyword"
        }

        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| {
                    let t = t.to_lowercase();
                    if t.contains("hostel") {
                        vec![1.0, 0.0, 0.0]
                    } else if t.contains("exam") {
                        vec![0.0, 1.0, 0.0]
                    } else {
                        vec![0.0, 0.0, 0.0]
                    }
                })
                .collect())
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        fn model_name(&self) -> &str {
            "failing"
        }

        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            anyhow::bail!("embedding service down")
        }
    }

    /// Records every prompt it sees and answers with a canned reply.
    struct RecordingGenerator {
        prompts: Mutex<Vec<String>>,
        reply: String,
    }

    impl RecordingGenerator {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                prompts: Mutex::new(Vec::new()),
                reply: reply.to_string(),
            })
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Generator for RecordingGenerator {
        fn model_name(&self) -> &str {
            "recording"
        }

        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.clone())
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl Generator for FailingGenerator {
        fn model_name(&self) -> &str {
            "failing"
        }

        async fn generate(&self, _prompt: &str) -> Result<String> {
            anyhow::bail!("generation service down")
        }
    }

    fn hostel_doc() -> Document {
        Document {
            source: SourceKind::Administrative,
            title: "Hostel Rules".to_string(),
            text: "hostel gates close at 10 PM".to_string(),
            keywords: Vec::new(),
            category: None,
            created_at: None,
        }
    }

    async fn service_with(
        config: Config,
        static_text: &str,
        docs: Vec<Document>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
    ) -> ChatService {
        let source = Arc::new(FakeSource {
            static_text: static_text.to_string(),
            docs,
        });
        let service = ChatService::new(Arc::new(config), source, embedder, generator);
        service.refresh().await;
        service
    }

    /// A service whose index holds one hostel chunk and the given static
    /// text, with generation always answering `reply`.
    async fn standard_service(static_text: &str, reply: &str) -> (ChatService, Arc<RecordingGenerator>) {
        let generator = RecordingGenerator::new(reply);
        let service = service_with(
            Config::default(),
            static_text,
            vec![hostel_doc()],
            Arc::new(KeywordEmbedder),
            generator.clone(),
        )
        .await;
        (service, generator)
    }

    /// Burn the one-time welcome so the next call exercises the real path.
    async fn open_session(service: &ChatService, sid: &str) {
        let reply = service.handle(sid, "hello").await;
        assert_eq!(reply, WELCOME);
    }

    #[tokio::test]
    async fn test_blank_input_rejected_before_welcome() {
        let (service, generator) = standard_service("", "unused").await;

        assert_eq!(service.handle("s", "   ").await, EMPTY_REJECTION);
        // The blank message did not consume the welcome.
        assert_eq!(service.handle("s", "hello").await, WELCOME);
        assert!(generator.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_welcome_only_once_per_session() {
        let (service, _) = standard_service("", "unused").await;

        assert_eq!(service.handle("s", "hello").await, WELCOME);
        assert_eq!(service.handle("s", "hello").await, GREETING_REPLY);
        // A different session gets its own welcome.
        assert_eq!(service.handle("t", "hello").await, WELCOME);
    }

    #[tokio::test]
    async fn test_welcome_recorded_as_assistant_turn() {
        let (service, _) = standard_service("", "unused").await;
        service.handle("s", "hello").await;

        let history = service.sessions.history("s");
        assert_eq!(history, vec![Turn::assistant(WELCOME)]);
    }

    #[tokio::test]
    async fn test_fixed_intents_short_circuit_generation() {
        // A failing generator proves these paths never call it.
        let service = service_with(
            Config::default(),
            "",
            vec![],
            Arc::new(KeywordEmbedder),
            Arc::new(FailingGenerator),
        )
        .await;
        open_session(&service, "s").await;

        assert_eq!(service.handle("s", "hey there").await, GREETING_REPLY);
        assert!(service.handle("s", "what time is it").await.starts_with("⏰ Time:"));
        assert!(service.handle("s", "what is the date").await.starts_with("📅 Date:"));
        assert_eq!(service.handle("s", "who created you").await, DEVELOPER_ATTRIBUTION);
    }

    #[tokio::test]
    async fn test_domain_query_grounds_and_cites() {
        let (service, generator) = standard_service("campus text", "Gates close at 10 PM.").await;
        open_session(&service, "s").await;

        let reply = service.handle("s", "when does the hostel close").await;
        assert_eq!(
            reply,
            "Gates close at 10 PM.\n\nSources: Administrative – Hostel Rules"
        );

        let prompts = generator.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("STRICT RULES:"));
        assert!(prompts[0].contains("[Administrative – Hostel Rules]"));
        assert!(prompts[0].contains("hostel gates close at 10 PM"));
    }

    #[tokio::test]
    async fn test_domain_empty_retrieval_static_fallback() {
        // "reappear" is a domain term but embeds to the zero vector, so
        // retrieval is empty and the static tier kicks in.
        let (service, generator) =
            standard_service("Reappear forms open after results.", "From the handbook.").await;
        open_session(&service, "s").await;

        let reply = service.handle("s", "how does reappear work").await;
        assert_eq!(reply, "From the handbook.");

        let prompts = generator.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("STRICT RULES:"));
        assert!(prompts[0].contains("CONTEXT:\nReappear forms open after results."));
    }

    #[tokio::test]
    async fn test_domain_decline_tier_skips_generation() {
        let mut config = Config::default();
        config.retrieval.strict_fallback = "decline".to_string();

        let generator = RecordingGenerator::new("unused");
        let service = service_with(
            config,
            "static corpus present but tier is decline",
            vec![],
            Arc::new(KeywordEmbedder),
            generator.clone(),
        )
        .await;
        open_session(&service, "s").await;

        assert_eq!(service.handle("s", "reappear rules").await, STRICT_DECLINE);
        assert!(generator.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_domain_static_tier_declines_without_static_corpus() {
        let (service, generator) = standard_service("", "unused").await;
        open_session(&service, "s").await;

        assert_eq!(service.handle("s", "reappear rules").await, STRICT_DECLINE);
        assert!(generator.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_domain_survives_query_embedding_failure() {
        let generator = RecordingGenerator::new("Degraded but grounded.");
        let service = service_with(
            Config::default(),
            "static corpus",
            vec![hostel_doc()],
            Arc::new(FailingEmbedder),
            generator.clone(),
        )
        .await;
        open_session(&service, "s").await;

        // Retrieval is skipped, the static fallback still answers.
        let reply = service.handle("s", "hostel timings").await;
        assert_eq!(reply, "Degraded but grounded.");
    }

    #[tokio::test]
    async fn test_general_query_open_mode_no_citations() {
        let (service, generator) = standard_service("campus text", "Paris.").await;
        open_session(&service, "s").await;

        let reply = service.handle("s", "what is the capital of france").await;
        assert_eq!(reply, "Paris.");

        let prompts = generator.prompts();
        assert!(prompts[0].contains("GUIDELINES:"));
        assert!(!prompts[0].contains("STRICT RULES:"));
    }

    #[tokio::test]
    async fn test_identity_query_grounds_on_biography() {
        let (service, generator) = standard_service("", "They are one of my developers.").await;
        open_session(&service, "s").await;

        let reply = service.handle("s", "who is sujith").await;
        assert_eq!(reply, "They are one of my developers.");

        let prompts = generator.prompts();
        assert!(prompts[0].contains("Sujith Lavudu"));
        assert!(prompts[0].contains("GUIDELINES:"));
    }

    #[tokio::test]
    async fn test_generation_failure_yields_apology_without_memory() {
        let service = service_with(
            Config::default(),
            "",
            vec![],
            Arc::new(KeywordEmbedder),
            Arc::new(FailingGenerator),
        )
        .await;
        open_session(&service, "s").await;

        let reply = service.handle("s", "tell me something interesting").await;
        assert_eq!(reply, GENERATION_APOLOGY);

        // The failed exchange left no trace beyond the welcome.
        assert_eq!(service.sessions.history("s").len(), 1);
    }

    #[tokio::test]
    async fn test_successful_exchange_recorded_pre_citation() {
        let (service, _) = standard_service("campus text", "Gates close at 10 PM.").await;
        open_session(&service, "s").await;

        service.handle("s", "when does the hostel close").await;

        let history = service.sessions.history("s");
        assert_eq!(history.len(), 3);
        assert_eq!(history[1], Turn::user("when does the hostel close"));
        // Memory holds the reply without the citation suffix.
        assert_eq!(history[2], Turn::assistant("Gates close at 10 PM."));
    }

    #[tokio::test]
    async fn test_conversation_carried_into_later_prompts() {
        let (service, generator) = standard_service("", "Noted.").await;
        open_session(&service, "s").await;

        service.handle("s", "my favourite colour is blue").await;
        service.handle("s", "write me a short poem").await;

        let prompts = generator.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[1].contains("CONVERSATION"));
        assert!(prompts[1].contains("user: my favourite colour is blue"));
        assert!(prompts[1].contains("assistant: Noted."));
    }

    #[tokio::test]
    async fn test_memory_stays_bounded() {
        let (service, _) = standard_service("", "Reply.").await;
        open_session(&service, "s").await;

        for i in 0..5 {
            service.handle("s", &format!("question number {}", i)).await;
        }

        let history = service.sessions.history("s");
        assert_eq!(history.len(), Config::default().memory.max_turns);
    }

    #[tokio::test]
    async fn test_from_config_with_disabled_providers() {
        let mut config = Config::default();
        config.corpus.static_path = std::path::PathBuf::from("/nonexistent/knowledge.txt");

        let service = ChatService::from_config(config).unwrap();
        // Everything is down, the index build still completes.
        let index = service.refresh().await;
        assert_eq!(index.chunk_count(), 0);
    }
}
