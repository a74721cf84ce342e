//! Query routing and the hybrid answer policy.
//!
//! Each request walks `START → RULE_CHECK (hybrid only) → RETRIEVE →
//! GENERATE → DONE`, with two short-circuits:
//!
//! - a rule match ends the request immediately (no retrieval, no
//!   generation);
//! - empty retrieval ends the request with the fixed "don't know" answer,
//!   so the model is never asked to answer without supporting context.
//!
//! The model tag is validated before any other work; an unknown tag is a
//! client error and must not cost an embedding call. In `hybrid` mode the
//! generation fallback is the cloud backend; `gemini` and `llama` modes
//! skip the rule table and always retrieve.

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::backend::BackendRegistry;
use crate::embedding::EmbeddingProvider;
use crate::error::AnswerError;
use crate::index::{ScoredChunk, VectorIndex};
use crate::rules::RulesEngine;

/// The fixed answer used both when retrieval comes back empty and as the
/// phrase the backend is instructed to emit when the supplied context is
/// insufficient.
pub const UNGROUNDED_ANSWER: &str = "I don't know based on the provided documents.";

/// Which backend a request is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTag {
    Gemini,
    Llama,
    Hybrid,
}

impl FromStr for ModelTag {
    type Err = AnswerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gemini" => Ok(ModelTag::Gemini),
            "llama" => Ok(ModelTag::Llama),
            "hybrid" => Ok(ModelTag::Hybrid),
            other => Err(AnswerError::InvalidModel(other.to_string())),
        }
    }
}

/// Provenance tag identifying which path produced an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnswerSource {
    RuleBased,
    CloudGeneration,
    LocalGeneration,
    /// Retrieval found nothing to ground an answer in; generation was
    /// skipped.
    NoContext,
}

impl AnswerSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerSource::RuleBased => "rule-based",
            AnswerSource::CloudGeneration => "cloud-generation",
            AnswerSource::LocalGeneration => "local-generation",
            AnswerSource::NoContext => "no-context",
        }
    }
}

impl std::fmt::Display for AnswerSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub source: AnswerSource,
}

/// The per-request orchestrator over the shared, read-only service state.
pub struct QueryRouter {
    rules: RulesEngine,
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<VectorIndex>,
    backends: BackendRegistry,
    top_k: usize,
}

impl QueryRouter {
    pub fn new(
        rules: RulesEngine,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<VectorIndex>,
        backends: BackendRegistry,
        top_k: usize,
    ) -> Self {
        Self {
            rules,
            embedder,
            index,
            backends,
            top_k,
        }
    }

    pub async fn answer(&self, question: &str, model: &str) -> Result<Answer, AnswerError> {
        let tag: ModelTag = model.parse()?;

        if tag == ModelTag::Hybrid {
            if let Some(rule_answer) = self.rules.match_question(question) {
                tracing::debug!("answered from the rule table");
                return Ok(Answer {
                    text: rule_answer.to_string(),
                    source: AnswerSource::RuleBased,
                });
            }
        }

        let retrieved = self.retrieve(question)?;
        if retrieved.is_empty() {
            tracing::debug!("retrieval returned no context, skipping generation");
            return Ok(Answer {
                text: UNGROUNDED_ANSWER.to_string(),
                source: AnswerSource::NoContext,
            });
        }

        let prompt = build_grounded_prompt(&retrieved, question);

        let backend_name = match tag {
            ModelTag::Llama => "llama",
            // Hybrid falls back to the cloud backend when no rule matched.
            ModelTag::Gemini | ModelTag::Hybrid => "gemini",
        };
        let backend = self
            .backends
            .find(backend_name)
            .ok_or_else(|| AnswerError::BackendUnavailable(backend_name.to_string()))?;

        let text = backend.generate(&prompt).await?;
        Ok(Answer {
            text,
            source: backend.source(),
        })
    }

    fn retrieve(&self, question: &str) -> Result<Vec<ScoredChunk>, AnswerError> {
        let query_vec = self.embedder.embed(question)?;
        Ok(self.index.search(&query_vec, self.top_k)?)
    }
}

/// Assemble the grounded prompt: a restriction to the supplied context, the
/// provenance-tagged context blocks, and the question.
pub fn build_grounded_prompt(context: &[ScoredChunk], question: &str) -> String {
    let mut blocks = String::new();
    for hit in context {
        blocks.push_str(&format!(
            "[Source: {} | chunk {}]\n{}\n\n",
            hit.chunk.doc_id, hit.chunk.ordinal, hit.chunk.text
        ));
    }

    format!(
        "You are an academic assistant.\n\
         Answer the question using ONLY the context below.\n\
         If the answer is not in the context, say:\n\
         \"{}\"\n\n\
         Context:\n{}\
         Question:\n{}\n",
        UNGROUNDED_ANSWER, blocks, question
    )
}
