//! # Lectern
//!
//! Retrieval-augmented question answering over a local academic document
//! corpus, with a rule-table fast path and a choice of generation backends.
//!
//! At startup the corpus directory is read wholesale, chunked into
//! overlapping windows, embedded locally, and indexed in memory. Each
//! question then either hits the rule table (hybrid mode), or retrieves
//! the most similar chunks and asks a generation backend to answer from
//! that context only.
//!
//! ```text
//! ┌────────┐   ┌─────────┐   ┌───────────┐   ┌─────────────┐
//! │ Corpus │──▶│ Chunker │──▶│ Embedding │──▶│ VectorIndex │
//! └────────┘   └─────────┘   └───────────┘   └──────┬──────┘
//!                                                   │ top-k
//!          ┌───────┐    no match   ┌────────┐       │
//! question │ Rules │──────────────▶│ Router │◀──────┘
//!          └───────┘               └───┬────┘
//!                                      ▼
//!                          ┌──────────────────────┐
//!                          │  GenerationBackend   │
//!                          │   gemini │ llama     │
//!                          └──────────────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`corpus`] | Document corpus loading |
//! | [`chunk`] | Overlapping fixed-window chunker |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`index`] | In-memory cosine vector index |
//! | [`backend`] | Generation backends and registry |
//! | [`rules`] | Keyword rule table |
//! | [`router`] | Hybrid answer policy |
//! | [`service`] | One-shot service initialization |
//! | [`server`] | HTTP boundary |
//! | [`error`] | Typed error taxonomy |

pub mod backend;
pub mod chunk;
pub mod config;
pub mod corpus;
pub mod embedding;
pub mod error;
pub mod index;
pub mod router;
pub mod rules;
pub mod server;
pub mod service;
