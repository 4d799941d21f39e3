//! Riskline-LLM: Model Service Client
//!
//! This crate owns the seam between the analysis pipeline and the model
//! serving it. The pipeline only sees the [`ModelClient`] trait; the
//! production implementation ([`OllamaClient`]) speaks the Ollama chat
//! protocol with JSON-format answers, and tests script responses through
//! `fakes::ScriptedModelClient`.

pub mod client;
mod error;
pub mod fakes;
mod ollama;

pub use client::{ModelClient, ModelConfig, ModelRequest};
pub use error::ModelError;
pub use ollama::OllamaClient;
