//! Shared LLM client layer for the concierge service.
//!
//! The crate hides provider-specific wire formats behind [`GenerationClient`]:
//! callers hand over a system instruction, a user prompt and a declarative
//! [`ResponseSchema`], and get back the raw JSON text of the first candidate.
//!
//! - [`config`]       : model/provider configuration and env loading
//! - [`error_handler`]: unified [`AiLlmError`]
//! - [`generation`]   : the client trait and structured-output request types
//! - [`services`]     : Gemini and OpenAI implementations, plus [`connect`]
//! - [`telemetry`]    : library-scoped `tracing` layer

pub mod config;
pub mod error_handler;
pub mod generation;
pub mod services;
pub mod telemetry;

pub use config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider};
pub use error_handler::{AiLlmError, ConfigError, ProviderError, ProviderErrorKind, Result};
pub use generation::{GenerationClient, ResponseSchema, SchemaField, StructuredRequest};
pub use services::connect;
