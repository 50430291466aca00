//! AI client module for LLM integration via OpenRouter.
//!
//! This module provides:
//! - `AiClient` trait for abstracting AI providers
//! - `CachingAiClient` implementation with disk-based caching
//! - `FakeAiClient` for tests
//! - Strict structured generation against the candidate schemas
//! - Prompt templates for text, page and photo extraction
//!
//! # Configuration
//!
//! Set these environment variables:
//!
//! - `OPENROUTER_API_KEY` (required unless offline): Your OpenRouter API key
//! - `LARDER_AI_MODEL` (optional): Model name, e.g., "openai/gpt-4o-mini"
//! - `LARDER_AI_VISION_MODEL` (optional): Model used when a request has images
//! - `LARDER_AI_BASE_URL` (optional): API base URL
//! - `LARDER_AI_CACHE_DIR` (optional): Cache directory path
//! - `LARDER_AI_OFFLINE` (optional): Set to "true" to use cache only
//! - `LARDER_AI_RATE_LIMIT_MS` (optional): Delay between requests in ms
//!
//! # Example
//!
//! ```ignore
//! use larder_core::ai::{generate_structured, CachingAiClient, ChatMessage};
//! use larder_core::schema::TextCandidate;
//!
//! let client = CachingAiClient::from_env(false)?;
//! let generated = generate_structured::<TextCandidate>(
//!     &client,
//!     "text_extract",
//!     vec![ChatMessage::user("Pancakes: ...")],
//! )
//! .await?;
//! println!("{}", generated.candidate.title);
//! ```

mod cache;
mod client;
mod config;
mod fake;
pub mod prompts;
mod structured;
mod types;

pub use cache::{AiCache, CacheEntry, CacheKey};
pub use client::{AiClient, AiError, CachingAiClient};
pub use config::{AiConfig, ConfigError};
pub use fake::FakeAiClient;
pub use structured::{generate_structured, GenerationError, Generated};
pub use types::{ChatMessage, ChatRequest, ChatResponse, ImageData, ResponseSchema, Role, Usage};
