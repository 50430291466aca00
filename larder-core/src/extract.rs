//! Extraction orchestrator.
//!
//! Each entry point runs one source through the model and decides between a
//! validated recipe, a partial recipe for manual completion, and a failure.
//! Nothing is retried.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::ai::prompts::{
    render_page_extract_prompt, render_photo_extract_prompt, render_text_extract_prompt,
    EXTRACTION_SYSTEM_PROMPT, PAGE_EXTRACT_PROMPT_NAME, PHOTO_EXTRACT_PROMPT_NAME,
    TEXT_EXTRACT_PROMPT_NAME,
};
use crate::ai::{
    generate_structured, AiClient, AiError, CachingAiClient, ChatMessage, GenerationError,
};
use crate::canonicalize::{normalize_page_candidate, normalize_text_candidate};
use crate::error::FetchError;
use crate::http::{ContentFetcher, DnsUrlGuard, ReqwestFetcher, UrlGuard};
use crate::image::{prepare_images, ImageError};
use crate::page::{extract_page_content, DEFAULT_MAX_PAGE_CHARS};
use crate::partial::extract_partial_recipe;
use crate::schema::{PageCandidate, StrictSchema, TextCandidate};
use crate::types::{ExtractionResult, NormalizedRecipe, RecipeSource};

/// Prefix of every `Incomplete` error message.
pub const INCOMPLETE_MESSAGE: &str = "Recipe incomplete, please review the extracted fields";

pub const DEFAULT_AI_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("No recipe text provided")]
    EmptyText,

    #[error("{0}")]
    UnsafeUrl(String),

    #[error("Failed to fetch page: {0}")]
    Fetch(#[from] FetchError),

    #[error("Timed out fetching page after {0} seconds")]
    FetchTimeout(u64),

    #[error("The page has no readable content")]
    EmptyPage,

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error("AI request failed: {0}")]
    Ai(#[from] AiError),

    #[error("AI request timed out after {0} seconds")]
    AiTimeout(u64),

    /// The model judged the input to hold no recipe.
    #[error("{0}")]
    Declined(String),
}

#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Bound on one model call.
    pub ai_timeout: Duration,
    /// Bound on one page fetch.
    pub fetch_timeout: Duration,
    /// Cap on readable page text sent to the model.
    pub max_page_chars: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            ai_timeout: DEFAULT_AI_TIMEOUT,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            max_page_chars: DEFAULT_MAX_PAGE_CHARS,
        }
    }
}

impl ExtractorConfig {
    /// Load overrides from the environment:
    ///
    /// - `LARDER_AI_TIMEOUT_SECS` (default: 60)
    /// - `LARDER_FETCH_TIMEOUT_SECS` (default: 15)
    /// - `LARDER_MAX_PAGE_CHARS` (default: 20000)
    ///
    /// Unparseable values fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let secs = |var: &str| env::var(var).ok().and_then(|v| v.parse::<u64>().ok());

        Self {
            ai_timeout: secs("LARDER_AI_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.ai_timeout),
            fetch_timeout: secs("LARDER_FETCH_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.fetch_timeout),
            max_page_chars: env::var("LARDER_MAX_PAGE_CHARS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_page_chars),
        }
    }
}

/// What one generation produced, before it becomes an [`ExtractionResult`].
enum Attempt {
    Complete(NormalizedRecipe),
    Incomplete {
        reason: String,
        raw: Option<JsonValue>,
    },
}

pub struct Extractor {
    ai: Arc<dyn AiClient>,
    guard: Arc<dyn UrlGuard>,
    fetcher: Arc<dyn ContentFetcher>,
    config: ExtractorConfig,
}

impl Extractor {
    pub fn new(
        ai: Arc<dyn AiClient>,
        guard: Arc<dyn UrlGuard>,
        fetcher: Arc<dyn ContentFetcher>,
        config: ExtractorConfig,
    ) -> Self {
        Self {
            ai,
            guard,
            fetcher,
            config,
        }
    }

    /// Production wiring: OpenRouter client, DNS guard, reqwest fetcher.
    /// `offline` serves model answers from the cache only.
    pub fn from_env(config: ExtractorConfig, offline: bool) -> Result<Self, ExtractError> {
        let ai = CachingAiClient::from_env(offline)?;
        let fetcher = ReqwestFetcher::new(config.fetch_timeout)?;
        Ok(Self::new(
            Arc::new(ai),
            Arc::new(DnsUrlGuard),
            Arc::new(fetcher),
            config,
        ))
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    pub async fn extract(&self, source: RecipeSource) -> ExtractionResult {
        tracing::debug!(source = source.kind(), "starting extraction");
        match source {
            RecipeSource::Text(text) => self.extract_from_text(&text).await,
            RecipeSource::Url(url) => self.extract_from_url(&url).await,
            RecipeSource::Photos(images) => self.extract_from_photos(images).await,
        }
    }

    pub async fn extract_from_text(&self, text: &str) -> ExtractionResult {
        let attempt = self.text_attempt(text).await;
        finish("text", attempt)
    }

    pub async fn extract_from_url(&self, url: &str) -> ExtractionResult {
        let attempt = self.url_attempt(url).await;
        finish("url", attempt)
    }

    pub async fn extract_from_photos(&self, images: Vec<Vec<u8>>) -> ExtractionResult {
        let attempt = self.photo_attempt(images).await;
        finish("photos", attempt)
    }

    async fn text_attempt(&self, text: &str) -> Result<Attempt, ExtractError> {
        if text.trim().is_empty() {
            return Err(ExtractError::EmptyText);
        }

        self.generate::<TextCandidate>(
            TEXT_EXTRACT_PROMPT_NAME,
            ChatMessage::user(render_text_extract_prompt(text)),
            normalize_text_candidate,
        )
        .await
    }

    async fn url_attempt(&self, raw_url: &str) -> Result<Attempt, ExtractError> {
        let validation = self.guard.validate(raw_url).await;
        if !validation.valid {
            let reason = validation
                .reason
                .unwrap_or_else(|| "URL is not allowed".to_string());
            return Err(ExtractError::UnsafeUrl(reason));
        }
        let url = validation
            .url
            .ok_or_else(|| ExtractError::UnsafeUrl("URL is not allowed".to_string()))?;

        let fetch = self.fetcher.fetch(&url, &validation.addrs);
        let fetched = tokio::time::timeout(self.config.fetch_timeout, fetch)
            .await
            .map_err(|_| ExtractError::FetchTimeout(self.config.fetch_timeout.as_secs()))??;

        let page = extract_page_content(&fetched.body, &url, self.config.max_page_chars);
        if page.is_empty() {
            return Err(ExtractError::EmptyPage);
        }
        tracing::debug!(
            url = %url,
            text_chars = page.text.len(),
            has_json_ld = page.recipe_json_ld.is_some(),
            "page content extracted"
        );

        let prompt = render_page_extract_prompt(
            url.as_str(),
            &page.text,
            page.recipe_json_ld_text().as_deref(),
        );
        let attempt = self
            .generate::<PageCandidate>(
                PAGE_EXTRACT_PROMPT_NAME,
                ChatMessage::user(prompt),
                normalize_page_candidate,
            )
            .await?;

        Ok(match attempt {
            Attempt::Complete(mut recipe) => {
                recipe.image_url = recipe
                    .image_url
                    .and_then(|href| url.join(&href).ok())
                    .map(String::from)
                    .or(page.image_url);
                recipe.source_url = Some(url.to_string());
                Attempt::Complete(recipe)
            }
            incomplete => incomplete,
        })
    }

    async fn photo_attempt(&self, images: Vec<Vec<u8>>) -> Result<Attempt, ExtractError> {
        let prepared = prepare_images(images).await?;

        let prompt = render_photo_extract_prompt(prepared.len());
        let attempt = self
            .generate::<PageCandidate>(
                PHOTO_EXTRACT_PROMPT_NAME,
                ChatMessage::user_with_images(prompt, prepared),
                normalize_page_candidate,
            )
            .await?;

        Ok(match attempt {
            Attempt::Complete(mut recipe) => {
                recipe.image_url = None;
                Attempt::Complete(recipe)
            }
            incomplete => incomplete,
        })
    }

    /// One model call: the shared system message followed by `prompt`.
    async fn generate<T: StrictSchema>(
        &self,
        prompt_name: &str,
        prompt: ChatMessage,
        normalize: fn(T) -> NormalizedRecipe,
    ) -> Result<Attempt, ExtractError> {
        let messages = vec![ChatMessage::system(EXTRACTION_SYSTEM_PROMPT), prompt];
        let generation = generate_structured::<T>(self.ai.as_ref(), prompt_name, messages);

        match tokio::time::timeout(self.config.ai_timeout, generation).await {
            Err(_) => Err(ExtractError::AiTimeout(self.config.ai_timeout.as_secs())),
            Ok(Ok(generated)) => {
                tracing::debug!(prompt_name, cached = generated.cached, "candidate accepted");
                Ok(Attempt::Complete(normalize(generated.candidate)))
            }
            Ok(Err(GenerationError::SchemaNotSatisfied { reason, raw })) => {
                Ok(Attempt::Incomplete { reason, raw })
            }
            Ok(Err(GenerationError::Declined(message))) => Err(ExtractError::Declined(message)),
            Ok(Err(GenerationError::Ai(e))) => Err(ExtractError::Ai(e)),
        }
    }
}

fn finish(source: &'static str, attempt: Result<Attempt, ExtractError>) -> ExtractionResult {
    match attempt {
        Ok(Attempt::Complete(recipe)) => {
            tracing::info!(
                source,
                outcome = "success",
                ingredients = recipe.ingredients.len(),
                steps = recipe.method.len(),
                "recipe extracted"
            );
            ExtractionResult::Success { recipe }
        }
        Ok(Attempt::Incomplete { reason, raw }) => {
            let partial_recipe = raw.as_ref().and_then(extract_partial_recipe);
            tracing::info!(
                source,
                outcome = "incomplete",
                reason = %reason,
                recovered_fields = partial_recipe.as_ref().map_or(0, |p| p.field_count()),
                "recipe extracted"
            );
            ExtractionResult::Incomplete {
                error: format!("{INCOMPLETE_MESSAGE}: {reason}"),
                partial_recipe,
            }
        }
        Err(e) => {
            tracing::warn!(source, outcome = "failure", error = %e, "recipe extraction failed");
            ExtractionResult::failure(e.to_string())
        }
    }
}
