//! Model access: the [`AiClient`] seam and its OpenRouter implementation.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImageArgs,
        ChatCompletionRequestMessageContentPartTextArgs, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContentPart,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs, CreateChatCompletionResponse,
        ImageUrlArgs, ResponseFormat, ResponseFormatJsonSchema,
    },
    Client,
};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::cache::{AiCache, CacheKey};
use super::config::AiConfig;
use super::types::{ChatMessage, ChatRequest, ChatResponse, Role, Usage};

#[derive(Error, Debug)]
pub enum AiError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Response not in cache and offline mode is enabled")]
    OfflineNotCached,

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Configuration error: {0}")]
    Config(#[from] super::config::ConfigError),
}

impl From<OpenAIError> for AiError {
    fn from(e: OpenAIError) -> Self {
        AiError::Api(e.to_string())
    }
}

/// Anything that can answer a chat request.
#[async_trait]
pub trait AiClient: Send + Sync {
    /// `prompt_name` groups cache entries and fake responses; it never
    /// reaches the model.
    async fn complete(
        &self,
        prompt_name: &str,
        request: ChatRequest,
    ) -> Result<ChatResponse, AiError>;
}

/// Keeps consecutive API calls at least `interval` apart.
#[derive(Debug)]
struct RateLimiter {
    interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_call: Mutex::new(None),
        }
    }

    async fn wait(&self) {
        let mut last_call = self.last_call.lock().await;
        if let Some(earlier) = *last_call {
            let ready_at = earlier + self.interval;
            if ready_at > Instant::now() {
                tokio::time::sleep_until(ready_at).await;
            }
        }
        *last_call = Some(Instant::now());
    }
}

/// OpenRouter client with a disk cache in front of it. Cache hits skip the
/// rate limiter; offline mode never reaches the network.
pub struct CachingAiClient {
    client: Client<OpenAIConfig>,
    cache: AiCache,
    config: AiConfig,
    limiter: RateLimiter,
}

impl CachingAiClient {
    /// `offline` forces cache-only mode on top of `LARDER_AI_OFFLINE`.
    pub fn from_env(offline: bool) -> Result<Self, AiError> {
        let config = AiConfig::from_env_with_offline(offline)?;
        tracing::debug!(
            model = %config.model,
            vision_model = %config.vision_model,
            offline = config.offline,
            "AI client configured"
        );
        Ok(Self::new(config))
    }

    pub fn new(config: AiConfig) -> Self {
        let client = Client::with_config(
            OpenAIConfig::new()
                .with_api_key(&config.api_key)
                .with_api_base(&config.base_url),
        );

        Self {
            client,
            cache: AiCache::new(config.cache_dir.clone()),
            limiter: RateLimiter::new(Duration::from_millis(config.rate_limit_ms)),
            config,
        }
    }

    /// Requests with images go to the vision model.
    fn model_for(&self, request: &ChatRequest) -> &str {
        if request.has_images() {
            &self.config.vision_model
        } else {
            &self.config.model
        }
    }

    fn build_request(
        model: &str,
        request: &ChatRequest,
    ) -> Result<CreateChatCompletionRequest, AiError> {
        let messages = request
            .messages
            .iter()
            .map(to_openai_message)
            .collect::<Result<Vec<_>, _>>()?;

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder.model(model).messages(messages);

        if let Some(max_tokens) = request.max_tokens {
            builder.max_completion_tokens(max_tokens);
        }
        if let Some(temperature) = request.temperature {
            builder.temperature(temperature);
        }
        if let Some(schema) = &request.response_schema {
            builder.response_format(ResponseFormat::JsonSchema {
                json_schema: ResponseFormatJsonSchema {
                    description: None,
                    name: schema.name.clone(),
                    schema: Some(schema.schema.clone()),
                    strict: Some(true),
                },
            });
        }

        Ok(builder.build()?)
    }
}

fn to_openai_message(msg: &ChatMessage) -> Result<ChatCompletionRequestMessage, AiError> {
    let message: ChatCompletionRequestMessage = match msg.role {
        Role::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(msg.content.as_str())
            .build()?
            .into(),
        Role::User if msg.has_images() => {
            let text = ChatCompletionRequestMessageContentPartTextArgs::default()
                .text(msg.content.as_str())
                .build()?;
            let mut parts = vec![ChatCompletionRequestUserMessageContentPart::from(text)];

            for image in &msg.images {
                let image_url = ImageUrlArgs::default().url(image.data_url()).build()?;
                let part = ChatCompletionRequestMessageContentPartImageArgs::default()
                    .image_url(image_url)
                    .build()?;
                parts.push(part.into());
            }

            ChatCompletionRequestUserMessageArgs::default()
                .content(parts)
                .build()?
                .into()
        }
        Role::User => ChatCompletionRequestUserMessageArgs::default()
            .content(msg.content.as_str())
            .build()?
            .into(),
    };
    Ok(message)
}

/// First choice's text, or why there is none.
fn answer_from(response: CreateChatCompletionResponse) -> Result<ChatResponse, AiError> {
    let usage = response
        .usage
        .map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        })
        .unwrap_or_default();

    let message = response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message)
        .ok_or_else(|| AiError::ParseError("response has no choices".to_string()))?;

    if let Some(refusal) = message.refusal {
        return Err(AiError::Api(format!("model refused: {refusal}")));
    }

    let content = message
        .content
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| AiError::ParseError("response has no content".to_string()))?;

    Ok(ChatResponse {
        content,
        usage,
        cached: false,
    })
}

#[async_trait]
impl AiClient for CachingAiClient {
    async fn complete(
        &self,
        prompt_name: &str,
        request: ChatRequest,
    ) -> Result<ChatResponse, AiError> {
        let model = self.model_for(&request);
        let key = CacheKey::new(prompt_name, model, &request);

        if let Some(hit) = self.cache.lookup(&key) {
            tracing::debug!(prompt_name, model, "AI cache hit");
            return Ok(hit);
        }
        if self.config.offline {
            return Err(AiError::OfflineNotCached);
        }

        let openai_request = Self::build_request(model, &request)?;

        self.limiter.wait().await;
        tracing::debug!(
            prompt_name,
            model,
            images = request.image_count(),
            "calling AI API"
        );
        let response = self.client.chat().create(openai_request).await?;
        let answer = answer_from(response)?;

        tracing::debug!(
            prompt_name,
            total_tokens = answer.usage.total_tokens,
            "AI API answered"
        );

        let schema_name = request.response_schema.as_ref().map(|s| s.name.as_str());
        if let Err(e) = self.cache.store(&key, &answer, schema_name) {
            tracing::warn!(error = %e, "failed to cache AI response");
        }

        Ok(answer)
    }
}
