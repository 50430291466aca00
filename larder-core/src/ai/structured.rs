//! Strict structured generation: ask the model for output conforming to a
//! candidate type's strict schema, and hold the answer to that schema.

use serde_json::Value as JsonValue;
use thiserror::Error;

use super::client::{AiClient, AiError};
use super::types::{ChatMessage, ChatRequest, ResponseSchema};
use crate::schema::{parse_model_output, validate_candidate, StrictSchema};

/// Upper bound on completion length for one extraction.
const MAX_COMPLETION_TOKENS: u32 = 4096;
const EXTRACTION_TEMPERATURE: f32 = 0.1;

#[derive(Error, Debug)]
pub enum GenerationError {
    /// The model answered, but not with a valid candidate. `raw` holds the
    /// parsed output when there was any.
    #[error("{reason}")]
    SchemaNotSatisfied {
        reason: String,
        raw: Option<JsonValue>,
    },

    /// The model reported that the input holds no usable recipe.
    #[error("{0}")]
    Declined(String),

    #[error(transparent)]
    Ai(#[from] AiError),
}

/// A validated candidate plus where it came from.
#[derive(Debug, Clone)]
pub struct Generated<T> {
    pub candidate: T,
    pub cached: bool,
}

/// Send `messages` with `T`'s strict schema attached and validate the answer.
pub async fn generate_structured<T: StrictSchema>(
    ai_client: &dyn AiClient,
    prompt_name: &str,
    messages: Vec<ChatMessage>,
) -> Result<Generated<T>, GenerationError> {
    let request = ChatRequest::new(messages)
        .max_tokens(MAX_COMPLETION_TOKENS)
        .temperature(EXTRACTION_TEMPERATURE)
        .response_schema(ResponseSchema::strict::<T>());

    let response = ai_client.complete(prompt_name, request).await?;

    let Some(raw) = parse_model_output(&response.content) else {
        return Err(GenerationError::SchemaNotSatisfied {
            reason: "response is not valid JSON".to_string(),
            raw: None,
        });
    };

    if let Some(message) = T::declined(&raw) {
        return Err(GenerationError::Declined(message));
    }

    match validate_candidate::<T>(&raw) {
        Ok(candidate) => Ok(Generated {
            candidate,
            cached: response.cached,
        }),
        Err(reason) => {
            tracing::debug!(prompt_name, reason = %reason, "model output failed validation");
            Err(GenerationError::SchemaNotSatisfied {
                reason,
                raw: Some(raw),
            })
        }
    }
}
