//! Provider-neutral chat types. `CachingAiClient` translates them to the
//! OpenAI wire format; the whole `ChatRequest` is also what the cache hashes.

use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::schema::{strict_schema, StrictSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Standing instructions.
    System,
    /// The material to extract from.
    User,
}

/// A photo attached to a user message, already validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageData {
    /// MIME type, e.g. "image/jpeg".
    pub media_type: String,
    pub base64: String,
}

impl ImageData {
    pub fn from_bytes(media_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            media_type: media_type.into(),
            base64: base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    }

    /// `data:` URL accepted by vision-capable chat APIs.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.base64)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ImageData>,
}

impl ChatMessage {
    fn new(role: Role, content: impl Into<String>, images: Vec<ImageData>) -> Self {
        Self {
            role,
            content: content.into(),
            images,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content, Vec::new())
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content, Vec::new())
    }

    pub fn user_with_images(content: impl Into<String>, images: Vec<ImageData>) -> Self {
        Self::new(Role::User, content, images)
    }

    pub fn has_images(&self) -> bool {
        !self.images.is_empty()
    }
}

/// Named JSON Schema the answer must conform to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseSchema {
    pub name: String,
    pub schema: JsonValue,
}

impl ResponseSchema {
    /// The strict schema of candidate type `T`.
    pub fn strict<T: StrictSchema>() -> Self {
        Self {
            name: T::NAME.to_string(),
            schema: strict_schema::<T>(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// `None` means free-form text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<ResponseSchema>,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn response_schema(mut self, schema: ResponseSchema) -> Self {
        self.response_schema = Some(schema);
        self
    }

    pub fn has_images(&self) -> bool {
        self.messages.iter().any(ChatMessage::has_images)
    }

    pub fn image_count(&self) -> usize {
        self.messages.iter().map(|m| m.images.len()).sum()
    }
}

/// Token accounting reported by the provider. Zero for cached and fake
/// answers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Raw text of the answer, expected to be JSON.
    pub content: String,
    pub usage: Usage,
    /// Served from the disk cache rather than the API.
    #[serde(default)]
    pub cached: bool,
}
