//! On-disk store of model answers, so re-running an extraction over the same
//! input costs nothing and works offline.
//!
//! Layout: `{cache_dir}/{prompt}/{model}/{digest[..2]}/{digest}.json`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::types::{ChatRequest, ChatResponse, Usage};

/// One stored answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub content: String,
    pub usage: Usage,
    pub model: String,
    /// Name of the response schema the answer was generated against.
    #[serde(default)]
    pub schema: Option<String>,
    pub stored_at: DateTime<Utc>,
}

/// Identifies one request. Anything that can change the answer (messages,
/// images, sampling parameters, response schema, model) changes the digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    pub prompt_name: String,
    pub model: String,
    pub digest: String,
}

impl CacheKey {
    pub fn new(prompt_name: &str, model: &str, request: &ChatRequest) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(model.as_bytes());
        hasher.update([0]);
        hasher.update(serde_json::to_vec(request).unwrap_or_default());

        let digest = hasher.finalize().iter().fold(String::new(), |mut hex, b| {
            let _ = write!(hex, "{b:02x}");
            hex
        });

        Self {
            prompt_name: prompt_name.to_string(),
            model: model.to_string(),
            digest,
        }
    }

    /// Path of the entry relative to the cache root.
    pub fn relative_path(&self) -> PathBuf {
        // "openai/gpt-4o" is one directory, not two
        let model_dir = self.model.replace('/', "--");

        [
            self.prompt_name.as_str(),
            model_dir.as_str(),
            &self.digest[..2],
            &format!("{}.json", self.digest),
        ]
        .iter()
        .collect()
    }
}

#[derive(Debug, Clone)]
pub struct AiCache {
    root: PathBuf,
}

impl AiCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The stored answer for `key`, marked as cached. Unreadable or corrupt
    /// entries count as misses.
    pub fn lookup(&self, key: &CacheKey) -> Option<ChatResponse> {
        let path = self.root.join(key.relative_path());
        let raw = fs::read(&path).ok()?;

        match serde_json::from_slice::<CacheEntry>(&raw) {
            Ok(entry) => Some(ChatResponse {
                content: entry.content,
                usage: entry.usage,
                cached: true,
            }),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "ignoring corrupt cache entry");
                None
            }
        }
    }

    /// Store an answer. The entry is written to a temporary file and renamed
    /// into place, so concurrent readers never see a half-written entry.
    pub fn store(
        &self,
        key: &CacheKey,
        response: &ChatResponse,
        schema: Option<&str>,
    ) -> io::Result<()> {
        let path = self.root.join(key.relative_path());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let entry = CacheEntry {
            content: response.content.clone(),
            usage: response.usage.clone(),
            model: key.model.clone(),
            schema: schema.map(str::to_string),
            stored_at: Utc::now(),
        };
        let json = serde_json::to_vec_pretty(&entry).map_err(io::Error::other)?;

        let tmp = path.with_extension(format!("{}.tmp", std::process::id()));
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)
    }
}
