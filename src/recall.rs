//! Hosted long-term memory: snippets stored per user across sessions.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::MemoryConfig;
use crate::error::{MnemoError, Result};

/// A remembered snippet returned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    #[serde(default)]
    pub id: String,
    pub memory: String,
}

/// The external long-term memory service: write a turn, query past snippets.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    async fn search(&self, user_id: &str, query: &str) -> Result<Vec<MemoryRecord>>;
    async fn add(&self, user_id: &str, text: &str) -> Result<()>;
}

/// Client for the Mem0 hosted memory API.
pub struct Mem0Client {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl Mem0Client {
    pub fn from_config(cfg: &MemoryConfig) -> Result<Self> {
        let api_key = cfg
            .api_key
            .clone()
            .ok_or_else(|| MnemoError::Credential("Mem0 API key".into()))?;
        Ok(Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(20))
                .build()
                .map_err(|err| MnemoError::Memory(format!("http client error: {err}")))?,
            api_key,
            endpoint: cfg.endpoint.trim_end_matches('/').to_string(),
        })
    }

    fn parse_records(body: Value) -> Vec<MemoryRecord> {
        // The v1 API has returned both a bare array and {"results": [...]}.
        let items = match body {
            Value::Array(items) => items,
            Value::Object(mut map) => match map.remove("results") {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };
        items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect()
    }
}

#[async_trait]
impl MemoryStore for Mem0Client {
    async fn search(&self, user_id: &str, query: &str) -> Result<Vec<MemoryRecord>> {
        let resp = self
            .http
            .post(format!("{}/v1/memories/search/", self.endpoint))
            .header(reqwest::header::AUTHORIZATION, format!("Token {}", self.api_key))
            .json(&json!({ "query": query, "user_id": user_id }))
            .send()
            .await
            .map_err(|err| MnemoError::Memory(format!("search request error: {err}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(MnemoError::Memory(format!(
                "search failed with {status}: {body}"
            )));
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|err| MnemoError::Memory(format!("search response parse error: {err}")))?;
        Ok(Self::parse_records(body))
    }

    async fn add(&self, user_id: &str, text: &str) -> Result<()> {
        let resp = self
            .http
            .post(format!("{}/v1/memories/", self.endpoint))
            .header(reqwest::header::AUTHORIZATION, format!("Token {}", self.api_key))
            .json(&json!({
                "messages": [{ "role": "user", "content": text }],
                "user_id": user_id,
            }))
            .send()
            .await
            .map_err(|err| MnemoError::Memory(format!("add request error: {err}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(MnemoError::Memory(format!(
                "add failed with {status}: {body}"
            )));
        }
        Ok(())
    }
}

/// Naive in-process store used by tests and offline runs: keeps raw entries
/// per user and matches on shared lowercase words.
#[derive(Default)]
pub struct InMemoryStore {
    entries: Mutex<HashMap<String, Vec<String>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self, user_id: &str) -> Vec<String> {
        self.entries
            .lock()
            .expect("store lock")
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    async fn search(&self, user_id: &str, query: &str) -> Result<Vec<MemoryRecord>> {
        let words: Vec<String> = query
            .split_whitespace()
            .map(|w| w.to_lowercase())
            .filter(|w| w.len() > 2)
            .collect();

        let entries = self.entries.lock().expect("store lock");
        let matches = entries
            .get(user_id)
            .map(|stored| {
                stored
                    .iter()
                    .enumerate()
                    .filter(|(_, text)| {
                        let lower = text.to_lowercase();
                        words.iter().any(|w| lower.contains(w.as_str()))
                    })
                    .map(|(idx, text)| MemoryRecord {
                        id: idx.to_string(),
                        memory: text.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(matches)
    }

    async fn add(&self, user_id: &str, text: &str) -> Result<()> {
        self.entries
            .lock()
            .expect("store lock")
            .entry(user_id.to_string())
            .or_default()
            .push(text.to_string());
        Ok(())
    }
}
