//! Text analysis tool: word/character counts and a keyword sentiment check.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Value};

use crate::error::Result;
use crate::tool::Tool;

const POSITIVE_WORDS: &[&str] = &[
    "good", "great", "awesome", "amazing", "love", "excellent", "happy", "nice", "fantastic",
    "positive",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad", "terrible", "awful", "hate", "poor", "sad", "angry", "worst", "negative", "horrible",
];

fn word_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b\w+\b").expect("static word pattern"))
}

pub struct AnalyzeTextTool;

#[async_trait]
impl Tool for AnalyzeTextTool {
    fn name(&self) -> &str {
        "analyze_text"
    }

    fn description(&self) -> &str {
        "Analyze text: word count, character count, and rule-based sentiment. Expects {\"text\": string}."
    }

    fn parameters(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "text": {"type": "string", "description": "Text to analyze"}
            },
            "required": ["text"]
        }))
    }

    async fn call(&self, input: Value) -> Result<Value> {
        let Some(text) = input.get("text").and_then(Value::as_str) else {
            return Ok(json!({ "error": "`text` must be a string" }));
        };
        if text.trim().is_empty() {
            return Ok(json!({ "error": "text is empty" }));
        }

        Ok(analyze(text))
    }
}

fn analyze(text: &str) -> Value {
    let tokens: Vec<&str> = word_pattern().find_iter(text).map(|m| m.as_str()).collect();
    let word_count = tokens.len();
    let character_count = text.chars().count();

    let lower: Vec<String> = tokens.iter().map(|t| t.to_lowercase()).collect();
    let pos_hits = lower
        .iter()
        .filter(|t| POSITIVE_WORDS.contains(&t.as_str()))
        .count();
    let neg_hits = lower
        .iter()
        .filter(|t| NEGATIVE_WORDS.contains(&t.as_str()))
        .count();

    let (sentiment, reason) = if pos_hits > neg_hits {
        (
            "positive",
            format!("More positive keywords ({pos_hits}) than negative keywords ({neg_hits})."),
        )
    } else if neg_hits > pos_hits {
        (
            "negative",
            format!("More negative keywords ({neg_hits}) than positive keywords ({pos_hits})."),
        )
    } else {
        (
            "neutral",
            format!("Equal/zero keyword hits (pos={pos_hits}, neg={neg_hits})."),
        )
    };

    json!({
        "word_count": word_count,
        "character_count": character_count,
        "sentiment": sentiment,
        "sentiment_reason": reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn counts_words_and_characters() {
        let result = AnalyzeTextTool.call(json!({"text": "a b c"})).await.unwrap();
        assert_eq!(result["word_count"], 3);
        assert_eq!(result["character_count"], 5);
    }

    #[tokio::test]
    async fn detects_positive_sentiment() {
        let result = AnalyzeTextTool
            .call(json!({"text": "What a great and happy day"}))
            .await
            .unwrap();
        assert_eq!(result["sentiment"], "positive");
        assert!(result["sentiment_reason"].as_str().unwrap().contains("(2)"));
    }

    #[tokio::test]
    async fn balanced_keywords_are_neutral() {
        let result = AnalyzeTextTool
            .call(json!({"text": "good food, bad service"}))
            .await
            .unwrap();
        assert_eq!(result["sentiment"], "neutral");
    }

    #[tokio::test]
    async fn blank_text_is_an_error_payload() {
        let result = AnalyzeTextTool.call(json!({"text": "   "})).await.unwrap();
        assert!(result["error"].as_str().unwrap().contains("empty"));
    }

    #[test]
    fn character_count_is_unicode_aware() {
        let out = analyze("héllo");
        assert_eq!(out["character_count"], 5);
    }
}
