//! LLM-backed categorization via a Gemini-style `generateContent` endpoint

use super::keywords;
use super::types::{SummaryResponse, TaskItem};
use crate::config::CategorizerConfig;
use crate::error::{CoreError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::timeout;

const TEMPERATURE: f64 = 0.1;
const MAX_OUTPUT_TOKENS: u32 = 2048;

const EXAMPLE_CATEGORIES: &str =
    "Development, Meeting, Learning, Design, Testing, Debugging, Documentation, Code review";
const EXAMPLE_SUBCATEGORIES: &str = "Frontend, Backend, API, Database, UI/UX, Infrastructure";

/// Client for the external categorization model
#[derive(Clone)]
pub struct LlmCategorizer {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    timeout: Duration,
}

impl std::fmt::Debug for LlmCategorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmCategorizer")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct LlmSummary {
    #[serde(default)]
    categories: Vec<LlmCategory>,
}

#[derive(Debug, Deserialize)]
struct LlmCategory {
    category: String,
    subcategory: String,
    #[serde(default)]
    tasks: Vec<String>,
}

impl LlmCategorizer {
    /// Build a client, or `None` when no API key is configured
    pub fn from_config(config: &CategorizerConfig) -> Option<Self> {
        let api_key = config.active_api_key()?;
        Some(LlmCategorizer {
            client: reqwest::Client::new(),
            endpoint: format!(
                "{}/models/{}:generateContent",
                config.base_url.trim_end_matches('/'),
                config.model
            ),
            api_key: api_key.to_string(),
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Ask the model to group `tasks`. Any failure is returned as
    /// `CoreError::Categorize`; callers decide how to degrade.
    pub async fn categorize(
        &self,
        tasks: &[TaskItem],
        known_categories: &[String],
    ) -> Result<SummaryResponse> {
        let prompt = build_prompt(tasks, known_categories);
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": TEMPERATURE,
                "maxOutputTokens": MAX_OUTPUT_TOKENS,
            }
        });

        let response = timeout(
            self.timeout,
            self.client
                .post(&self.endpoint)
                .header("x-goog-api-key", &self.api_key)
                .json(&body)
                .send(),
        )
        .await
        .map_err(|_| {
            CoreError::Categorize(format!(
                "request timed out after {}s",
                self.timeout.as_secs()
            ))
        })??;

        if !response.status().is_success() {
            return Err(CoreError::Categorize(format!(
                "model API returned status {}",
                response.status()
            )));
        }

        let json: serde_json::Value = response.json().await?;
        let text = extract_text(&json)
            .ok_or_else(|| CoreError::Categorize("response contained no text".to_string()))?;

        parse_response(text, tasks, known_categories)
    }
}

/// Build the categorization prompt
pub fn build_prompt(tasks: &[TaskItem], known_categories: &[String]) -> String {
    let task_lines = tasks
        .iter()
        .map(|t| format!("- {} ({}ms)", t.task_name, t.duration_ms))
        .collect::<Vec<_>>()
        .join("\n");

    let category_hint = if known_categories.is_empty() {
        format!("Example categories: {}", EXAMPLE_CATEGORIES)
    } else {
        format!("Use only these categories: {}", known_categories.join(", "))
    };

    format!(
        r#"Group the following work items into categories and subcategories.
Assign every item to exactly one category and subcategory, and answer in JSON.

Work items:
{}

Answer format:
{{
  "categories": [
    {{ "category": "Development", "subcategory": "Frontend", "tasks": ["item 1", "item 2"] }},
    {{ "category": "Meeting", "subcategory": "Design review", "tasks": ["item 3"] }}
  ]
}}

{}
Example subcategories: {}
"#,
        task_lines, category_hint, EXAMPLE_SUBCATEGORIES
    )
}

/// Pull `candidates[0].content.parts[0].text` out of a generateContent response
fn extract_text(json: &serde_json::Value) -> Option<&str> {
    json.get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .get(0)?
        .get("text")?
        .as_str()
}

/// Parse the model's answer into totals.
///
/// Each task's duration is counted once, under the first category that names
/// it; names the model invents count zero. Tasks the model left out are
/// classified by the keyword rules so the grand total always matches the input.
/// Rows outside a non-empty `known_categories` list are folded into Other/General.
pub fn parse_response(
    text: &str,
    tasks: &[TaskItem],
    known_categories: &[String],
) -> Result<SummaryResponse> {
    let start = text
        .find('{')
        .ok_or_else(|| CoreError::Categorize("no JSON object in model output".to_string()))?;
    let end = text
        .rfind('}')
        .filter(|end| *end > start)
        .ok_or_else(|| CoreError::Categorize("unterminated JSON object in model output".to_string()))?;

    let parsed: LlmSummary = serde_json::from_str(&text[start..=end])?;

    let mut remaining: HashMap<&str, u64> = HashMap::new();
    for task in tasks {
        let entry = remaining.entry(task.task_name.as_str()).or_insert(0);
        *entry = entry.saturating_add(task.duration_ms);
    }

    let mut summary = SummaryResponse::default();
    for row in &parsed.categories {
        let total = row
            .tasks
            .iter()
            .filter_map(|name| remaining.remove(name.as_str()))
            .fold(0, u64::saturating_add);
        if keywords::is_known(&row.category, known_categories) {
            summary.add(&row.category, &row.subcategory, total);
        } else {
            summary.add(keywords::OTHER_CATEGORY, keywords::OTHER_SUBCATEGORY, total);
        }
    }

    for task in tasks {
        if let Some(duration_ms) = remaining.remove(task.task_name.as_str()) {
            let (category, subcategory) = keywords::classify(&task.task_name, known_categories);
            summary.add(category, subcategory, duration_ms);
        }
    }

    Ok(summary)
}
