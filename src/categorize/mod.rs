//! Categorization of finished sessions
//!
//! Groups `(task_name, duration_ms)` pairs into category/subcategory totals.
//! An LLM is consulted when an API key is configured; keyword rules are the
//! deterministic fallback, so categorization itself never fails.

pub mod keywords;
pub mod llm;
pub mod types;

pub use llm::LlmCategorizer;
pub use types::{CategoryItem, SummaryResponse, TaskItem};

use crate::config::CategorizerConfig;

/// Categorizer with an optional LLM backend
#[derive(Debug, Clone, Default)]
pub struct Categorizer {
    llm: Option<LlmCategorizer>,
}

impl Categorizer {
    pub fn from_config(config: &CategorizerConfig) -> Self {
        let llm = LlmCategorizer::from_config(config);
        if llm.is_some() {
            tracing::info!("LLM categorizer enabled (model: {})", config.model);
        } else {
            tracing::info!("No categorizer API key configured, using keyword rules");
        }
        Categorizer { llm }
    }

    /// Keyword rules only
    pub fn keyword_only() -> Self {
        Categorizer { llm: None }
    }

    pub fn uses_llm(&self) -> bool {
        self.llm.is_some()
    }

    /// Group `tasks` into totals. `known_categories` (if non-empty) restricts
    /// which categories may be used.
    pub async fn categorize(
        &self,
        tasks: &[TaskItem],
        known_categories: &[String],
    ) -> SummaryResponse {
        if tasks.is_empty() {
            return SummaryResponse::default();
        }

        if let Some(llm) = &self.llm {
            match llm.categorize(tasks, known_categories).await {
                Ok(summary) => return summary,
                Err(e) => {
                    tracing::warn!("LLM categorization failed, using keyword rules: {}", e);
                }
            }
        }

        keywords::categorize(tasks, known_categories)
    }
}
