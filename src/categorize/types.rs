//! Categorization input and output types

use serde::{Deserialize, Serialize};

/// A finished unit of work: task name plus banked duration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskItem {
    pub task_name: String,
    pub duration_ms: u64,
}

/// Total time spent in one category/subcategory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryItem {
    pub category: String,
    pub subcategory: String,
    pub total_duration_ms: u64,
}

/// Grouped totals, in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub categories: Vec<CategoryItem>,
}

impl SummaryResponse {
    /// Add `duration_ms` to the matching row, creating it if needed
    pub fn add(&mut self, category: &str, subcategory: &str, duration_ms: u64) {
        match self
            .categories
            .iter_mut()
            .find(|c| c.category == category && c.subcategory == subcategory)
        {
            Some(existing) => {
                existing.total_duration_ms = existing.total_duration_ms.saturating_add(duration_ms)
            }
            None => self.categories.push(CategoryItem {
                category: category.to_string(),
                subcategory: subcategory.to_string(),
                total_duration_ms: duration_ms,
            }),
        }
    }

    pub fn total_duration_ms(&self) -> u64 {
        self.categories
            .iter()
            .map(|c| c.total_duration_ms)
            .fold(0, u64::saturating_add)
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
