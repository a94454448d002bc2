//! Rule-based task categorization.
//!
//! The first rule with a keyword contained in the (lowercased) task name wins.

use super::types::{SummaryResponse, TaskItem};

pub const OTHER_CATEGORY: &str = "Other";
pub const OTHER_SUBCATEGORY: &str = "General";

struct Rule {
    category: &'static str,
    subcategory: &'static str,
    keywords: &'static [&'static str],
}

const RULES: &[Rule] = &[
    Rule {
        category: "Development",
        subcategory: "Implementation",
        keywords: &[
            "develop", "code", "coding", "implement", "program", "refactor", "開発", "コード",
            "実装", "プログラム",
        ],
    },
    Rule {
        category: "Development",
        subcategory: "Testing",
        keywords: &["test", "debug", "テスト", "デバッグ"],
    },
    Rule {
        category: "Meeting",
        subcategory: "Team meeting",
        keywords: &["meeting", "standup", "1:1", "会議", "ミーティング", "打ち合わせ"],
    },
    Rule {
        category: "Learning",
        subcategory: "Research",
        keywords: &[
            "learn", "study", "research", "investigat", "学習", "勉強", "調査", "研究",
        ],
    },
    Rule {
        category: "Design",
        subcategory: "System design",
        keywords: &["design", "spec", "architecture", "設計", "仕様"],
    },
    Rule {
        category: "Documentation",
        subcategory: "Technical writing",
        keywords: &["document", "docs", "writing", "ドキュメント", "資料", "文書"],
    },
];

/// Category and subcategory for a single task name.
///
/// When `known_categories` is non-empty, a matched category outside that list
/// falls through to Other/General.
pub fn classify(task_name: &str, known_categories: &[String]) -> (&'static str, &'static str) {
    let name = task_name.to_lowercase();

    RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| name.contains(k)))
        .filter(|rule| is_known(rule.category, known_categories))
        .map(|rule| (rule.category, rule.subcategory))
        .unwrap_or((OTHER_CATEGORY, OTHER_SUBCATEGORY))
}

pub(crate) fn is_known(category: &str, known_categories: &[String]) -> bool {
    known_categories.is_empty()
        || known_categories
            .iter()
            .any(|k| k.trim().eq_ignore_ascii_case(category))
}

/// Group tasks by keyword rules, summing durations per category/subcategory
pub fn categorize(tasks: &[TaskItem], known_categories: &[String]) -> SummaryResponse {
    let mut summary = SummaryResponse::default();
    for task in tasks {
        let (category, subcategory) = classify(&task.task_name, known_categories);
        summary.add(category, subcategory, task.duration_ms);
    }
    summary
}
