//! Markdown rendering of a category summary

use crate::categorize::SummaryResponse;
use std::fmt::Write;

/// Render `summary` as a Markdown report with rows sorted by time spent
pub fn render_markdown(summary: &SummaryResponse, title: &str) -> String {
    let mut out = format!("# {}\n\n", title);

    if summary.is_empty() {
        out.push_str("No completed sessions.\n");
        return out;
    }

    let mut rows: Vec<_> = summary.categories.iter().collect();
    // Stable sort keeps first-seen order among equal durations
    rows.sort_by(|a, b| b.total_duration_ms.cmp(&a.total_duration_ms));

    out.push_str("| Category | Subcategory | Time |\n");
    out.push_str("|---|---|---:|\n");
    for row in rows {
        let _ = writeln!(
            out,
            "| {} | {} | {} |",
            escape_cell(&row.category),
            escape_cell(&row.subcategory),
            format_duration(row.total_duration_ms)
        );
    }

    let _ = writeln!(
        out,
        "\n**Total:** {}",
        format_duration(summary.total_duration_ms())
    );
    out
}

/// `1h 05m` from one hour up, `4m 09s` below
pub fn format_duration(ms: u64) -> String {
    let total_secs = ms / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{}h {:02}m", hours, minutes)
    } else {
        format!("{}m {:02}s", minutes, seconds)
    }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
