//! Output formatting utilities for markdown and JSON.

use crate::resolver::{ConfigListing, Resolved};
use crate::value::ConfigValue;
use std::collections::BTreeMap;

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Markdown,
}

/// Inline rendering of a value for markdown tables and lines.
fn inline_value(value: &ConfigValue) -> String {
    match value {
        ConfigValue::String(s) => format!("`\"{}\"`", s),
        other => format!("`{}`", other),
    }
}

/// Format a resolved value as markdown.
pub fn format_resolved_markdown(path: &str, resolved: &Resolved) -> String {
    format!(
        "- **{}**: {} _(from {})_\n",
        path,
        inline_value(&resolved.value),
        resolved.source
    )
}

/// Format one tier's entries as a markdown table.
pub fn format_entries_markdown(title: &str, entries: &BTreeMap<String, ConfigValue>) -> String {
    let mut md = format!("## {} ({})\n\n", title, entries.len());
    if entries.is_empty() {
        md.push_str("_no entries_\n");
        return md;
    }
    md.push_str("| path | value |\n|---|---|\n");
    for (path, value) in entries {
        md.push_str(&format!("| `{}` | {} |\n", path, inline_value(value)));
    }
    md
}

/// Format a full listing as markdown: both persistent tiers, then the
/// default tree as a JSON block.
pub fn format_listing_markdown(listing: &ConfigListing) -> String {
    let mut md = String::from("# Configuration\n\n");
    md.push_str(&format_entries_markdown("Primary", &listing.primary));
    md.push('\n');
    md.push_str(&format_entries_markdown("Secondary", &listing.secondary));
    md.push_str("\n## Defaults\n\n```json\n");
    md.push_str(&serde_json::to_string_pretty(&listing.defaults).unwrap_or_default());
    md.push_str("\n```\n");
    md
}
