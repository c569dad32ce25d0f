//! Authoring collaborator: turns approved material into the next stage's text.
//!
//! The pipeline never trusts what an author writes: every draft goes back
//! through the full policy gate before it can be published.

use crate::pipeline::types::{ApprovedBrief, Brief, DraftBody};

/// Length of the generated excerpt, in characters.
const EXCERPT_CHARS: usize = 160;

/// Writes brief and draft text.
pub trait ContentAuthor: Send + Sync {
    /// Text of the approved brief handed to drafting.
    fn compose_brief(&self, brief: &Brief) -> String;

    /// Draft written from an approved brief.
    fn write_draft(&self, approved: &ApprovedBrief) -> DraftBody;
}

/// Deterministic author that restates the submitted idea.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateAuthor;

impl ContentAuthor for TemplateAuthor {
    fn compose_brief(&self, brief: &Brief) -> String {
        format!("{}\n\n{}", brief.idea.title.trim(), brief.idea.raw_idea.trim())
    }

    fn write_draft(&self, approved: &ApprovedBrief) -> DraftBody {
        let content = approved.approved_brief.trim().to_string();
        let html = content
            .split("\n\n")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| format!("<p>{}</p>", escape_html(p)))
            .collect::<Vec<_>>()
            .join("\n");
        let excerpt = excerpt(&approved.idea().raw_idea, EXCERPT_CHARS);
        DraftBody {
            content,
            html,
            excerpt,
        }
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// First `max` characters, cut back to a word boundary when truncated.
fn excerpt(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    let cut = match cut.rfind(char::is_whitespace) {
        Some(idx) if idx > 0 => &cut[..idx],
        _ => cut.as_str(),
    };
    format!("{}…", cut.trim_end())
}
