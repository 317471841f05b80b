//! Presentation renderer.
//!
//! DESIGN
//! ======
//! `render` turns a [`SegmentedSolution`] into a [`StructuredDocument`]: an
//! ordered list of typed blocks. `to_markup` serializes the document as an
//! HTML fragment with stable CSS class names. Both steps are pure and
//! deterministic. Provider text is always HTML-escaped.


use serde::Serialize;

use super::segment::SegmentedSolution;
use crate::llm::ProviderName;

pub const HEADER_TITLE: &str = "🎯 Solution Analysis";
pub const INTRODUCTION_TITLE: &str = "Understanding the Problem";
pub const FINAL_ANSWER_TITLE: &str = "📋 Final Answer";
pub const SUMMARY_TITLE: &str = "Key Takeaways";

// =============================================================================
// DOCUMENT
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    Header { title: String },
    Introduction { title: String, paragraphs: Vec<String> },
    /// One ordered list per step run.
    Steps { runs: Vec<Vec<String>> },
    Explanation { paragraphs: Vec<String> },
    FinalAnswer { title: String, text: String, math: Option<String> },
    Summary { title: String, paragraphs: Vec<String> },
    Footer { provider: ProviderName, label: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructuredDocument {
    pub blocks: Vec<Block>,
}

/// Build the display document. Empty buckets produce no block.
#[must_use]
pub fn render(solution: &SegmentedSolution, provider: ProviderName) -> StructuredDocument {
    let mut blocks = vec![Block::Header { title: HEADER_TITLE.into() }];

    if !solution.introduction.is_empty() {
        blocks.push(Block::Introduction {
            title: INTRODUCTION_TITLE.into(),
            paragraphs: solution.introduction.clone(),
        });
    }
    if !solution.steps.is_empty() {
        blocks.push(Block::Steps { runs: solution.steps.clone() });
    }
    if !solution.explanation.is_empty() {
        blocks.push(Block::Explanation { paragraphs: solution.explanation.clone() });
    }
    if let Some(answer) = &solution.final_answer {
        blocks.push(Block::FinalAnswer {
            title: FINAL_ANSWER_TITLE.into(),
            text: answer.text.clone(),
            math: answer.math.clone(),
        });
    }
    if !solution.summary.is_empty() {
        blocks.push(Block::Summary { title: SUMMARY_TITLE.into(), paragraphs: solution.summary.clone() });
    }
    blocks.push(Block::Footer { provider, label: footer_label(provider) });

    StructuredDocument { blocks }
}

/// "Powered by Gemini AI". First letter of the wire name upper-cased.
#[must_use]
pub fn footer_label(provider: ProviderName) -> String {
    let name = provider.as_str();
    let mut chars = name.chars();
    let capitalized: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };
    format!("🤖 Powered by {capitalized} AI")
}

// =============================================================================
// MARKUP
// =============================================================================

impl StructuredDocument {
    /// HTML fragment for the document. Header sits outside the content
    /// wrapper; everything else inside `solution-content`.
    #[must_use]
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        let mut content_open = false;

        for block in &self.blocks {
            if let Block::Header { title } = block {
                push_element(&mut out, r#"<div class="solution-header">"#, "</div>", title);
                continue;
            }
            if !content_open {
                out.push_str(r#"<div class="solution-content">"#);
                content_open = true;
            }
            write_block(&mut out, block);
        }

        if content_open {
            out.push_str("</div>");
        }
        out
    }
}

fn write_block(out: &mut String, block: &Block) {
    match block {
        Block::Header { .. } => {}
        Block::Introduction { title, paragraphs } => {
            out.push_str(r#"<div class="solution-explanation">"#);
            push_element(out, r#"<div class="solution-explanation-title">"#, "</div>", title);
            write_paragraphs(out, paragraphs);
            out.push_str("</div>");
        }
        Block::Steps { runs } => {
            for run in runs {
                out.push_str(r#"<ol class="solution-steps">"#);
                for step in run {
                    push_element(out, r#"<li class="solution-step">"#, "</li>", step);
                }
                out.push_str("</ol>");
            }
        }
        Block::Explanation { paragraphs } => {
            out.push_str(r#"<div class="solution-section">"#);
            write_paragraphs(out, paragraphs);
            out.push_str("</div>");
        }
        Block::FinalAnswer { title, text, math } => {
            out.push_str(r#"<div class="solution-final-answer">"#);
            push_element(out, r#"<div class="solution-final-answer-title">"#, "</div>", title);
            match math {
                Some(math) => push_element(out, r#"<div class="solution-math">"#, "</div>", math),
                None => out.push_str(&escape_html(text)),
            }
            out.push_str("</div>");
        }
        Block::Summary { title, paragraphs } => {
            out.push_str(r#"<div class="solution-summary">"#);
            push_element(out, r#"<div class="solution-summary-title">"#, "</div>", title);
            write_paragraphs(out, paragraphs);
            out.push_str("</div>");
        }
        Block::Footer { label, .. } => {
            push_element(out, r#"<div class="solution-footer"><small>"#, "</small></div>", label);
        }
    }
}

/// `open`, escaped `text`, `close`.
fn push_element(out: &mut String, open: &str, close: &str, text: &str) {
    out.push_str(open);
    out.push_str(&escape_html(text));
    out.push_str(close);
}

fn write_paragraphs(out: &mut String, paragraphs: &[String]) {
    for p in paragraphs {
        push_element(out, "<p>", "</p>", p);
    }
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
#[path = "render_test.rs"]
mod tests;
