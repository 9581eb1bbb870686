//! Markdown → HTML fragments for header, topics and Q&A answers.

use paperfeed_qa::QaPair;
use pulldown_cmark::{html, Event, Options, Parser};

/// Render markdown to an HTML fragment.
///
/// Never fails: unbalanced emphasis, stray brackets and the like come out
/// as literal text. Raw HTML in the input is escaped, not passed through.
pub fn render_markdown(text: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(text, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });

    let mut out = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Each question as a level-3 heading followed by its answer.
pub fn format_qa(pairs: &[QaPair]) -> String {
    pairs
        .iter()
        .map(|p| format!("### {}\n\n{}\n\n", p.question, p.answer))
        .collect()
}

pub fn render_qa(pairs: &[QaPair]) -> String {
    render_markdown(&format_qa(pairs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_and_inline_constructs() {
        let html = render_markdown("# Title\n\nSome *emphasis* and `code`.\n\n- one\n- two\n");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<em>emphasis</em>"));
        assert!(html.contains("<code>code</code>"));
        assert!(html.contains("<li>one</li>"));
    }

    #[test]
    fn test_malformed_markdown_degrades_to_text() {
        let html = render_markdown("**unclosed and [broken](link");
        assert!(html.contains("**unclosed"));
        assert!(html.starts_with("<p>"));
    }

    #[test]
    fn test_raw_html_is_escaped() {
        let html = render_markdown("hello <script>alert(1)</script>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(render_markdown(""), "");
    }

    #[test]
    fn test_qa_questions_become_subheadings() {
        let pairs = vec![
            QaPair { question: "What is new?".into(), answer: "A **faster** method.".into() },
            QaPair { question: "Limitations?".into(), answer: "Small datasets.".into() },
        ];
        assert_eq!(
            format_qa(&pairs),
            "### What is new?\n\nA **faster** method.\n\n### Limitations?\n\nSmall datasets.\n\n"
        );
        let html = render_qa(&pairs);
        assert!(html.contains("<h3>What is new?</h3>"));
        assert!(html.contains("<strong>faster</strong>"));
        assert!(html.contains("<h3>Limitations?</h3>"));
    }
}
